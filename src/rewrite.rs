use crate::env::Environment;
use crate::error::{ReplaceTokensError, Result};
use crate::placeholder::PlaceholderPattern;
use crate::resolve::{Replacement, resolve};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of processing one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    /// Distinct placeholders found in the file
    pub placeholders: usize,
    /// Keys replaced with an empty string because they had no binding, for display
    pub blanked: Vec<String>,
    /// Whether the file content differs after substitution
    pub changed: bool,
    /// Whether the new content was written back
    pub written: bool,
}

/// Replaces every placeholder in the file at `path` and writes the result back
///
/// All placeholders are resolved before anything is written, so a strict-mode failure leaves
/// the file untouched. Files without placeholders are never written. When `write` is false
/// the file is only analysed.
///
/// # Errors
///
/// - `ReplaceTokensError::Io` if the file cannot be read or written.
/// - `ReplaceTokensError::MissingReplacement` if `strict` is set and a key is unbound.
pub fn rewrite_file(
    path: &Path,
    pattern: &PlaceholderPattern,
    env: &impl Environment,
    strict: bool,
    write: bool,
) -> Result<FileReport> {
    let content = fs::read(path).map_err(|e| ReplaceTokensError::io(path, e))?;
    let placeholders = pattern.extract(&content);

    let mut report = FileReport {
        path: path.to_path_buf(),
        placeholders: placeholders.len(),
        blanked: Vec::new(),
        changed: false,
        written: false,
    };

    if placeholders.is_empty() {
        tracing::trace!(path = %path.display(), "no placeholders");
        return Ok(report);
    }

    let mut substitutions = BTreeMap::new();
    for placeholder in placeholders {
        let replacement = resolve(&placeholder, env, strict, path)?;
        if replacement == Replacement::Blank {
            report.blanked.push(placeholder.display_key().into_owned());
        }
        substitutions.insert(placeholder.raw, replacement.value().to_vec());
    }

    let rewritten = pattern.substitute(&content, &substitutions);
    report.changed = rewritten != content;

    if report.changed && write {
        // Writing through the existing file keeps its permissions
        fs::write(path, &rewritten).map_err(|e| ReplaceTokensError::io(path, e))?;
        report.written = true;
        tracing::info!(
            path = %path.display(),
            placeholders = report.placeholders,
            "rewrote file"
        );
    }

    Ok(report)
}
