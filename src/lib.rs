//! # replace-tokens
//!
//! Replaces delimited placeholder tokens in files with values taken from environment
//! variables. Meant to run once over a file tree in a build or deployment pipeline, for
//! example to inject configuration values into templated config files.
//!
//! ## Features
//!
//! - Placeholders like `#{DATABASE_URL}#`, with configurable delimiters
//! - Glob selection of the files to process
//! - Strict mode aborts on the first placeholder without a value; lenient mode blanks it
//! - Files without placeholders are never rewritten
//!
//! ## Usage
//!
//! ### As a Library
//!
//! ```no_run
//! use replace_tokens::{ProcessEnv, RunConfig, RunOptions};
//! use std::path::Path;
//!
//! let config = RunConfig::resolve(&ProcessEnv)?;
//! let summary = replace_tokens::run(&config, Path::new("."), &ProcessEnv, &RunOptions::default())?;
//! println!("{} files rewritten", summary.files_rewritten);
//! # Ok::<(), replace_tokens::ReplaceTokensError>(())
//! ```
//!
//! ### As a CLI Tool
//!
//! ```bash
//! # Replace #{...}# tokens in every file below the current directory
//! DATABASE_URL=postgres://db replace-tokens
//!
//! # Only YAML files, custom delimiters, blank unknown tokens
//! INPUT_FILES='**/*.yaml' INPUT_PREFIX='__' INPUT_SUFFIX='__' \
//!   INPUT_FAIL-IF-NO-PROVIDED-REPLACEMENT=false replace-tokens
//! ```

pub mod config;
pub mod env;
pub mod error;
pub mod placeholder;
pub mod resolve;
pub mod rewrite;
pub mod walk;

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

// Re-export main types and functions for convenience
pub use config::RunConfig;
pub use env::{Environment, ProcessEnv};
pub use error::{ReplaceTokensError, Result};
pub use placeholder::{Placeholder, PlaceholderPattern, extract};
pub use resolve::{Replacement, resolve};
pub use rewrite::{FileReport, rewrite_file};
pub use walk::{compile_glob, find_files};

/// Options that change how a run treats the selected files
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Resolve everything but write nothing
    pub dry_run: bool,
}

/// Totals for a completed run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub files_scanned: usize,
    pub files_rewritten: usize,
    pub placeholders_replaced: usize,
    /// Reports for every file that contained at least one placeholder
    pub reports: Vec<FileReport>,
}

impl RunSummary {
    /// Keys blanked across all files, in file order
    pub fn blanked(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.reports.iter().flat_map(|report| {
            report
                .blanked
                .iter()
                .map(move |key| (report.path.as_path(), key.as_str()))
        })
    }
}

/// Placeholders present in one file
///
/// Keys are for display; invalid UTF-8 is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileListing {
    pub path: PathBuf,
    pub keys: Vec<String>,
}

/// Replaces placeholders in every file under `root` selected by the configuration
///
/// Files are processed one at a time, in path order. The first error aborts the run; files
/// already rewritten stay rewritten.
///
/// # Errors
///
/// - `ReplaceTokensError::Pattern` or `ReplaceTokensError::Glob` before any file is touched.
/// - `ReplaceTokensError::Io` or `ReplaceTokensError::MissingReplacement` from the first
///   failing file.
pub fn run(
    config: &RunConfig,
    root: &Path,
    env: &impl Environment,
    options: &RunOptions,
) -> Result<RunSummary> {
    let pattern = PlaceholderPattern::new(&config.prefix, &config.suffix)?;
    let matcher = compile_glob(&config.files)?;

    let files = find_files(root, &matcher);
    tracing::debug!(
        count = files.len(),
        glob = %config.files,
        root = %root.display(),
        "selected files"
    );

    let mut summary = RunSummary {
        files_scanned: files.len(),
        ..RunSummary::default()
    };

    for path in files {
        let report = rewrite_file(
            &path,
            &pattern,
            env,
            config.fail_on_missing,
            !options.dry_run,
        )?;
        if report.placeholders == 0 {
            continue;
        }
        if report.written {
            summary.files_rewritten += 1;
        }
        summary.placeholders_replaced += report.placeholders;
        summary.reports.push(report);
    }

    Ok(summary)
}

/// Lists the distinct placeholder keys in every selected file that has any
///
/// Nothing is resolved or written.
///
/// # Errors
///
/// Returns pattern or glob errors, or `ReplaceTokensError::Io` for an unreadable file.
pub fn list_placeholders(config: &RunConfig, root: &Path) -> Result<Vec<FileListing>> {
    let pattern = PlaceholderPattern::new(&config.prefix, &config.suffix)?;
    let matcher = compile_glob(&config.files)?;

    let mut listings = Vec::new();
    for path in find_files(root, &matcher) {
        let content = fs::read(&path).map_err(|e| ReplaceTokensError::io(&path, e))?;
        let placeholders = pattern.extract(&content);
        if placeholders.is_empty() {
            continue;
        }
        listings.push(FileListing {
            path,
            keys: placeholders
                .iter()
                .map(|p| p.display_key().into_owned())
                .collect(),
        });
    }

    Ok(listings)
}
