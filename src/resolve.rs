use crate::env::Environment;
use crate::error::{ReplaceTokensError, Result};
use crate::placeholder::Placeholder;
use std::path::Path;

/// Value chosen for a placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// The key is bound in the environment; holds the value's bytes
    Bound(Vec<u8>),
    /// The key is unbound and lenient mode replaces it with nothing
    Blank,
}

impl Replacement {
    pub fn value(&self) -> &[u8] {
        match self {
            Self::Bound(value) => value,
            Self::Blank => &[],
        }
    }
}

/// Resolves a placeholder's key against `env`
///
/// The key is looked up as the exact bytes found in the file and the value is taken as the
/// variable's bytes, so neither side needs to be UTF-8. Empty values count as unbound.
///
/// # Errors
///
/// Returns `ReplaceTokensError::MissingReplacement` naming the key and `path` when the key
/// is unbound and `strict` is set.
pub fn resolve(
    placeholder: &Placeholder,
    env: &impl Environment,
    strict: bool,
    path: &Path,
) -> Result<Replacement> {
    match env.lookup_bytes(&placeholder.key) {
        Some(value) => Ok(Replacement::Bound(value)),
        None if strict => Err(ReplaceTokensError::MissingReplacement {
            key: placeholder.display_key().into_owned(),
            path: path.to_path_buf(),
        }),
        None => {
            tracing::warn!(
                key = %placeholder.display_key(),
                path = %path.display(),
                "no replacement provided, substituting empty string"
            );
            Ok(Replacement::Blank)
        }
    }
}
