use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for replace-tokens operations
///
/// Every variant is fatal to a run; nothing in the crate recovers from one locally.
#[derive(Error, Debug)]
pub enum ReplaceTokensError {
    /// A configuration input is missing or cannot be interpreted
    #[error("Configuration error for input '{name}': {message}")]
    Configuration { name: String, message: String },

    /// The prefix/suffix pair could not be compiled into a pattern
    #[error("Placeholder pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// The file selection glob is invalid
    #[error("Invalid file glob '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// IO error when reading or writing a selected file
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A placeholder has no environment binding while strict mode is on
    #[error(
        "Replaceable string '{key}' found in file {path} but has no corresponding replacement"
    )]
    MissingReplacement { key: String, path: PathBuf },

    /// IO error when writing reports to stdout
    #[error("Output error: {0}")]
    Output(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReplaceTokensError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReplaceTokensError>;
