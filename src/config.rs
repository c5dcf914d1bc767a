use crate::env::Environment;
use crate::error::{ReplaceTokensError, Result};
use std::ffi::OsStr;

/// Namespace prepended to every logical input name before lookup
pub const INPUT_NAMESPACE: &str = "INPUT_";

pub const PREFIX_INPUT: &str = "PREFIX";
pub const SUFFIX_INPUT: &str = "SUFFIX";
pub const FILES_INPUT: &str = "FILES";
pub const FAIL_ON_MISSING_INPUT: &str = "FAIL-IF-NO-PROVIDED-REPLACEMENT";

pub const DEFAULT_PREFIX: &str = "#{";
pub const DEFAULT_SUFFIX: &str = "}#";
pub const DEFAULT_FILES: &str = "**";

/// Configuration of a single replacement run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Opening delimiter of a placeholder
    pub prefix: String,
    /// Closing delimiter of a placeholder
    pub suffix: String,
    /// Glob selecting the files to process, relative to the walk root
    pub files: String,
    /// Abort the run on the first placeholder without a binding
    pub fail_on_missing: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
            files: DEFAULT_FILES.to_string(),
            fail_on_missing: true,
        }
    }
}

/// Values that take precedence over the environment, typically from command-line flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub files: Option<String>,
    pub fail_on_missing: Option<bool>,
}

impl RunConfig {
    /// Resolves the run configuration from namespaced inputs in `env`
    ///
    /// # Errors
    ///
    /// Returns `ReplaceTokensError::Configuration` if an input is not valid UTF-8 or the
    /// fail-on-missing input is not a boolean literal.
    pub fn resolve(env: &impl Environment) -> Result<Self> {
        Self::resolve_with(env, &ConfigOverrides::default())
    }

    /// Resolves the run configuration, reading `env` only for inputs `overrides` leaves unset
    ///
    /// An overridden input is never read, so an invalid environment value cannot fail a run
    /// that overrides it.
    ///
    /// # Errors
    ///
    /// Same as [`RunConfig::resolve`], for the inputs that are read.
    pub fn resolve_with(env: &impl Environment, overrides: &ConfigOverrides) -> Result<Self> {
        let fail_on_missing = match overrides.fail_on_missing {
            Some(value) => value,
            None => match input(env, FAIL_ON_MISSING_INPUT)? {
                Some(value) => parse_bool(FAIL_ON_MISSING_INPUT, &value)?,
                None => true,
            },
        };

        let text = |value: &Option<String>, name: &str, default: &str| match value {
            Some(value) => Ok(value.clone()),
            None => required_input(env, name, Some(default)),
        };

        Ok(Self {
            prefix: text(&overrides.prefix, PREFIX_INPUT, DEFAULT_PREFIX)?,
            suffix: text(&overrides.suffix, SUFFIX_INPUT, DEFAULT_SUFFIX)?,
            files: text(&overrides.files, FILES_INPUT, DEFAULT_FILES)?,
            fail_on_missing,
        })
    }
}

/// Looks up a logical input name under the input namespace
///
/// The hyphenated name is tried first, then the same name with `-` replaced by `_`.
/// Empty values are treated as absent.
///
/// # Errors
///
/// Returns `ReplaceTokensError::Configuration` if the value is not valid UTF-8.
pub fn input(env: &impl Environment, name: &str) -> Result<Option<String>> {
    let namespaced = format!("{INPUT_NAMESPACE}{name}");
    let underscored = namespaced.replace('-', "_");

    let value = env
        .lookup_os(OsStr::new(&namespaced))
        .or_else(|| env.lookup_os(OsStr::new(&underscored)));

    value
        .map(|value| {
            value
                .into_string()
                .map_err(|_| ReplaceTokensError::Configuration {
                    name: name.to_string(),
                    message: "value is not valid UTF-8".to_string(),
                })
        })
        .transpose()
}

/// Looks up an input, falling back to `default`
///
/// # Errors
///
/// Returns `ReplaceTokensError::Configuration` if the input is absent and has no default, or
/// is not valid UTF-8.
pub fn required_input(env: &impl Environment, name: &str, default: Option<&str>) -> Result<String> {
    input(env, name)?
        .or_else(|| default.map(str::to_string))
        .ok_or_else(|| ReplaceTokensError::Configuration {
            name: name.to_string(),
            message: "a value is required".to_string(),
        })
}

/// Parses a boolean literal (`true` or `false`, case-insensitive)
///
/// # Errors
///
/// Returns `ReplaceTokensError::Configuration` naming `name` for any other value.
pub fn parse_bool(name: &str, value: &str) -> Result<bool> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ReplaceTokensError::Configuration {
            name: name.to_string(),
            message: format!("cannot convert '{value}' to boolean"),
        })
    }
}
