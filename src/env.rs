//! Read-only key/value lookup used for both configuration inputs and replacement values.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};

/// Source of environment bindings
pub trait Environment {
    /// Returns the raw value bound to `key`, if any
    fn var_os(&self, key: &OsStr) -> Option<OsString>;

    /// Returns the value bound to `key`, treating an empty value as unbound
    fn lookup_os(&self, key: &OsStr) -> Option<OsString> {
        self.var_os(key).filter(|value| !value.is_empty())
    }

    /// Looks up a key taken verbatim from file content and returns the value's bytes
    ///
    /// Empty values count as unbound. Keys the platform cannot name a variable with are
    /// never bound.
    fn lookup_bytes(&self, key: &[u8]) -> Option<Vec<u8>> {
        let key = os_key(key)?;
        self.lookup_os(key).map(OsString::into_encoded_bytes)
    }
}

/// Converts key bytes to an `OsStr` without loss
///
/// Non-UTF-8 keys are only representable on Unix, where environment names are raw bytes.
fn os_key(key: &[u8]) -> Option<&OsStr> {
    match std::str::from_utf8(key) {
        Ok(key) => Some(OsStr::new(key)),
        #[cfg(unix)]
        Err(_) => Some(std::os::unix::ffi::OsStrExt::from_bytes(key)),
        #[cfg(not(unix))]
        Err(_) => None,
    }
}

/// The environment of the current process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var_os(&self, key: &OsStr) -> Option<OsString> {
        // Keys that the OS cannot represent (empty, or containing '=' or NUL) are never bound
        if key.is_empty() || key.as_encoded_bytes().iter().any(|b| matches!(b, b'=' | b'\0')) {
            return None;
        }
        std::env::var_os(key)
    }
}

impl Environment for HashMap<String, String> {
    fn var_os(&self, key: &OsStr) -> Option<OsString> {
        self.get(key.to_str()?).map(OsString::from)
    }
}

impl Environment for HashMap<OsString, OsString> {
    fn var_os(&self, key: &OsStr) -> Option<OsString> {
        self.get(key).cloned()
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn var_os(&self, key: &OsStr) -> Option<OsString> {
        (**self).var_os(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_lookup() {
        let env = HashMap::from([
            ("VAL".to_string(), "42".to_string()),
            ("EMPTY".to_string(), String::new()),
        ]);
        assert_eq!(env.lookup_bytes(b"VAL"), Some(b"42".to_vec()));
        assert_eq!(env.var_os(OsStr::new("EMPTY")), Some(OsString::new()));
        assert_eq!(env.lookup_os(OsStr::new("EMPTY")), None);
        assert_eq!(env.lookup_bytes(b"EMPTY"), None);
        assert_eq!(env.lookup_bytes(b"NOPE"), None);
    }

    #[test]
    fn test_process_env_rejects_unrepresentable_keys() {
        assert_eq!(ProcessEnv.var_os(OsStr::new("")), None);
        assert_eq!(ProcessEnv.var_os(OsStr::new("A=B")), None);
        assert_eq!(ProcessEnv.var_os(OsStr::new("A\0B")), None);
        assert_eq!(ProcessEnv.lookup_bytes(b"A=B"), None);
    }

    #[test]
    fn test_invalid_utf8_key_does_not_match_replacement_character() {
        let env = HashMap::from([("\u{FFFD}".to_string(), "X".to_string())]);
        assert_eq!(env.lookup_bytes(b"\xff"), None);
        assert_eq!(env.lookup_bytes("\u{FFFD}".as_bytes()), Some(b"X".to_vec()));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_keys_and_values() {
        use std::os::unix::ffi::OsStringExt;

        let env = HashMap::from([
            (
                OsString::from_vec(b"K\xff".to_vec()),
                OsString::from_vec(b"v\xfe".to_vec()),
            ),
            (
                OsString::from("TEXT"),
                OsString::from_vec(b"\x80raw".to_vec()),
            ),
        ]);
        assert_eq!(env.lookup_bytes(b"K\xff"), Some(b"v\xfe".to_vec()));
        assert_eq!(env.lookup_bytes(b"K\xfe"), None);
        assert_eq!(env.lookup_bytes(b"TEXT"), Some(b"\x80raw".to_vec()));
    }
}
