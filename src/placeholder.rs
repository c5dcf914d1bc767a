use crate::error::Result;
use regex::bytes::{Captures, Regex};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

/// A delimited token found in file content
///
/// Both fields hold the exact bytes from the file, so placeholders that differ only in
/// invalid UTF-8 stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Placeholder {
    /// The full match including prefix and suffix
    pub raw: Vec<u8>,
    /// The bytes between prefix and suffix, used verbatim as the lookup key
    pub key: Vec<u8>,
}

impl Placeholder {
    /// The key for messages and reports, with invalid UTF-8 replaced
    pub fn display_key(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.key)
    }
}

/// Compiled matcher for one prefix/suffix pair
#[derive(Debug, Clone)]
pub struct PlaceholderPattern {
    regex: Regex,
    prefix_len: usize,
    suffix_len: usize,
}

impl PlaceholderPattern {
    /// Compiles a pattern matching `prefix`, the shortest run of characters on one line,
    /// then `suffix`. Both delimiters are matched literally.
    ///
    /// # Errors
    ///
    /// Returns `ReplaceTokensError::Pattern` if the pattern cannot be compiled.
    pub fn new(prefix: &str, suffix: &str) -> Result<Self> {
        let pattern = format!(
            "{}(?-u:.)*?{}",
            regex::escape(prefix),
            regex::escape(suffix)
        );
        Ok(Self {
            regex: Regex::new(&pattern)?,
            prefix_len: prefix.len(),
            suffix_len: suffix.len(),
        })
    }

    /// Returns the distinct placeholders in `content`
    pub fn extract(&self, content: &[u8]) -> BTreeSet<Placeholder> {
        self.regex
            .find_iter(content)
            .map(|m| self.placeholder(m.as_bytes()))
            .collect()
    }

    fn placeholder(&self, raw: &[u8]) -> Placeholder {
        let key = &raw[self.prefix_len..raw.len() - self.suffix_len];
        Placeholder {
            raw: raw.to_vec(),
            key: key.to_vec(),
        }
    }

    /// Replaces every placeholder whose raw text is in `substitutions` with its value
    ///
    /// Replacement happens in a single pass over the matches, so the result does not depend
    /// on the order of `substitutions`. Values are inserted literally.
    pub fn substitute(&self, content: &[u8], substitutions: &BTreeMap<Vec<u8>, Vec<u8>>) -> Vec<u8> {
        self.regex
            .replace_all(content, |caps: &Captures<'_>| {
                let raw = &caps[0];
                substitutions.get(raw).map_or(raw, Vec::as_slice).to_vec()
            })
            .into_owned()
    }
}

/// Extracts the distinct placeholders delimited by `prefix` and `suffix` from `content`
///
/// # Errors
///
/// Returns `ReplaceTokensError::Pattern` if the delimiters cannot form a pattern.
pub fn extract(content: &str, prefix: &str, suffix: &str) -> Result<BTreeSet<Placeholder>> {
    Ok(PlaceholderPattern::new(prefix, suffix)?.extract(content.as_bytes()))
}
