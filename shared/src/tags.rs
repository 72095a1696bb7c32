use serde::{Deserialize, Serialize};

pub const TAG_DELIMITER: char = ',';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub text: String,
}

impl Tag {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Splits a comma-delimited category string into trimmed tags.
///
/// Blank entries survive as empty tags (`"a,,b"` yields three tags) so the
/// chip count always matches the delimiter count.
#[must_use]
pub fn tokenize(raw: Option<&str>) -> Vec<Tag> {
    match raw {
        None | Some("") => Vec::new(),
        Some(raw) => raw
            .split(TAG_DELIMITER)
            .map(|token| Tag::new(token.trim()))
            .collect(),
    }
}

/// Content hash of the tag source, used to tell whether a cached
/// measurement still describes the same panel.
#[must_use]
pub fn fingerprint(raw: Option<&str>) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    match raw {
        Some(raw) => {
            hasher.update(&[1]);
            hasher.update(raw.as_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
    hasher.finalize()
}
