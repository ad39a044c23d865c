use serde::{Deserialize, Serialize};
use std::fmt;

/// A parcel (tax account) lookup key.
///
/// Keys are case-sensitive and never contain whitespace or hyphens once produced by
/// [`sanitize_identifiers`]. Duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParcelId(String);

impl ParcelId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ParcelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ParcelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_separator(ch: char) -> bool {
    ch == ',' || ch.is_whitespace()
}

/// Splits free text on commas and/or whitespace (in any mixture) into parcel keys.
///
/// Hyphens are stripped from every token, empty segments are dropped, and input order and
/// duplicates are preserved. Empty input yields an empty list; rejecting that is the caller's job.
pub fn sanitize_identifiers(raw: &str) -> Vec<ParcelId> {
    raw.split(is_separator)
        .map(|segment| {
            segment
                .chars()
                .filter(|ch| !ch.is_whitespace() && *ch != '-')
                .collect::<String>()
        })
        .filter(|token| !token.is_empty())
        .map(ParcelId)
        .collect()
}
