use crate::document::StoreError;
use regex::Regex;

/// Layer name matcher: `*` matches any run of characters, everything else is literal and
/// case-sensitive. A pattern without `*` is an exact name.
#[derive(Debug, Clone)]
pub(crate) enum NamePattern {
    Exact(String),
    Glob(Regex),
}

impl NamePattern {
    pub(crate) fn parse(pattern: &str) -> Result<Self, StoreError> {
        if !pattern.contains('*') {
            return Ok(Self::Exact(pattern.to_string()));
        }
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let re = Regex::new(&format!("^{body}$")).map_err(|err| StoreError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?;
        Ok(Self::Glob(re))
    }

    pub(crate) fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == name,
            Self::Glob(re) => re.is_match(name),
        }
    }
}
