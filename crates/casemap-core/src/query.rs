use crate::sanitize::ParcelId;
use serde::Serialize;
use std::fmt;

/// Identifier field of the parcel layer when the configuration does not name one.
pub const DEFAULT_ID_FIELD: &str = "ACCOUNT";

/// An immutable `<field> IN (<quoted values...>)` predicate.
///
/// Values keep input order and duplicates. An empty value list renders as `<field> IN ()` and
/// matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeQuery {
    field: String,
    values: Vec<String>,
}

impl AttributeQuery {
    pub fn build(field: &str, identifiers: &[ParcelId]) -> Self {
        let query = Self {
            field: field.to_string(),
            values: identifiers.iter().map(|id| id.as_str().to_string()).collect(),
        };
        tracing::info!(
            field = %query.field,
            identifiers = query.values.len(),
            predicate = %query,
            "built parcel attribute query"
        );
        query
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Set membership against the textual form of an attribute value.
    pub fn matches(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn predicate(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AttributeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} IN (", self.field)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}'", value.replace('\'', "''"))?;
        }
        f.write_str(")")
    }
}
