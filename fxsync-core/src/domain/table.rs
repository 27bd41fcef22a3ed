//! Rate table identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::DomainError;

/// Name of a rate table, validated as a plain SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableId(String);

impl TableId {
    pub fn new(raw: &str) -> Result<Self, DomainError> {
        let mut chars = raw.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };
        if !valid {
            return Err(DomainError::InvalidTableId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Table for a configured prefix: `dollar` -> `dollar_based_currency`.
    pub fn for_prefix(prefix: &str) -> Result<Self, DomainError> {
        Self::new(&format!("{prefix}_based_currency"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Inverse of `for_prefix`; other names are returned whole.
    pub fn prefix(&self) -> &str {
        self.0.strip_suffix("_based_currency").unwrap_or(&self.0)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TableId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<TableId> for String {
    fn from(table: TableId) -> Self {
        table.0
    }
}
