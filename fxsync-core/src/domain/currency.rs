//! Currency codes and the source's currency catalog.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::row::ColumnSet;
use super::DomainError;

/// A currency code as served by the rate source (`usd`, `eur`, `1inch`, ...).
///
/// Codes double as SQL column names, so only lowercase ASCII alphanumerics
/// are accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(raw: &str) -> Result<Self, DomainError> {
        let code = raw.trim().to_ascii_lowercase();
        if code.is_empty() {
            return Err(DomainError::InvalidCurrencyCode(raw.to_string()));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::InvalidCurrencyCode(raw.to_string()));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upper-case form used in report titles.
    pub fn display_upper(&self) -> String {
        self.0.to_ascii_uppercase()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Every currency the source knows about, with display names.
///
/// Fetched once per bootstrap; defines the column set of new rate tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyCatalog {
    names: BTreeMap<CurrencyCode, String>,
}

impl CurrencyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from raw `code -> name` pairs.
    ///
    /// Entries whose code is not a valid column name are skipped and
    /// returned separately so callers can log them.
    pub fn from_entries<I, K, V>(entries: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut catalog = Self::new();
        let mut rejected = Vec::new();
        for (code, name) in entries {
            match CurrencyCode::new(code.as_ref()) {
                Ok(code) => {
                    catalog.names.insert(code, name.into());
                }
                Err(_) => rejected.push(code.as_ref().to_string()),
            }
        }
        (catalog, rejected)
    }

    pub fn insert(&mut self, code: CurrencyCode, name: impl Into<String>) {
        self.names.insert(code, name.into());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.names.contains_key(code)
    }

    pub fn name(&self, code: &CurrencyCode) -> Option<&str> {
        self.names.get(code).map(|s| s.as_str())
    }

    pub fn codes(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.names.keys()
    }

    /// Columns of a rate table built from this catalog, in code order.
    pub fn column_set(&self) -> ColumnSet {
        ColumnSet::new(self.names.keys().cloned().collect())
    }
}
