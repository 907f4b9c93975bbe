//! Validated identifiers for requested entities and currencies.

use core::fmt;
use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

use crate::error::CambioError;

/// One requested ticker or instrument identifier.
///
/// Identifiers are trimmed and upper-cased on construction so `"aapl "` and
/// `"AAPL"` address the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Entity(String);

impl Entity {
    /// Validate and normalize an identifier.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the identifier is empty or contains whitespace.
    pub fn new(id: impl AsRef<str>) -> Result<Self, CambioError> {
        let trimmed = id.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CambioError::InvalidArg("entity identifier is empty".into()));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(CambioError::InvalidArg(format!(
                "entity identifier '{trimmed}' contains whitespace"
            )));
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    /// Borrow the normalized identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Entity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Entity {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Entity {
    type Error = CambioError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Entity {
    type Error = CambioError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Entity> for String {
    fn from(e: Entity) -> Self {
        e.0
    }
}

/// ISO-4217 style three-letter currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Validate and upper-case a currency code.
    ///
    /// # Errors
    /// Returns `InvalidArg` unless the code is exactly three ASCII letters.
    pub fn new(code: impl AsRef<str>) -> Result<Self, CambioError> {
        let code = code.as_ref().trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CambioError::InvalidArg(format!(
                "invalid currency code '{code}'"
            )));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// Borrow the code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// FX pair symbol converting from `self` into `target`, e.g. `EURUSD`.
    #[must_use]
    pub fn pair_symbol(&self, target: &Self) -> String {
        format!("{}{}", self.0, target.0)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = CambioError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.0
    }
}
