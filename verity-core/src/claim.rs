//! User-submitted claims

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from claim construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    #[error("No text provided")]
    Empty,
}

/// A statement to be fact-checked.
///
/// Always trimmed and never empty. The text is kept exactly as submitted
/// otherwise, since evidence sources are queried with it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Claim(String);

impl Claim {
    /// Build a claim from raw input, trimming surrounding whitespace
    pub fn new(text: &str) -> Result<Self, ClaimError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ClaimError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive substring test against some evidence text
    pub fn is_contained_in(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.0.to_lowercase())
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Claim {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Claim {
    type Error = ClaimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Claim::new(&value)
    }
}

impl From<Claim> for String {
    fn from(claim: Claim) -> Self {
        claim.0
    }
}
