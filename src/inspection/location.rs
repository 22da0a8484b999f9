use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use super::error::ValidationError;

static SHELF_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[A-Z]-\d{2}|STD-[A-Z]-\d{2}|HUM-\d{2}|TEMP-\d{2}|VAULT-\d{2}|INSP-[A-Z]|PHOTO|PACK)$",
    )
    .expect("shelf code pattern is valid")
});

/// A normalized shelf code that passed the local format check. Existence and capacity
/// are only known to the location API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationCode(String);

impl LocationCode {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(ValidationError::MissingLocation);
        }
        if !SHELF_CODE.is_match(&normalized) {
            return Err(ValidationError::MalformedLocation { code: normalized });
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for LocationCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LocationCode::parse(s)
    }
}

impl fmt::Display for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
