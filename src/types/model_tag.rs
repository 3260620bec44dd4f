// ABOUTME: Model tag normalization and validation.
// ABOUTME: Tags are lossy lower-cased because they end up in DNS hostnames.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelTagError {
    #[error("model tag cannot be empty")]
    Empty,

    #[error("model tag exceeds maximum length of 63 characters")]
    TooLong,

    #[error("model tag cannot start with a hyphen")]
    StartsWithHyphen,

    #[error("model tag cannot end with a hyphen")]
    EndsWithHyphen,

    #[error("invalid character in model tag: '{0}'")]
    InvalidChar(char),
}

/// A normalized model tag.
///
/// Construction lower-cases the input before validating, discarding case
/// information on purpose: the tag is later used as a DNS label, a routing
/// hostname fragment, and a filename component, all of which are
/// case-insensitive or case-hostile. Normalization is idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModelTag(String);

impl ModelTag {
    pub fn new(value: &str) -> Result<Self, ModelTagError> {
        let value = value.to_lowercase();

        if value.is_empty() {
            return Err(ModelTagError::Empty);
        }

        if value.len() > 63 {
            return Err(ModelTagError::TooLong);
        }

        if value.starts_with('-') {
            return Err(ModelTagError::StartsWithHyphen);
        }

        if value.ends_with('-') {
            return Err(ModelTagError::EndsWithHyphen);
        }

        for c in value.chars() {
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' {
                return Err(ModelTagError::InvalidChar(c));
            }
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for ModelTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ModelTag::new(&s).map_err(serde::de::Error::custom)
    }
}
