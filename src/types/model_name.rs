// ABOUTME: DNS-compatible model name validation.
// ABOUTME: Model names become label/hostname fragments, so RFC 1123 rules apply.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelNameError {
    #[error("model name cannot be empty")]
    Empty,

    #[error("model name exceeds maximum length of 63 characters")]
    TooLong,

    #[error("model name cannot start with a hyphen")]
    StartsWithHyphen,

    #[error("model name cannot end with a hyphen")]
    EndsWithHyphen,

    #[error("model name must be lowercase")]
    NotLowercase,

    #[error("invalid character in model name: '{0}'")]
    InvalidChar(char),
}

/// A validated model name, safe for use in DNS labels, container names,
/// and generated-artifact filenames.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModelName(String);

impl ModelName {
    pub fn new(value: &str) -> Result<Self, ModelNameError> {
        if value.is_empty() {
            return Err(ModelNameError::Empty);
        }

        if value.len() > 63 {
            return Err(ModelNameError::TooLong);
        }

        if value.starts_with('-') {
            return Err(ModelNameError::StartsWithHyphen);
        }

        if value.ends_with('-') {
            return Err(ModelNameError::EndsWithHyphen);
        }

        for c in value.chars() {
            if c.is_ascii_uppercase() {
                return Err(ModelNameError::NotLowercase);
            }
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' {
                return Err(ModelNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for ModelName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ModelName::new(&s).map_err(serde::de::Error::custom)
    }
}
