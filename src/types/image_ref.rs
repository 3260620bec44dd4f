// ABOUTME: Container image reference parsing and composition.
// ABOUTME: Registered model-server images are registry/repo/namespace-name:tag.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: {0}")]
    InvalidChar(char),
}

/// A parsed container image reference.
///
/// Composed references from the registry coordinates are always fully
/// qualified, but `pull` accepts anything the daemon would, so the usual
/// short forms parse too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    registry: Option<String>,
    name: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        if let Some(bad) = input
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !"/:.-_@".contains(*c))
        {
            return Err(ParseImageRefError::InvalidChar(bad));
        }

        let (rest, digest) = match input.split_once('@') {
            Some((rest, digest)) => (rest, Some(digest.to_string())),
            None => (input, None),
        };

        let (rest, mut tag) = split_tag(rest);

        // The leading component is a registry host when it has a dot, a
        // port colon, or is "localhost"; otherwise it is part of the name.
        let (registry, name) = match rest.split_once('/') {
            Some((host, remainder))
                if host.contains('.') || host.contains(':') || host == "localhost" =>
            {
                (Some(host.to_string()), remainder.to_string())
            }
            _ => (None, rest.to_string()),
        };

        if tag.is_none() && digest.is_none() {
            tag = Some("latest".to_string());
        }

        Ok(Self {
            registry,
            name,
            tag,
            digest,
        })
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }
}

/// Split a trailing `:tag`, leaving registry port colons alone (anything
/// after the last colon that still contains a slash is a port, not a tag).
fn split_tag(input: &str) -> (&str, Option<String>) {
    match input.rsplit_once(':') {
        Some((rest, candidate)) if !candidate.contains('/') => {
            (rest, Some(candidate.to_string()))
        }
        _ => (input, None),
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref registry) = self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}", self.name)?;
        if let Some(ref tag) = self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(ref digest) = self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}
