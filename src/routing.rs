// ABOUTME: Traffic split and shadow policy: validation and route context.
// ABOUTME: Entry order is preserved end-to-end; tag and weight lists pair by index.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use nonempty::NonEmpty;
use thiserror::Error;

use crate::templates::RenderContext;
use crate::types::{ModelTag, ModelTagError};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(
        "total of '{sum}' for weights '{weights}' does not equal 100 as expected"
    )]
    WeightSumMismatch { sum: i64, weights: String },

    #[error(
        "shadow tag '{tag}' is not in the split map; shadow tags must also appear in the split map with 0% weight"
    )]
    ShadowNotInSplit { tag: String },

    #[error(
        "shadow tag '{tag}' has split weight {weight}; shadow tags must also appear in the split map with 0% weight"
    )]
    ShadowNonZeroWeight { tag: String, weight: u32 },

    #[error("invalid split entry '{0}': expected tag=weight")]
    MalformedEntry(String),

    #[error("invalid split weight '{0}'")]
    MalformedWeight(String),

    #[error("duplicate split tag '{0}'")]
    DuplicateTag(String),

    #[error("split spec must contain at least one tag=weight entry")]
    EmptySpec,

    #[error("split spec is base64-encoded but does not decode to UTF-8")]
    InvalidEncoding,

    #[error("invalid tag in split spec: {0}")]
    InvalidTag(#[from] ModelTagError),
}

/// A weighted/shadow traffic specification for one model's variants.
///
/// Entries keep the caller's order: the rendered tag and weight lists must
/// pair by index, and the artifact-name snippet must read the same way the
/// caller wrote the spec.
#[derive(Debug, Clone)]
pub struct TrafficSplitSpec {
    entries: NonEmpty<(ModelTag, u32)>,
    shadows: Vec<ModelTag>,
}

impl TrafficSplitSpec {
    pub fn new(
        entries: NonEmpty<(ModelTag, u32)>,
        shadows: Vec<ModelTag>,
    ) -> Result<Self, ValidationError> {
        for (i, (tag, _)) in entries.iter().enumerate() {
            if entries.iter().skip(i + 1).any(|(other, _)| other == tag) {
                return Err(ValidationError::DuplicateTag(tag.to_string()));
            }
        }
        Ok(Self { entries, shadows })
    }

    /// Parse the wire format: an ordered `tag=weight` comma list, e.g.
    /// `a=60,b=40`, optionally base64-encoded for URL-path transport.
    /// Tags are normalized on the way in.
    pub fn parse(split: &str, shadows: &str) -> Result<Self, ValidationError> {
        let split = decode_if_encoded(split)?;
        let shadows = decode_if_encoded(shadows)?;

        let mut entries = Vec::new();
        for part in split.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (tag, weight) = part
                .split_once('=')
                .ok_or_else(|| ValidationError::MalformedEntry(part.to_string()))?;
            let tag = ModelTag::new(tag.trim())?;
            let weight: u32 = weight
                .trim()
                .parse()
                .map_err(|_| ValidationError::MalformedWeight(weight.trim().to_string()))?;
            entries.push((tag, weight));
        }

        let entries = NonEmpty::from_vec(entries).ok_or(ValidationError::EmptySpec)?;

        let shadows = shadows
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(ModelTag::new)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(entries, shadows)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&ModelTag, u32)> {
        self.entries.iter().map(|(t, w)| (t, *w))
    }

    pub fn shadows(&self) -> &[ModelTag] {
        &self.shadows
    }

    /// Enforce the routing invariants, in order: the weights must sum to
    /// exactly 100, and every shadow tag must appear in the split map with
    /// weight exactly 0. Checked before any manifest is rendered or applied.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let sum: i64 = self.entries.iter().map(|(_, w)| *w as i64).sum();
        if sum != 100 {
            return Err(ValidationError::WeightSumMismatch {
                sum,
                weights: self.weights_display(),
            });
        }

        for shadow in &self.shadows {
            match self.entries.iter().find(|(tag, _)| tag == shadow) {
                None => {
                    return Err(ValidationError::ShadowNotInSplit {
                        tag: shadow.to_string(),
                    });
                }
                Some((_, weight)) if *weight != 0 => {
                    return Err(ValidationError::ShadowNonZeroWeight {
                        tag: shadow.to_string(),
                        weight: *weight,
                    });
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Build the routing render context: parallel ordered lists plus their
    /// lengths, produced in a single pass so tag and weight positions can
    /// never drift apart.
    pub fn build_route_context(&self, registry_namespace: &str, model_name: &str) -> RenderContext {
        let mut split_tags = Vec::with_capacity(self.entries.len());
        let mut split_weights = Vec::with_capacity(self.entries.len());
        for (tag, weight) in self.entries.iter() {
            split_tags.push(tag.to_string());
            split_weights.push(weight.to_string());
        }
        let shadow_tags: Vec<String> = self.shadows.iter().map(|t| t.to_string()).collect();

        let mut ctx = RenderContext::new();
        ctx.set("IMAGE_REGISTRY_NAMESPACE", registry_namespace)
            .set("MODEL_NAME", model_name)
            .set("MODEL_SPLIT_TAG_LIST", split_tags.clone())
            .set("MODEL_SPLIT_WEIGHT_LIST", split_weights)
            .set(
                "MODEL_NUM_SPLIT_TAGS_AND_WEIGHTS",
                self.entries.len() as i64,
            )
            .set("MODEL_SHADOW_TAG_LIST", shadow_tags)
            .set("MODEL_NUM_SHADOW_TAGS", self.shadows.len() as i64);
        ctx
    }

    /// Human-diagnostic filename fragment, e.g. `split-a-100-b-0`, folded
    /// over the same ordered lists the route context uses.
    pub fn split_snippet(&self) -> String {
        let mut snippet = String::from("split");
        for (tag, weight) in self.entries.iter() {
            snippet.push_str(&format!("-{}-{}", tag, weight));
        }
        snippet
    }

    /// Shadow counterpart of `split_snippet`, e.g. `shadow-b`; bare
    /// `shadow` when no tags are shadowed.
    pub fn shadow_snippet(&self) -> String {
        let mut snippet = String::from("shadow");
        for tag in &self.shadows {
            snippet.push_str(&format!("-{}", tag));
        }
        snippet
    }

    fn weights_display(&self) -> String {
        let pairs: Vec<String> = self
            .entries
            .iter()
            .map(|(tag, weight)| format!("'{}': {}", tag, weight))
            .collect();
        format!("{{{}}}", pairs.join(", "))
    }
}

fn decode_if_encoded(raw: &str) -> Result<String, ValidationError> {
    match BASE64.decode(raw.as_bytes()) {
        Ok(decoded) if BASE64.encode(&decoded) == raw => {
            String::from_utf8(decoded).map_err(|_| ValidationError::InvalidEncoding)
        }
        _ => Ok(raw.to_string()),
    }
}
