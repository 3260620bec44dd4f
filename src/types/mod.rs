// ABOUTME: Validated domain types for model identity and image references.
// ABOUTME: Everything that ends up in a DNS label or filename is validated here.

mod image_ref;
mod model_name;
mod model_tag;
mod model_type;
mod variant;

pub use image_ref::{ImageRef, ParseImageRefError};
pub use model_name::{ModelName, ModelNameError};
pub use model_tag::{ModelTag, ModelTagError};
pub use model_type::{Chip, ModelType, ParseEnumError, Runtime};
pub use variant::{ModelVariant, RegistryCoordinates};
