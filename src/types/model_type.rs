// ABOUTME: Model type, runtime, and chip enums.
// ABOUTME: The runtime derivation table maps each model type to its serving runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown {kind}: '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// The framework a model artifact was exported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Tensorflow,
    Python,
    Java,
    Pmml,
    Spark,
    Xgboost,
    Keras,
    Scikit,
    Pytorch,
    Caffe,
}

impl ModelType {
    /// Derive the serving runtime for a model type when the caller did not
    /// override it. Unknown combinations fall back to the python runtime.
    pub fn default_runtime(self) -> Runtime {
        match self {
            ModelType::Keras | ModelType::Python | ModelType::Scikit | ModelType::Pytorch => {
                Runtime::Python
            }
            ModelType::Java | ModelType::Pmml | ModelType::Spark | ModelType::Xgboost => {
                Runtime::Jvm
            }
            ModelType::Tensorflow => Runtime::TfServing,
            ModelType::Caffe => Runtime::Cpp,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModelType::Tensorflow => "tensorflow",
            ModelType::Python => "python",
            ModelType::Java => "java",
            ModelType::Pmml => "pmml",
            ModelType::Spark => "spark",
            ModelType::Xgboost => "xgboost",
            ModelType::Keras => "keras",
            ModelType::Scikit => "scikit",
            ModelType::Pytorch => "pytorch",
            ModelType::Caffe => "caffe",
        }
    }
}

impl FromStr for ModelType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tensorflow" => Ok(ModelType::Tensorflow),
            "python" => Ok(ModelType::Python),
            "java" => Ok(ModelType::Java),
            "pmml" => Ok(ModelType::Pmml),
            "spark" => Ok(ModelType::Spark),
            "xgboost" => Ok(ModelType::Xgboost),
            "keras" => Ok(ModelType::Keras),
            "scikit" => Ok(ModelType::Scikit),
            "pytorch" => Ok(ModelType::Pytorch),
            "caffe" => Ok(ModelType::Caffe),
            other => Err(ParseEnumError {
                kind: "model type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The serving runtime that hosts a model inside its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    Python,
    Jvm,
    TfServing,
    Cpp,
}

impl Runtime {
    pub fn as_str(self) -> &'static str {
        match self {
            Runtime::Python => "python",
            Runtime::Jvm => "jvm",
            Runtime::TfServing => "tfserving",
            Runtime::Cpp => "cpp",
        }
    }
}

impl FromStr for Runtime {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "python" => Ok(Runtime::Python),
            "jvm" => Ok(Runtime::Jvm),
            "tfserving" => Ok(Runtime::TfServing),
            "cpp" => Ok(Runtime::Cpp),
            other => Err(ParseEnumError {
                kind: "runtime",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hardware target for a model variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chip {
    #[default]
    Cpu,
    Gpu,
}

impl Chip {
    pub fn as_str(self) -> &'static str {
        match self {
            Chip::Cpu => "cpu",
            Chip::Gpu => "gpu",
        }
    }
}

impl FromStr for Chip {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(Chip::Cpu),
            "gpu" => Ok(Chip::Gpu),
            other => Err(ParseEnumError {
                kind: "chip",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Chip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
