use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::layers::{Dense, Flatten};
use crate::network::sequential::Sequential;
use crate::optim::sgd::{Sgd, DEFAULT_LEARNING_RATE, DEFAULT_MOMENTUM};

/// One dense layer in a model specification.
///
/// `activation` defaults to ReLU when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseSpec {
    pub neurons: usize,
    #[serde(default)]
    pub activation: ActivationFunction,
}

/// A serializable description of a sequential architecture: a flatten input
/// layer of `input_shape` followed by `layers`, in order.
///
/// Only the architecture and training rates are stored; trained parameters
/// are not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Human-readable name, e.g. the file stem.
    pub name: String,
    pub input_shape: Vec<usize>,
    pub layers: Vec<DenseSpec>,
    #[serde(default)]
    pub learning_rate: Option<f64>,
    #[serde(default)]
    pub momentum: Option<f64>,
}

impl ModelSpec {
    pub fn optimizer(&self) -> Sgd {
        Sgd::new(
            self.learning_rate.unwrap_or(DEFAULT_LEARNING_RATE),
            self.momentum.unwrap_or(DEFAULT_MOMENTUM),
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_shape.is_empty() || self.input_shape.contains(&0) {
            return Err(NetworkError::InvalidArgument(format!(
                "input shape {:?} must be non-empty with non-zero lengths",
                self.input_shape
            )));
        }
        if let Some(i) = self.layers.iter().position(|layer| layer.neurons == 0) {
            return Err(NetworkError::InvalidArgument(format!("layer {i} has no neurons")));
        }
        let sgd = self.optimizer();
        if !(sgd.learning_rate.is_finite() && sgd.learning_rate > 0.0) {
            return Err(NetworkError::InvalidArgument(format!(
                "learning rate must be positive, got {}",
                sgd.learning_rate
            )));
        }
        if !(sgd.momentum.is_finite() && sgd.momentum >= 0.0) {
            return Err(NetworkError::InvalidArgument(format!(
                "momentum must be non-negative, got {}",
                sgd.momentum
            )));
        }
        Ok(())
    }

    /// Builds the uncompiled model this spec describes.
    pub fn build(&self) -> Result<Sequential> {
        self.validate()?;
        let builder = Sequential::builder()
            .optimizer(self.optimizer())
            .layer(Flatten::new(self.input_shape.clone()));
        let model = self
            .layers
            .iter()
            .fold(builder, |builder, spec| {
                builder.layer(Dense::with_activation(spec.neurons, spec.activation))
            })
            .build();
        Ok(model)
    }

    pub fn from_json_str(json: &str) -> Result<ModelSpec> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `ModelSpec` from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<ModelSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
