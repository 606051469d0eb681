use log::debug;

use crate::activation::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::layers::layer::{Layer, LayerKind, LayerState, Momentum};
use crate::math::matrix::Matrix;

/// Fully connected layer: every previous-layer neuron feeds every neuron here.
#[derive(Debug)]
pub struct Dense {
    size: usize,
    state: LayerState,
}

impl Dense {
    /// A ReLU layer of `size` neurons.
    pub fn new(size: usize) -> Dense {
        Dense::with_activation(size, ActivationFunction::default())
    }

    pub fn with_activation(size: usize, activation: ActivationFunction) -> Dense {
        Dense {
            size,
            state: LayerState::new(activation),
        }
    }

    /// Builds an already-compiled layer from known parameters.
    ///
    /// `weights` is `neurons x prev_neurons` and `biases` must be a
    /// `neurons x 1` column. Calling [`Layer::compile`] afterwards replaces
    /// both with seeded values.
    pub fn from_parameters(
        weights: Matrix,
        biases: Matrix,
        activation: ActivationFunction,
    ) -> Result<Dense> {
        if weights.is_empty() {
            return Err(NetworkError::InvalidArgument(
                "dense weights must not be empty".into(),
            ));
        }
        if biases.rows() != weights.rows() || biases.cols() != 1 {
            return Err(NetworkError::mismatch(
                "from_parameters",
                format!("{}x1 biases", weights.rows()),
                format!("{}x{} biases", biases.rows(), biases.cols()),
            ));
        }

        let size = weights.rows();
        Ok(Dense {
            size,
            state: LayerState {
                weights,
                biases,
                values: Matrix::zeros(size, 1),
                pre_activation: Matrix::zeros(size, 1),
                activation,
                momentum: Momentum::default(),
            },
        })
    }
}

impl Layer for Dense {
    fn kind(&self) -> LayerKind {
        LayerKind::Dense
    }

    fn state(&self) -> &LayerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut LayerState {
        &mut self.state
    }

    fn compile(&mut self, seed: u64, prev: Option<&dyn Layer>) -> Result<()> {
        let prev = prev.ok_or_else(|| {
            NetworkError::PreconditionFailed("a dense layer needs a preceding layer".into())
        })?;
        let inputs = prev.num_neurons();
        if inputs == 0 {
            return Err(NetworkError::PreconditionFailed(
                "the layer before a dense layer has no neurons".into(),
            ));
        }
        if self.size == 0 {
            return Err(NetworkError::InvalidArgument(
                "a dense layer needs at least one neuron".into(),
            ));
        }

        // Weights and biases draw from the same seeded stream.
        self.state.weights = Matrix::seeded(self.size, inputs, seed);
        self.state.biases = Matrix::seeded(self.size, 1, seed);
        self.state.values = Matrix::zeros(self.size, 1);
        self.state.pre_activation = Matrix::zeros(self.size, 1);
        self.state.momentum = Momentum::default();

        debug!(
            "compiled dense layer: {} x {} weights, activation {}",
            self.size, inputs, self.state.activation
        );
        Ok(())
    }
}
