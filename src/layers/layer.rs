use std::fmt;

use log::warn;

use crate::activation::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::loss::mse::MseLoss;
use crate::math::matrix::Matrix;
use crate::optim::sgd::Sgd;
use crate::view::ndarray_view::NdArrayView;

/// Distinguishes layers that receive external data from computing layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Input,
    Dense,
}

/// Gradients from the previous training step, kept for the momentum term.
/// Both are `None` until the layer is first backpropagated.
#[derive(Debug, Clone, Default)]
pub struct Momentum {
    pub weights: Option<Matrix>,
    pub biases: Option<Matrix>,
}

/// Parameters and activations shared by every layer type.
///
/// `weights` is `neurons x prev_neurons`; `biases`, `values` and
/// `pre_activation` are `neurons x 1` column vectors. Input layers leave
/// `weights` and `biases` empty.
#[derive(Debug, Clone, Default)]
pub struct LayerState {
    pub(crate) weights: Matrix,
    pub(crate) biases: Matrix,
    pub(crate) values: Matrix,
    pub(crate) pre_activation: Matrix,
    pub(crate) activation: ActivationFunction,
    pub(crate) momentum: Momentum,
}

impl LayerState {
    pub fn new(activation: ActivationFunction) -> LayerState {
        LayerState {
            activation,
            ..LayerState::default()
        }
    }

    pub fn momentum(&self) -> &Momentum {
        &self.momentum
    }

    /// Computes `activation(weights x prev + biases)`, caching the
    /// pre-activation values for backpropagation.
    pub fn forward(&mut self, prev: &Matrix) -> Result<()> {
        if self.values.is_empty() {
            return Err(NetworkError::NotCompiled("layer".into()));
        }

        let z = Matrix::add(&Matrix::multiply(&self.weights, prev)?, &self.biases)?;
        self.values = match self.activation {
            ActivationFunction::Identity => z.clone(),
            activation => z.map(|x| activation.function(x)),
        };
        self.pre_activation = z;
        Ok(())
    }

    /// One gradient-descent step on this layer's weights and biases.
    ///
    /// `cost` holds the expected outputs when `is_output` is set, and
    /// otherwise the cost sensitivity (∂C/∂a) handed down by the next layer.
    /// Returns ∂C/∂a for `prev`, averaged over each neuron's nonzero-weight
    /// connections and computed against the weights before the update.
    pub fn backpropagate(
        &mut self,
        cost: &Matrix,
        is_output: bool,
        prev: &Matrix,
        optimizer: &Sgd,
    ) -> Result<Matrix> {
        let neurons = self.values.rows();
        if neurons == 0 {
            return Err(NetworkError::NotCompiled("layer".into()));
        }
        if cost.capacity() != neurons {
            return Err(NetworkError::mismatch(
                "backpropagate",
                format!("{neurons} cost values"),
                format!("{} cost values", cost.capacity()),
            ));
        }
        if prev.rows() != self.weights.cols() {
            return Err(NetworkError::mismatch(
                "backpropagate",
                format!("{} previous neurons", self.weights.cols()),
                format!("{} previous neurons", prev.rows()),
            ));
        }

        // ∂C/∂a
        let cost_sensitivity = if is_output {
            Matrix::column(&MseLoss::derivative(self.values.as_slice(), cost.as_slice()))
        } else {
            Matrix::column(cost.as_slice())
        };
        // ∂a/∂z, at the cached pre-activation values
        let activation = self.activation;
        let activation_sensitivity = self.pre_activation.map(|x| activation.derivative(x));
        // δ = ∂C/∂z; also the bias gradient since ∂z/∂b = 1
        let delta = Matrix::hadamard(&activation_sensitivity, &cost_sensitivity)?;

        // ∂C/∂w_jk = a_k · δ_j
        let weight_gradients = Matrix::multiply(&delta, &prev.transpose())?;

        let propagated = self.propagate(&delta)?;

        optimizer.step(&mut self.weights, weight_gradients, &mut self.momentum.weights)?;
        optimizer.step(&mut self.biases, delta, &mut self.momentum.biases)?;

        Ok(propagated)
    }

    fn propagate(&self, delta: &Matrix) -> Result<Matrix> {
        let prev_neurons = self.weights.cols();
        let mut sensitivity = Matrix::zeros(prev_neurons, 1);

        for k in 0..prev_neurons {
            let mut sum = 0.0;
            let mut connections = 0usize;
            for j in 0..self.weights.rows() {
                let weight = self.weights.get(j, k)?;
                // A zero weight is no connection.
                if weight != 0.0 {
                    sum += weight * delta.get(j, 0)?;
                    connections += 1;
                }
            }
            if connections == 0 {
                warn!("previous-layer neuron {k} has no nonzero connections; propagating zero");
                continue;
            }
            sensitivity.set(k, 0, sum / connections as f64)?;
        }

        Ok(sensitivity)
    }
}

/// A layer in a sequential model.
///
/// Implementors own a [`LayerState`]; the provided methods run the weighted
/// forward pass and backpropagation over it.
pub trait Layer: fmt::Debug {
    fn kind(&self) -> LayerKind;

    fn state(&self) -> &LayerState;

    fn state_mut(&mut self) -> &mut LayerState;

    /// Allocates and seeds parameters. `prev` is `None` for the first layer.
    fn compile(&mut self, seed: u64, prev: Option<&dyn Layer>) -> Result<()>;

    fn execute(&mut self, prev: Option<&dyn Layer>) -> Result<()> {
        let prev = prev.ok_or_else(|| {
            NetworkError::PreconditionFailed("execute needs a previous layer".into())
        })?;
        self.state_mut().forward(prev.values())
    }

    fn backpropagate(
        &mut self,
        cost: &Matrix,
        is_output: bool,
        prev: &dyn Layer,
        optimizer: &Sgd,
    ) -> Result<Matrix> {
        self.state_mut().backpropagate(cost, is_output, prev.values(), optimizer)
    }

    /// The input-layer view of this layer, if it is one.
    fn as_input_mut(&mut self) -> Option<&mut dyn InputLayer> {
        None
    }

    /// Zero until compiled.
    fn num_neurons(&self) -> usize {
        self.state().values.capacity()
    }

    fn values(&self) -> &Matrix {
        &self.state().values
    }

    fn pre_activation(&self) -> &Matrix {
        &self.state().pre_activation
    }

    fn weights(&self) -> &Matrix {
        &self.state().weights
    }

    fn biases(&self) -> &Matrix {
        &self.state().biases
    }

    fn activation(&self) -> ActivationFunction {
        self.state().activation
    }
}

/// A layer whose values are written from external data instead of computed.
pub trait InputLayer: Layer {
    fn set_input_data(&mut self, input: &NdArrayView<'_>) -> Result<()>;
}
