use log::debug;

use crate::activation::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::layers::layer::{InputLayer, Layer, LayerKind, LayerState};
use crate::math::matrix::Matrix;
use crate::optim::sgd::Sgd;
use crate::view::ndarray_view::NdArrayView;

/// Input layer that flattens an n-dimensional view into one value vector.
///
/// The neuron count is the product of the declared dimension lengths, and a
/// shape whose concatenated lengths exceed that product does not compile.
/// Owns no weights or biases.
#[derive(Debug)]
pub struct Flatten {
    input_shape: Vec<usize>,
    state: LayerState,
}

impl Flatten {
    pub fn new(input_shape: Vec<usize>) -> Flatten {
        Flatten {
            input_shape,
            state: LayerState::new(ActivationFunction::Identity),
        }
    }

    pub fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }
}

impl Layer for Flatten {
    fn kind(&self) -> LayerKind {
        LayerKind::Input
    }

    fn state(&self) -> &LayerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut LayerState {
        &mut self.state
    }

    fn compile(&mut self, _seed: u64, prev: Option<&dyn Layer>) -> Result<()> {
        if prev.is_some() {
            return Err(NetworkError::PreconditionFailed(
                "a flatten layer must be the first layer".into(),
            ));
        }
        if self.input_shape.is_empty() {
            return Err(NetworkError::InvalidArgument(
                "a flatten layer needs at least one input dimension".into(),
            ));
        }
        let neurons: usize = self.input_shape.iter().product();
        if neurons == 0 {
            return Err(NetworkError::InvalidArgument(format!(
                "input shape {:?} has no elements",
                self.input_shape
            )));
        }
        // Concatenated dimensions must fit inside the value vector.
        let concatenated: usize = self.input_shape.iter().sum();
        if concatenated > neurons {
            return Err(NetworkError::InvalidArgument(format!(
                "input shape {:?} concatenates to {} values but has only {} neurons",
                self.input_shape, concatenated, neurons
            )));
        }

        self.state.weights = Matrix::default();
        self.state.biases = Matrix::default();
        self.state.values = Matrix::zeros(neurons, 1);
        self.state.pre_activation = Matrix::default();

        debug!("compiled flatten layer: shape {:?} -> {} neurons", self.input_shape, neurons);
        Ok(())
    }

    /// Values come from [`InputLayer::set_input_data`]; nothing to compute.
    fn execute(&mut self, _prev: Option<&dyn Layer>) -> Result<()> {
        Ok(())
    }

    fn backpropagate(
        &mut self,
        _cost: &Matrix,
        _is_output: bool,
        _prev: &dyn Layer,
        _optimizer: &Sgd,
    ) -> Result<Matrix> {
        Err(NetworkError::PreconditionFailed(
            "a flatten layer has no trainable parameters".into(),
        ))
    }

    fn as_input_mut(&mut self) -> Option<&mut dyn InputLayer> {
        Some(self)
    }
}

impl InputLayer for Flatten {
    /// Concatenates the view's dimensions, in declared order, into the value
    /// vector. Neurons past the concatenated data are zeroed.
    fn set_input_data(&mut self, input: &NdArrayView<'_>) -> Result<()> {
        let neurons = self.num_neurons();
        if neurons == 0 {
            return Err(NetworkError::NotCompiled("flatten layer".into()));
        }
        if input.lengths() != self.input_shape {
            return Err(NetworkError::mismatch(
                "set_input_data",
                format!("{:?}", self.input_shape),
                format!("{:?}", input.lengths()),
            ));
        }

        let mut values = Matrix::zeros(neurons, 1);
        let mut offset = 0;
        for dimension in input.iter() {
            values.copy_from(offset, 0, dimension)?;
            offset += dimension.len();
        }
        self.state.values = values;
        Ok(())
    }
}
