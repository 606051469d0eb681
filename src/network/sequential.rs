use log::{debug, trace};

use crate::error::{NetworkError, Result};
use crate::layers::layer::{Layer, LayerKind};
use crate::loss::mse::MseLoss;
use crate::math::matrix::Matrix;
use crate::optim::sgd::Sgd;
use crate::view::ndarray_view::NdArrayView;

/// An ordered stack of layers, the first of which receives the input.
///
/// The model owns its layers; they are dropped with it, once each, in order.
#[derive(Debug)]
pub struct Sequential {
    layers: Vec<Box<dyn Layer>>,
    optimizer: Sgd,
    compiled: bool,
}

impl Sequential {
    pub fn new(layers: Vec<Box<dyn Layer>>) -> Sequential {
        Sequential {
            layers,
            optimizer: Sgd::default(),
            compiled: false,
        }
    }

    pub fn builder() -> SequentialBuilder {
        SequentialBuilder::default()
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn optimizer(&self) -> &Sgd {
        &self.optimizer
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Values of the last layer from the most recent forward pass.
    pub fn output(&self) -> Option<&Matrix> {
        self.layers.last().map(|layer| layer.values())
    }

    /// Compiles every layer front to back, each against its predecessor.
    pub fn compile(&mut self, seed: u64) -> Result<()> {
        self.check_first_layer()?;

        self.compiled = false;
        for i in 0..self.layers.len() {
            let (before, rest) = self.layers.split_at_mut(i);
            let prev = before.last().map(|layer| &**layer);
            rest[0].compile(seed, prev)?;
        }
        self.compiled = true;

        debug!("compiled sequential model: {} layers, seed {}", self.layers.len(), seed);
        Ok(())
    }

    /// Runs a forward pass and returns a copy of the output values.
    pub fn execute(&mut self, input: &NdArrayView<'_>) -> Result<Matrix> {
        self.forward(input)?;
        self.output()
            .cloned()
            .ok_or_else(|| NetworkError::NotCompiled("sequential model".into()))
    }

    /// Runs a forward pass, backpropagates the squared error against
    /// `expected` through every layer after the input layer, and returns the
    /// mean squared error of the forward pass.
    pub fn train(&mut self, input: &NdArrayView<'_>, expected: &[f64]) -> Result<f64> {
        self.ensure_compiled()?;
        let outputs = self.layers.last().map_or(0, |layer| layer.num_neurons());
        if expected.len() != outputs {
            return Err(NetworkError::mismatch(
                "train",
                format!("{outputs} expected outputs"),
                format!("{} expected outputs", expected.len()),
            ));
        }

        self.forward(input)?;
        let mse = self
            .output()
            .map(|output| MseLoss::loss(output.as_slice(), expected))
            .unwrap_or_default();
        self.backward(expected)?;

        trace!("training step: mse {mse:.6}");
        Ok(mse)
    }

    fn check_first_layer(&self) -> Result<()> {
        match self.layers.first() {
            None => Err(NetworkError::InvalidArgument(
                "a sequential model needs at least one layer".into(),
            )),
            Some(first) if first.kind() != LayerKind::Input => Err(NetworkError::PreconditionFailed(
                "the first layer of a sequential model must be an input layer".into(),
            )),
            Some(_) => Ok(()),
        }
    }

    /// Compiles only the input layers and checks that every other layer
    /// already holds parameters shaped for its predecessor.
    fn adopt_parameters(&mut self) -> Result<()> {
        self.check_first_layer()?;

        for i in 0..self.layers.len() {
            let (before, rest) = self.layers.split_at_mut(i);
            let prev = before.last().map(|layer| &**layer);
            let layer = &mut rest[0];
            if layer.kind() == LayerKind::Input {
                layer.compile(0, prev)?;
                continue;
            }

            if layer.num_neurons() == 0 || layer.weights().is_empty() {
                return Err(NetworkError::NotCompiled(format!("layer {i}")));
            }
            let inputs = prev.map_or(0, |prev| prev.num_neurons());
            if layer.weights().width() != inputs {
                return Err(NetworkError::mismatch(
                    "build_with_parameters",
                    format!("{inputs} weight columns in layer {i}"),
                    format!("{} weight columns in layer {i}", layer.weights().width()),
                ));
            }
        }
        self.compiled = true;

        debug!("assembled sequential model from parameters: {} layers", self.layers.len());
        Ok(())
    }

    fn ensure_compiled(&self) -> Result<()> {
        if self.compiled {
            Ok(())
        } else {
            Err(NetworkError::NotCompiled("sequential model".into()))
        }
    }

    fn forward(&mut self, input: &NdArrayView<'_>) -> Result<()> {
        self.ensure_compiled()?;

        let first = self.layers[0].as_input_mut().ok_or_else(|| {
            NetworkError::PreconditionFailed("the first layer is not an input layer".into())
        })?;
        first.set_input_data(input)?;

        for i in 0..self.layers.len() {
            let (before, rest) = self.layers.split_at_mut(i);
            let prev = before.last().map(|layer| &**layer);
            rest[0].execute(prev)?;
        }
        Ok(())
    }

    /// Walks back from the output layer, handing each layer's propagated
    /// cost sensitivity to the layer before it. The input layer is skipped.
    fn backward(&mut self, expected: &[f64]) -> Result<()> {
        let optimizer = self.optimizer;
        let mut cost = Matrix::column(expected);
        let mut is_output = true;

        for i in (1..self.layers.len()).rev() {
            let (before, rest) = self.layers.split_at_mut(i);
            cost = rest[0].backpropagate(&cost, is_output, &*before[i - 1], &optimizer)?;
            is_output = false;
        }
        Ok(())
    }
}

/// Collects owned layers, in order, for a [`Sequential`] model.
#[derive(Debug, Default)]
pub struct SequentialBuilder {
    layers: Vec<Box<dyn Layer>>,
    optimizer: Sgd,
}

impl SequentialBuilder {
    pub fn layer<L: Layer + 'static>(mut self, layer: L) -> SequentialBuilder {
        self.layers.push(Box::new(layer));
        self
    }

    pub fn boxed(mut self, layer: Box<dyn Layer>) -> SequentialBuilder {
        self.layers.push(layer);
        self
    }

    pub fn optimizer(mut self, optimizer: Sgd) -> SequentialBuilder {
        self.optimizer = optimizer;
        self
    }

    pub fn build(self) -> Sequential {
        Sequential {
            layers: self.layers,
            optimizer: self.optimizer,
            compiled: false,
        }
    }

    /// Builds a model that is ready to execute and train without seeding,
    /// from layers that already carry their parameters (see
    /// [`crate::layers::Dense::from_parameters`]). Input layers are compiled
    /// here. Calling [`Sequential::compile`] later reseeds everything.
    pub fn build_with_parameters(self) -> Result<Sequential> {
        let mut model = self.build();
        model.adopt_parameters()?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::layers::layer::{InputLayer, LayerState};
    use crate::layers::{Dense, Flatten};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Journal = Rc<RefCell<Vec<String>>>;

    /// Records every call it receives, tagged with its index.
    #[derive(Debug)]
    struct Probe {
        id: usize,
        kind: LayerKind,
        journal: Journal,
        state: LayerState,
    }

    impl Probe {
        fn new(id: usize, kind: LayerKind, journal: &Journal) -> Probe {
            Probe {
                id,
                kind,
                journal: journal.clone(),
                state: LayerState::default(),
            }
        }

        fn log(&self, event: &str) {
            self.journal.borrow_mut().push(format!("{event}{}", self.id));
        }
    }

    impl Drop for Probe {
        fn drop(&mut self) {
            self.log("drop");
        }
    }

    impl Layer for Probe {
        fn kind(&self) -> LayerKind {
            self.kind
        }

        fn state(&self) -> &LayerState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut LayerState {
            &mut self.state
        }

        fn compile(&mut self, _seed: u64, prev: Option<&dyn Layer>) -> Result<()> {
            assert_eq!(prev.is_none(), self.id == 0);
            self.state.values = Matrix::zeros(1, 1);
            self.log("compile");
            Ok(())
        }

        fn execute(&mut self, prev: Option<&dyn Layer>) -> Result<()> {
            assert_eq!(prev.is_none(), self.id == 0);
            self.log("execute");
            Ok(())
        }

        fn backpropagate(
            &mut self,
            cost: &Matrix,
            is_output: bool,
            _prev: &dyn Layer,
            _optimizer: &Sgd,
        ) -> Result<Matrix> {
            self.log(if is_output { "output" } else { "hidden" });
            Ok(cost.clone())
        }

        fn as_input_mut(&mut self) -> Option<&mut dyn InputLayer> {
            match self.kind {
                LayerKind::Input => Some(self),
                LayerKind::Dense => None,
            }
        }
    }

    impl InputLayer for Probe {
        fn set_input_data(&mut self, _input: &NdArrayView<'_>) -> Result<()> {
            self.log("input");
            Ok(())
        }
    }

    fn probes(journal: &Journal) -> Sequential {
        Sequential::builder()
            .layer(Probe::new(0, LayerKind::Input, journal))
            .layer(Probe::new(1, LayerKind::Dense, journal))
            .layer(Probe::new(2, LayerKind::Dense, journal))
            .build()
    }

    #[test]
    fn compile_walks_layers_in_order() {
        let journal = Journal::default();
        let mut model = probes(&journal);
        model.compile(0).unwrap();
        assert!(model.is_compiled());
        assert_eq!(*journal.borrow(), vec!["compile0", "compile1", "compile2"]);
    }

    #[test]
    fn train_sets_input_executes_then_backpropagates_in_reverse() {
        let journal = Journal::default();
        let mut model = probes(&journal);
        model.compile(0).unwrap();
        journal.borrow_mut().clear();

        model.train(&NdArrayView::default(), &[0.0]).unwrap();
        assert_eq!(
            *journal.borrow(),
            vec!["input0", "execute0", "execute1", "execute2", "output2", "hidden1"]
        );
    }

    #[test]
    fn drop_releases_each_layer_once_in_order() {
        let journal = Journal::default();
        drop(probes(&journal));
        assert_eq!(*journal.borrow(), vec!["drop0", "drop1", "drop2"]);
    }

    #[test]
    fn compile_requires_an_input_layer_first() {
        assert!(matches!(
            Sequential::new(vec![]).compile(0),
            Err(NetworkError::InvalidArgument(_))
        ));

        let mut model = Sequential::builder().layer(Dense::new(2)).build();
        assert!(matches!(
            model.compile(0),
            Err(NetworkError::PreconditionFailed(_))
        ));
        assert!(!model.is_compiled());
    }

    #[test]
    fn execute_before_compile_fails() {
        let mut model = Sequential::builder()
            .layer(Flatten::new(vec![2]))
            .layer(Dense::new(1))
            .build();
        let input = [1.0, 0.0];
        assert!(matches!(
            model.execute(&NdArrayView::flat(&input)),
            Err(NetworkError::NotCompiled(_))
        ));
        assert!(model.train(&NdArrayView::flat(&input), &[1.0]).is_err());
    }

    #[test]
    fn train_checks_expected_length() {
        let mut model = Sequential::builder()
            .layer(Flatten::new(vec![2]))
            .layer(Dense::new(1))
            .build();
        model.compile(0).unwrap();
        let input = [1.0, 0.0];
        assert!(matches!(
            model.train(&NdArrayView::flat(&input), &[1.0, 0.0]),
            Err(NetworkError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn build_with_parameters_keeps_known_weights() {
        let weights = Matrix::from_rows(vec![vec![1.0, 2.0]]).unwrap();
        let model = Sequential::builder()
            .layer(Flatten::new(vec![2]))
            .layer(Dense::from_parameters(weights.clone(), Matrix::column(&[0.5]), ActivationFunction::Identity).unwrap())
            .build_with_parameters()
            .unwrap();
        assert!(model.is_compiled());
        assert_eq!(model.layers()[0].num_neurons(), 2);
        assert_eq!(model.layers()[1].weights(), &weights);
    }

    #[test]
    fn build_with_parameters_rejects_unparameterised_or_misfit_layers() {
        let unseeded = Sequential::builder()
            .layer(Flatten::new(vec![2]))
            .layer(Dense::new(1))
            .build_with_parameters();
        assert!(matches!(unseeded, Err(NetworkError::NotCompiled(_))));

        let misfit = Sequential::builder()
            .layer(Flatten::new(vec![3]))
            .layer(Dense::from_parameters(Matrix::zeros(1, 2), Matrix::zeros(1, 1), ActivationFunction::ReLU).unwrap())
            .build_with_parameters();
        assert!(matches!(misfit, Err(NetworkError::DimensionMismatch { .. })));

        let headless = Sequential::builder()
            .layer(Dense::from_parameters(Matrix::zeros(1, 1), Matrix::zeros(1, 1), ActivationFunction::ReLU).unwrap())
            .build_with_parameters();
        assert!(matches!(headless, Err(NetworkError::PreconditionFailed(_))));
    }

    #[test]
    fn builder_keeps_optimizer() {
        let model = Sequential::builder()
            .optimizer(Sgd::new(0.5, 0.0))
            .layer(Flatten::new(vec![1]))
            .build();
        assert_eq!(model.optimizer(), &Sgd::new(0.5, 0.0));
        assert_eq!(model.num_layers(), 1);
    }
}
