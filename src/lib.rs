pub mod error;
pub mod math;
pub mod activation;
pub mod view;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use error::{NetworkError, Result};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use view::ndarray_view::NdArrayView;
pub use layers::{Dense, Flatten, InputLayer, Layer, LayerKind};
pub use network::{ModelSpec, Sequential};
pub use loss::mse::MseLoss;
pub use optim::sgd::Sgd;
pub use train::{fit, train_epoch, EpochStats, TrainConfig};
