pub mod dense;
pub mod flatten;
pub mod layer;

pub use dense::Dense;
pub use flatten::Flatten;
pub use layer::{InputLayer, Layer, LayerKind, LayerState, Momentum};
