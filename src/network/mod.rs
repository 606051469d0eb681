pub mod sequential;
pub mod spec;

pub use sequential::{Sequential, SequentialBuilder};
pub use spec::{DenseSpec, ModelSpec};
