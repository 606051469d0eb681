use thiserror::Error;

/// Errors raised by matrix algebra, layers and models.
///
/// Shape and precondition violations are reported to the caller rather than
/// asserted; every failure is deterministic for the same inputs.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Operand shapes are incompatible for the named operation.
    #[error("{op}: dimension mismatch, expected {expected}, got {actual}")]
    DimensionMismatch {
        op: &'static str,
        expected: String,
        actual: String,
    },

    #[error("element ({row}, {col}) is out of bounds for a {rows}x{cols} matrix")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// A layer or model was used before `compile`.
    #[error("{0} has not been compiled")]
    NotCompiled(String),

    #[error("unknown activation function `{0}`")]
    UnknownActivation(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NetworkError>;

impl NetworkError {
    pub(crate) fn mismatch(
        op: &'static str,
        expected: impl ToString,
        actual: impl ToString,
    ) -> NetworkError {
        NetworkError::DimensionMismatch {
            op,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
