use crate::error::Result;
use crate::math::matrix::Matrix;

pub const DEFAULT_LEARNING_RATE: f64 = 0.01;
pub const DEFAULT_MOMENTUM: f64 = 0.03;

/// Per-example gradient descent with a momentum term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgd {
    pub learning_rate: f64,
    pub momentum: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64, momentum: f64) -> Sgd {
        Sgd { learning_rate, momentum }
    }

    /// Applies one update to `params`.
    ///
    /// `momentum * previous` is added to `gradient`, the sum is scaled by the
    /// learning rate, recorded in `previous` for the next call and then
    /// subtracted from `params`.
    pub fn step(&self, params: &mut Matrix, gradient: Matrix, previous: &mut Option<Matrix>) -> Result<()> {
        let gradient = match previous.as_ref() {
            Some(prev) => Matrix::add(&gradient, &prev.scale(self.momentum))?,
            None => gradient,
        };
        let adjustment = gradient.scale(self.learning_rate);
        *params = Matrix::subtract(params, &adjustment)?;
        *previous = Some(adjustment);
        Ok(())
    }
}

impl Default for Sgd {
    fn default() -> Self {
        Sgd::new(DEFAULT_LEARNING_RATE, DEFAULT_MOMENTUM)
    }
}
