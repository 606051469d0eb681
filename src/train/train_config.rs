/// Configuration for a `fit` run.
///
/// - `epochs`    — full passes over the samples
/// - `log_every` — progress is logged at `info` every this many epochs
///                 (and on the last); `0` disables progress logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainConfig {
    pub epochs: usize,
    pub log_every: usize,
}

impl TrainConfig {
    pub fn new(epochs: usize) -> Self {
        TrainConfig { epochs, log_every: 0 }
    }

    pub fn log_every(mut self, log_every: usize) -> Self {
        self.log_every = log_every;
        self
    }
}
