use std::time::Instant;

use log::info;

use crate::error::{NetworkError, Result};
use crate::network::sequential::Sequential;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;
use crate::view::ndarray_view::NdArrayView;

/// Trains `model` once on every sample, in order, and returns the mean of
/// the per-example MSE values. Gradients are applied after each example.
///
/// Each input is a view shaped like the model's input layer.
pub fn train_epoch(
    model: &mut Sequential,
    inputs: &[NdArrayView<'_>],
    expected_outputs: &[Vec<f64>],
) -> Result<f64> {
    if inputs.is_empty() {
        return Err(NetworkError::InvalidArgument("no training samples".into()));
    }
    if inputs.len() != expected_outputs.len() {
        return Err(NetworkError::mismatch(
            "train_epoch",
            format!("{} expected outputs", inputs.len()),
            format!("{} expected outputs", expected_outputs.len()),
        ));
    }

    let mut total_loss = 0.0;
    for (input, expected) in inputs.iter().zip(expected_outputs) {
        total_loss += model.train(input, expected)?;
    }

    Ok(total_loss / inputs.len() as f64)
}

/// Runs `config.epochs` epochs of [`train_epoch`] and returns their stats.
pub fn fit(
    model: &mut Sequential,
    inputs: &[NdArrayView<'_>],
    expected_outputs: &[Vec<f64>],
    config: &TrainConfig,
) -> Result<Vec<EpochStats>> {
    let mut history = Vec::with_capacity(config.epochs);

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();
        let train_loss = train_epoch(model, inputs, expected_outputs)?;
        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };

        if config.log_every > 0 && (epoch % config.log_every == 0 || epoch == config.epochs) {
            info!("epoch {}/{}: loss = {:.6}", epoch, config.epochs, train_loss);
        }
        history.push(stats);
    }

    Ok(history)
}
