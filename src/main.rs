// Builds and compiles a model from a JSON model description and prints its layout.
// Run the XOR demo with:
//   cargo run --example xor
use std::process::ExitCode;

use log::error;
use mia_nn::ModelSpec;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(path) = std::env::args().nth(1) else {
        println!("mia-nn: a minimal feed-forward neural network library in Rust.");
        println!("usage: mia-nn <model-spec.json> [seed]");
        println!("Run `cargo run --example xor` to see the XOR demo.");
        return ExitCode::SUCCESS;
    };
    let seed = std::env::args().nth(2).and_then(|s| s.parse().ok()).unwrap_or(0);

    let result = ModelSpec::load_json(&path).and_then(|spec| {
        let mut model = spec.build()?;
        model.compile(seed)?;
        println!("{} ({} layers, seed {seed})", spec.name, model.num_layers());
        for (i, layer) in model.layers().iter().enumerate() {
            println!(
                "  {i}: {:?} {} neurons, {} weights, activation {}",
                layer.kind(),
                layer.num_neurons(),
                layer.weights().capacity(),
                layer.activation()
            );
        }
        Ok(())
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{path}: {e}");
            ExitCode::FAILURE
        }
    }
}
