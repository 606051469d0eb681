use mia_nn::{fit, ActivationFunction, Dense, Flatten, NdArrayView, Sequential, Sgd, TrainConfig};

fn main() -> mia_nn::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut model = Sequential::builder()
        .optimizer(Sgd::new(0.5, 0.03))
        .layer(Flatten::new(vec![2]))
        .layer(Dense::with_activation(2, ActivationFunction::Sigmoid))
        .layer(Dense::with_activation(1, ActivationFunction::Sigmoid))
        .build();
    model.compile(42)?;

    let inputs = vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ];
    let expected_outputs = vec![
        vec![1.0],
        vec![0.0],
        vec![1.0],
        vec![0.0],
    ];

    let views: Vec<NdArrayView<'_>> = inputs.iter().map(|input| NdArrayView::flat(input)).collect();
    let history = fit(&mut model, &views, &expected_outputs, &TrainConfig::new(10000).log_every(1000))?;
    if let Some(last) = history.last() {
        println!("Final loss: {:.6}", last.train_loss);
    }

    for input in &inputs {
        let output = model.execute(&NdArrayView::flat(input))?;
        println!("Input: {:?} -> Output: {:.4}", input, output.as_slice()[0]);
    }
    Ok(())
}
