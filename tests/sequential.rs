use approx::assert_relative_eq;
use mia_nn::{
    fit, ActivationFunction, Dense, Flatten, Matrix, MseLoss, NdArrayView, Sequential, TrainConfig,
};

const SEED: u64 = 0;

fn sigmoid_net(hidden: usize) -> Sequential {
    let mut model = Sequential::builder()
        .layer(Flatten::new(vec![2]))
        .layer(Dense::with_activation(hidden, ActivationFunction::Sigmoid))
        .layer(Dense::with_activation(1, ActivationFunction::Sigmoid))
        .build();
    model.compile(SEED).unwrap();
    model
}

#[test]
fn compiled_dense_layers_match_their_neighbours() {
    let mut model = Sequential::builder()
        .layer(Flatten::new(vec![4, 3]))
        .layer(Dense::new(16))
        .layer(Dense::new(8))
        .layer(Dense::with_activation(2, ActivationFunction::Identity))
        .build();
    model.compile(SEED).unwrap();

    let layers = model.layers();
    assert_eq!(layers[0].num_neurons(), 12);
    for pair in layers.windows(2) {
        let (prev, layer) = (&pair[0], &pair[1]);
        assert_eq!(layer.weights().height(), layer.num_neurons());
        assert_eq!(layer.weights().width(), prev.num_neurons());
        assert_eq!(layer.biases().height(), layer.num_neurons());
        assert_eq!(layer.biases().width(), 1);
    }
}

#[test]
fn same_seed_compiles_identical_models() {
    let a = sigmoid_net(3);
    let b = sigmoid_net(3);
    for (x, y) in a.layers().iter().zip(b.layers()) {
        assert_eq!(x.weights(), y.weights());
        assert_eq!(x.biases(), y.biases());
    }
}

#[test]
fn execute_is_repeatable() {
    let mut model = sigmoid_net(2);
    let input = [0.25, 0.75];
    let first = model.execute(&NdArrayView::flat(&input)).unwrap();
    let second = model.execute(&NdArrayView::flat(&input)).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.height(), 1);
    assert!(first.as_slice()[0] > 0.0 && first.as_slice()[0] < 1.0);
}

#[test]
fn execute_matches_a_hand_computed_forward_pass() {
    let mut model = sigmoid_net(2);
    let input = [1.0, 0.5];
    let output = model.execute(&NdArrayView::flat(&input)).unwrap();

    let layers = model.layers();
    let sigmoid = ActivationFunction::Sigmoid;
    let hidden = Matrix::add(
        &Matrix::multiply(layers[1].weights(), &Matrix::column(&input)).unwrap(),
        layers[1].biases(),
    )
    .unwrap()
    .map(|x| sigmoid.function(x));
    let out = Matrix::add(
        &Matrix::multiply(layers[2].weights(), &hidden).unwrap(),
        layers[2].biases(),
    )
    .unwrap()
    .map(|x| sigmoid.function(x));

    assert_relative_eq!(output.as_slice()[0], out.as_slice()[0], epsilon = 1e-12);
}

#[test]
fn train_returns_the_forward_pass_error() {
    let mut model = sigmoid_net(2);
    let input = [1.0, 0.5];
    let before = model.execute(&NdArrayView::flat(&input)).unwrap();
    let mse = model.train(&NdArrayView::flat(&input), &[0.0]).unwrap();
    assert_relative_eq!(mse, MseLoss::loss(before.as_slice(), &[0.0]), epsilon = 1e-12);
}

#[test]
fn one_training_step_reduces_that_examples_error() {
    let mut model = sigmoid_net(2);
    let input = [1.0, 0.5];
    let expected = [0.0];

    let before = model.train(&NdArrayView::flat(&input), &expected).unwrap();
    let output = model.execute(&NdArrayView::flat(&input)).unwrap();
    let after = MseLoss::loss(output.as_slice(), &expected);
    assert!(after < before, "{after} should be below {before}");
}

#[test]
fn training_updates_every_trainable_layer() {
    let mut model = sigmoid_net(2);
    let initial: Vec<Matrix> = model.layers().iter().map(|l| l.weights().clone()).collect();

    model.train(&NdArrayView::flat(&[1.0, 1.0]), &[0.0]).unwrap();

    let layers = model.layers();
    assert!(layers[0].weights().is_empty());
    assert_ne!(layers[1].weights(), &initial[1]);
    assert_ne!(layers[2].weights(), &initial[2]);
    assert!(layers[1].state().momentum().weights.is_some());
    assert!(layers[0].state().momentum().weights.is_none());
}

#[test]
fn repeated_training_drives_error_down() {
    let mut model = sigmoid_net(3);
    let inputs = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
    let expected = vec![vec![0.9], vec![0.1]];

    let views: Vec<NdArrayView<'_>> = inputs.iter().map(|input| NdArrayView::flat(input)).collect();
    let history = fit(&mut model, &views, &expected, &TrainConfig::new(300)).unwrap();
    let first = history.first().unwrap().train_loss;
    let last = history.last().unwrap().train_loss;
    assert!(last < first, "{last} should be below {first}");
}

#[test]
fn recompiling_restores_seeded_parameters() {
    let mut model = sigmoid_net(2);
    let seeded = model.layers()[2].weights().clone();
    model.train(&NdArrayView::flat(&[1.0, 1.0]), &[0.0]).unwrap();
    assert_ne!(model.layers()[2].weights(), &seeded);

    model.compile(SEED).unwrap();
    assert_eq!(model.layers()[2].weights(), &seeded);
    assert!(model.layers()[2].state().momentum().weights.is_none());
}

#[test]
fn input_shape_must_match_the_flatten_layer() {
    let mut model = sigmoid_net(2);
    assert!(model.execute(&NdArrayView::flat(&[1.0, 2.0, 3.0])).is_err());
    let a = [1.0];
    let b = [2.0];
    assert!(model.execute(&NdArrayView::new(vec![&a[..], &b[..]])).is_err());
}

fn assert_all_close(actual: &Matrix, expected: &[f64]) {
    assert_eq!(actual.capacity(), expected.len());
    for (a, e) in actual.as_slice().iter().zip(expected) {
        assert_relative_eq!(*a, *e, epsilon = 1e-12);
    }
}

#[test]
fn train_hands_propagated_sensitivity_to_the_hidden_layer() {
    // 2 inputs -> 2 hidden -> 1 output, identity activations, default rates.
    let hidden = Dense::from_parameters(
        Matrix::from_rows(vec![vec![0.5, -0.5], vec![1.0, 0.25]]).unwrap(),
        Matrix::column(&[0.0, 0.5]),
        ActivationFunction::Identity,
    )
    .unwrap();
    let output = Dense::from_parameters(
        Matrix::from_rows(vec![vec![1.0, 2.0]]).unwrap(),
        Matrix::column(&[0.5]),
        ActivationFunction::Identity,
    )
    .unwrap();
    let mut model = Sequential::builder()
        .layer(Flatten::new(vec![2]))
        .layer(hidden)
        .layer(output)
        .build_with_parameters()
        .unwrap();

    // hidden = [-0.5, 2.0], output = 4.0
    let mse = model.train(&NdArrayView::flat(&[1.0, 2.0]), &[3.0]).unwrap();
    assert_relative_eq!(mse, 1.0, epsilon = 1e-12);

    // Output: delta = 2 * (4 - 3) = 2, weight gradient [-1, 4].
    let layers = model.layers();
    assert_all_close(layers[2].weights(), &[1.01, 1.96]);
    assert_all_close(layers[2].biases(), &[0.48]);

    // Hidden: receives [2 * 1 / 1, 2 * 2 / 1] = [2, 4] from the pre-update
    // output weights; weight gradient is [[2, 4], [4, 8]].
    assert_all_close(layers[1].weights(), &[0.48, -0.54, 0.96, 0.17]);
    assert_all_close(layers[1].biases(), &[-0.02, 0.46]);

    let momentum = layers[1].state().momentum();
    assert_all_close(momentum.weights.as_ref().unwrap(), &[0.02, 0.04, 0.04, 0.08]);
    assert_all_close(momentum.biases.as_ref().unwrap(), &[0.02, 0.04]);
}
