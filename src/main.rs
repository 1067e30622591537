use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

use ferrite_net::{
    Activation, EarlyStopping, Example, NetConfig, NetworkRegistry, NetworkSpec, UpdateFn,
};

/// Points in the unit square, labelled by whether they fall inside a circle.
fn circle_set(n: usize, rng: &mut StdRng) -> Vec<Example> {
    (0..n)
        .map(|_| {
            let (x, y) = (rng.gen::<f64>(), rng.gen::<f64>());
            let inside = (x - 0.5).powi(2) + (y - 0.5).powi(2) < 0.09;
            let target = if inside { vec![1.0, 0.0] } else { vec![0.0, 1.0] };
            (vec![x, y], target)
        })
        .collect()
}

fn main() -> ferrite_net::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = NetConfig {
        learning_rate: 0.01,
        update_fn: UpdateFn::Adam,
        activation: Activation::Tanh,
        mini_batch_size: 4,
        validation_interval: 200,
        early_stopping: EarlyStopping::Patience { patience: 5 },
        seed: Some(2024),
        ..NetConfig::default()
    };
    let spec = NetworkSpec::new("circle", &[2, 8, 2]).with_config(config);

    let mut rng = StdRng::seed_from_u64(7);
    let mut registry = NetworkRegistry::new();
    let handle = registry.create(&spec)?;

    let network = registry.get_mut(handle)?;
    network.set_training_data(circle_set(4000, &mut rng));
    network.set_validation_data(circle_set(200, &mut rng));
    network.set_test_data(circle_set(500, &mut rng));

    let summary = network.train(4000, 0)?;
    if network.has_validation_backup() {
        network.restore_validation();
    }
    let test_error = network.test(500, 0)?;

    println!("network {handle}: {} iterations, mean error {:.4}", summary.iterations_run, summary.mean_error);
    println!("\ntraining\n{}", network.training_confusion());
    println!("\nvalidation\n{}", network.validation_confusion());
    println!("\ntest (error {test_error:.4})\n{}", network.test_confusion());

    registry.remove(handle)?;
    Ok(())
}
