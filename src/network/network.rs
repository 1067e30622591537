use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NetError, Result};
use crate::layers::dense::DenseLayer;
use crate::layers::layer::Layer;
use crate::network::config::NetConfig;
use crate::network::spec::NetworkSpec;
use crate::train::confusion::{classify, Classification, ConfusionMatrix};
use crate::train::early_stopping::EarlyStoppingState;

/// One (input vector, one-hot target vector) pair.
pub type Example = (Vec<f64>, Vec<f64>);

/// Per-example costs, kept when `collect_errors` is on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorHistory {
    pub training: Vec<f64>,
    /// One entry per validation checkpoint (the mean over the validation set).
    pub validation: Vec<f64>,
    pub test: Vec<f64>,
}

/// A trainable network: an ordered chain of layers plus everything a
/// training run tracks about it.
///
/// Build it with [`Network::new`] + [`Network::add_layer`] +
/// [`Network::join_layers`], or in one go with [`Network::from_spec`].
pub struct Network {
    config: NetConfig,
    layers: Vec<Box<dyn Layer>>,
    joined: bool,
    rng: StdRng,
    pub(crate) iterations: u64,
    pub(crate) validations: u64,
    pub(crate) training_data: Vec<Example>,
    pub(crate) validation_data: Vec<Example>,
    pub(crate) test_data: Vec<Example>,
    pub(crate) training_confusion: ConfusionMatrix,
    pub(crate) validation_confusion: ConfusionMatrix,
    pub(crate) test_confusion: ConfusionMatrix,
    pub(crate) errors: ErrorHistory,
    pub(crate) early_stopping: EarlyStoppingState,
    pub(crate) error: f64,
    pub(crate) last_validation_error: Option<f64>,
    pub(crate) is_training: bool,
    pub(crate) stopped_early: bool,
    backed_up: bool,
}

impl Network {
    /// An empty network. Fails if `config` does not validate.
    pub fn new(config: NetConfig) -> Result<Network> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let early_stopping = EarlyStoppingState::new(config.early_stopping);

        Ok(Network {
            config,
            layers: Vec::new(),
            joined: false,
            rng,
            iterations: 0,
            validations: 0,
            training_data: Vec::new(),
            validation_data: Vec::new(),
            test_data: Vec::new(),
            training_confusion: ConfusionMatrix::new(0),
            validation_confusion: ConfusionMatrix::new(0),
            test_confusion: ConfusionMatrix::new(0),
            errors: ErrorHistory::default(),
            early_stopping,
            error: 0.0,
            last_validation_error: None,
            is_training: false,
            stopped_early: false,
            backed_up: false,
        })
    }

    /// Builds and joins a chain of dense layers.
    pub fn from_spec(spec: &NetworkSpec) -> Result<Network> {
        let mut network = Network::new(spec.config.clone())?;
        for layer in &spec.layers {
            network.add_layer(Box::new(DenseLayer::new(layer.size)));
        }
        network.join_layers()?;
        Ok(network)
    }

    /// Appends a layer. The chain has to be joined again before use.
    pub fn add_layer(&mut self, layer: Box<dyn Layer>) {
        self.layers.push(layer);
        self.joined = false;
    }

    /// Wires fan-in/fan-out, initialises every layer in order and sizes the
    /// confusion matrices to the output layer.
    pub fn join_layers(&mut self) -> Result<()> {
        let n = self.layers.len();
        if n < 2 {
            return Err(NetError::TooFewLayers(n));
        }
        if let Some(l) = self.layers.iter().position(|layer| layer.size() == 0) {
            return Err(NetError::InvalidConfig(format!("layer {l} has no units")));
        }

        let ctx = self.config.init_context();
        for l in 0..n {
            let fan_in = if l > 0 { Some(self.layers[l - 1].size()) } else { None };
            let fan_out = if l + 1 < n { Some(self.layers[l + 1].size()) } else { None };
            self.layers[l].set_fans(fan_in, fan_out);
            self.layers[l].init(l, &ctx, &mut self.rng)?;
        }

        let classes = self.layers[n - 1].size();
        self.training_confusion = ConfusionMatrix::new(classes);
        self.validation_confusion = ConfusionMatrix::new(classes);
        self.test_confusion = ConfusionMatrix::new(classes);
        self.joined = true;

        debug!("Joined {} layers, {} output classes", n, classes);
        Ok(())
    }

    /// Runs `input` through the chain and returns a copy of the output
    /// layer's activations.
    pub fn forward(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        self.ensure_joined()?;
        let expected = self.layers[0].size();
        if input.len() != expected {
            return Err(NetError::ShapeMismatch { what: "input", expected, actual: input.len() });
        }

        self.layers[0].set_actvns(input);
        for l in 1..self.layers.len() {
            let (before, rest) = self.layers.split_at_mut(l);
            rest[0].forward(&*before[l - 1]);
        }

        Ok(self.output_layer().actvns().to_vec())
    }

    /// Back-propagates the output layer's error buffer, output layer first,
    /// down to layer 1. The input layer never runs backward.
    pub fn backward(&mut self) -> Result<()> {
        self.ensure_joined()?;
        let last = self.layers.len() - 1;
        self.backward_layer(last, true);
        for l in (1..last).rev() {
            self.backward_layer(l, false);
        }
        Ok(())
    }

    fn backward_layer(&mut self, l: usize, is_output: bool) {
        let (before, rest) = self.layers.split_at_mut(l);
        if let Some((current, after)) = rest.split_first_mut() {
            let next = after.first().map(|layer| &**layer);
            current.backward(is_output, &*before[l - 1], next);
        }
    }

    pub fn apply_delta_weights(&mut self) {
        let ctx = self.config.update_context(self.iterations);
        for layer in self.layers.iter_mut().skip(1) {
            layer.apply_delta_weights(&ctx);
        }
    }

    pub fn reset_delta_weights(&mut self) {
        for layer in self.layers.iter_mut().skip(1) {
            layer.reset_delta_weights();
        }
    }

    pub fn back_up_validation(&mut self) {
        for layer in self.layers.iter_mut().skip(1) {
            layer.back_up_validation();
        }
        self.backed_up = true;
    }

    pub fn has_validation_backup(&self) -> bool {
        self.backed_up
    }

    /// Runs one example forward and reads its classes. Checks that the
    /// target matches the output layer.
    pub(crate) fn evaluate_example(&mut self, example: &Example) -> Result<(Vec<f64>, Classification)> {
        let (input, target) = example;
        let output = self.forward(input)?;
        if target.len() != output.len() {
            return Err(NetError::ShapeMismatch {
                what: "target",
                expected: output.len(),
                actual: target.len(),
            });
        }
        let classification = classify(&output, target);
        Ok((output, classification))
    }

    pub(crate) fn output_layer(&self) -> &dyn Layer {
        &*self.layers[self.layers.len() - 1]
    }

    pub(crate) fn output_layer_mut(&mut self) -> &mut dyn Layer {
        let last = self.layers.len() - 1;
        &mut *self.layers[last]
    }

    pub(crate) fn ensure_joined(&self) -> Result<()> {
        if self.joined {
            Ok(())
        } else {
            Err(NetError::NotJoined)
        }
    }

    pub fn set_training_data(&mut self, data: Vec<Example>) {
        self.training_data = data;
    }

    pub fn set_validation_data(&mut self, data: Vec<Example>) {
        self.validation_data = data;
    }

    pub fn set_test_data(&mut self, data: Vec<Example>) {
        self.test_data = data;
    }

    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Box<dyn Layer>] {
        &mut self.layers
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    /// Training iterations run over the network's lifetime.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Validation examples evaluated over the network's lifetime.
    pub fn validations(&self) -> u64 {
        self.validations
    }

    /// Mean training error of the last `train` call.
    pub fn error(&self) -> f64 {
        self.error
    }

    pub fn last_validation_error(&self) -> Option<f64> {
        self.last_validation_error
    }

    pub fn is_training(&self) -> bool {
        self.is_training
    }

    pub fn stopped_early(&self) -> bool {
        self.stopped_early
    }

    pub fn early_stopping(&self) -> &EarlyStoppingState {
        &self.early_stopping
    }

    pub fn training_confusion(&self) -> &ConfusionMatrix {
        &self.training_confusion
    }

    pub fn validation_confusion(&self) -> &ConfusionMatrix {
        &self.validation_confusion
    }

    pub fn test_confusion(&self) -> &ConfusionMatrix {
        &self.test_confusion
    }

    pub fn errors(&self) -> &ErrorHistory {
        &self.errors
    }
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("layers", &self.layers.iter().map(|l| l.size()).collect::<Vec<_>>())
            .field("joined", &self.joined)
            .field("iterations", &self.iterations)
            .field("error", &self.error)
            .finish()
    }
}
