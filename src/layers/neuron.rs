use rand::Rng;

use crate::activation::ActivationParam;
use crate::layers::layer::InitContext;
use crate::math::volume::Volume;
use crate::network::config::WeightInit;
use crate::optim::{OptimizerState, Slot, UpdateContext};

/// A dense unit: one bias, one weight per input, their accumulated deltas,
/// and the optimizer state that trains them.
#[derive(Debug, Clone)]
pub struct Neuron {
    pub bias: f64,
    pub weights: Volume,
    pub delta_bias: f64,
    pub delta_weights: Volume,
    pub optimizer: OptimizerState,
    pub activation_param: ActivationParam,
    /// Best-validation snapshot of (bias, weights).
    validation: Option<(f64, Volume)>,
}

impl Neuron {
    pub fn new<R: Rng + ?Sized>(fan_in: usize, ctx: &InitContext, rng: &mut R) -> Neuron {
        let weights = match ctx.weight_init {
            WeightInit::Uniform => Volume::uniform(1, 1, fan_in, rng),
            WeightInit::Xavier => Volume::normal(1, 1, fan_in, (1.0 / fan_in as f64).sqrt(), rng),
            WeightInit::He => Volume::normal(1, 1, fan_in, (2.0 / fan_in as f64).sqrt(), rng),
        };

        Neuron {
            bias: 0.0,
            weights,
            delta_bias: 0.0,
            delta_weights: Volume::zeros(1, 1, fan_in),
            optimizer: OptimizerState::new(ctx.update_fn, 1, 1, fan_in),
            activation_param: ActivationParam::seed(ctx.activation, ctx.lrelu_slope, ctx.elu_alpha, rng),
            validation: None,
        }
    }

    pub fn apply_deltas(&mut self, ctx: &UpdateContext) {
        self.bias = self.optimizer.step(Slot::Bias, self.bias, self.delta_bias, ctx);
        for w in 0..self.weights.len() {
            self.weights[w] = self.optimizer.step(Slot::Weight(w), self.weights[w], self.delta_weights[w], ctx);
        }
    }

    pub fn reset_deltas(&mut self) {
        self.delta_bias = 0.0;
        self.delta_weights.fill(0.0);
    }

    pub fn back_up(&mut self) {
        match &mut self.validation {
            Some((bias, weights)) => {
                *bias = self.bias;
                weights.copy_from(&self.weights);
            }
            None => self.validation = Some((self.bias, self.weights.clone())),
        }
    }

    pub fn restore(&mut self) {
        if let Some((bias, weights)) = &self.validation {
            self.bias = *bias;
            self.weights.copy_from(weights);
        }
    }

    pub fn has_backup(&self) -> bool {
        self.validation.is_some()
    }
}
