use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::error::{NetError, Result};
use crate::layers::layer::InitContext;
use crate::loss::CostFunction;
use crate::optim::{UpdateContext, UpdateFn};
use crate::train::early_stopping::EarlyStopping;

/// How weights are drawn when a layer is initialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightInit {
    /// Uniform in [-1, 1).
    Uniform,
    /// N(0, sqrt(1 / fan_in)). Suits sigmoid/tanh.
    #[default]
    Xavier,
    /// N(0, sqrt(2 / fan_in)). Suits the ReLU family.
    He,
}

/// Network-wide hyperparameters.
///
/// Every field has a default, so a JSON config only needs the fields it
/// changes:
///
/// ```json
/// { "update_fn": "adam", "mini_batch_size": 8,
///   "validation_interval": 50,
///   "early_stopping": { "type": "patience", "patience": 5 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    pub learning_rate: f64,
    pub update_fn: UpdateFn,
    pub activation: Activation,
    pub cost: CostFunction,
    pub weight_init: WeightInit,
    pub lrelu_slope: f64,
    pub elu_alpha: f64,
    /// RMSProp decay.
    pub rms_decay: f64,
    /// Adadelta decay.
    pub rho: f64,
    pub momentum: f64,
    pub adam_beta1: f64,
    pub adam_beta2: f64,
    /// Iterations per weight update; `1` for online learning.
    pub mini_batch_size: usize,
    /// Validate every this many training iterations; `0` never validates.
    pub validation_interval: usize,
    pub early_stopping: EarlyStopping,
    /// Keep per-iteration error histories.
    pub collect_errors: bool,
    /// Seed for weight init and random slopes; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for NetConfig {
    fn default() -> Self {
        NetConfig {
            learning_rate: 0.2,
            update_fn: UpdateFn::Vanilla,
            activation: Activation::Sigmoid,
            cost: CostFunction::MeanSquaredError,
            weight_init: WeightInit::Xavier,
            lrelu_slope: -0.0005,
            elu_alpha: 1.0,
            rms_decay: 0.99,
            rho: 0.95,
            momentum: 0.9,
            adam_beta1: 0.9,
            adam_beta2: 0.999,
            mini_batch_size: 1,
            validation_interval: 0,
            early_stopping: EarlyStopping::Disabled,
            collect_errors: false,
            seed: None,
        }
    }
}

impl NetConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(NetError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.mini_batch_size == 0 {
            return Err(NetError::InvalidConfig("mini_batch_size must be at least 1".to_string()));
        }

        let decays = [
            ("rms_decay", self.rms_decay),
            ("rho", self.rho),
            ("momentum", self.momentum),
            ("adam_beta1", self.adam_beta1),
            ("adam_beta2", self.adam_beta2),
        ];
        for (name, value) in decays {
            if !(0.0..1.0).contains(&value) {
                return Err(NetError::InvalidConfig(format!("{name} must be in [0, 1), got {value}")));
            }
        }

        if self.early_stopping != EarlyStopping::Disabled && self.validation_interval == 0 {
            return Err(NetError::InvalidConfig(
                "early stopping needs a non-zero validation_interval".to_string(),
            ));
        }
        self.early_stopping.validate()
    }

    pub fn init_context(&self) -> InitContext {
        InitContext {
            update_fn: self.update_fn,
            activation: self.activation,
            weight_init: self.weight_init,
            lrelu_slope: self.lrelu_slope,
            elu_alpha: self.elu_alpha,
        }
    }

    pub fn update_context(&self, iterations: u64) -> UpdateContext {
        UpdateContext {
            learning_rate: self.learning_rate,
            rms_decay: self.rms_decay,
            rho: self.rho,
            momentum: self.momentum,
            adam_beta1: self.adam_beta1,
            adam_beta2: self.adam_beta2,
            iterations,
        }
    }
}
