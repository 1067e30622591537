use serde::{Deserialize, Serialize};
use std::f64::consts::E;

/// Which activation function a network's neurons apply.
///
/// The variants that need a scalar (`LeakyRelu`, `Rrelu`, `Elu`) read it from
/// the neuron's own [`ActivationParam`](super::ActivationParam), seeded once at
/// layer init; the tag itself carries no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Sigmoid,
    Tanh,
    Relu,
    /// Leaky ReLU with a slope shared by the whole network.
    LeakyRelu,
    /// Randomized leaky ReLU: each neuron draws its own slope.
    Rrelu,
    Elu,
    /// LeCun's scaled tanh, 1.7159 · tanh(2x/3).
    Lecun,
    Identity,
}

impl Activation {
    /// Element-wise activation. `param` is the neuron's seeded scalar (0 when unused).
    pub fn function(&self, x: f64, param: f64) -> f64 {
        match self {
            Activation::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            Activation::Tanh => x.tanh(),
            Activation::Relu => if x > 0.0 { x } else { 0.0 },
            Activation::LeakyRelu | Activation::Rrelu => if x > 0.0 { x } else { param * x },
            Activation::Elu => if x >= 0.0 { x } else { param * (E.powf(x) - 1.0) },
            Activation::Lecun => 1.7159 * (2.0 * x / 3.0).tanh(),
            Activation::Identity => x,
        }
    }

    /// Element-wise derivative, taken at the pre-activation sum `x`.
    pub fn derivative(&self, x: f64, param: f64) -> f64 {
        match self {
            Activation::Sigmoid => {
                let fx = self.function(x, param);
                fx * (1.0 - fx)
            }
            Activation::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            Activation::Relu => if x > 0.0 { 1.0 } else { 0.0 },
            Activation::LeakyRelu | Activation::Rrelu => if x > 0.0 { 1.0 } else { param },
            Activation::Elu => {
                if x >= 0.0 { 1.0 } else { self.function(x, param) + param }
            }
            Activation::Lecun => {
                let t = (2.0 * x / 3.0).tanh();
                1.7159 * 2.0 / 3.0 * (1.0 - t * t)
            }
            Activation::Identity => 1.0,
        }
    }
}
