use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Activation;

/// The activation-specific scalar a parameter group carries.
///
/// At most one of these is set per group, chosen by the network's
/// [`Activation`]; activations without a tunable constant get `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ActivationParam {
    #[default]
    None,
    /// Fixed leaky-ReLU slope, copied from the network config.
    LeakySlope(f64),
    /// Randomized leaky-ReLU slope drawn once per group.
    RandomSlope(f64),
    /// Fixed ELU alpha, copied from the network config.
    EluAlpha(f64),
}

impl ActivationParam {
    /// Seeds the scalar for `activation`. RReLU slopes are drawn from [-0.1, 0.1).
    pub fn seed<R: Rng + ?Sized>(
        activation: Activation,
        lrelu_slope: f64,
        elu_alpha: f64,
        rng: &mut R,
    ) -> ActivationParam {
        match activation {
            Activation::LeakyRelu => ActivationParam::LeakySlope(lrelu_slope),
            Activation::Rrelu => ActivationParam::RandomSlope(rng.gen::<f64>() / 5.0 - 0.1),
            Activation::Elu => ActivationParam::EluAlpha(elu_alpha),
            _ => ActivationParam::None,
        }
    }

    /// The scalar handed to [`Activation::function`]; 0 when unset.
    pub fn value(&self) -> f64 {
        match *self {
            ActivationParam::None => 0.0,
            ActivationParam::LeakySlope(v)
            | ActivationParam::RandomSlope(v)
            | ActivationParam::EluAlpha(v) => v,
        }
    }
}
