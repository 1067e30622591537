use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NetError;

/// Weight update rule, chosen once when the network is built.
///
/// Also decodes the numeric selectors older model configs use
/// (`0` vanilla through `6` momentum); anything else is rejected
/// rather than silently leaving optimizer state unallocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateFn {
    #[default]
    Vanilla,
    Gain,
    Adagrad,
    Rmsprop,
    Adam,
    Adadelta,
    Momentum,
}

impl UpdateFn {
    pub const ALL: [UpdateFn; 7] = [
        UpdateFn::Vanilla,
        UpdateFn::Gain,
        UpdateFn::Adagrad,
        UpdateFn::Rmsprop,
        UpdateFn::Adam,
        UpdateFn::Adadelta,
        UpdateFn::Momentum,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            UpdateFn::Vanilla => "vanilla",
            UpdateFn::Gain => "gain",
            UpdateFn::Adagrad => "adagrad",
            UpdateFn::Rmsprop => "rmsprop",
            UpdateFn::Adam => "adam",
            UpdateFn::Adadelta => "adadelta",
            UpdateFn::Momentum => "momentum",
        }
    }
}

impl TryFrom<u8> for UpdateFn {
    type Error = NetError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        UpdateFn::ALL
            .get(index as usize)
            .copied()
            .ok_or_else(|| NetError::UnknownUpdateFn(index.to_string()))
    }
}

impl FromStr for UpdateFn {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        UpdateFn::ALL
            .iter()
            .copied()
            .find(|f| f.name() == lower)
            .ok_or_else(|| NetError::UnknownUpdateFn(s.to_string()))
    }
}

impl fmt::Display for UpdateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hyperparameters an update rule reads when deltas are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateContext {
    pub learning_rate: f64,
    pub rms_decay: f64,
    pub rho: f64,
    pub momentum: f64,
    pub adam_beta1: f64,
    pub adam_beta2: f64,
    /// Network iteration counter; drives Adam's bias correction.
    pub iterations: u64,
}
