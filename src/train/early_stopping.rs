use serde::{Deserialize, Serialize};

use crate::error::{NetError, Result};

/// Early-stopping policy, fixed when the network is configured.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EarlyStopping {
    #[default]
    Disabled,
    /// Stop once the validation error is at or below `threshold`.
    Threshold { threshold: f64 },
    /// Stop after `patience` validation checks in a row without improvement.
    Patience { patience: usize },
    /// Stop once the validation error exceeds the best seen by more than `percent`%.
    Divergence { percent: f64 },
}

impl EarlyStopping {
    pub fn validate(&self) -> Result<()> {
        match *self {
            EarlyStopping::Disabled => Ok(()),
            EarlyStopping::Threshold { threshold } if !threshold.is_finite() => Err(
                NetError::InvalidConfig(format!("early stopping threshold must be finite, got {threshold}")),
            ),
            EarlyStopping::Patience { patience: 0 } => Err(NetError::InvalidConfig(
                "early stopping patience must be at least 1".to_string(),
            )),
            EarlyStopping::Divergence { percent } if !(percent.is_finite() && percent >= 0.0) => Err(
                NetError::InvalidConfig(format!("early stopping percent must be >= 0, got {percent}")),
            ),
            _ => Ok(()),
        }
    }
}

/// What the training loop must do after a validation checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    Continue,
    /// A new best validation error: snapshot every layer, keep training.
    BackUp,
    /// Halt. With `final_step` the pending example's gradient is still
    /// back-propagated and applied before the loop exits.
    Stop { final_step: bool },
}

/// Runtime side of [`EarlyStopping`]: the best error so far and the
/// patience counter.
#[derive(Debug, Clone, PartialEq)]
pub struct EarlyStoppingState {
    policy: EarlyStopping,
    best_error: f64,
    patience_counter: usize,
}

impl EarlyStoppingState {
    pub fn new(policy: EarlyStopping) -> Self {
        EarlyStoppingState {
            policy,
            best_error: f64::INFINITY,
            patience_counter: 0,
        }
    }

    pub fn policy(&self) -> EarlyStopping {
        self.policy
    }

    pub fn is_enabled(&self) -> bool {
        self.policy != EarlyStopping::Disabled
    }

    /// Lowest validation error seen so far (`inf` before the first check).
    pub fn best_error(&self) -> f64 {
        self.best_error
    }

    pub fn patience_counter(&self) -> usize {
        self.patience_counter
    }

    pub fn check(&mut self, last_error: f64) -> StopDecision {
        match self.policy {
            EarlyStopping::Disabled => StopDecision::Continue,
            EarlyStopping::Threshold { threshold } => {
                if last_error <= threshold {
                    StopDecision::Stop { final_step: true }
                } else {
                    StopDecision::Continue
                }
            }
            EarlyStopping::Patience { patience } => {
                if last_error < self.best_error {
                    self.patience_counter = 0;
                    self.best_error = last_error;
                    StopDecision::BackUp
                } else {
                    self.patience_counter += 1;
                    if self.patience_counter >= patience {
                        StopDecision::Stop { final_step: false }
                    } else {
                        StopDecision::Continue
                    }
                }
            }
            EarlyStopping::Divergence { percent } => {
                if last_error < self.best_error {
                    self.best_error = last_error;
                    StopDecision::BackUp
                } else if last_error / self.best_error >= 1.0 + percent / 100.0 {
                    StopDecision::Stop { final_step: false }
                } else {
                    StopDecision::Continue
                }
            }
        }
    }
}
