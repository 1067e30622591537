use serde::{Deserialize, Serialize};

/// What one `train` call did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSummary {
    /// Training set index the run started from.
    pub start: usize,
    /// Iterations asked for.
    pub requested: usize,
    /// Iterations whose cost was accumulated. Smaller than `requested` when
    /// the run stopped early; the iteration that triggered the stop is not
    /// counted.
    pub iterations_run: usize,
    /// Mean cost over `iterations_run`.
    pub mean_error: f64,
    pub stopped_early: bool,
    /// Mean validation error at the last checkpoint of this run, if any.
    pub last_validation_error: Option<f64>,
    /// Wall-clock duration of the run in milliseconds.
    pub elapsed_ms: u64,
}
