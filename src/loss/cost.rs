use serde::{Deserialize, Serialize};

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-15;

/// Scalar cost of one example, reported per iteration and averaged by the
/// training loop and the evaluator.
///
/// All variants take `(target, output)` in that order. The training error
/// signal itself is always `target - output`; the cost only feeds the
/// reported error and early-stopping decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostFunction {
    #[default]
    MeanSquaredError,
    RootMeanSquaredError,
    /// Categorical cross-entropy; expects outputs in (0, 1].
    CrossEntropy,
    /// Euclidean distance between target and output.
    VectorDistance,
}

impl CostFunction {
    pub fn cost(&self, target: &[f64], output: &[f64]) -> f64 {
        match self {
            CostFunction::MeanSquaredError => mean_squared_error(target, output),
            CostFunction::RootMeanSquaredError => mean_squared_error(target, output).sqrt(),
            CostFunction::CrossEntropy => cross_entropy(target, output),
            CostFunction::VectorDistance => squared_distance(target, output).sqrt(),
        }
    }
}

/// mean((target - output)²)
fn mean_squared_error(target: &[f64], output: &[f64]) -> f64 {
    if target.is_empty() {
        return 0.0;
    }
    squared_distance(target, output) / target.len() as f64
}

/// -sum(target · ln(output + ε))
fn cross_entropy(target: &[f64], output: &[f64]) -> f64 {
    target.iter().zip(output.iter())
        .map(|(t, o)| -t * (o + EPS).ln())
        .sum()
}

fn squared_distance(target: &[f64], output: &[f64]) -> f64 {
    target.iter().zip(output.iter())
        .map(|(t, o)| (t - o).powi(2))
        .sum()
}
