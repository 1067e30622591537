use thiserror::Error;

use crate::network::registry::NetworkHandle;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NetError>;

/// Everything the engine can report back to a caller.
#[derive(Debug, Error)]
pub enum NetError {
    /// An optimizer selector (numeric index or name) that maps to no update rule.
    #[error("unknown update function: {0}")]
    UnknownUpdateFn(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The handle was never issued, or its network has since been removed.
    #[error("no network for handle {0}")]
    NotFound(NetworkHandle),

    /// A `[start, start + its)` window that does not fit inside a dataset.
    #[error("{dataset} set has {len} examples, cannot run {its} iterations from index {start}")]
    OutOfBounds {
        dataset: &'static str,
        start: usize,
        its: usize,
        len: usize,
    },

    #[error("{what}: expected length {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{0} set is empty")]
    EmptyDataset(&'static str),

    #[error("layers have not been joined")]
    NotJoined,

    /// A network needs at least an input and an output layer.
    #[error("a network needs at least 2 layers, got {0}")]
    TooFewLayers(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
