pub mod confusion;
pub mod early_stopping;
pub mod evaluate;
pub mod loop_fn;
pub mod summary;

pub use confusion::{classify, Classification, ConfusionMatrix};
pub use early_stopping::{EarlyStopping, EarlyStoppingState, StopDecision};
pub use summary::TrainSummary;
