pub mod state;
pub mod update_fn;

pub use state::{CacheRule, OptimizerState, Slot};
pub use update_fn::{UpdateContext, UpdateFn};
