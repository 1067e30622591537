pub mod math;
pub mod activation;
pub mod error;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use math::volume::Volume;
pub use activation::{Activation, ActivationParam};
pub use error::{NetError, Result};
pub use layers::{DenseLayer, InitContext, Layer};
pub use network::{Example, NetConfig, Network, NetworkHandle, NetworkRegistry, NetworkSpec, WeightInit};
pub use loss::CostFunction;
pub use optim::{OptimizerState, UpdateContext, UpdateFn};
pub use train::{ConfusionMatrix, EarlyStopping, TrainSummary};
