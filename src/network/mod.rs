pub mod config;
pub mod network;
pub mod registry;
pub mod spec;

pub use config::{NetConfig, WeightInit};
pub use network::{ErrorHistory, Example, Network};
pub use registry::{NetworkHandle, NetworkRegistry};
pub use spec::{LayerSpec, NetworkSpec};
