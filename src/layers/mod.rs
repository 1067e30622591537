pub mod dense;
pub mod layer;
pub mod neuron;

pub use dense::DenseLayer;
pub use layer::{InitContext, Layer};
pub use neuron::Neuron;
