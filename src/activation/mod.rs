pub mod activation;
pub mod param;

pub use activation::Activation;
pub use param::ActivationParam;
