use rand::rngs::StdRng;

use crate::activation::Activation;
use crate::error::Result;
use crate::network::config::WeightInit;
use crate::optim::{UpdateContext, UpdateFn};

/// What a layer needs to know from its network when it is initialised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitContext {
    pub update_fn: UpdateFn,
    pub activation: Activation,
    pub weight_init: WeightInit,
    pub lrelu_slope: f64,
    pub elu_alpha: f64,
}

/// One link of a network's layer chain.
///
/// Layers never hold references to their neighbours. The network owns them
/// in order and lends the previous (and, going backwards, the next) layer
/// for the duration of each call.
///
/// Layer 0 is the input layer: it only ever has its activations assigned,
/// and is never run forward or backward.
pub trait Layer: Send {
    /// Number of units.
    fn size(&self) -> usize;

    /// Size of the previous layer, `None` for the input layer.
    fn fan_in(&self) -> Option<usize>;

    /// Size of the next layer, `None` for the output layer.
    fn fan_out(&self) -> Option<usize>;

    fn set_fans(&mut self, fan_in: Option<usize>, fan_out: Option<usize>);

    /// Allocates parameters and optimizer state. Called once, after the fans
    /// are set, with the layer's position in the chain.
    fn init(&mut self, index: usize, ctx: &InitContext, rng: &mut StdRng) -> Result<()>;

    fn actvns(&self) -> &[f64];

    /// Copies `input` into the activation buffer.
    fn set_actvns(&mut self, input: &[f64]);

    fn errs(&self) -> &[f64];

    fn errs_mut(&mut self) -> &mut [f64];

    fn forward(&mut self, prev: &dyn Layer);

    /// Accumulates parameter deltas. When `is_output` is set the error buffer
    /// has already been filled by the caller; otherwise it is pulled from
    /// `next` through [`Layer::error_for_input`].
    fn backward(&mut self, is_output: bool, prev: &dyn Layer, next: Option<&dyn Layer>);

    /// Error this layer sends back to unit `unit` of the previous layer.
    fn error_for_input(&self, unit: usize) -> f64;

    fn apply_delta_weights(&mut self, ctx: &UpdateContext);

    fn reset_delta_weights(&mut self);

    /// Snapshots the current parameters as the best validation state.
    fn back_up_validation(&mut self);

    /// Reverts to the last snapshot, if any.
    fn restore_validation(&mut self);
}
