use crate::math::volume::Volume;
use crate::optim::update_fn::{UpdateContext, UpdateFn};

/// Rules that share the single-cache layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheRule {
    Adagrad,
    Rmsprop,
    Momentum,
}

/// Which parameter of a group an update targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Bias,
    /// Flat index into the group's weight volume.
    Weight(usize),
}

/// Auxiliary storage an update rule keeps for one parameter group
/// (a neuron's bias and weights, or a filter's).
///
/// Built once from the network's [`UpdateFn`] and shaped like the group's
/// weights; the variant never changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizerState {
    /// Plain gradient step, nothing to keep.
    Vanilla,
    /// Multiplicative gains, starting at 1.
    Gain { bias_gain: f64, weight_gain: Volume },
    Cache {
        rule: CacheRule,
        bias_cache: f64,
        weights_cache: Volume,
    },
    /// Adadelta: squared-gradient cache plus squared-update accumulator.
    DualCache {
        bias_cache: f64,
        weights_cache: Volume,
        adadelta_bias_cache: f64,
        adadelta_cache: Volume,
    },
    /// Adam: scalar moments for the bias. The weight moments are only
    /// allocated the first time a weight is updated.
    Moments {
        m: f64,
        v: f64,
        shape: (usize, usize, usize),
        weights_m: Option<Volume>,
        weights_v: Option<Volume>,
    },
}

impl OptimizerState {
    pub fn new(update_fn: UpdateFn, channels: usize, rows: usize, cols: usize) -> OptimizerState {
        match update_fn {
            UpdateFn::Vanilla => OptimizerState::Vanilla,
            UpdateFn::Gain => OptimizerState::Gain {
                bias_gain: 1.0,
                weight_gain: Volume::filled(channels, rows, cols, 1.0),
            },
            UpdateFn::Adagrad | UpdateFn::Rmsprop | UpdateFn::Momentum => OptimizerState::Cache {
                rule: match update_fn {
                    UpdateFn::Rmsprop => CacheRule::Rmsprop,
                    UpdateFn::Momentum => CacheRule::Momentum,
                    _ => CacheRule::Adagrad,
                },
                bias_cache: 0.0,
                weights_cache: Volume::zeros(channels, rows, cols),
            },
            UpdateFn::Adadelta => OptimizerState::DualCache {
                bias_cache: 0.0,
                weights_cache: Volume::zeros(channels, rows, cols),
                adadelta_bias_cache: 0.0,
                adadelta_cache: Volume::zeros(channels, rows, cols),
            },
            UpdateFn::Adam => OptimizerState::Moments {
                m: 0.0,
                v: 0.0,
                shape: (channels, rows, cols),
                weights_m: None,
                weights_v: None,
            },
        }
    }

    /// The rule this state was built for.
    pub fn update_fn(&self) -> UpdateFn {
        match self {
            OptimizerState::Vanilla => UpdateFn::Vanilla,
            OptimizerState::Gain { .. } => UpdateFn::Gain,
            OptimizerState::Cache { rule: CacheRule::Adagrad, .. } => UpdateFn::Adagrad,
            OptimizerState::Cache { rule: CacheRule::Rmsprop, .. } => UpdateFn::Rmsprop,
            OptimizerState::Cache { rule: CacheRule::Momentum, .. } => UpdateFn::Momentum,
            OptimizerState::DualCache { .. } => UpdateFn::Adadelta,
            OptimizerState::Moments { .. } => UpdateFn::Adam,
        }
    }

    /// Returns the updated value of the parameter in `slot`, given its
    /// current `value` and accumulated `delta` (target - output direction).
    pub fn step(&mut self, slot: Slot, value: f64, delta: f64, ctx: &UpdateContext) -> f64 {
        let lr = ctx.learning_rate;
        match self {
            OptimizerState::Vanilla => value + lr * delta,
            OptimizerState::Gain { bias_gain, weight_gain } => {
                gain(value, delta, pick(slot, bias_gain, weight_gain), lr)
            }
            OptimizerState::Cache { rule, bias_cache, weights_cache } => {
                let cache = pick(slot, bias_cache, weights_cache);
                match rule {
                    CacheRule::Adagrad => adagrad(value, delta, cache, lr),
                    CacheRule::Rmsprop => rmsprop(value, delta, cache, lr, ctx.rms_decay),
                    CacheRule::Momentum => momentum(value, delta, cache, lr, ctx.momentum),
                }
            }
            OptimizerState::DualCache { bias_cache, weights_cache, adadelta_bias_cache, adadelta_cache } => {
                let cache = pick(slot, bias_cache, weights_cache);
                let acc = pick(slot, adadelta_bias_cache, adadelta_cache);
                adadelta(value, delta, cache, acc, ctx.rho)
            }
            OptimizerState::Moments { m, v, shape, weights_m, weights_v } => match slot {
                Slot::Bias => adam(value, delta, m, v, ctx),
                Slot::Weight(i) => {
                    let (c, r, w) = *shape;
                    let wm = weights_m.get_or_insert_with(|| Volume::zeros(c, r, w));
                    let wv = weights_v.get_or_insert_with(|| Volume::zeros(c, r, w));
                    adam(value, delta, &mut wm[i], &mut wv[i], ctx)
                }
            },
        }
    }
}

fn pick<'a>(slot: Slot, scalar: &'a mut f64, tensor: &'a mut Volume) -> &'a mut f64 {
    match slot {
        Slot::Bias => scalar,
        Slot::Weight(i) => &mut tensor[i],
    }
}

fn gain(value: f64, delta: f64, g: &mut f64, lr: f64) -> f64 {
    let new_value = value + lr * delta * *g;
    if (new_value <= 0.0 && value > 0.0) || (new_value >= 0.0 && value < 0.0) {
        *g = (*g * 0.95).max(0.5);
    } else {
        *g = (*g + 0.05).min(5.0);
    }
    new_value
}

fn adagrad(value: f64, delta: f64, cache: &mut f64, lr: f64) -> f64 {
    *cache += delta.powi(2);
    value + lr * delta / (cache.sqrt() + 1e-6)
}

fn rmsprop(value: f64, delta: f64, cache: &mut f64, lr: f64, decay: f64) -> f64 {
    *cache = decay * *cache + (1.0 - decay) * delta.powi(2);
    value + lr * delta / (*cache + 1e-6).sqrt()
}

fn momentum(value: f64, delta: f64, velocity: &mut f64, lr: f64, mu: f64) -> f64 {
    *velocity = mu * *velocity + lr * delta;
    value + *velocity
}

fn adadelta(value: f64, delta: f64, cache: &mut f64, acc: &mut f64, rho: f64) -> f64 {
    *cache = rho * *cache + (1.0 - rho) * delta.powi(2);
    let step = (*acc + 1e-6).sqrt() / (*cache + 1e-6).sqrt() * delta;
    *acc = rho * *acc + (1.0 - rho) * step.powi(2);
    value + step
}

fn adam(value: f64, delta: f64, m: &mut f64, v: &mut f64, ctx: &UpdateContext) -> f64 {
    let t = (ctx.iterations + 1) as f64;
    *m = ctx.adam_beta1 * *m + (1.0 - ctx.adam_beta1) * delta;
    *v = ctx.adam_beta2 * *v + (1.0 - ctx.adam_beta2) * delta.powi(2);
    let m_hat = *m / (1.0 - ctx.adam_beta1.powf(t));
    let v_hat = *v / (1.0 - ctx.adam_beta2.powf(t));
    value + ctx.learning_rate * m_hat / (v_hat.sqrt() + 1e-8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ctx() -> UpdateContext {
        UpdateContext {
            learning_rate: 0.1,
            rms_decay: 0.99,
            rho: 0.95,
            momentum: 0.9,
            adam_beta1: 0.9,
            adam_beta2: 0.999,
            iterations: 0,
        }
    }

    #[test]
    fn gain_state_starts_at_one() {
        match OptimizerState::new(UpdateFn::Gain, 2, 3, 3) {
            OptimizerState::Gain { bias_gain, weight_gain } => {
                assert_eq!(bias_gain, 1.0);
                assert_eq!(weight_gain.shape(), (2, 3, 3));
                assert!(weight_gain.as_slice().iter().all(|&g| g == 1.0));
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn cache_rules_share_a_zeroed_layout() {
        for f in [UpdateFn::Adagrad, UpdateFn::Rmsprop, UpdateFn::Momentum] {
            match OptimizerState::new(f, 1, 2, 5) {
                OptimizerState::Cache { bias_cache, weights_cache, .. } => {
                    assert_eq!(bias_cache, 0.0);
                    assert_eq!(weights_cache.len(), 10);
                    assert!(weights_cache.as_slice().iter().all(|&c| c == 0.0));
                }
                other => panic!("unexpected state {other:?}"),
            }
        }
    }

    #[test]
    fn adadelta_adds_a_second_pair() {
        match OptimizerState::new(UpdateFn::Adadelta, 3, 1, 1) {
            OptimizerState::DualCache { weights_cache, adadelta_cache, adadelta_bias_cache, .. } => {
                assert_eq!(weights_cache.shape(), (3, 1, 1));
                assert_eq!(adadelta_cache.shape(), (3, 1, 1));
                assert_eq!(adadelta_bias_cache, 0.0);
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn adam_allocates_weight_moments_lazily() {
        let mut state = OptimizerState::new(UpdateFn::Adam, 1, 1, 4);
        assert!(matches!(
            state,
            OptimizerState::Moments { m, v, weights_m: None, weights_v: None, .. } if m == 0.0 && v == 0.0
        ));
        state.step(Slot::Weight(2), 0.0, 1.0, &ctx());
        match state {
            OptimizerState::Moments { weights_m: Some(wm), weights_v: Some(wv), .. } => {
                assert_eq!(wm.len(), 4);
                assert_relative_eq!(wm[2], 0.1);
                assert_relative_eq!(wv[2], 0.001, epsilon = 1e-12);
                assert_eq!(wm[0], 0.0);
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn every_selector_reports_itself_back() {
        for f in UpdateFn::ALL {
            assert_eq!(OptimizerState::new(f, 1, 1, 1).update_fn(), f);
        }
    }

    #[test]
    fn vanilla_steps_along_the_delta() {
        let mut state = OptimizerState::new(UpdateFn::Vanilla, 1, 1, 1);
        assert_relative_eq!(state.step(Slot::Bias, 1.0, 0.5, &ctx()), 1.05);
    }

    #[test]
    fn gain_grows_while_sign_holds_and_shrinks_on_flip() {
        let mut state = OptimizerState::new(UpdateFn::Gain, 1, 1, 1);
        let v = state.step(Slot::Weight(0), 1.0, 1.0, &ctx());
        assert_relative_eq!(v, 1.1);
        if let OptimizerState::Gain { weight_gain, .. } = &state {
            assert_relative_eq!(weight_gain[0], 1.05);
        }
        state.step(Slot::Weight(0), 0.01, -1.0, &ctx());
        if let OptimizerState::Gain { weight_gain, .. } = &state {
            assert_relative_eq!(weight_gain[0], 1.05 * 0.95);
        }
    }

    #[test]
    fn adagrad_normalises_by_accumulated_squares() {
        let mut state = OptimizerState::new(UpdateFn::Adagrad, 1, 1, 1);
        let v = state.step(Slot::Bias, 0.0, 2.0, &ctx());
        assert_relative_eq!(v, 0.1 * 2.0 / (2.0 + 1e-6));
    }

    #[test]
    fn momentum_carries_velocity() {
        let mut state = OptimizerState::new(UpdateFn::Momentum, 1, 1, 1);
        let first = state.step(Slot::Bias, 0.0, 1.0, &ctx());
        let second = state.step(Slot::Bias, first, 1.0, &ctx());
        assert_relative_eq!(first, 0.1);
        assert_relative_eq!(second, 0.1 + 0.9 * 0.1 + 0.1);
    }

    #[test]
    fn adadelta_moves_towards_the_delta() {
        let mut state = OptimizerState::new(UpdateFn::Adadelta, 1, 1, 1);
        let v = state.step(Slot::Bias, 0.0, 1.0, &ctx());
        assert!(v > 0.0);
    }
}
