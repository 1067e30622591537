use rand::rngs::StdRng;

use crate::activation::Activation;
use crate::error::Result;
use crate::layers::layer::{InitContext, Layer};
use crate::layers::neuron::Neuron;
use crate::optim::UpdateContext;

/// Fully-connected layer.
#[derive(Debug)]
pub struct DenseLayer {
    pub size: usize,
    pub neurons: Vec<Neuron>,
    pub activation: Activation,
    fan_in: Option<usize>,
    fan_out: Option<usize>,
    sums: Vec<f64>, // pre-activation values, needed for the derivative
    actvns: Vec<f64>,
    errs: Vec<f64>,
}

impl DenseLayer {
    pub fn new(size: usize) -> DenseLayer {
        DenseLayer {
            size,
            neurons: Vec::new(),
            activation: Activation::default(),
            fan_in: None,
            fan_out: None,
            sums: vec![0.0; size],
            actvns: vec![0.0; size],
            errs: vec![0.0; size],
        }
    }

    pub fn sums(&self) -> &[f64] {
        &self.sums
    }
}

impl Layer for DenseLayer {
    fn size(&self) -> usize {
        self.size
    }

    fn fan_in(&self) -> Option<usize> {
        self.fan_in
    }

    fn fan_out(&self) -> Option<usize> {
        self.fan_out
    }

    fn set_fans(&mut self, fan_in: Option<usize>, fan_out: Option<usize>) {
        self.fan_in = fan_in;
        self.fan_out = fan_out;
    }

    fn init(&mut self, _index: usize, ctx: &InitContext, rng: &mut StdRng) -> Result<()> {
        self.activation = ctx.activation;
        // The input layer has nothing upstream to weigh.
        self.neurons = match self.fan_in {
            Some(fan_in) => (0..self.size).map(|_| Neuron::new(fan_in, ctx, rng)).collect(),
            None => Vec::new(),
        };
        Ok(())
    }

    fn actvns(&self) -> &[f64] {
        &self.actvns
    }

    fn set_actvns(&mut self, input: &[f64]) {
        self.actvns.clear();
        self.actvns.extend_from_slice(input);
    }

    fn errs(&self) -> &[f64] {
        &self.errs
    }

    fn errs_mut(&mut self) -> &mut [f64] {
        &mut self.errs
    }

    fn forward(&mut self, prev: &dyn Layer) {
        let input = prev.actvns();
        for (n, neuron) in self.neurons.iter().enumerate() {
            let sum = neuron.bias
                + neuron.weights.as_slice().iter().zip(input.iter())
                    .map(|(w, a)| w * a)
                    .sum::<f64>();
            self.sums[n] = sum;
            self.actvns[n] = self.activation.function(sum, neuron.activation_param.value());
        }
    }

    fn backward(&mut self, is_output: bool, prev: &dyn Layer, next: Option<&dyn Layer>) {
        let input = prev.actvns();
        for (n, neuron) in self.neurons.iter_mut().enumerate() {
            if !is_output {
                self.errs[n] = next.map_or(0.0, |layer| layer.error_for_input(n));
            }
            self.errs[n] *= self.activation.derivative(self.sums[n], neuron.activation_param.value());

            let err = self.errs[n];
            neuron.delta_bias += err;
            for (dw, a) in neuron.delta_weights.as_mut_slice().iter_mut().zip(input.iter()) {
                *dw += err * a;
            }
        }
    }

    fn error_for_input(&self, unit: usize) -> f64 {
        self.neurons.iter().zip(self.errs.iter())
            .map(|(neuron, err)| neuron.weights[unit] * err)
            .sum()
    }

    fn apply_delta_weights(&mut self, ctx: &UpdateContext) {
        for neuron in &mut self.neurons {
            neuron.apply_deltas(ctx);
        }
    }

    fn reset_delta_weights(&mut self) {
        for neuron in &mut self.neurons {
            neuron.reset_deltas();
        }
    }

    fn back_up_validation(&mut self) {
        for neuron in &mut self.neurons {
            neuron.back_up();
        }
    }

    fn restore_validation(&mut self) {
        for neuron in &mut self.neurons {
            neuron.restore();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::config::WeightInit;
    use crate::optim::{OptimizerState, UpdateFn};
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn ctx(activation: Activation) -> InitContext {
        InitContext {
            update_fn: UpdateFn::Vanilla,
            activation,
            weight_init: WeightInit::Uniform,
            lrelu_slope: 0.01,
            elu_alpha: 1.0,
        }
    }

    fn update_ctx() -> UpdateContext {
        UpdateContext {
            learning_rate: 0.5,
            rms_decay: 0.99,
            rho: 0.95,
            momentum: 0.9,
            adam_beta1: 0.9,
            adam_beta2: 0.999,
            iterations: 0,
        }
    }

    /// Input layer of `inputs` units feeding an identity layer with fixed weights.
    fn pair(inputs: &[f64], weights: &[&[f64]]) -> (DenseLayer, DenseLayer) {
        let mut rng = StdRng::seed_from_u64(0);
        let mut input = DenseLayer::new(inputs.len());
        input.set_fans(None, Some(weights.len()));
        input.init(0, &ctx(Activation::Identity), &mut rng).unwrap();
        input.set_actvns(inputs);

        let mut layer = DenseLayer::new(weights.len());
        layer.set_fans(Some(inputs.len()), None);
        layer.init(1, &ctx(Activation::Identity), &mut rng).unwrap();
        for (neuron, w) in layer.neurons.iter_mut().zip(weights) {
            neuron.weights.as_mut_slice().copy_from_slice(w);
        }
        (input, layer)
    }

    #[test]
    fn input_layer_has_no_neurons() {
        let (input, layer) = pair(&[1.0, 2.0], &[&[0.0, 0.0]]);
        assert!(input.neurons.is_empty());
        assert_eq!(layer.neurons.len(), 1);
        assert_eq!(layer.neurons[0].weights.len(), 2);
    }

    #[test]
    fn forward_is_weighted_sum_plus_bias() {
        let (input, mut layer) = pair(&[1.0, 2.0], &[&[0.5, -1.0], &[2.0, 0.25]]);
        layer.neurons[1].bias = 1.0;
        layer.forward(&input);
        assert_relative_eq!(layer.actvns()[0], -1.5);
        assert_relative_eq!(layer.actvns()[1], 3.5);
    }

    #[test]
    fn output_backward_accumulates_deltas_from_errs() {
        let (input, mut layer) = pair(&[1.0, 2.0], &[&[0.5, -1.0]]);
        layer.forward(&input);
        layer.errs_mut()[0] = 0.5;
        layer.backward(true, &input, None);
        layer.backward(true, &input, None);
        assert_relative_eq!(layer.neurons[0].delta_bias, 1.0);
        assert_relative_eq!(layer.neurons[0].delta_weights[0], 1.0);
        assert_relative_eq!(layer.neurons[0].delta_weights[1], 2.0);
    }

    #[test]
    fn hidden_backward_pulls_error_from_next_layer() {
        let (input, mut hidden) = pair(&[1.0], &[&[1.0], &[1.0]]);
        hidden.forward(&input);
        let (_, mut out) = pair(&[0.0, 0.0], &[&[3.0, -2.0]]);
        out.errs_mut()[0] = 0.5;
        assert_relative_eq!(out.error_for_input(0), 1.5);
        assert_relative_eq!(out.error_for_input(1), -1.0);

        hidden.backward(false, &input, Some(&out as &dyn Layer));
        assert_relative_eq!(hidden.errs()[0], 1.5);
        assert_relative_eq!(hidden.errs()[1], -1.0);
    }

    #[test]
    fn reset_delta_weights_is_idempotent() {
        let (input, mut layer) = pair(&[1.0, 1.0], &[&[0.1, 0.2]]);
        layer.forward(&input);
        layer.errs_mut()[0] = 1.0;
        layer.backward(true, &input, None);

        for _ in 0..2 {
            layer.reset_delta_weights();
            assert_eq!(layer.neurons[0].delta_bias, 0.0);
            assert!(layer.neurons[0].delta_weights.as_slice().iter().all(|&d| d == 0.0));
        }
    }

    #[test]
    fn apply_delta_weights_keeps_deltas() {
        let (input, mut layer) = pair(&[1.0], &[&[0.0]]);
        layer.forward(&input);
        layer.errs_mut()[0] = 1.0;
        layer.backward(true, &input, None);
        layer.apply_delta_weights(&update_ctx());
        assert_relative_eq!(layer.neurons[0].weights[0], 0.5);
        assert_relative_eq!(layer.neurons[0].bias, 0.5);
        assert_relative_eq!(layer.neurons[0].delta_weights[0], 1.0);
    }

    #[test]
    fn restore_reverts_to_last_backup() {
        let (_, mut layer) = pair(&[1.0], &[&[0.3]]);
        layer.restore_validation();
        assert_relative_eq!(layer.neurons[0].weights[0], 0.3);

        layer.back_up_validation();
        layer.neurons[0].weights[0] = 9.0;
        layer.neurons[0].bias = 4.0;
        layer.back_up_validation();
        layer.neurons[0].weights[0] = -1.0;
        layer.restore_validation();
        assert_relative_eq!(layer.neurons[0].weights[0], 9.0);
        assert_relative_eq!(layer.neurons[0].bias, 4.0);
    }

    #[test]
    fn neurons_get_state_for_the_configured_rule() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut layer = DenseLayer::new(3);
        layer.set_fans(Some(4), None);
        let mut c = ctx(Activation::Rrelu);
        c.update_fn = UpdateFn::Adadelta;
        layer.init(1, &c, &mut rng).unwrap();
        for neuron in &layer.neurons {
            assert!(matches!(neuron.optimizer, OptimizerState::DualCache { .. }));
            assert!((-0.1..0.1).contains(&neuron.activation_param.value()));
        }
    }
}
