#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;

use ferrite_net::{InitContext, Layer, NetConfig, Network, UpdateContext};

pub type Log = Arc<Mutex<Vec<String>>>;

/// A layer that passes its input through unchanged (plus a bias that
/// drifts by `drift` on every weight update) and logs every call it gets.
pub struct RecordingLayer {
    size: usize,
    fan_in: Option<usize>,
    fan_out: Option<usize>,
    index: usize,
    bias: f64,
    drift: f64,
    backup: Option<f64>,
    actvns: Vec<f64>,
    errs: Vec<f64>,
    log: Log,
}

impl RecordingLayer {
    pub fn new(size: usize, drift: f64, log: &Log) -> Self {
        RecordingLayer {
            size,
            fan_in: None,
            fan_out: None,
            index: usize::MAX,
            bias: 0.0,
            drift,
            backup: None,
            actvns: vec![0.0; size],
            errs: vec![0.0; size],
            log: Arc::clone(log),
        }
    }

    fn record(&self, event: String) {
        self.log.lock().unwrap().push(event);
    }
}

impl Layer for RecordingLayer {
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

    fn init(&mut self, index: usize, _ctx: &InitContext, _rng: &mut StdRng) -> ferrite_net::Result<()> {
        self.index = index;
        self.record(format!("init {} {:?} {:?}", index, self.fan_in, self.fan_out));
        Ok(())
    }

    fn actvns(&self) -> &[f64] {
        &self.actvns
    }

    fn set_actvns(&mut self, input: &[f64]) {
        self.actvns.copy_from_slice(input);
    }

    fn errs(&self) -> &[f64] {
        &self.errs
    }

    fn errs_mut(&mut self) -> &mut [f64] {
        &mut self.errs
    }

    fn forward(&mut self, prev: &dyn Layer) {
        for (a, p) in self.actvns.iter_mut().zip(prev.actvns()) {
            *a = p + self.bias;
        }
        self.record(format!("forward {}", self.index));
    }

    fn backward(&mut self, is_output: bool, _prev: &dyn Layer, next: Option<&dyn Layer>) {
        if !is_output {
            for (n, err) in self.errs.iter_mut().enumerate() {
                *err = next.map_or(0.0, |layer| layer.error_for_input(n));
            }
        }
        let kind = if is_output { "output" } else { "hidden" };
        self.record(format!("backward {} {}", self.index, kind));
    }

    fn error_for_input(&self, unit: usize) -> f64 {
        self.errs.get(unit).copied().unwrap_or(0.0)
    }

    fn apply_delta_weights(&mut self, _ctx: &UpdateContext) {
        self.bias += self.drift;
        self.record(format!("apply {}", self.index));
    }

    fn reset_delta_weights(&mut self) {
        self.record(format!("reset {}", self.index));
    }

    fn back_up_validation(&mut self) {
        self.backup = Some(self.bias);
        self.record(format!("backup {}", self.index));
    }

    fn restore_validation(&mut self) {
        if let Some(bias) = self.backup {
            self.bias = bias;
        }
        self.record(format!("restore {}", self.index));
    }
}

/// A joined chain of recording layers. Only the output layer drifts.
pub fn recording_network(sizes: &[usize], drift: f64, config: NetConfig) -> (Network, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut network = Network::new(config).unwrap();
    for (l, &size) in sizes.iter().enumerate() {
        let d = if l + 1 == sizes.len() { drift } else { 0.0 };
        network.add_layer(Box::new(RecordingLayer::new(size, d, &log)));
    }
    network.join_layers().unwrap();
    (network, log)
}

/// Number of logged events equal to `event`.
pub fn count(log: &Log, event: &str) -> usize {
    log.lock().unwrap().iter().filter(|e| e.as_str() == event).count()
}

/// Logged events starting with `prefix`, in order.
pub fn events(log: &Log, prefix: &str) -> Vec<String> {
    log.lock().unwrap().iter().filter(|e| e.starts_with(prefix)).cloned().collect()
}

pub fn clear(log: &Log) {
    log.lock().unwrap().clear();
}

/// `n` copies of a one-wide example.
pub fn repeat(input: f64, target: f64, n: usize) -> Vec<ferrite_net::Example> {
    (0..n).map(|_| (vec![input], vec![target])).collect()
}
