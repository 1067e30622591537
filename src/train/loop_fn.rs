use std::time::Instant;

use tracing::{debug, info};

use crate::error::{NetError, Result};
use crate::network::network::{Example, Network};
use crate::train::early_stopping::StopDecision;
use crate::train::summary::TrainSummary;

/// Running totals of one training run.
struct RunTotals {
    total_error: f64,
    counted: usize,
    last_validation_error: Option<f64>,
}

impl Network {
    /// Trains on `its` consecutive training examples starting at `start_i`.
    ///
    /// Each iteration runs one example forward, sets the output error to
    /// `target - output`, records the training confusion matrix and
    /// back-propagates. Deltas are applied and reset at the end of every
    /// `mini_batch_size`-th iteration (counting indices from 1), and applied
    /// once more without a reset on the training set's last example.
    ///
    /// Every `validation_interval` iterations (never at index 0) the
    /// validation set is evaluated and the early-stopping policy consulted.
    ///
    /// The mean error is taken over the iterations whose cost was actually
    /// accumulated, so an early stop does not dilute it.
    ///
    /// # Errors
    /// - `NotJoined` before [`Network::join_layers`]
    /// - `OutOfBounds` if `[start_i, start_i + its)` does not fit the training set
    /// - `EmptyDataset` if validation is configured but the validation set is empty
    /// - `ShapeMismatch` for an example that does not fit the input/output layers
    pub fn train(&mut self, its: usize, start_i: usize) -> Result<TrainSummary> {
        self.ensure_joined()?;
        let len = self.training_data.len();
        if start_i.checked_add(its).map_or(true, |end| end > len) {
            return Err(NetError::OutOfBounds { dataset: "training", start: start_i, its, len });
        }
        if self.config().validation_interval != 0 && self.validation_data.is_empty() {
            return Err(NetError::EmptyDataset("validation"));
        }

        info!("Training {} iterations from index {}", its, start_i);
        let t_start = Instant::now();
        self.is_training = true;
        self.stopped_early = false;

        let data = std::mem::take(&mut self.training_data);
        let result = self.run_iterations(&data, its, start_i);
        self.training_data = data;
        self.is_training = false;
        let totals = result?;

        self.error = if totals.counted == 0 {
            0.0
        } else {
            totals.total_error / totals.counted as f64
        };

        let summary = TrainSummary {
            start: start_i,
            requested: its,
            iterations_run: totals.counted,
            mean_error: self.error,
            stopped_early: self.stopped_early,
            last_validation_error: totals.last_validation_error,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        info!(
            "Trained {} of {} iterations, mean error {:.6}{}",
            summary.iterations_run,
            its,
            summary.mean_error,
            if summary.stopped_early { " (stopped early)" } else { "" }
        );
        Ok(summary)
    }

    fn run_iterations(&mut self, data: &[Example], its: usize, start_i: usize) -> Result<RunTotals> {
        let batch_size = self.config().mini_batch_size;
        let interval = self.config().validation_interval;
        let cost = self.config().cost;
        let collect = self.config().collect_errors;

        let mut totals = RunTotals { total_error: 0.0, counted: 0, last_validation_error: None };

        for iteration_index in start_i..start_i + its {
            self.iterations += 1;
            let example = &data[iteration_index];
            let target = &example.1;
            let (output, class) = self.evaluate_example(example)?;

            let errs = self.output_layer_mut().errs_mut();
            for (err, (t, o)) in errs.iter_mut().zip(target.iter().zip(output.iter())) {
                *err = t - o;
            }
            if let Some(t) = class.target {
                self.training_confusion.record(t, class.predicted);
            }

            if interval != 0 && iteration_index != 0 && iteration_index % interval == 0 {
                let validation_error = self.validate()?;
                totals.last_validation_error = Some(validation_error);
                if collect {
                    self.errors.validation.push(validation_error);
                }
                debug!("Validation at iteration {}: error {:.6}", iteration_index, validation_error);

                // Validation overwrote the activations backward() reads.
                self.forward(&example.0)?;

                match self.early_stopping.check(validation_error) {
                    StopDecision::Continue => {}
                    StopDecision::BackUp => {
                        debug!("New best validation error {:.6}, backing up", validation_error);
                        self.back_up_validation();
                    }
                    StopDecision::Stop { final_step } => {
                        if final_step {
                            self.backward()?;
                            self.apply_delta_weights();
                        }
                        info!("Stopping early at iteration {}", iteration_index);
                        self.stopped_early = true;
                        break;
                    }
                }
            }

            self.backward()?;

            let iteration_error = cost.cost(target, &output);
            totals.total_error += iteration_error;
            totals.counted += 1;
            if collect {
                self.errors.training.push(iteration_error);
            }

            if (iteration_index + 1) % batch_size == 0 {
                self.apply_delta_weights();
                self.reset_delta_weights();
            } else if iteration_index + 1 >= data.len() {
                self.apply_delta_weights();
            }
        }

        Ok(totals)
    }
}
