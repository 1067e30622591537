use tracing::{debug, warn};

use crate::error::{NetError, Result};
use crate::network::network::{Example, Network};

impl Network {
    /// Evaluates the whole validation set without touching error buffers
    /// or parameters. Updates the validation confusion matrix and stores
    /// the mean cost as the last validation error.
    pub fn validate(&mut self) -> Result<f64> {
        self.ensure_joined()?;
        if self.validation_data.is_empty() {
            return Err(NetError::EmptyDataset("validation"));
        }

        let data = std::mem::take(&mut self.validation_data);
        let result = self.run_validation(&data);
        self.validation_data = data;

        let error = result?;
        self.last_validation_error = Some(error);
        Ok(error)
    }

    fn run_validation(&mut self, data: &[Example]) -> Result<f64> {
        let cost = self.config().cost;
        let mut total = 0.0;

        for example in data {
            let (output, class) = self.evaluate_example(example)?;
            if let Some(t) = class.target {
                self.validation_confusion.record(t, class.predicted);
            }
            total += cost.cost(&example.1, &output);
            self.validations += 1;
        }

        Ok(total / data.len() as f64)
    }

    /// Evaluates `its` test examples starting at `start_i` and returns their
    /// mean cost. Only ever runs on demand.
    pub fn test(&mut self, its: usize, start_i: usize) -> Result<f64> {
        self.ensure_joined()?;
        let len = self.test_data.len();
        if start_i.checked_add(its).map_or(true, |end| end > len) {
            return Err(NetError::OutOfBounds { dataset: "test", start: start_i, its, len });
        }
        if its == 0 {
            return Ok(0.0);
        }

        let data = std::mem::take(&mut self.test_data);
        let result = self.run_test(&data[start_i..start_i + its]);
        self.test_data = data;

        let error = result?;
        debug!("Tested {} examples from index {}: error {:.6}", its, start_i, error);
        Ok(error)
    }

    fn run_test(&mut self, data: &[Example]) -> Result<f64> {
        let cost = self.config().cost;
        let collect = self.config().collect_errors;
        let mut total = 0.0;

        for example in data {
            let (output, class) = self.evaluate_example(example)?;
            if let Some(t) = class.target {
                self.test_confusion.record(t, class.predicted);
            }
            let iteration_error = cost.cost(&example.1, &output);
            if collect {
                self.errors.test.push(iteration_error);
            }
            total += iteration_error;
        }

        Ok(total / data.len() as f64)
    }

    /// Rolls every layer back to its last validation backup.
    pub fn restore_validation(&mut self) {
        if !self.has_validation_backup() {
            warn!("No validation backup to restore");
        }
        for layer in self.layers_mut().iter_mut().skip(1) {
            layer.restore_validation();
        }
    }
}
