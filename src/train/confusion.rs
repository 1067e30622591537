use serde::{Deserialize, Serialize};
use std::fmt;

/// Square table of (true class, predicted class) counts.
///
/// Sized to the output layer when the network is joined; counts only grow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    cells: Vec<Vec<u64>>,
}

impl ConfusionMatrix {
    pub fn new(classes: usize) -> Self {
        ConfusionMatrix { cells: vec![vec![0; classes]; classes] }
    }

    pub fn classes(&self) -> usize {
        self.cells.len()
    }

    pub fn record(&mut self, target: usize, predicted: usize) {
        self.cells[target][predicted] += 1;
    }

    pub fn get(&self, target: usize, predicted: usize) -> u64 {
        self.cells[target][predicted]
    }

    pub fn rows(&self) -> &[Vec<u64>] {
        &self.cells
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().flatten().sum()
    }

    /// Sum of the diagonal.
    pub fn correct(&self) -> u64 {
        (0..self.classes()).map(|c| self.cells[c][c]).sum()
    }

    /// Fraction on the diagonal, or `None` before anything is recorded.
    pub fn accuracy(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.correct() as f64 / total as f64),
        }
    }

    /// Fraction of class `target` examples predicted correctly.
    pub fn recall(&self, target: usize) -> Option<f64> {
        let row: u64 = self.cells[target].iter().sum();
        if row == 0 {
            None
        } else {
            Some(self.cells[target][target] as f64 / row as f64)
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.cells.iter().flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1)
            .max(self.classes().to_string().len());

        write!(f, "{:>width$} |", "")?;
        for p in 0..self.classes() {
            write!(f, " {p:>width$}")?;
        }
        writeln!(f, " | recall")?;

        for (t, row) in self.cells.iter().enumerate() {
            write!(f, "{t:>width$} |")?;
            for count in row {
                write!(f, " {count:>width$}")?;
            }
            match self.recall(t) {
                Some(r) => writeln!(f, " | {:.1}%", r * 100.0)?,
                None => writeln!(f, " | -")?,
            }
        }

        match self.accuracy() {
            Some(a) => write!(f, "accuracy {:.1}% ({}/{})", a * 100.0, self.correct(), self.total()),
            None => write!(f, "accuracy -"),
        }
    }
}

/// Predicted and true class of one example.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// First index holding the largest output.
    pub predicted: usize,
    /// Index where the target equals 1, if any (the last one when several do).
    pub target: Option<usize>,
}

/// Reads the argmax of `output` and the hot index of a one-hot `target`.
pub fn classify(output: &[f64], target: &[f64]) -> Classification {
    let mut predicted = 0;
    let mut best = f64::NEG_INFINITY;
    let mut target_class = None;

    for (n, &value) in output.iter().enumerate() {
        if value > best {
            best = value;
            predicted = n;
        }
        if target.get(n) == Some(&1.0) {
            target_class = Some(n);
        }
    }

    Classification { predicted, target: target_class }
}
