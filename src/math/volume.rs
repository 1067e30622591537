use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::{Index, IndexMut};

/// A channels × rows × cols block of `f64`, stored flat in row-major order.
///
/// Used both for trainable weights and for the optimizer state that mirrors
/// them, so the two always share a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub channels: usize,
    pub rows: usize,
    pub cols: usize,
    data: Vec<f64>,
}

impl Volume {
    /// Every entry set to `value`.
    pub fn filled(channels: usize, rows: usize, cols: usize, value: f64) -> Volume {
        Volume {
            channels,
            rows,
            cols,
            data: vec![value; channels * rows * cols],
        }
    }

    pub fn zeros(channels: usize, rows: usize, cols: usize) -> Volume {
        Volume::filled(channels, rows, cols, 0.0)
    }

    /// Uniform samples in [-1, 1).
    pub fn uniform<R: Rng + ?Sized>(channels: usize, rows: usize, cols: usize, rng: &mut R) -> Volume {
        let mut res = Volume::zeros(channels, rows, cols);
        for x in res.data.iter_mut() {
            *x = rng.gen::<f64>() * 2.0 - 1.0;
        }
        res
    }

    /// Normal samples with standard deviation `std_dev`.
    pub fn normal<R: Rng + ?Sized>(
        channels: usize,
        rows: usize,
        cols: usize,
        std_dev: f64,
        rng: &mut R,
    ) -> Volume {
        let mut res = Volume::zeros(channels, rows, cols);
        for x in res.data.iter_mut() {
            *x = sample_standard_normal(rng) * std_dev;
        }
        res
    }

    /// Number of entries (`channels * rows * cols`).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.channels, self.rows, self.cols)
    }

    /// Entry at (channel, row, col).
    pub fn at(&self, channel: usize, row: usize, col: usize) -> f64 {
        self.data[(channel * self.rows + row) * self.cols + col]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Sets every entry to `value` without reallocating.
    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    /// Copies `other` into `self`. Shapes must match.
    pub fn copy_from(&mut self, other: &Volume) {
        assert_eq!(self.shape(), other.shape(), "Volumes are of incorrect sizes");
        self.data.copy_from_slice(&other.data);
    }
}

impl Default for Volume {
    fn default() -> Self {
        Volume { channels: 0, rows: 0, cols: 0, data: vec![] }
    }
}

impl Index<usize> for Volume {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.data[i]
    }
}

impl IndexMut<usize> for Volume {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.data[i]
    }
}

/// Samples a single value from N(0, 1) using the Box-Muller transform.
fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // (0, 1] so that ln never sees 0.
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn filled_volume_has_requested_shape_and_value() {
        let v = Volume::filled(2, 3, 4, 1.0);
        assert_eq!(v.len(), 24);
        assert_eq!(v.shape(), (2, 3, 4));
        assert!(v.as_slice().iter().all(|&x| x == 1.0));
    }

    #[test]
    fn at_walks_row_major() {
        let mut v = Volume::zeros(2, 2, 3);
        v[(1 * 2 + 1) * 3 + 2] = 7.0;
        assert_eq!(v.at(1, 1, 2), 7.0);
        assert_eq!(v.at(0, 0, 0), 0.0);
    }

    #[test]
    fn uniform_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let v = Volume::uniform(1, 10, 10, &mut rng);
        assert!(v.as_slice().iter().all(|&x| (-1.0..1.0).contains(&x)));
    }

    #[test]
    fn fill_keeps_shape() {
        let mut v = Volume::filled(1, 2, 2, 3.0);
        v.fill(0.0);
        assert_eq!(v.shape(), (1, 2, 2));
        assert!(v.as_slice().iter().all(|&x| x == 0.0));
    }
}
