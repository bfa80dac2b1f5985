//! Per-sample summaries shared by the procedures.
//!
//! The mean (Kahan-compensated) and the sample variance (Welford) come from
//! `u_numflow::stats`; [`Summary`] bundles them with the sample size so the
//! tests can carry them into their detail records.

use serde::{Deserialize, Serialize};
use u_numflow::stats;

/// Size, mean and sample variance of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub n: usize,
    pub mean: f64,
    /// Sample variance (n − 1 denominator).
    pub variance: f64,
}

impl Summary {
    /// `None` if fewer than two values or any is non-finite.
    ///
    /// # Examples
    /// ```
    /// use u_inference::stats::Summary;
    /// let s = Summary::of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
    /// assert!((s.mean - 5.0).abs() < 1e-15);
    /// assert!((s.variance - 4.571428571428571).abs() < 1e-10);
    /// ```
    pub fn of(data: &[f64]) -> Option<Self> {
        Some(Self {
            n: data.len(),
            mean: stats::mean(data)?,
            variance: stats::variance(data)?,
        })
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Σ(x − x̄)².
    pub fn sum_sq_dev(&self) -> f64 {
        self.variance * (self.n - 1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let s = Summary::of(&[220.0, 223.0, 234.0, 245.0, 257.0]).unwrap();
        assert_eq!(s.n, 5);
        assert!((s.mean - 235.8).abs() < 1e-12);
        assert!((s.variance - 237.7).abs() < 1e-9);
        assert!((s.sum_sq_dev() - 950.8).abs() < 1e-9);
    }

    #[test]
    fn test_short_or_invalid() {
        assert!(Summary::of(&[]).is_none());
        assert!(Summary::of(&[1.0]).is_none());
        assert!(Summary::of(&[1.0, f64::INFINITY]).is_none());
        assert!(Summary::of(&[f64::NAN, 2.0]).is_none());
    }

    #[test]
    fn test_small_increments_stay_exact() {
        let s = Summary::of(&[0.1; 10]).unwrap();
        assert!((s.mean - 0.1).abs() < 1e-15);
        assert!(s.variance.abs() < 1e-30);
    }

    #[test]
    fn test_std_dev() {
        let s = Summary::of(&[1.0, 3.0]).unwrap();
        assert!((s.std_dev() - 2.0_f64.sqrt()).abs() < 1e-15);
    }
}
