//! Error types shared by every procedure in the crate.
//!
//! Only malformed input and broken numerical invariants surface as errors.
//! Conditions the procedures can recover from (tied ranks, a degenerate
//! Shapiro–Wilk sample, an optimizer hitting its iteration cap) are reported
//! as warnings or flags on the result instead.

use thiserror::Error;

/// Error type for all inference operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// Too few observations for the requested procedure.
    #[error("Insufficient data for {procedure}: expected at least {expected} observations, got {actual}")]
    InsufficientData {
        procedure: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A parameter or an input value is outside its valid domain.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Gauss–Jordan elimination met a numerically zero pivot.
    #[error("Singular matrix: pivot in column {pivot} is numerically zero")]
    SingularMatrix { pivot: usize },

    /// Operand shapes are incompatible.
    #[error("Dimension mismatch: {left:?} is incompatible with {right:?}")]
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    /// The optimizer stopped at its iteration cap.
    #[error("No convergence after {iterations} iterations (objective spread {spread:e})")]
    ConvergenceFailure { iterations: usize, spread: f64 },

    /// The exact permutation distribution would exceed the configured cost.
    #[error(
        "Exact distribution for m={m}, n={n} needs {cost} cells (limit {limit}); \
         use a normal approximation or allow the expensive computation explicitly"
    )]
    ExactAlgorithmCostExceeded {
        m: usize,
        n: usize,
        cost: u64,
        limit: u64,
    },

    /// A cooperative cancellation flag was raised.
    #[error("Cancelled after {iterations} iterations")]
    Cancelled { iterations: usize },
}

/// Result alias using [`InferenceError`].
pub type Result<T> = std::result::Result<T, InferenceError>;

impl InferenceError {
    /// Significance level outside (0, 1).
    pub fn invalid_alpha(alpha: f64) -> Self {
        Self::InvalidParameter(format!("alpha must lie in (0, 1), got {alpha}"))
    }

    /// Probability outside the open unit interval.
    pub fn invalid_probability(p: f64) -> Self {
        Self::InvalidParameter(format!("probability must lie in (0, 1), got {p}"))
    }

    /// NaN or infinite observation.
    pub fn non_finite(context: &str) -> Self {
        Self::InvalidParameter(format!("{context} contains a non-finite value"))
    }

    pub(crate) fn insufficient(procedure: &'static str, expected: usize, actual: usize) -> Self {
        Self::InsufficientData {
            procedure,
            expected,
            actual,
        }
    }
}

/// Fails with [`InferenceError::non_finite`] when any value is NaN or infinite.
pub(crate) fn ensure_finite(values: &[f64], context: &str) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(InferenceError::non_finite(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InferenceError::insufficient("Grubbs", 3, 2);
        assert_eq!(
            err.to_string(),
            "Insufficient data for Grubbs: expected at least 3 observations, got 2"
        );

        let err = InferenceError::SingularMatrix { pivot: 1 };
        assert_eq!(
            err.to_string(),
            "Singular matrix: pivot in column 1 is numerically zero"
        );

        let err = InferenceError::invalid_alpha(1.5);
        assert!(err.to_string().contains("alpha"));
    }

    #[test]
    fn test_cost_exceeded_recommends_approximation() {
        let err = InferenceError::ExactAlgorithmCostExceeded {
            m: 200,
            n: 100,
            cost: 20_101,
            limit: 10_000,
        };
        assert!(err.to_string().contains("normal approximation"));
    }

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite(&[1.0, 2.0], "sample").is_ok());
        assert!(matches!(
            ensure_finite(&[1.0, f64::NAN], "sample"),
            Err(InferenceError::InvalidParameter(_))
        ));
    }
}
