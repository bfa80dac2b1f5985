//! Configuration records for tests, the optimizer and the exact
//! permutation distribution.
//!
//! Every record deserializes with defaults for missing fields, so an external
//! parser can map `alpha = 0.01` style key-value lines straight onto them.

use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, Result};

/// Significance level and sidedness of a hypothesis test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Significance level, strictly inside (0, 1).
    pub alpha: f64,
    /// Two-sided alternative when `true`.
    pub two_sided: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            two_sided: true,
        }
    }
}

impl TestConfig {
    /// Two-sided configuration at the given significance level.
    pub fn new(alpha: f64) -> Result<Self> {
        let config = Self {
            alpha,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Returns a copy with the given sidedness.
    pub fn with_two_sided(mut self, two_sided: bool) -> Self {
        self.two_sided = two_sided;
        self
    }

    /// Checks that alpha lies in (0, 1).
    pub fn validate(&self) -> Result<()> {
        if self.alpha > 0.0 && self.alpha < 1.0 {
            Ok(())
        } else {
            Err(InferenceError::invalid_alpha(self.alpha))
        }
    }

    /// Probability mass in one rejection tail.
    pub(crate) fn tail_probability(&self) -> f64 {
        if self.two_sided {
            self.alpha / 2.0
        } else {
            self.alpha
        }
    }
}

/// Nelder–Mead settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Stop when the RMS deviation of vertex values from the best drops below this.
    pub tolerance: f64,
    /// When set, the simplex diameter must also drop below this.
    pub x_tolerance: Option<f64>,
    /// Iteration cap; reaching it is reported, not raised.
    pub max_iterations: usize,
    /// Relative offset used to build the initial simplex (absolute for zero coordinates).
    pub initial_step: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            x_tolerance: None,
            max_iterations: 1000,
            initial_step: 0.05,
        }
    }
}

impl OptimizerConfig {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_x_tolerance(mut self, x_tolerance: f64) -> Self {
        self.x_tolerance = Some(x_tolerance);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(InferenceError::InvalidParameter(format!(
                "optimizer tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if let Some(x_tol) = self.x_tolerance {
            if !(x_tol.is_finite() && x_tol > 0.0) {
                return Err(InferenceError::InvalidParameter(format!(
                    "optimizer x tolerance must be positive, got {x_tol}"
                )));
            }
        }
        if self.max_iterations == 0 {
            return Err(InferenceError::InvalidParameter(
                "optimizer needs at least one iteration".into(),
            ));
        }
        if !(self.initial_step.is_finite() && self.initial_step > 0.0) {
            return Err(InferenceError::InvalidParameter(format!(
                "initial simplex step must be positive, got {}",
                self.initial_step
            )));
        }
        Ok(())
    }
}

/// Cost gate for the exact Mann–Whitney distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExactConfig {
    /// Largest `m * n` computed without explicit opt-in.
    pub cost_limit: u64,
    /// Compute beyond `cost_limit` (with a warning) instead of failing.
    pub allow_expensive: bool,
}

impl Default for ExactConfig {
    fn default() -> Self {
        Self {
            cost_limit: 10_000,
            allow_expensive: false,
        }
    }
}

impl ExactConfig {
    pub fn allowing_expensive(mut self) -> Self {
        self.allow_expensive = true;
        self
    }
}

/// Everything a [`crate::procedure::Procedure`] may need.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub test: TestConfig,
    pub optimizer: OptimizerConfig,
    pub exact: ExactConfig,
}

impl InferenceConfig {
    pub fn validate(&self) -> Result<()> {
        self.test.validate()?;
        self.optimizer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InferenceConfig::default();
        assert_eq!(config.test.alpha, 0.05);
        assert!(config.test.two_sided);
        assert_eq!(config.optimizer.max_iterations, 1000);
        assert_eq!(config.exact.cost_limit, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_alpha_validation() {
        assert!(TestConfig::new(0.01).is_ok());
        assert!(TestConfig::new(0.0).is_err());
        assert!(TestConfig::new(1.0).is_err());
        assert!(TestConfig::new(f64::NAN).is_err());
    }

    #[test]
    fn test_tail_probability() {
        let two = TestConfig::default();
        assert!((two.tail_probability() - 0.025).abs() < 1e-15);
        let one = two.with_two_sided(false);
        assert!((one.tail_probability() - 0.05).abs() < 1e-15);
    }

    #[test]
    fn test_optimizer_validation() {
        assert!(OptimizerConfig::default().with_tolerance(0.0).validate().is_err());
        assert!(OptimizerConfig::default().with_max_iterations(0).validate().is_err());
        assert!(OptimizerConfig::default().with_x_tolerance(-1.0).validate().is_err());
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let config: InferenceConfig =
            serde_json::from_str(r#"{"test": {"alpha": 0.01}}"#).expect("should parse");
        assert_eq!(config.test.alpha, 0.01);
        assert!(config.test.two_sided);
        assert_eq!(config.optimizer, OptimizerConfig::default());
    }
}
