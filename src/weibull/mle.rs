//! Maximum likelihood estimation of Weibull parameters under right-censoring.
//!
//! The scale is concentrated out of the likelihood, leaving a one-dimensional
//! root-finding problem in the shape k which is handed to the Nelder–Mead
//! minimizer as a squared residual.

use std::sync::atomic::AtomicBool;

use statrs::function::gamma::gamma;
use tracing::{debug, instrument, warn};
use u_numflow::stats;

use crate::config::OptimizerConfig;
use crate::distribution::{ContinuousDistribution, Weibull};
use crate::error::{InferenceError, Result};
use crate::linalg::Matrix;
use crate::optimize::{NelderMead, OptimizationResult, Termination};
use crate::result::{
    Characteristics, EstimationDetails, EstimationResult, ParameterEstimate, ProcedureKind,
    WeibullFitDetails,
};
use crate::sample::Sample;

const NAME: &str = "Weibull MLE";

/// Shape guess used when the moments say nothing about it.
const DEFAULT_SHAPE: f64 = 1.5;

/// Bounds on the moment-based shape guess.
const SHAPE_GUESS_RANGE: (f64, f64) = (0.1, 10.0);

/// Simplex diameter in k used when the configuration sets none.
const DEFAULT_SHAPE_TOLERANCE: f64 = 1e-9;

/// Squared score residual above which the root is reported as unresolved.
const SCORE_TOLERANCE: f64 = 1e-8;

/// Objective value for k ≤ 0.
const PENALTY: f64 = 1e10;

/// Probabilities of the reported quantile table.
const QUANTILE_LEVELS: [f64; 9] = [0.01, 0.05, 0.10, 0.25, 0.50, 0.75, 0.90, 0.95, 0.99];

/// Method-of-moments starting point (k, λ) from the uncensored observations.
///
/// The coefficient of variation is mapped to the shape with
/// `k ≈ cv^(−1.086)`, clamped to [0.1, 10]; k = 1 when cv ≥ 1 and k = 1.5
/// for fewer than two observations or zero spread. The scale follows as
/// `λ = mean / Γ(1 + 1/k)`. Without any uncensored value the default
/// (1.5, 1) is returned.
///
/// # Examples
///
/// ```
/// use u_inference::sample::Sample;
/// use u_inference::weibull::initial_estimates;
///
/// let (k, lambda) = initial_estimates(&Sample::new(vec![4.0, 4.0, 4.0]));
/// assert_eq!(k, 1.5);
/// assert!(lambda > 4.0);
/// ```
pub fn initial_estimates(sample: &Sample) -> (f64, f64) {
    let observed = sample.observed();
    let Some(mean) = stats::mean(&observed) else {
        return (DEFAULT_SHAPE, 1.0);
    };
    let shape = match stats::variance(&observed) {
        Some(variance) if variance > 0.0 => {
            let cv = variance.sqrt() / mean;
            if !cv.is_finite() {
                DEFAULT_SHAPE
            } else if cv >= 1.0 {
                1.0
            } else {
                cv.powf(-1.086).clamp(SHAPE_GUESS_RANGE.0, SHAPE_GUESS_RANGE.1)
            }
        }
        _ => DEFAULT_SHAPE,
    };
    let scale = mean / gamma(1.0 + 1.0 / shape);
    if scale.is_finite() && scale > 0.0 {
        (shape, scale)
    } else {
        (shape, 1.0)
    }
}

/// Fits a two-parameter Weibull distribution by maximum likelihood.
///
/// # Algorithm
///
/// With r uncensored observations, δᵢ = 1 for observed values and
/// zᵢ = (xᵢ/λ)ᵏ, the likelihood equations reduce to
///
/// ```text
/// λ = (Σ xᵢᵏ / r)^(1/k)
/// Σ zᵢ ln zᵢ − Σ δᵢ ln zᵢ − r = 0
/// ```
///
/// The second equation (divided by r and squared) is minimized over k with
/// Nelder–Mead from the [`initial_estimates`] starting point. All sums are
/// evaluated in log space so large xᵏ never overflow.
///
/// The covariance comes from the observed information of the extreme-value
/// parameters u = ln λ, b = 1/k with sᵢ = k(ln xᵢ − ln λ):
///
/// ```text
/// M = | r            r + Σ δᵢ sᵢ   |      Cov(u, b) = b² M⁻¹
///     | r + Σ δᵢ sᵢ  r + Σ sᵢ² e^sᵢ |
/// ```
///
/// mapped to (k, λ) by the delta method with J = [[0, −k²], [λ, 0]].
///
/// Failing to converge is reported through `warnings` and the details'
/// termination, not as an error.
///
/// # Errors
/// - `InsufficientData` if no observation is uncensored.
/// - `InvalidParameter` for non-positive or non-finite values, a sample
///   without two distinct values, or an invalid optimizer configuration.
/// - `SingularMatrix` if the information matrix cannot be inverted.
///
/// # References
///
/// Lawless (2003), *Statistical Models and Methods for Lifetime Data*,
/// 2nd ed., §5.2.
///
/// # Examples
///
/// ```
/// use u_inference::config::OptimizerConfig;
/// use u_inference::sample::Sample;
/// use u_inference::weibull::weibull_mle;
///
/// let times = vec![16.0, 34.0, 53.0, 75.0, 93.0, 120.0, 150.0, 191.0];
/// let fit = weibull_mle(&Sample::new(times), &OptimizerConfig::default()).unwrap();
/// let k = fit.parameter("shape").unwrap().value;
/// assert!(k > 1.0 && k < 2.5);
/// ```
pub fn weibull_mle(sample: &Sample, config: &OptimizerConfig) -> Result<EstimationResult> {
    fit(sample, config, None)
}

/// Like [`weibull_mle`], polling `cancel` between simplex iterations.
///
/// # Errors
/// As [`weibull_mle`], plus `Cancelled` once the flag is observed.
pub fn weibull_mle_with_cancel(
    sample: &Sample,
    config: &OptimizerConfig,
    cancel: &AtomicBool,
) -> Result<EstimationResult> {
    fit(sample, config, Some(cancel))
}

/// Log-space sufficient quantities of a censored sample.
struct LogSample {
    ln_x: Vec<f64>,
    observed: Vec<bool>,
    r: f64,
}

impl LogSample {
    /// ln λ(k) = (ln Σ xᵢᵏ − ln r) / k.
    fn ln_scale(&self, k: f64) -> f64 {
        (log_sum_exp(self.ln_x.iter().map(|l| k * l)) - self.r.ln()) / k
    }

    /// (Σ zᵢ ln zᵢ − Σ δᵢ ln zᵢ) / r − 1 at the concentrated scale.
    fn score_residual(&self, k: f64) -> f64 {
        let ln_lambda = self.ln_scale(k);
        let mut sum_z_ln_z = 0.0;
        let mut sum_observed_ln_z = 0.0;
        for (l, &obs) in self.ln_x.iter().zip(&self.observed) {
            let ln_z = k * (l - ln_lambda);
            sum_z_ln_z += ln_z.exp() * ln_z;
            if obs {
                sum_observed_ln_z += ln_z;
            }
        }
        (sum_z_ln_z - sum_observed_ln_z) / self.r - 1.0
    }

    fn objective(&self, k: f64) -> f64 {
        if k <= 0.0 {
            return PENALTY + k * k;
        }
        self.score_residual(k).powi(2)
    }

    fn log_likelihood(&self, k: f64, ln_lambda: f64) -> f64 {
        self.ln_x
            .iter()
            .zip(&self.observed)
            .map(|(l, &obs)| {
                let ln_z = k * (l - ln_lambda);
                let density = if obs {
                    k.ln() - l + ln_z
                } else {
                    0.0
                };
                density - ln_z.exp()
            })
            .sum()
    }

    /// Delta-method covariance of (k, λ).
    fn covariance(&self, k: f64, ln_lambda: f64) -> Result<Matrix> {
        let b = 1.0 / k;
        let mut observed_s = 0.0;
        let mut s2_exp_s = 0.0;
        for (l, &obs) in self.ln_x.iter().zip(&self.observed) {
            let s = k * (l - ln_lambda);
            if obs {
                observed_s += s;
            }
            s2_exp_s += s * s * s.exp();
        }
        let r = self.r;
        let information =
            Matrix::from_rows(&[vec![r, r + observed_s], vec![r + observed_s, r + s2_exp_s]])?;
        let cov_ub = information.invert()?.scaled(b * b);
        let jacobian = Matrix::from_rows(&[vec![0.0, -k * k], vec![ln_lambda.exp(), 0.0]])?;
        jacobian.multiply(&cov_ub)?.multiply(&jacobian.transpose())
    }
}

/// ln Σ eˣ without overflow.
fn log_sum_exp(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let max = values.clone().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + values.map(|v| (v - max).exp()).sum::<f64>().ln()
}

fn validate(sample: &Sample) -> Result<LogSample> {
    let values = sample.values();
    if let Some(bad) = values.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
        return Err(InferenceError::InvalidParameter(format!(
            "Weibull data must be positive and finite, got {bad}"
        )));
    }
    let r = sample.observed_count();
    if r == 0 {
        return Err(InferenceError::insufficient(NAME, 1, 0));
    }
    if values.iter().all(|&v| v == values[0]) {
        return Err(InferenceError::InvalidParameter(
            "Weibull MLE needs at least two distinct values".into(),
        ));
    }
    let (ln_x, observed) = sample.iter().map(|(v, obs)| (v.ln(), obs)).unzip();
    Ok(LogSample {
        ln_x,
        observed,
        r: r as f64,
    })
}

#[instrument(level = "debug", skip_all, fields(n = sample.len()))]
fn fit(
    sample: &Sample,
    config: &OptimizerConfig,
    cancel: Option<&AtomicBool>,
) -> Result<EstimationResult> {
    let data = validate(sample)?;
    let (initial_shape, initial_scale) = initial_estimates(sample);

    let config = OptimizerConfig {
        x_tolerance: Some(config.x_tolerance.unwrap_or(DEFAULT_SHAPE_TOLERANCE)),
        ..*config
    };
    let optimizer = NelderMead::new(config)?;
    let objective = |x: &[f64]| data.objective(x[0]);
    let result: OptimizationResult = match cancel {
        Some(flag) => optimizer.minimize_with_cancel(objective, &[initial_shape], flag)?,
        None => optimizer.minimize(objective, &[initial_shape])?,
    };
    if result.termination == Termination::Cancelled {
        return Err(InferenceError::Cancelled {
            iterations: result.iterations,
        });
    }

    let mut warnings = Vec::new();
    if !result.converged() {
        warnings.push(format!(
            "optimizer stopped after {} iterations without converging",
            result.iterations
        ));
    }
    if result.value > SCORE_TOLERANCE {
        warn!(residual = result.value, "Weibull shape score not solved");
        warnings.push(format!(
            "shape score equation not solved (squared residual {:.3e})",
            result.value
        ));
    }

    let k = result.point[0];
    if !(k.is_finite() && k > 0.0) {
        return Err(InferenceError::ConvergenceFailure {
            iterations: result.iterations,
            spread: result.spread,
        });
    }
    let ln_lambda = data.ln_scale(k);
    let lambda = ln_lambda.exp();
    let covariance = data.covariance(k, ln_lambda)?;
    let log_likelihood = data.log_likelihood(k, ln_lambda);
    debug!(k, lambda, log_likelihood, "Weibull MLE");

    let fitted = Weibull::new(k, lambda)?;
    let quantiles = QUANTILE_LEVELS
        .iter()
        .map(|&p| fitted.quantile(p).map(|q| (p, q)))
        .collect::<Result<Vec<_>>>()?;

    let n = sample.len();
    let observed = sample.observed_count();
    Ok(EstimationResult {
        procedure: ProcedureKind::WeibullMle,
        parameters: vec![
            ParameterEstimate::new("shape", k, covariance[(0, 0)].sqrt()),
            ParameterEstimate::new("scale", lambda, covariance[(1, 1)].sqrt()),
        ],
        covariance,
        characteristics: Characteristics {
            mean: fitted.mean(),
            variance: fitted.variance(),
            median: fitted.median(),
            mode: fitted.mode(),
        },
        details: EstimationDetails::Weibull(WeibullFitDetails {
            n,
            observed,
            censored: n - observed,
            initial_shape,
            initial_scale,
            log_likelihood,
            objective: result.value,
            iterations: result.iterations,
            evaluations: result.evaluations,
            termination: result.termination,
            quantiles,
        }),
        warnings,
    })
}
