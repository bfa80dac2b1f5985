//! Result records returned by the tests and estimators.
//!
//! A [`TestResult`] carries the statistic, degrees of freedom, critical
//! value, decision and optional p-value common to every hypothesis test,
//! plus test-specific [`TestDetails`]. An [`EstimationResult`] carries
//! point estimates with standard errors, their covariance matrix and the
//! derived characteristics of the fitted distribution.
//!
//! Results are plain data: immutable once produced and serializable for an
//! external reporting layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use u_numflow::special;

use crate::error::{InferenceError, Result};
use crate::linalg::Matrix;
use crate::optimize::Termination;
use crate::rank::GroupRanks;
use crate::stats::Summary;

/// The nine supported procedures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcedureKind {
    Bartlett,
    Grubbs,
    FisherStudent,
    Student,
    ShapiroWilk,
    KruskalWallis,
    MannWhitney,
    WeibullMle,
    NormalOrderFit,
}

impl ProcedureKind {
    pub const ALL: [ProcedureKind; 9] = [
        ProcedureKind::Bartlett,
        ProcedureKind::Grubbs,
        ProcedureKind::FisherStudent,
        ProcedureKind::Student,
        ProcedureKind::ShapiroWilk,
        ProcedureKind::KruskalWallis,
        ProcedureKind::MannWhitney,
        ProcedureKind::WeibullMle,
        ProcedureKind::NormalOrderFit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProcedureKind::Bartlett => "Bartlett",
            ProcedureKind::Grubbs => "Grubbs",
            ProcedureKind::FisherStudent => "Fisher-Student",
            ProcedureKind::Student => "Student",
            ProcedureKind::ShapiroWilk => "Shapiro-Wilk",
            ProcedureKind::KruskalWallis => "Kruskal-Wallis",
            ProcedureKind::MannWhitney => "Wilcoxon-Mann-Whitney",
            ProcedureKind::WeibullMle => "Weibull MLE",
            ProcedureKind::NormalOrderFit => "Normal least squares",
        }
    }

    /// `true` for hypothesis tests, `false` for estimators.
    pub fn is_test(&self) -> bool {
        !matches!(
            self,
            ProcedureKind::WeibullMle | ProcedureKind::NormalOrderFit
        )
    }
}

impl fmt::Display for ProcedureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a hypothesis test at the configured alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// The data are consistent with H₀.
    RetainNull,
    /// H₀ is rejected.
    RejectNull,
}

impl Decision {
    pub fn from_rejection(reject: bool) -> Self {
        if reject {
            Decision::RejectNull
        } else {
            Decision::RetainNull
        }
    }

    pub fn is_rejected(&self) -> bool {
        *self == Decision::RejectNull
    }
}

/// Degrees of freedom of the reference distribution.
///
/// Real-valued so Welch–Satterthwaite corrections fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DegreesOfFreedom {
    NotApplicable,
    One(f64),
    Two(f64, f64),
}

/// Common record for every hypothesis test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub procedure: ProcedureKind,
    /// The statistic compared against `critical_value`.
    pub statistic: f64,
    pub df: DegreesOfFreedom,
    /// `None` when no rejection region is attainable (tiny exact samples).
    pub critical_value: Option<f64>,
    pub p_value: Option<f64>,
    pub decision: Decision,
    pub alpha: f64,
    pub two_sided: bool,
    pub details: TestDetails,
    /// Non-fatal notes (sample size outside the recommended range, etc.).
    pub warnings: Vec<String>,
}

impl TestResult {
    pub fn rejects_null(&self) -> bool {
        self.decision.is_rejected()
    }
}

/// Test-specific intermediate quantities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TestDetails {
    Bartlett(BartlettDetails),
    Grubbs(GrubbsDetails),
    MeanComparison(MeanComparisonDetails),
    ShapiroWilk(ShapiroWilkDetails),
    KruskalWallis(KruskalWallisDetails),
    MannWhitney(MannWhitneyDetails),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BartlettDetails {
    pub variances: Vec<f64>,
    pub sizes: Vec<usize>,
    /// Σ(nᵢ − 1).
    pub total_df: f64,
    pub pooled_variance: f64,
    /// Bartlett's correction factor c.
    pub correction: f64,
}

/// Check of one extreme value in Grubbs' test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtremeCheck {
    pub value: f64,
    /// |value − mean| / s.
    pub statistic: f64,
    pub is_outlier: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrubbsDetails {
    pub n: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub max: ExtremeCheck,
    pub min: ExtremeCheck,
    /// Student-t quantile used in the critical value.
    pub t_quantile: f64,
}

/// F-test of the variance ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarianceRatio {
    /// Larger variance over smaller.
    pub f: f64,
    pub df_numerator: f64,
    pub df_denominator: f64,
    pub critical_value: f64,
    pub p_value: f64,
    pub equal_variances: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanComparisonDetails {
    pub first: Summary,
    pub second: Summary,
    /// Present when the variance assumption was decided by an F-test.
    pub variance_test: Option<VarianceRatio>,
    pub equal_variances_assumed: bool,
    /// Pooled variance when equal variances are assumed.
    pub pooled_variance: Option<f64>,
    /// Standard error of the mean difference.
    pub standard_error: f64,
}

/// Origin of a Shapiro–Wilk critical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CriticalSource {
    /// Interpolated from the Shapiro–Wilk table.
    Table,
    /// Royston's normalizing transformation inverted at alpha.
    Royston,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapiroWilkDetails {
    pub n: usize,
    /// Σ aᵢ (x₍ₙ₊₁₋ᵢ₎ − x₍ᵢ₎).
    pub b: f64,
    /// Σ(x − x̄)².
    pub sum_sq_dev: f64,
    /// Coefficients aᵢ for the upper half of the order statistics.
    pub coefficients: Vec<f64>,
    pub critical_source: CriticalSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KruskalWallisDetails {
    /// Tie-corrected H.
    pub h: f64,
    /// H₁ = (H/2)(1 + (N − k)/(N − 1 − H)).
    pub h_adjusted: f64,
    pub ranks: GroupRanks,
    pub tie_correction: f64,
    /// F₁₋α(k − 1, N − k).
    pub f_quantile: f64,
    /// χ²₁₋α(k − 1).
    pub chi_squared_quantile: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MannWhitneyDetails {
    /// U for the first sample, ties counted ½.
    pub u: f64,
    pub m: usize,
    pub n: usize,
    pub rank_sum_first: f64,
    /// P(U ≤ u).
    pub p_left: f64,
    /// P(U ≥ u).
    pub p_right: f64,
}

// ----------------------------------------------------------------------------
// Estimation
// ----------------------------------------------------------------------------

/// One estimated parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEstimate {
    pub name: String,
    pub value: f64,
    pub std_error: f64,
}

impl ParameterEstimate {
    pub fn new(name: &str, value: f64, std_error: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            std_error,
        }
    }

    /// Wald interval value ± z₍₁₊level₎/₂ · SE.
    ///
    /// # Errors
    /// `InvalidParameter` if `level` is outside (0, 1).
    pub fn wald_interval(&self, level: f64) -> Result<(f64, f64)> {
        if !(level > 0.0 && level < 1.0) {
            return Err(InferenceError::invalid_probability(level));
        }
        let z = special::inverse_normal_cdf(0.5 + level / 2.0);
        Ok((self.value - z * self.std_error, self.value + z * self.std_error))
    }
}

/// Moments and location summaries of a fitted distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Characteristics {
    pub mean: f64,
    pub variance: f64,
    pub median: f64,
    pub mode: f64,
}

impl Characteristics {
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }
}

/// Common record for every estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub procedure: ProcedureKind,
    pub parameters: Vec<ParameterEstimate>,
    /// Covariance of the estimates, in `parameters` order.
    pub covariance: Matrix,
    pub characteristics: Characteristics,
    pub details: EstimationDetails,
    pub warnings: Vec<String>,
}

impl EstimationResult {
    pub fn parameter(&self, name: &str) -> Option<&ParameterEstimate> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Correlation of estimates `i` and `j`; NaN when either variance is zero.
    pub fn correlation(&self, i: usize, j: usize) -> f64 {
        let c = &self.covariance;
        let denom = (c[(i, i)] * c[(j, j)]).sqrt();
        if denom > 0.0 {
            c[(i, j)] / denom
        } else {
            f64::NAN
        }
    }
}

/// Estimator-specific diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EstimationDetails {
    Weibull(WeibullFitDetails),
    Normal(NormalFitDetails),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeibullFitDetails {
    pub n: usize,
    pub observed: usize,
    pub censored: usize,
    pub initial_shape: f64,
    pub initial_scale: f64,
    pub log_likelihood: f64,
    /// Squared shape-score residual at the optimum.
    pub objective: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub termination: Termination,
    /// (probability, quantile) pairs of the fitted distribution.
    pub quantiles: Vec<(f64, f64)>,
}

impl WeibullFitDetails {
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalFitDetails {
    pub n: usize,
    /// Expected standard-normal order statistics used as regressors.
    pub expected_order_statistics: Vec<f64>,
    /// Sorted observations.
    pub sorted: Vec<f64>,
    pub fitted: Vec<f64>,
    pub sse: f64,
    pub mse: f64,
    pub r_squared: f64,
    /// (XᵀX)⁻¹ of the design.
    pub design_inverse: Matrix,
    pub sample_mean: f64,
    pub sample_std_dev: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedure_kinds() {
        assert_eq!(ProcedureKind::ALL.len(), 9);
        assert_eq!(ProcedureKind::ALL.iter().filter(|k| k.is_test()).count(), 7);
        assert_eq!(ProcedureKind::MannWhitney.to_string(), "Wilcoxon-Mann-Whitney");
    }

    #[test]
    fn test_decision() {
        assert!(Decision::from_rejection(true).is_rejected());
        assert_eq!(Decision::from_rejection(false), Decision::RetainNull);
    }

    #[test]
    fn test_wald_interval() {
        let p = ParameterEstimate::new("mu", 10.0, 2.0);
        let (lo, hi) = p.wald_interval(0.95).unwrap();
        assert!((lo - (10.0 - 1.959963984540054 * 2.0)).abs() < 1e-9);
        assert!((hi - (10.0 + 1.959963984540054 * 2.0)).abs() < 1e-9);
        assert!(p.wald_interval(1.0).is_err());
    }
}
