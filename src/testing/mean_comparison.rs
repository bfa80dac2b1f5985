//! Two-sample comparisons of means and variances: the variance-ratio F-test,
//! Student's t-test (pooled or Welch) and the combined Fisher–Student
//! procedure that lets the F-test choose between them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::checked_summary;
use crate::config::TestConfig;
use crate::distribution::{ContinuousDistribution, FisherF, StudentT};
use crate::error::{InferenceError, Result};
use crate::result::{
    Decision, DegreesOfFreedom, MeanComparisonDetails, ProcedureKind, TestDetails, TestResult,
    VarianceRatio,
};
use crate::stats::Summary;

/// Variance assumption of the two-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarianceAssumption {
    /// Pooled variance, df = n₁ + n₂ − 2.
    Equal,
    /// Welch standard error with Satterthwaite df.
    Unequal,
}

/// F-test of H₀: σ₁² = σ₂².
///
/// F is the larger sample variance over the smaller, so F ≥ 1. Variances are
/// judged equal when F ≤ F₁₋α/2(f_num, f_den); the p-value is
/// min(1, 2·P(F' > F)).
///
/// # Errors
/// `InsufficientData` if either sample has fewer than two values;
/// `InvalidParameter` for non-finite values, a zero variance or an invalid
/// alpha.
///
/// # Examples
///
/// ```
/// use u_inference::config::TestConfig;
/// use u_inference::testing::variance_ratio_test;
///
/// let a = [220.0, 223.0, 234.0, 245.0, 257.0];
/// let b = [234.0, 246.0, 259.0, 262.0, 278.0, 280.0, 285.0, 290.0];
/// let f = variance_ratio_test(&a, &b, &TestConfig::default()).unwrap();
/// assert!(f.equal_variances);
/// assert_eq!(f.df_numerator, 7.0);
/// ```
pub fn variance_ratio_test(a: &[f64], b: &[f64], config: &TestConfig) -> Result<VarianceRatio> {
    config.validate()?;
    let first = checked_summary(a, "variance ratio", 2)?;
    let second = checked_summary(b, "variance ratio", 2)?;
    variance_ratio(&first, &second, config)
}

fn variance_ratio(first: &Summary, second: &Summary, config: &TestConfig) -> Result<VarianceRatio> {
    if first.variance <= 0.0 || second.variance <= 0.0 {
        return Err(InferenceError::InvalidParameter(
            "variance ratio needs both samples to have non-zero variance".into(),
        ));
    }
    let (larger, smaller) = if first.variance >= second.variance {
        (first, second)
    } else {
        (second, first)
    };
    let f = larger.variance / smaller.variance;
    let df_numerator = (larger.n - 1) as f64;
    let df_denominator = (smaller.n - 1) as f64;

    let dist = FisherF::new(df_numerator, df_denominator)?;
    let critical_value = dist.quantile(1.0 - config.alpha / 2.0)?;
    let p_value = (2.0 * dist.sf(f)).min(1.0);
    debug!(f, critical_value, "variance ratio");

    Ok(VarianceRatio {
        f,
        df_numerator,
        df_denominator,
        critical_value,
        p_value,
        equal_variances: f <= critical_value,
    })
}

/// Two-sample t-test of H₀: μ₁ = μ₂ under a stated variance assumption.
///
/// # Algorithm
///
/// ```text
/// Equal:    s²ₚ = ((n₁−1)s₁² + (n₂−1)s₂²)/(n₁+n₂−2),  SE = sₚ√(1/n₁ + 1/n₂)
/// Unequal:  SE = √(s₁²/n₁ + s₂²/n₂),
///           df = SE⁴ / ((s₁²/n₁)²/(n₁−1) + (s₂²/n₂)²/(n₂−1))
/// t = (x̄₁ − x̄₂) / SE
/// ```
///
/// Two-sided: reject when |t| > t₁₋α/2(df), p = 2·P(T > |t|).
/// One-sided (alternative μ₁ > μ₂): reject when t > t₁₋α(df), p = P(T > t).
///
/// # Errors
/// `InsufficientData` if either sample has fewer than two values;
/// `InvalidParameter` for non-finite values, an invalid alpha or a zero
/// standard error.
pub fn student_t_test(
    a: &[f64],
    b: &[f64],
    assumption: VarianceAssumption,
    config: &TestConfig,
) -> Result<TestResult> {
    config.validate()?;
    let first = checked_summary(a, "Student", 2)?;
    let second = checked_summary(b, "Student", 2)?;
    compare_means(
        ProcedureKind::Student,
        first,
        second,
        assumption,
        None,
        config,
    )
}

/// Fisher–Student procedure: an F-test on the variances decides between the
/// pooled and the Welch t-test, which then tests H₀: μ₁ = μ₂.
///
/// The F-test always runs two-sided at `config.alpha`; the sidedness of
/// `config` applies to the t-test only.
///
/// # Errors
/// As [`variance_ratio_test`] and [`student_t_test`].
///
/// # Examples
///
/// ```
/// use u_inference::config::TestConfig;
/// use u_inference::result::{TestDetails, DegreesOfFreedom};
/// use u_inference::testing::fisher_student_test;
///
/// let a = [220.0, 223.0, 234.0, 245.0, 257.0];
/// let b = [234.0, 246.0, 259.0, 262.0, 278.0, 280.0, 285.0, 290.0];
/// let r = fisher_student_test(&a, &b, &TestConfig::default()).unwrap();
/// assert_eq!(r.df, DegreesOfFreedom::One(11.0));
/// assert!(r.rejects_null());
/// ```
pub fn fisher_student_test(a: &[f64], b: &[f64], config: &TestConfig) -> Result<TestResult> {
    config.validate()?;
    let first = checked_summary(a, "Fisher-Student", 2)?;
    let second = checked_summary(b, "Fisher-Student", 2)?;
    let ratio = variance_ratio(&first, &second, config)?;
    let assumption = if ratio.equal_variances {
        VarianceAssumption::Equal
    } else {
        VarianceAssumption::Unequal
    };
    compare_means(
        ProcedureKind::FisherStudent,
        first,
        second,
        assumption,
        Some(ratio),
        config,
    )
}

fn compare_means(
    procedure: ProcedureKind,
    first: Summary,
    second: Summary,
    assumption: VarianceAssumption,
    variance_test: Option<VarianceRatio>,
    config: &TestConfig,
) -> Result<TestResult> {
    let n1 = first.n as f64;
    let n2 = second.n as f64;

    let (standard_error, df, pooled_variance) = match assumption {
        VarianceAssumption::Equal => {
            let df = n1 + n2 - 2.0;
            let pooled = (first.sum_sq_dev() + second.sum_sq_dev()) / df;
            ((pooled * (1.0 / n1 + 1.0 / n2)).sqrt(), df, Some(pooled))
        }
        VarianceAssumption::Unequal => {
            let v1 = first.variance / n1;
            let v2 = second.variance / n2;
            let se2 = v1 + v2;
            let df = se2 * se2 / (v1 * v1 / (n1 - 1.0) + v2 * v2 / (n2 - 1.0));
            (se2.sqrt(), df, None)
        }
    };
    if !(standard_error > 0.0) {
        return Err(InferenceError::InvalidParameter(
            "both samples are constant; the t statistic is undefined".into(),
        ));
    }

    let t = (first.mean - second.mean) / standard_error;
    let dist = StudentT::new(df)?;
    let critical = dist.quantile(1.0 - config.tail_probability())?;
    let (reject, p_value) = if config.two_sided {
        (t.abs() > critical, (2.0 * dist.sf(t.abs())).min(1.0))
    } else {
        (t > critical, dist.sf(t))
    };
    debug!(t, df, critical, ?assumption, "mean comparison");

    Ok(TestResult {
        procedure,
        statistic: t,
        df: DegreesOfFreedom::One(df),
        critical_value: Some(critical),
        p_value: Some(p_value),
        decision: Decision::from_rejection(reject),
        alpha: config.alpha,
        two_sided: config.two_sided,
        details: TestDetails::MeanComparison(MeanComparisonDetails {
            first,
            second,
            variance_test,
            equal_variances_assumed: assumption == VarianceAssumption::Equal,
            pooled_variance,
            standard_error,
        }),
        warnings: Vec::new(),
    })
}
