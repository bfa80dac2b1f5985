//! Bartlett test for homogeneity of variances.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_group_count, checked_summary};
use crate::config::TestConfig;
use crate::distribution::{ChiSquared, ContinuousDistribution};
use crate::error::{InferenceError, Result};
use crate::result::{
    BartlettDetails, Decision, DegreesOfFreedom, ProcedureKind, TestDetails, TestResult,
};

const NAME: &str = "Bartlett";

/// Sample variance and size of one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupVariance {
    /// Sample variance (n − 1 denominator).
    pub variance: f64,
    pub size: usize,
}

/// Bartlett test from raw groups: H₀: all groups have equal variance.
///
/// Computes each group's sample variance and delegates to
/// [`bartlett_test_from_summary`].
///
/// # Errors
/// `InsufficientData` for fewer than two groups or a group with fewer than
/// two observations; `InvalidParameter` for non-finite values, a zero
/// variance or an invalid alpha.
///
/// # Examples
///
/// ```
/// use u_inference::config::TestConfig;
/// use u_inference::testing::bartlett_test;
///
/// let g1 = [2.0, 3.0, 4.0, 5.0, 6.0];
/// let g2 = [10.0, 20.0, 30.0, 40.0, 50.0];
/// let r = bartlett_test(&[&g1, &g2], &TestConfig::default()).unwrap();
/// assert!(r.rejects_null());
/// ```
pub fn bartlett_test(groups: &[&[f64]], config: &TestConfig) -> Result<TestResult> {
    check_group_count(groups.len(), NAME)?;
    let summaries = groups
        .iter()
        .map(|g| {
            checked_summary(g, NAME, 2).map(|s| GroupVariance {
                variance: s.variance,
                size: s.n,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    bartlett_test_from_summary(&summaries, config)
}

/// Bartlett test from per-group variances and sizes.
///
/// # Algorithm
///
/// With fᵢ = nᵢ − 1 and F = Σfᵢ:
///
/// 1. Pooled variance s²ₚ = Σ fᵢ s²ᵢ / F
/// 2. Correction c = 1 + (Σ 1/fᵢ − 1/F) / (3(m − 1))
/// 3. χ² = (F ln s²ₚ − Σ fᵢ ln s²ᵢ) / c, referred to χ²(m − 1)
///
/// H₀ is retained when χ² ≤ χ²₁₋α(m − 1).
///
/// # References
///
/// Bartlett (1937), "Properties of sufficiency and statistical tests",
/// *Proceedings of the Royal Society A* 160(901), 268–282.
pub fn bartlett_test_from_summary(
    groups: &[GroupVariance],
    config: &TestConfig,
) -> Result<TestResult> {
    config.validate()?;
    check_group_count(groups.len(), NAME)?;
    for g in groups {
        if g.size < 2 {
            return Err(InferenceError::insufficient(NAME, 2, g.size));
        }
        if !(g.variance.is_finite() && g.variance > 0.0) {
            return Err(InferenceError::InvalidParameter(format!(
                "Bartlett needs positive group variances, got {}",
                g.variance
            )));
        }
    }

    let m = groups.len() as f64;
    let total_df: f64 = groups.iter().map(|g| (g.size - 1) as f64).sum();
    let pooled = groups
        .iter()
        .map(|g| (g.size - 1) as f64 * g.variance)
        .sum::<f64>()
        / total_df;

    let sum_recip: f64 = groups.iter().map(|g| 1.0 / (g.size - 1) as f64).sum();
    let correction = 1.0 + (sum_recip - 1.0 / total_df) / (3.0 * (m - 1.0));

    let numerator = total_df * pooled.ln()
        - groups
            .iter()
            .map(|g| (g.size - 1) as f64 * g.variance.ln())
            .sum::<f64>();
    // Jensen guarantees a non-negative numerator; clamp rounding noise
    let statistic = (numerator / correction).max(0.0);

    let chi = ChiSquared::new(m - 1.0)?;
    let critical = chi.quantile(1.0 - config.alpha)?;
    let p_value = chi.sf(statistic);
    debug!(statistic, critical, pooled, "Bartlett statistic");

    Ok(TestResult {
        procedure: ProcedureKind::Bartlett,
        statistic,
        df: DegreesOfFreedom::One(m - 1.0),
        critical_value: Some(critical),
        p_value: Some(p_value),
        decision: Decision::from_rejection(statistic > critical),
        alpha: config.alpha,
        two_sided: config.two_sided,
        details: TestDetails::Bartlett(BartlettDetails {
            variances: groups.iter().map(|g| g.variance).collect(),
            sizes: groups.iter().map(|g| g.size).collect(),
            total_df,
            pooled_variance: pooled,
            correction,
        }),
        warnings: Vec::new(),
    })
}
