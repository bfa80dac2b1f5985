//! Wilcoxon–Mann–Whitney rank-sum test with exact p-values.

use tracing::debug;

use crate::config::{ExactConfig, TestConfig};
use crate::error::{ensure_finite, InferenceError, Result};
use crate::exact::UDistribution;
use crate::rank::group_rank_sums;
use crate::result::{
    Decision, DegreesOfFreedom, MannWhitneyDetails, ProcedureKind, TestDetails, TestResult,
};

const NAME: &str = "Wilcoxon-Mann-Whitney";

/// Wilcoxon–Mann–Whitney test: H₀: both samples come from the same
/// distribution.
///
/// # Algorithm
///
/// ```text
/// U = R₁ − m(m + 1)/2
/// ```
///
/// where R₁ is the rank sum of `a` in the pooled sample (mid-ranks for
/// ties, so each tied pair contributes ½ to U). The p-value comes from the
/// exact null distribution of U ([`UDistribution`]): min(1, 2·min(P(U ≤ u),
/// P(U ≥ u))) two-sided, P(U ≥ u) one-sided with the alternative that `a`
/// tends to be larger. H₀ is rejected when p < α.
///
/// The reported critical value is the largest u with P(U ≤ u) ≤ α/2
/// (two-sided) or the smallest u with P(U ≥ u) ≤ α (one-sided); it is
/// `None` when no rejection region exists at this alpha.
///
/// # Errors
/// `InsufficientData` for an empty sample, `InvalidParameter` for non-finite
/// values or an invalid alpha, `ExactAlgorithmCostExceeded` when m·n is above
/// `exact.cost_limit` without opt-in.
///
/// # References
///
/// Mann & Whitney (1947), "On a test of whether one of two random variables
/// is stochastically larger than the other", *Annals of Mathematical
/// Statistics* 18(1), 50–60.
///
/// # Examples
///
/// ```
/// use u_inference::config::{ExactConfig, TestConfig};
/// use u_inference::testing::mann_whitney_test;
///
/// let a: Vec<f64> = (1..=8).map(f64::from).collect();
/// let b: Vec<f64> = (9..=16).map(f64::from).collect();
/// let r = mann_whitney_test(&a, &b, &TestConfig::default(), &ExactConfig::default()).unwrap();
/// assert_eq!(r.statistic, 0.0);
/// assert!(r.rejects_null());
/// ```
pub fn mann_whitney_test(
    a: &[f64],
    b: &[f64],
    config: &TestConfig,
    exact: &ExactConfig,
) -> Result<TestResult> {
    config.validate()?;
    if a.is_empty() || b.is_empty() {
        return Err(InferenceError::insufficient(NAME, 1, 0));
    }
    ensure_finite(a, NAME)?;
    ensure_finite(b, NAME)?;

    let (m, n) = (a.len(), b.len());
    let dist = UDistribution::compute(m, n, exact)?;

    let mut warnings = Vec::new();
    if (m as u64) * (n as u64) > exact.cost_limit {
        warnings.push(format!(
            "m*n = {} exceeds the exact cost limit {}; computed on request",
            m * n,
            exact.cost_limit
        ));
    }

    let ranks = group_rank_sums(&[a, b]);
    if ranks.tie_term > 0.0 {
        warnings.push("ties present; the exact distribution assumes continuous data".to_string());
    }
    let rank_sum_first = ranks.rank_sums[0];
    let mf = m as f64;
    let u = rank_sum_first - mf * (mf + 1.0) / 2.0;

    let p_left = dist.left_tail(u);
    let p_right = dist.right_tail(u);
    let (p_value, critical_value) = if config.two_sided {
        (
            dist.two_sided(u),
            dist.lower_critical_value(config.alpha / 2.0)
                .map(|c| c as f64),
        )
    } else {
        (
            p_right,
            dist.lower_critical_value(config.alpha)
                .map(|c| (dist.max_u() - c) as f64),
        )
    };
    debug!(u, p_value, "Mann-Whitney statistic");

    Ok(TestResult {
        procedure: ProcedureKind::MannWhitney,
        statistic: u,
        df: DegreesOfFreedom::NotApplicable,
        critical_value,
        p_value: Some(p_value),
        decision: Decision::from_rejection(p_value < config.alpha),
        alpha: config.alpha,
        two_sided: config.two_sided,
        details: TestDetails::MannWhitney(MannWhitneyDetails {
            u,
            m,
            n,
            rank_sum_first,
            p_left,
            p_right,
        }),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force_u(a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .flat_map(|&x| b.iter().map(move |&y| (x, y)))
            .map(|(x, y)| {
                if x > y {
                    1.0
                } else if x == y {
                    0.5
                } else {
                    0.0
                }
            })
            .sum()
    }

    #[test]
    fn test_complete_separation_small() {
        let a = [10.0, 11.0, 12.0];
        let b = [1.0, 2.0, 3.0, 4.0];
        let exact = ExactConfig::default();

        let r = mann_whitney_test(&a, &b, &TestConfig::default(), &exact).unwrap();
        assert_eq!(r.statistic, 12.0);
        assert!((r.p_value.unwrap() - 2.0 / 35.0).abs() < 1e-12);
        assert_eq!(r.decision, Decision::RetainNull);
        // P(U <= 0) = 1/35 > 0.025: no two-sided rejection region on the low side
        assert_eq!(r.critical_value, None);

        let one_sided = TestConfig::default().with_two_sided(false);
        let r = mann_whitney_test(&a, &b, &one_sided, &exact).unwrap();
        assert!((r.p_value.unwrap() - 1.0 / 35.0).abs() < 1e-12);
        assert!(r.rejects_null());
        assert_eq!(r.critical_value, Some(12.0));
    }

    #[test]
    fn test_separated_samples_reject() {
        let a: Vec<f64> = (1..=8).map(f64::from).collect();
        let b: Vec<f64> = (9..=16).map(f64::from).collect();
        let r = mann_whitney_test(&a, &b, &TestConfig::default(), &ExactConfig::default()).unwrap();
        assert_eq!(r.statistic, 0.0);
        assert!((r.p_value.unwrap() - 2.0 / 12870.0).abs() < 1e-15);
        assert!(r.rejects_null());
        let TestDetails::MannWhitney(d) = &r.details else {
            panic!("unexpected details");
        };
        assert_eq!(d.rank_sum_first, 36.0);
        assert!((d.p_right - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_overlapping_samples_retain() {
        let a = [1.1, 3.2, 5.3, 7.4, 9.5];
        let b = [2.1, 4.2, 6.3, 8.4, 10.5];
        let r = mann_whitney_test(&a, &b, &TestConfig::default(), &ExactConfig::default()).unwrap();
        assert_eq!(r.statistic, brute_force_u(&a, &b));
        assert!(r.p_value.unwrap() > 0.5);
        assert!(!r.rejects_null());
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn test_ties_counted_half() {
        let a = [1.0, 2.0, 3.0, 3.0];
        let b = [3.0, 4.0, 5.0];
        let r = mann_whitney_test(&a, &b, &TestConfig::default(), &ExactConfig::default()).unwrap();
        assert_eq!(r.statistic, brute_force_u(&a, &b));
        assert_eq!(r.statistic, 1.0);
        assert!(r.warnings.iter().any(|w| w.contains("ties")));
    }

    #[test]
    fn test_cost_gate() {
        let a: Vec<f64> = (0..120).map(|i| i as f64 * 0.5).collect();
        let b: Vec<f64> = (0..100).map(|i| i as f64 * 0.7 + 0.1).collect();
        let config = TestConfig::default();
        assert!(matches!(
            mann_whitney_test(&a, &b, &config, &ExactConfig::default()),
            Err(InferenceError::ExactAlgorithmCostExceeded { m: 120, n: 100, .. })
        ));
        let r = mann_whitney_test(&a, &b, &config, &ExactConfig::default().allowing_expensive())
            .unwrap();
        assert!(r.warnings.iter().any(|w| w.contains("cost limit")));
        let p = r.p_value.unwrap();
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_preconditions() {
        let config = TestConfig::default();
        let exact = ExactConfig::default();
        assert!(matches!(
            mann_whitney_test(&[], &[1.0], &config, &exact),
            Err(InferenceError::InsufficientData { .. })
        ));
        assert!(mann_whitney_test(&[1.0, f64::NAN], &[1.0], &config, &exact).is_err());
        let bad_alpha = TestConfig {
            alpha: 0.0,
            two_sided: true,
        };
        assert!(mann_whitney_test(&[1.0], &[2.0], &bad_alpha, &exact).is_err());
    }
}
