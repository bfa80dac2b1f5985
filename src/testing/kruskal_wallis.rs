//! Kruskal–Wallis rank test for k independent samples.

use tracing::debug;

use super::check_group_count;
use crate::config::TestConfig;
use crate::distribution::{ChiSquared, ContinuousDistribution, FisherF};
use crate::error::{ensure_finite, InferenceError, Result};
use crate::rank::group_rank_sums;
use crate::result::{
    Decision, DegreesOfFreedom, KruskalWallisDetails, ProcedureKind, TestDetails, TestResult,
};

const NAME: &str = "Kruskal-Wallis";

/// Groups smaller than this make the approximation to the null
/// distribution unreliable.
const SMALL_GROUP: usize = 3;

/// Kruskal–Wallis test: H₀: all groups come from the same distribution.
///
/// # Algorithm
///
/// Ranks are assigned to the pooled sample (mid-ranks for ties). With group
/// rank sums Rᵢ, sizes nᵢ and N = Σnᵢ:
///
/// ```text
/// H  = [12/(N(N+1)) Σ Rᵢ²/nᵢ − 3(N+1)] / C,    C = 1 − Σ(t³ − t)/(N³ − N)
/// H₁ = (H/2) · (1 + (N − k)/(N − 1 − H))
/// crit = ½ [(k − 1) F₁₋α(k − 1, N − k) + χ²₁₋α(k − 1)]
/// ```
///
/// H₀ is retained when H₁ ≤ crit (Iman–Davenport approximation). The
/// reported p-value is the χ²(k − 1) upper tail of H.
///
/// # Errors
/// `InsufficientData` for fewer than two groups, an empty group or
/// N ≤ k; `InvalidParameter` for non-finite values or an invalid alpha.
///
/// # References
///
/// - Kruskal & Wallis (1952), "Use of ranks in one-criterion variance
///   analysis", *JASA* 47(260), 583–621.
/// - Iman & Davenport (1976), "New approximations to the exact distribution
///   of the Kruskal–Wallis test statistic", *Communications in Statistics*
///   A5(14), 1335–1348.
///
/// # Examples
///
/// ```
/// use u_inference::config::TestConfig;
/// use u_inference::testing::kruskal_wallis_test;
///
/// let a = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let b = [6.0, 7.0, 8.0, 9.0, 10.0];
/// let c = [11.0, 12.0, 13.0, 14.0, 15.0];
/// let r = kruskal_wallis_test(&[&a, &b, &c], &TestConfig::default()).unwrap();
/// assert!(r.rejects_null());
/// ```
pub fn kruskal_wallis_test(groups: &[&[f64]], config: &TestConfig) -> Result<TestResult> {
    config.validate()?;
    check_group_count(groups.len(), NAME)?;
    let mut warnings = Vec::new();
    for (i, g) in groups.iter().enumerate() {
        if g.is_empty() {
            return Err(InferenceError::insufficient(NAME, 1, 0));
        }
        ensure_finite(g, NAME)?;
        if g.len() < SMALL_GROUP {
            warnings.push(format!(
                "group {i} has {} observations; the approximation expects at least {SMALL_GROUP}",
                g.len()
            ));
        }
    }

    let k = groups.len();
    let ranks = group_rank_sums(groups);
    let total = ranks.total;
    if total <= k {
        return Err(InferenceError::insufficient(NAME, k + 1, total));
    }

    let nf = total as f64;
    let kf = k as f64;
    let sum_sq: f64 = ranks
        .rank_sums
        .iter()
        .zip(&ranks.sizes)
        .map(|(r, &size)| r * r / size as f64)
        .sum();
    let raw = 12.0 / (nf * (nf + 1.0)) * sum_sq - 3.0 * (nf + 1.0);
    let tie_correction = ranks.tie_correction();
    let corrected = if tie_correction > 0.0 {
        raw / tie_correction
    } else {
        warnings.push("all observations are tied".to_string());
        raw
    };
    let h = corrected.max(0.0);

    let denom = nf - 1.0 - h;
    let h_adjusted = if denom > 0.0 {
        h / 2.0 * (1.0 + (nf - kf) / denom)
    } else {
        f64::INFINITY
    };

    let f_quantile = FisherF::new(kf - 1.0, nf - kf)?.quantile(1.0 - config.alpha)?;
    let chi = ChiSquared::new(kf - 1.0)?;
    let chi_squared_quantile = chi.quantile(1.0 - config.alpha)?;
    let critical = 0.5 * ((kf - 1.0) * f_quantile + chi_squared_quantile);
    let p_value = chi.sf(h);
    debug!(h, h_adjusted, critical, "Kruskal-Wallis statistic");

    Ok(TestResult {
        procedure: ProcedureKind::KruskalWallis,
        statistic: h_adjusted,
        df: DegreesOfFreedom::Two(kf - 1.0, nf - kf),
        critical_value: Some(critical),
        p_value: Some(p_value),
        decision: Decision::from_rejection(h_adjusted > critical),
        alpha: config.alpha,
        two_sided: config.two_sided,
        details: TestDetails::KruskalWallis(KruskalWallisDetails {
            h,
            h_adjusted,
            ranks,
            tie_correction,
            f_quantile,
            chi_squared_quantile,
        }),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(r: &TestResult) -> &KruskalWallisDetails {
        match &r.details {
            TestDetails::KruskalWallis(d) => d,
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn test_separated_groups() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [6.0, 7.0, 8.0, 9.0, 10.0];
        let c = [11.0, 12.0, 13.0, 14.0, 15.0];
        let r = kruskal_wallis_test(&[&a, &b, &c], &TestConfig::default()).unwrap();
        let d = details(&r);
        assert!((d.h - 12.5).abs() < 1e-10, "H = {}", d.h);
        assert!((r.statistic - 56.25).abs() < 1e-9, "H1 = {}", r.statistic);
        assert_eq!(r.df, DegreesOfFreedom::Two(2.0, 12.0));
        // 0.5 * (2 * F(0.95; 2, 12) + chi2(0.95; 2))
        let expected = 0.5 * (2.0 * 3.885293834652 + 5.991464547107979);
        assert!((r.critical_value.unwrap() - expected).abs() < 1e-5);
        assert!(r.rejects_null());
        assert!((r.p_value.unwrap() - (-6.25_f64).exp()).abs() < 1e-9);
        assert_eq!(d.ranks.rank_sums, vec![15.0, 40.0, 65.0]);
        assert_eq!(d.tie_correction, 1.0);
    }

    #[test]
    fn test_interleaved_groups() {
        let a = [1.0, 4.0, 7.0, 10.0, 13.0];
        let b = [2.0, 5.0, 8.0, 11.0, 14.0];
        let c = [3.0, 6.0, 9.0, 12.0, 15.0];
        let r = kruskal_wallis_test(&[&a, &b, &c], &TestConfig::default()).unwrap();
        assert!((details(&r).h - 0.5).abs() < 1e-10);
        assert!((r.statistic - 0.25 * (1.0 + 12.0 / 13.5)).abs() < 1e-10);
        assert_eq!(r.decision, Decision::RetainNull);
    }

    #[test]
    fn test_tie_correction_applied() {
        let a = [1.0, 2.0, 2.0, 3.0];
        let b = [2.0, 3.0, 3.0, 4.0];
        let c = [4.0, 4.0, 5.0, 6.0];
        let r = kruskal_wallis_test(&[&a, &b, &c], &TestConfig::default()).unwrap();
        let d = details(&r);
        assert!(d.tie_correction < 1.0);

        let ranks = &d.ranks;
        let n = ranks.total as f64;
        let sum_sq: f64 = ranks
            .rank_sums
            .iter()
            .zip(&ranks.sizes)
            .map(|(r, &s)| r * r / s as f64)
            .sum();
        let raw = 12.0 / (n * (n + 1.0)) * sum_sq - 3.0 * (n + 1.0);
        assert!((d.h - raw / d.tie_correction).abs() < 1e-10);
    }

    #[test]
    fn test_all_tied() {
        let a = [2.0, 2.0, 2.0];
        let b = [2.0, 2.0, 2.0];
        let r = kruskal_wallis_test(&[&a, &b], &TestConfig::default()).unwrap();
        assert!(details(&r).h.abs() < 1e-12);
        assert_eq!(r.decision, Decision::RetainNull);
        assert!(r.warnings.iter().any(|w| w.contains("tied")));
    }

    #[test]
    fn test_small_group_warns() {
        let a = [1.0, 2.0];
        let b = [3.0, 4.0, 5.0];
        let r = kruskal_wallis_test(&[&a, &b], &TestConfig::default()).unwrap();
        assert_eq!(r.warnings.len(), 1);
        assert!(r.warnings[0].starts_with("group 0"));
    }

    #[test]
    fn test_preconditions() {
        let config = TestConfig::default();
        let a = [1.0, 2.0, 3.0];
        assert!(matches!(
            kruskal_wallis_test(&[&a], &config),
            Err(InferenceError::InsufficientData { .. })
        ));
        assert!(matches!(
            kruskal_wallis_test(&[&a, &[]], &config),
            Err(InferenceError::InsufficientData { actual: 0, .. })
        ));
        // N must exceed k
        assert!(matches!(
            kruskal_wallis_test(&[&[1.0], &[2.0]], &config),
            Err(InferenceError::InsufficientData { expected: 3, actual: 2, .. })
        ));
        assert!(kruskal_wallis_test(&[&a, &[1.0, f64::NAN]], &config).is_err());
    }
}
