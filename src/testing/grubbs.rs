//! Grubbs test for a single outlier at either extreme.

use tracing::{debug, warn};

use super::{checked_summary, shapiro_wilk_test};
use crate::config::TestConfig;
use crate::distribution::{ContinuousDistribution, StudentT};
use crate::error::{InferenceError, Result};
use crate::result::{
    Decision, DegreesOfFreedom, ExtremeCheck, GrubbsDetails, ProcedureKind, TestDetails,
    TestResult,
};

const NAME: &str = "Grubbs";

/// Above this size the single-outlier model is rarely appropriate.
const LARGE_SAMPLE: usize = 50;

/// Smallest sample for which the normality screen is run.
const NORMALITY_SCREEN_MIN: usize = 8;

/// Grubbs test: H₀: the sample contains no outlier.
///
/// # Algorithm
///
/// With sample mean x̄ and standard deviation s (n − 1 denominator):
///
/// ```text
/// G_max = (x_max − x̄) / s        G_min = (x̄ − x_min) / s
/// G_crit = ((n − 1)/√n) · √(t² / (n − 2 + t²)),   t = t_{1−α'}(n − 2)
/// ```
///
/// where α' = α/(2n) for a two-sided configuration and α/n otherwise. Each
/// extreme is flagged when its statistic exceeds `G_crit`; H₀ is rejected if
/// either is flagged. The reported statistic is the larger of the two.
///
/// The test assumes normality. For n ≥ 8 a Shapiro–Wilk test at the same
/// alpha is run alongside and a warning is attached when it rejects; the
/// Grubbs decision itself does not depend on it.
///
/// # Errors
/// `InsufficientData` for n < 3, `InvalidParameter` for non-finite values,
/// a constant sample or an invalid alpha.
///
/// # References
///
/// Grubbs (1969), "Procedures for detecting outlying observations in
/// samples", *Technometrics* 11(1), 1–21.
///
/// # Examples
///
/// ```
/// use u_inference::config::TestConfig;
/// use u_inference::testing::grubbs_test;
///
/// let data = [9.8, 10.1, 10.0, 9.9, 10.2, 10.0, 15.0];
/// let r = grubbs_test(&data, &TestConfig::default()).unwrap();
/// assert!(r.rejects_null());
/// ```
pub fn grubbs_test(data: &[f64], config: &TestConfig) -> Result<TestResult> {
    config.validate()?;
    let summary = checked_summary(data, NAME, 3)?;
    let n = summary.n;
    let s = summary.std_dev();
    if s <= 0.0 {
        return Err(InferenceError::InvalidParameter(
            "Grubbs needs a sample with non-zero variance".into(),
        ));
    }

    let mut warnings = Vec::new();
    if n > LARGE_SAMPLE {
        warn!(n, "Grubbs test applied to a large sample");
        warnings.push(format!(
            "n = {n} exceeds {LARGE_SAMPLE}; Grubbs' single-outlier model is unreliable for large samples"
        ));
    }
    if n >= NORMALITY_SCREEN_MIN {
        if let Ok(sw) = shapiro_wilk_test(data, config) {
            if sw.rejects_null() {
                warnings.push(format!(
                    "Shapiro-Wilk rejects normality (W = {:.4}); Grubbs critical values assume a normal sample",
                    sw.statistic
                ));
            }
        }
    }

    let (min, max) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let g_max = (max - summary.mean) / s;
    let g_min = (summary.mean - min) / s;

    let nf = n as f64;
    let adjusted = if config.two_sided {
        config.alpha / (2.0 * nf)
    } else {
        config.alpha / nf
    };
    let t_dist = StudentT::new(nf - 2.0)?;
    let t = t_dist.quantile(1.0 - adjusted)?;
    let critical = (nf - 1.0) / nf.sqrt() * (t * t / (nf - 2.0 + t * t)).sqrt();

    let statistic = g_max.max(g_min);
    let p_value = bonferroni_p_value(statistic, n, &t_dist, config.two_sided);
    debug!(g_max, g_min, critical, "Grubbs statistics");

    let max_check = ExtremeCheck {
        value: max,
        statistic: g_max,
        is_outlier: g_max > critical,
    };
    let min_check = ExtremeCheck {
        value: min,
        statistic: g_min,
        is_outlier: g_min > critical,
    };

    Ok(TestResult {
        procedure: ProcedureKind::Grubbs,
        statistic,
        df: DegreesOfFreedom::One(nf - 2.0),
        critical_value: Some(critical),
        p_value: Some(p_value),
        decision: Decision::from_rejection(max_check.is_outlier || min_check.is_outlier),
        alpha: config.alpha,
        two_sided: config.two_sided,
        details: TestDetails::Grubbs(GrubbsDetails {
            n,
            mean: summary.mean,
            std_dev: s,
            max: max_check,
            min: min_check,
            t_quantile: t,
        }),
        warnings,
    })
}

/// Bonferroni upper bound on the p-value of G: n · P(T > t_G), doubled when
/// two-sided, where t_G inverts the critical-value formula.
fn bonferroni_p_value(g: f64, n: usize, t_dist: &StudentT, two_sided: bool) -> f64 {
    let nf = n as f64;
    let denom = (nf - 1.0).powi(2) - nf * g * g;
    if denom <= 0.0 {
        // G at its attainable maximum (n − 1)/√n
        return 0.0;
    }
    let t = (nf * (nf - 2.0) * g * g / denom).sqrt();
    let sides = if two_sided { 2.0 } else { 1.0 };
    (sides * nf * t_dist.sf(t)).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regression_sample_has_no_outlier() {
        let data = [4.12, 4.99, 5.12, 5.32, 5.55, 5.76, 5.87, 5.98, 6.03, 6.10];
        let r = grubbs_test(&data, &TestConfig::default()).unwrap();
        assert_eq!(r.decision, Decision::RetainNull);
        let TestDetails::Grubbs(d) = &r.details else {
            panic!("unexpected details");
        };
        assert!(!d.max.is_outlier && !d.min.is_outlier);
        // Critical value for n = 10, alpha = 0.05 two-sided is 2.290
        let critical = r.critical_value.unwrap();
        assert!((critical - 2.290).abs() < 2e-3, "G_crit = {critical}");
        assert!((d.min.statistic - 2.2136).abs() < 1e-3, "G_min = {}", d.min.statistic);
    }

    #[test]
    fn test_obvious_outlier() {
        let data = [9.8, 10.1, 10.0, 9.9, 10.2, 10.0, 15.0];
        let r = grubbs_test(&data, &TestConfig::default()).unwrap();
        assert!(r.rejects_null());
        let TestDetails::Grubbs(d) = &r.details else {
            panic!("unexpected details");
        };
        assert!(d.max.is_outlier);
        assert!(!d.min.is_outlier);
        assert_eq!(d.max.value, 15.0);
        assert!(r.p_value.unwrap() < 0.05);
    }

    #[test]
    fn test_low_outlier() {
        let data = [-40.0, 1.0, 2.0, 1.5, 2.5, 1.8, 2.2, 1.9];
        let r = grubbs_test(&data, &TestConfig::default()).unwrap();
        let TestDetails::Grubbs(d) = &r.details else {
            panic!("unexpected details");
        };
        assert!(d.min.is_outlier);
        assert_eq!(d.min.value, -40.0);
    }

    #[test]
    fn test_one_sided_critical_is_smaller() {
        let data = [4.12, 4.99, 5.12, 5.32, 5.55, 5.76, 5.87, 5.98, 6.03, 6.10];
        let two = grubbs_test(&data, &TestConfig::default()).unwrap();
        let one = grubbs_test(&data, &TestConfig::default().with_two_sided(false)).unwrap();
        assert!(one.critical_value.unwrap() < two.critical_value.unwrap());
    }

    #[test]
    fn test_large_sample_warns() {
        let data: Vec<f64> = (0..60).map(|i| (i as f64 * 0.37).sin()).collect();
        let r = grubbs_test(&data, &TestConfig::default()).unwrap();
        assert!(r.warnings.iter().any(|w| w.contains("exceeds 50")));
    }

    #[test]
    fn test_non_normal_sample_warns() {
        let mut data = vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5];
        data.extend_from_slice(&[9.5, 9.6, 9.7, 9.8, 9.9, 10.0]);
        let r = grubbs_test(&data, &TestConfig::default()).unwrap();
        assert!(r.warnings.iter().any(|w| w.contains("Shapiro-Wilk")));
    }

    #[test]
    fn test_preconditions() {
        let config = TestConfig::default();
        assert!(matches!(
            grubbs_test(&[1.0, 2.0], &config),
            Err(InferenceError::InsufficientData { expected: 3, actual: 2, .. })
        ));
        assert!(matches!(
            grubbs_test(&[3.0, 3.0, 3.0], &config),
            Err(InferenceError::InvalidParameter(_))
        ));
        assert!(grubbs_test(&[1.0, f64::NAN, 3.0], &config).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn statistic_bounded_by_sample_size(
            data in proptest::collection::vec(-1e3_f64..1e3, 3..=40),
        ) {
            prop_assume!(data.iter().any(|&v| v != data[0]));
            let r = grubbs_test(&data, &TestConfig::default()).unwrap();
            let n = data.len() as f64;
            // Samuelson's inequality
            prop_assert!(r.statistic <= (n - 1.0) / n.sqrt() + 1e-9);
            let p = r.p_value.unwrap();
            prop_assert!((0.0..=1.0).contains(&p));
        }

        #[test]
        fn decision_matches_p_value(
            data in proptest::collection::vec(-1e3_f64..1e3, 4..=40),
        ) {
            prop_assume!(data.iter().any(|&v| v != data[0]));
            let r = grubbs_test(&data, &TestConfig::default()).unwrap();
            let p = r.p_value.unwrap();
            if (p - r.alpha).abs() > 1e-4 {
                prop_assert_eq!(r.rejects_null(), p < r.alpha);
            }
        }
    }
}
