//! Shapiro–Wilk test for normality.
//!
//! Coefficients come from the published table for n ≤ 10 and from Royston's
//! polynomial approximation (AS R94) beyond. Critical values are interpolated
//! from the Shapiro–Wilk table where it applies and obtained by inverting
//! Royston's normalizing transformation otherwise.

use std::f64::consts::PI;

use tracing::{debug, warn};
use u_numflow::special;

use crate::config::TestConfig;
use crate::error::{ensure_finite, InferenceError, Result};
use crate::result::{
    CriticalSource, Decision, DegreesOfFreedom, ProcedureKind, ShapiroWilkDetails, TestDetails,
    TestResult,
};
use crate::stats::Summary;

const NAME: &str = "Shapiro-Wilk";

/// Largest n covered by the critical-value table.
const TABLE_MAX_N: usize = 50;

/// Upper end of the range Royston's approximation was fitted on.
const ROYSTON_MAX_N: usize = 5000;

/// Shapiro & Wilk (1965), coefficients a₁..a₍ₙ/₂₎ for n = 3..=10.
const COEFFICIENTS: [&[f64]; 8] = [
    &[0.7071],
    &[0.6872, 0.1677],
    &[0.6646, 0.2413],
    &[0.6431, 0.2806, 0.0875],
    &[0.6233, 0.3031, 0.1401],
    &[0.6052, 0.3164, 0.1743, 0.0561],
    &[0.5888, 0.3244, 0.1976, 0.0947],
    &[0.5739, 0.3291, 0.2141, 0.1224, 0.0399],
];

/// Significance levels of the critical-value table columns.
const TABLE_ALPHAS: [f64; 4] = [0.01, 0.02, 0.05, 0.10];

/// Shapiro & Wilk (1965), Table 6: lower critical values of W.
const CRITICAL_TABLE: [(usize, [f64; 4]); 24] = [
    (3, [0.753, 0.756, 0.767, 0.789]),
    (4, [0.687, 0.707, 0.748, 0.792]),
    (5, [0.686, 0.715, 0.762, 0.806]),
    (6, [0.713, 0.743, 0.788, 0.826]),
    (7, [0.730, 0.760, 0.803, 0.838]),
    (8, [0.749, 0.778, 0.818, 0.851]),
    (9, [0.764, 0.791, 0.829, 0.859]),
    (10, [0.781, 0.806, 0.842, 0.869]),
    (11, [0.792, 0.817, 0.850, 0.876]),
    (12, [0.805, 0.828, 0.859, 0.883]),
    (13, [0.814, 0.837, 0.866, 0.889]),
    (14, [0.825, 0.846, 0.874, 0.895]),
    (15, [0.835, 0.855, 0.881, 0.901]),
    (16, [0.844, 0.863, 0.887, 0.906]),
    (17, [0.851, 0.869, 0.892, 0.910]),
    (18, [0.858, 0.874, 0.897, 0.914]),
    (19, [0.863, 0.879, 0.901, 0.917]),
    (20, [0.868, 0.884, 0.905, 0.920]),
    (25, [0.888, 0.901, 0.918, 0.931]),
    (30, [0.900, 0.912, 0.927, 0.939]),
    (35, [0.910, 0.920, 0.934, 0.944]),
    (40, [0.919, 0.928, 0.940, 0.949]),
    (45, [0.926, 0.933, 0.945, 0.953]),
    (50, [0.930, 0.937, 0.947, 0.955]),
];

// Royston polynomial coefficients (AS R94)
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

/// c[0] + c[1]x + c[2]x² + …
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

/// Shapiro–Wilk coefficients a₁ ≥ a₂ ≥ … for the ⌊n/2⌋ outermost pairs of
/// order statistics.
///
/// The published table is used for n ≤ 10. Larger n use Royston's
/// approximation: Blom scores mᵢ = Φ⁻¹((i − 0.375)/(n + 0.25)), normalized,
/// with polynomial corrections to the two outermost coefficients.
///
/// # Errors
/// `InsufficientData` for n < 3.
///
/// # Examples
///
/// ```
/// use u_inference::testing::shapiro_wilk_coefficients;
///
/// assert_eq!(shapiro_wilk_coefficients(10).unwrap().len(), 5);
/// let a = shapiro_wilk_coefficients(30).unwrap();
/// let norm: f64 = a.iter().map(|c| 2.0 * c * c).sum();
/// assert!((norm - 1.0).abs() < 1e-9);
/// ```
pub fn shapiro_wilk_coefficients(n: usize) -> Result<Vec<f64>> {
    if n < 3 {
        return Err(InferenceError::insufficient(NAME, 3, n));
    }
    if let Some(table) = COEFFICIENTS.get(n - 3) {
        return Ok(table.to_vec());
    }

    let half = n / 2;
    let nf = n as f64;
    let m: Vec<f64> = (1..=half)
        .map(|i| special::inverse_normal_cdf((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    let a2 = poly(&C2, rsn) - m[1] / ssumm2;
    let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
        / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
        .sqrt();

    let mut a = Vec::with_capacity(half);
    a.push(a1);
    a.push(a2);
    a.extend(m[2..].iter().map(|mi| -mi / fac));
    Ok(a)
}

/// Shapiro–Wilk test: H₀: the sample is drawn from a normal distribution.
///
/// # Algorithm
///
/// ```text
/// b = Σ aᵢ (x₍ₙ₊₁₋ᵢ₎ − x₍ᵢ₎)     W = b² / Σ(x − x̄)²
/// ```
///
/// Normality is retained when W ≥ W_crit. W_crit is interpolated from the
/// Shapiro–Wilk table (linearly in n and in ln α) when n ≤ 50 and
/// 0.01 ≤ α ≤ 0.10; otherwise Royston's transformation is inverted at α.
/// The p-value follows Royston (1995), exact for n = 3. The test is
/// inherently one-sided; `two_sided` is ignored.
///
/// A constant sample yields the sentinel W = 1, p = 1 with a warning.
///
/// # Errors
/// `InsufficientData` for n < 3, `InvalidParameter` for non-finite values or
/// an invalid alpha.
///
/// # References
///
/// - Shapiro & Wilk (1965), "An analysis of variance test for normality",
///   *Biometrika* 52(3–4), 591–611.
/// - Royston (1995), "Remark AS R94", *Applied Statistics* 44(4), 547–551.
///
/// # Examples
///
/// ```
/// use u_inference::config::TestConfig;
/// use u_inference::testing::shapiro_wilk_test;
///
/// let data = [-2.0, -1.5, -1.0, -0.5, 0.0, 0.0, 0.5, 1.0, 1.5, 2.0];
/// let r = shapiro_wilk_test(&data, &TestConfig::default()).unwrap();
/// assert!(r.statistic > 0.95);
/// assert!(!r.rejects_null());
/// ```
pub fn shapiro_wilk_test(data: &[f64], config: &TestConfig) -> Result<TestResult> {
    config.validate()?;
    let n = data.len();
    if n < 3 {
        return Err(InferenceError::insufficient(NAME, 3, n));
    }
    ensure_finite(data, NAME)?;

    let mut warnings = Vec::new();
    if n > ROYSTON_MAX_N {
        warn!(n, "Shapiro-Wilk beyond the fitted range of the approximation");
        warnings.push(format!(
            "n = {n} exceeds {ROYSTON_MAX_N}; Royston's approximation is unvalidated here"
        ));
    } else if n > TABLE_MAX_N {
        warnings.push(format!(
            "n = {n} exceeds {TABLE_MAX_N}; critical value from Royston's approximation"
        ));
    }

    let mut x = data.to_vec();
    x.sort_by(f64::total_cmp);
    let coefficients = shapiro_wilk_coefficients(n)?;
    let (critical, critical_source) = critical_w(n, config.alpha);

    let sum_sq_dev = Summary::of(&x).map_or(0.0, |s| s.sum_sq_dev());
    let b: f64 = coefficients
        .iter()
        .enumerate()
        .map(|(i, a)| a * (x[n - 1 - i] - x[i]))
        .sum();

    let (w, p_value) = if x[n - 1] == x[0] || sum_sq_dev <= 0.0 {
        warnings.push("sample is constant; W set to 1".to_string());
        (1.0, 1.0)
    } else {
        let w = (b * b / sum_sq_dev).min(1.0);
        (w, royston_p_value(w, n))
    };
    debug!(w, critical, p_value, ?critical_source, "Shapiro-Wilk statistic");

    Ok(TestResult {
        procedure: ProcedureKind::ShapiroWilk,
        statistic: w,
        df: DegreesOfFreedom::NotApplicable,
        critical_value: Some(critical),
        p_value: Some(p_value),
        decision: Decision::from_rejection(w < critical),
        alpha: config.alpha,
        two_sided: config.two_sided,
        details: TestDetails::ShapiroWilk(ShapiroWilkDetails {
            n,
            b,
            sum_sq_dev,
            coefficients,
            critical_source,
        }),
        warnings,
    })
}

/// Lower critical value of W at level `alpha`.
fn critical_w(n: usize, alpha: f64) -> (f64, CriticalSource) {
    if n <= TABLE_MAX_N && (TABLE_ALPHAS[0]..=TABLE_ALPHAS[3]).contains(&alpha) {
        (table_critical(n, alpha), CriticalSource::Table)
    } else {
        (royston_critical(n, alpha), CriticalSource::Royston)
    }
}

fn table_critical(n: usize, alpha: f64) -> f64 {
    let row = |i: usize| interpolate_alpha(&CRITICAL_TABLE[i].1, alpha);
    let upper = CRITICAL_TABLE
        .iter()
        .position(|&(size, _)| size >= n)
        .unwrap_or(CRITICAL_TABLE.len() - 1);
    let (n_hi, _) = CRITICAL_TABLE[upper];
    if n_hi == n || upper == 0 {
        return row(upper);
    }
    let (n_lo, _) = CRITICAL_TABLE[upper - 1];
    let t = (n - n_lo) as f64 / (n_hi - n_lo) as f64;
    row(upper - 1) + t * (row(upper) - row(upper - 1))
}

/// Interpolates one table row linearly in ln α.
fn interpolate_alpha(row: &[f64; 4], alpha: f64) -> f64 {
    let j = TABLE_ALPHAS
        .windows(2)
        .position(|w| alpha <= w[1])
        .unwrap_or(TABLE_ALPHAS.len() - 2);
    let (a0, a1) = (TABLE_ALPHAS[j], TABLE_ALPHAS[j + 1]);
    let t = (alpha.ln() - a0.ln()) / (a1.ln() - a0.ln());
    row[j] + t * (row[j + 1] - row[j])
}

/// Inverts Royston's transformation: the W whose p-value equals `alpha`.
fn royston_critical(n: usize, alpha: f64) -> f64 {
    if n == 3 {
        return ((1.0 - alpha) * PI / 6.0).cos().powi(2);
    }
    let nf = n as f64;
    let z = special::inverse_normal_cdf(1.0 - alpha);
    let y = if n <= 11 {
        let y2 = poly(&C3, nf) + poly(&C4, nf).exp() * z;
        poly(&G, nf) - (-y2).exp()
    } else {
        let ln_n = nf.ln();
        poly(&C5, ln_n) + poly(&C6, ln_n).exp() * z
    };
    1.0 - y.exp()
}

/// Royston (1995) upper-tail p-value of the normalized W.
fn royston_p_value(w: f64, n: usize) -> f64 {
    if n == 3 {
        let w = w.max(0.75);
        return (1.0 - (6.0 / PI) * w.sqrt().acos()).clamp(0.0, 1.0);
    }
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return 1.0;
    }
    let y = w1.ln();
    let nf = n as f64;
    let z = if n <= 11 {
        let gamma = poly(&G, nf);
        if y >= gamma {
            return 0.0;
        }
        let y2 = -(gamma - y).ln();
        (y2 - poly(&C3, nf)) / poly(&C4, nf).exp()
    } else {
        let ln_n = nf.ln();
        (y - poly(&C5, ln_n)) / poly(&C6, ln_n).exp()
    };
    special::standard_normal_sf(z).clamp(0.0, 1.0)
}
