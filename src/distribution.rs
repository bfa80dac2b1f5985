//! Continuous distributions used by the tests and estimators.
//!
//! Each distribution exposes its CDF, survival function, PDF and quantile
//! through [`ContinuousDistribution`]. Degrees of freedom may be fractional.
//!
//! | Distribution | Parameters | CDF via |
//! |---|---|---|
//! | [`Normal`] | μ, σ | `u_numflow::special` (AS 241 quantile) |
//! | [`StudentT`] | ν | regularized incomplete beta |
//! | [`FisherF`] | ν₁, ν₂ | regularized incomplete beta |
//! | [`ChiSquared`] | k | regularized lower incomplete gamma |
//! | [`Weibull`] | k (shape), λ (scale) | closed form |
//!
//! Quantiles of the t, F and χ² families start from a closed-form
//! approximation and are polished by a bracketed Newton iteration, so
//! `cdf(quantile(p))` reproduces `p` to about 1e-12 and quantiles are
//! monotone in `p`.
//!
//! # Examples
//!
//! ```
//! use u_inference::distribution::{ContinuousDistribution, StudentT};
//!
//! let t = StudentT::new(10.0).unwrap();
//! let q = t.quantile(0.975).unwrap();
//! assert!((q - 2.228138851986).abs() < 1e-9);
//! assert!((t.cdf(q) - 0.975).abs() < 1e-12);
//! ```

use statrs::function::beta::{beta_reg, ln_beta};
use statrs::function::gamma::{gamma, gamma_lr, gamma_ur, ln_gamma};
use u_numflow::special;

use crate::error::{InferenceError, Result};

/// Maximum Newton/bisection steps when inverting a CDF.
const MAX_QUANTILE_ITER: usize = 300;

/// Bracket expansion guard (each step doubles the search width).
const MAX_BRACKET_STEPS: usize = 2000;

/// Evaluation interface shared by all distributions in this module.
pub trait ContinuousDistribution {
    /// Cumulative distribution function P(X ≤ x).
    fn cdf(&self, x: f64) -> f64;

    /// Survival function P(X > x).
    fn sf(&self, x: f64) -> f64 {
        1.0 - self.cdf(x)
    }

    /// Probability density at x.
    fn pdf(&self, x: f64) -> f64;

    /// Inverse CDF.
    ///
    /// # Errors
    /// [`InferenceError::InvalidParameter`] when `p` is outside (0, 1).
    fn quantile(&self, p: f64) -> Result<f64>;
}

fn check_probability(p: f64) -> Result<()> {
    if p > 0.0 && p < 1.0 {
        Ok(())
    } else {
        Err(InferenceError::invalid_probability(p))
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InferenceError::InvalidParameter(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

/// Inverts a monotone CDF by bracketing around `guess` and running a
/// safeguarded Newton iteration (bisection whenever Newton leaves the bracket).
fn invert_cdf<D>(dist: &D, p: f64, guess: f64, lower_bound: f64) -> f64
where
    D: ContinuousDistribution + ?Sized,
{
    let mut x0 = guess;
    if !x0.is_finite() || x0 <= lower_bound {
        x0 = if lower_bound.is_finite() {
            lower_bound + 1.0
        } else {
            0.0
        };
    }

    let (mut lo, mut hi);
    if dist.cdf(x0) < p {
        lo = x0;
        let mut step = x0.abs().max(1.0);
        hi = x0 + step;
        let mut guard = 0;
        while dist.cdf(hi) < p && guard < MAX_BRACKET_STEPS {
            lo = hi;
            step *= 2.0;
            hi = x0 + step;
            guard += 1;
        }
    } else {
        hi = x0;
        if lower_bound.is_finite() {
            lo = lower_bound + 0.5 * (x0 - lower_bound);
            let mut guard = 0;
            while dist.cdf(lo) >= p && guard < MAX_BRACKET_STEPS {
                hi = lo;
                lo = lower_bound + 0.5 * (lo - lower_bound);
                guard += 1;
            }
            if dist.cdf(lo) >= p {
                lo = lower_bound;
            }
        } else {
            let mut step = x0.abs().max(1.0);
            lo = x0 - step;
            let mut guard = 0;
            while dist.cdf(lo) >= p && guard < MAX_BRACKET_STEPS {
                hi = lo;
                step *= 2.0;
                lo = x0 - step;
                guard += 1;
            }
        }
    }

    let mut x = x0;
    for _ in 0..MAX_QUANTILE_ITER {
        let f = dist.cdf(x) - p;
        if f == 0.0 {
            return x;
        }
        if f < 0.0 {
            lo = lo.max(x);
        } else {
            hi = hi.min(x);
        }

        let density = dist.pdf(x);
        let newton = x - f / density;
        let next = if density > 0.0 && newton.is_finite() && newton > lo && newton < hi {
            newton
        } else {
            0.5 * (lo + hi)
        };

        let scale = next.abs().max(f64::MIN_POSITIVE);
        if (next - x).abs() <= 4.0 * f64::EPSILON * scale
            || (hi - lo) <= 4.0 * f64::EPSILON * hi.abs().max(lo.abs())
        {
            return next;
        }
        x = next;
    }
    x
}

// ============================================================================
// Normal
// ============================================================================

/// Normal distribution N(μ, σ²).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    mean: f64,
    std_dev: f64,
}

impl Normal {
    /// # Errors
    /// `InvalidParameter` if `mean` is not finite or `std_dev` is not positive.
    pub fn new(mean: f64, std_dev: f64) -> Result<Self> {
        if !mean.is_finite() {
            return Err(InferenceError::InvalidParameter(format!(
                "normal mean must be finite, got {mean}"
            )));
        }
        check_positive("normal standard deviation", std_dev)?;
        Ok(Self { mean, std_dev })
    }

    /// N(0, 1).
    pub fn standard() -> Self {
        Self {
            mean: 0.0,
            std_dev: 1.0,
        }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }
}

impl ContinuousDistribution for Normal {
    fn cdf(&self, x: f64) -> f64 {
        special::standard_normal_cdf((x - self.mean) / self.std_dev)
    }

    fn sf(&self, x: f64) -> f64 {
        special::standard_normal_sf((x - self.mean) / self.std_dev)
    }

    fn pdf(&self, x: f64) -> f64 {
        special::standard_normal_pdf((x - self.mean) / self.std_dev) / self.std_dev
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        check_probability(p)?;
        Ok(self.mean + self.std_dev * special::inverse_normal_cdf(p))
    }
}

// ============================================================================
// Student's t
// ============================================================================

/// Student's t distribution with ν degrees of freedom (ν may be fractional).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudentT {
    df: f64,
}

impl StudentT {
    pub fn new(df: f64) -> Result<Self> {
        check_positive("t degrees of freedom", df)?;
        Ok(Self { df })
    }

    pub fn df(&self) -> f64 {
        self.df
    }

    /// P(|T| > |t|) / 2, computed without cancellation.
    fn half_tail(&self, t: f64) -> f64 {
        let x = self.df / (self.df + t * t);
        0.5 * beta_reg(0.5 * self.df, 0.5, x)
    }
}

impl ContinuousDistribution for StudentT {
    fn cdf(&self, t: f64) -> f64 {
        if t.is_nan() {
            return f64::NAN;
        }
        let tail = self.half_tail(t);
        if t > 0.0 {
            1.0 - tail
        } else {
            tail
        }
    }

    fn sf(&self, t: f64) -> f64 {
        if t.is_nan() {
            return f64::NAN;
        }
        let tail = self.half_tail(t);
        if t > 0.0 {
            tail
        } else {
            1.0 - tail
        }
    }

    fn pdf(&self, t: f64) -> f64 {
        let v = self.df;
        let ln_norm =
            ln_gamma(0.5 * (v + 1.0)) - ln_gamma(0.5 * v) - 0.5 * (v * std::f64::consts::PI).ln();
        (ln_norm - 0.5 * (v + 1.0) * (t * t / v).ln_1p()).exp()
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        check_probability(p)?;
        if p == 0.5 {
            return Ok(0.0);
        }
        // Cornish–Fisher expansion around the normal quantile
        let z = special::inverse_normal_cdf(p);
        let v = self.df;
        let g1 = (z.powi(3) + z) / 4.0;
        let g2 = (5.0 * z.powi(5) + 16.0 * z.powi(3) + 3.0 * z) / 96.0;
        let guess = z + g1 / v + g2 / (v * v);
        Ok(invert_cdf(self, p, guess, f64::NEG_INFINITY))
    }
}

// ============================================================================
// Fisher's F
// ============================================================================

/// Fisher–Snedecor F distribution with (ν₁, ν₂) degrees of freedom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FisherF {
    df1: f64,
    df2: f64,
}

impl FisherF {
    pub fn new(df1: f64, df2: f64) -> Result<Self> {
        check_positive("F numerator degrees of freedom", df1)?;
        check_positive("F denominator degrees of freedom", df2)?;
        Ok(Self { df1, df2 })
    }

    pub fn df1(&self) -> f64 {
        self.df1
    }

    pub fn df2(&self) -> f64 {
        self.df2
    }
}

impl ContinuousDistribution for FisherF {
    fn cdf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x <= 0.0 {
            return 0.0;
        }
        if x == f64::INFINITY {
            return 1.0;
        }
        let num = self.df1 * x;
        beta_reg(0.5 * self.df1, 0.5 * self.df2, num / (num + self.df2))
    }

    fn sf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x <= 0.0 {
            return 1.0;
        }
        if x == f64::INFINITY {
            return 0.0;
        }
        let num = self.df1 * x;
        beta_reg(0.5 * self.df2, 0.5 * self.df1, self.df2 / (num + self.df2))
    }

    fn pdf(&self, x: f64) -> f64 {
        let (d1, d2) = (self.df1, self.df2);
        if x < 0.0 {
            return 0.0;
        }
        if x == 0.0 {
            return if d1 < 2.0 {
                f64::INFINITY
            } else if d1 == 2.0 {
                1.0
            } else {
                0.0
            };
        }
        let ln_pdf = 0.5 * (d1 * d1.ln() + d2 * d2.ln()) + (0.5 * d1 - 1.0) * x.ln()
            - 0.5 * (d1 + d2) * (d1 * x + d2).ln()
            - ln_beta(0.5 * d1, 0.5 * d2);
        ln_pdf.exp()
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        check_probability(p)?;
        // log F is roughly normal with variance 2/ν₁ + 2/ν₂
        let z = special::inverse_normal_cdf(p);
        let guess = (z * (2.0 / self.df1 + 2.0 / self.df2).sqrt()).exp();
        Ok(invert_cdf(self, p, guess, 0.0))
    }
}

// ============================================================================
// Chi-squared
// ============================================================================

/// χ² distribution with k degrees of freedom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiSquared {
    df: f64,
}

impl ChiSquared {
    pub fn new(df: f64) -> Result<Self> {
        check_positive("chi-squared degrees of freedom", df)?;
        Ok(Self { df })
    }

    pub fn df(&self) -> f64 {
        self.df
    }
}

impl ContinuousDistribution for ChiSquared {
    fn cdf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x <= 0.0 {
            return 0.0;
        }
        if x == f64::INFINITY {
            return 1.0;
        }
        gamma_lr(0.5 * self.df, 0.5 * x)
    }

    fn sf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x <= 0.0 {
            return 1.0;
        }
        if x == f64::INFINITY {
            return 0.0;
        }
        gamma_ur(0.5 * self.df, 0.5 * x)
    }

    fn pdf(&self, x: f64) -> f64 {
        let k = self.df;
        if x < 0.0 {
            return 0.0;
        }
        if x == 0.0 {
            return if k < 2.0 {
                f64::INFINITY
            } else if k == 2.0 {
                0.5
            } else {
                0.0
            };
        }
        let half = 0.5 * k;
        ((half - 1.0) * x.ln() - 0.5 * x - half * std::f64::consts::LN_2 - ln_gamma(half)).exp()
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        check_probability(p)?;
        // Wilson–Hilferty cube-root approximation
        let z = special::inverse_normal_cdf(p);
        let h = 2.0 / (9.0 * self.df);
        let guess = self.df * (1.0 - h + z * h.sqrt()).powi(3);
        Ok(invert_cdf(self, p, guess, 0.0))
    }
}

// ============================================================================
// Weibull
// ============================================================================

/// Two-parameter Weibull distribution with shape k and scale λ.
///
/// F(x) = 1 − exp(−(x/λ)ᵏ) for x ≥ 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weibull {
    shape: f64,
    scale: f64,
}

impl Weibull {
    pub fn new(shape: f64, scale: f64) -> Result<Self> {
        check_positive("Weibull shape", shape)?;
        check_positive("Weibull scale", scale)?;
        Ok(Self { shape, scale })
    }

    pub fn shape(&self) -> f64 {
        self.shape
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// λ Γ(1 + 1/k).
    pub fn mean(&self) -> f64 {
        self.scale * gamma(1.0 + 1.0 / self.shape)
    }

    /// λ² [Γ(1 + 2/k) − Γ(1 + 1/k)²].
    pub fn variance(&self) -> f64 {
        let g1 = gamma(1.0 + 1.0 / self.shape);
        let g2 = gamma(1.0 + 2.0 / self.shape);
        self.scale * self.scale * (g2 - g1 * g1)
    }

    /// λ (ln 2)^(1/k).
    pub fn median(&self) -> f64 {
        self.scale * std::f64::consts::LN_2.powf(1.0 / self.shape)
    }

    /// λ ((k − 1)/k)^(1/k) for k > 1, zero otherwise.
    pub fn mode(&self) -> f64 {
        if self.shape > 1.0 {
            self.scale * ((self.shape - 1.0) / self.shape).powf(1.0 / self.shape)
        } else {
            0.0
        }
    }
}

impl ContinuousDistribution for Weibull {
    fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        -(-(x / self.scale).powf(self.shape)).exp_m1()
    }

    fn sf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 1.0;
        }
        (-(x / self.scale).powf(self.shape)).exp()
    }

    fn pdf(&self, x: f64) -> f64 {
        let (k, lambda) = (self.shape, self.scale);
        if x < 0.0 {
            return 0.0;
        }
        if x == 0.0 {
            return if k < 1.0 {
                f64::INFINITY
            } else if k == 1.0 {
                1.0 / lambda
            } else {
                0.0
            };
        }
        let z = x / lambda;
        (k / lambda) * z.powf(k - 1.0) * (-z.powf(k)).exp()
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        check_probability(p)?;
        Ok(self.scale * (-(-p).ln_1p()).powf(1.0 / self.shape))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use statrs::distribution::ContinuousCDF;

    #[test]
    fn test_normal_quantile_reference_values() {
        let n = Normal::standard();
        assert_relative_eq!(n.quantile(0.975).unwrap(), 1.959963984540054, epsilon = 1e-12);
        assert_relative_eq!(n.quantile(0.5).unwrap(), 0.0, epsilon = 1e-14);
        assert_relative_eq!(n.quantile(0.01).unwrap(), -2.326347874040841, epsilon = 1e-12);
        assert_relative_eq!(n.quantile(1e-10).unwrap(), -6.361340902404056, epsilon = 1e-9);
    }

    #[test]
    fn test_normal_shifted() {
        let n = Normal::new(10.0, 2.0).unwrap();
        assert_relative_eq!(n.cdf(10.0), 0.5, epsilon = 1e-15);
        assert_relative_eq!(n.quantile(0.975).unwrap(), 10.0 + 2.0 * 1.959963984540054, epsilon = 1e-10);
        assert_relative_eq!(n.pdf(10.0), 0.19947114020071635, epsilon = 1e-14);
    }

    #[test]
    fn test_t_quantile_reference_values() {
        let cases = [
            (10.0, 0.975, 2.228138851986274),
            (1.0, 0.975, 12.706204736174698),
            (8.0, 0.995, 3.355387331329479),
            (30.0, 0.95, 1.697260886943300),
            (2.0, 0.025, -4.302652729749464),
        ];
        for (df, p, expected) in cases {
            let q = StudentT::new(df).unwrap().quantile(p).unwrap();
            assert_relative_eq!(q, expected, epsilon = 1e-8, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_t_cdf_matches_statrs() {
        for &df in &[0.7, 1.0, 3.5, 12.0, 150.0] {
            let ours = StudentT::new(df).unwrap();
            let reference = statrs::distribution::StudentsT::new(0.0, 1.0, df).unwrap();
            for &t in &[-8.0, -2.1, -0.3, 0.0, 0.4, 1.7, 5.0] {
                assert_relative_eq!(ours.cdf(t), reference.cdf(t), epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_t_sf_symmetry() {
        let t = StudentT::new(6.0).unwrap();
        for &x in &[0.5, 1.3, 4.0] {
            assert_relative_eq!(t.sf(x), t.cdf(-x), epsilon = 1e-14);
        }
    }

    #[test]
    fn test_chi_squared_quantile_reference_values() {
        let cases = [
            (1.0, 0.95, 3.841458820694124),
            (4.0, 0.95, 9.487729036781154),
            (10.0, 0.95, 18.307038053275146),
            (2.0, 0.05, 0.10258658877510107),
        ];
        for (df, p, expected) in cases {
            let q = ChiSquared::new(df).unwrap().quantile(p).unwrap();
            assert_relative_eq!(q, expected, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_chi_squared_cdf_matches_statrs() {
        for &df in &[0.5, 1.0, 2.0, 7.3, 40.0] {
            let ours = ChiSquared::new(df).unwrap();
            let reference = statrs::distribution::ChiSquared::new(df).unwrap();
            for &x in &[0.01, 0.5, 1.0, 4.0, 12.0, 60.0] {
                assert_relative_eq!(ours.cdf(x), reference.cdf(x), epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_f_quantile_reference_values() {
        let cases = [
            (3.0, 10.0, 0.95, 3.708264819),
            (1.0, 1.0, 0.95, 161.4476387),
            (4.0, 7.0, 0.975, 5.5226),
        ];
        for (d1, d2, p, expected) in cases {
            let q = FisherF::new(d1, d2).unwrap().quantile(p).unwrap();
            assert_relative_eq!(q, expected, max_relative = 1e-3);
        }
    }

    #[test]
    fn test_f_cdf_matches_statrs() {
        let ours = FisherF::new(4.5, 11.0).unwrap();
        let reference = statrs::distribution::FisherSnedecor::new(4.5, 11.0).unwrap();
        for &x in &[0.05, 0.5, 1.0, 2.5, 9.0] {
            assert_relative_eq!(ours.cdf(x), reference.cdf(x), epsilon = 1e-10);
            assert_relative_eq!(ours.sf(x), 1.0 - reference.cdf(x), epsilon = 1e-10);
        }
    }

    #[test]
    fn test_quantile_rejects_out_of_range_probability() {
        let t = StudentT::new(5.0).unwrap();
        for p in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            assert!(matches!(
                t.quantile(p),
                Err(InferenceError::InvalidParameter(_))
            ));
        }
        assert!(ChiSquared::new(3.0).unwrap().quantile(1.0).is_err());
        assert!(FisherF::new(3.0, 4.0).unwrap().quantile(0.0).is_err());
        assert!(Normal::standard().quantile(0.0).is_err());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(StudentT::new(0.0).is_err());
        assert!(FisherF::new(1.0, -2.0).is_err());
        assert!(ChiSquared::new(f64::NAN).is_err());
        assert!(Normal::new(0.0, 0.0).is_err());
        assert!(Weibull::new(1.0, 0.0).is_err());
    }

    #[test]
    fn test_weibull_characteristics() {
        // Shape 1 is the exponential distribution
        let w = Weibull::new(1.0, 2.0).unwrap();
        assert_relative_eq!(w.mean(), 2.0, epsilon = 1e-10);
        assert_relative_eq!(w.variance(), 4.0, epsilon = 1e-9);
        assert_relative_eq!(w.median(), 2.0 * std::f64::consts::LN_2, epsilon = 1e-12);
        assert_eq!(w.mode(), 0.0);

        let w = Weibull::new(2.0, 1.0).unwrap();
        assert_relative_eq!(w.mode(), 0.5_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(w.cdf(w.median()), 0.5, epsilon = 1e-12);
        assert_relative_eq!(w.quantile(w.cdf(1.3)).unwrap(), 1.3, epsilon = 1e-12);
    }

    #[test]
    fn test_fractional_degrees_of_freedom() {
        let t = StudentT::new(2.5).unwrap();
        let q = t.quantile(0.9).unwrap();
        assert_relative_eq!(t.cdf(q), 0.9, epsilon = 1e-12);

        let chi = ChiSquared::new(0.3).unwrap();
        let q = chi.quantile(0.2).unwrap();
        assert_relative_eq!(chi.cdf(q), 0.2, epsilon = 1e-12);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn t_quantile_round_trip(df in 1.0_f64..200.0, p in 0.001_f64..0.999) {
            let t = StudentT::new(df).unwrap();
            let q = t.quantile(p).unwrap();
            prop_assert!((t.cdf(q) - p).abs() < 1e-10, "df={}, p={}, q={}", df, p, q);
        }

        #[test]
        fn chi_squared_quantile_round_trip(df in 0.5_f64..200.0, p in 0.001_f64..0.999) {
            let chi = ChiSquared::new(df).unwrap();
            let q = chi.quantile(p).unwrap();
            prop_assert!(q > 0.0);
            prop_assert!((chi.cdf(q) - p).abs() < 1e-10, "df={}, p={}, q={}", df, p, q);
        }

        #[test]
        fn f_quantile_round_trip(
            df1 in 1.0_f64..100.0,
            df2 in 1.0_f64..100.0,
            p in 0.001_f64..0.999,
        ) {
            let f = FisherF::new(df1, df2).unwrap();
            let q = f.quantile(p).unwrap();
            prop_assert!((f.cdf(q) - p).abs() < 1e-10, "df=({}, {}), p={}, q={}", df1, df2, p, q);
        }

        #[test]
        fn normal_quantile_round_trip(p in 1e-12_f64..(1.0 - 1e-12)) {
            let n = Normal::standard();
            let q = n.quantile(p).unwrap();
            prop_assert!((n.cdf(q) - p).abs() < 1e-10 * p.max(1e-2));
        }

        #[test]
        fn quantiles_are_monotone(df in 1.0_f64..60.0, p in 0.01_f64..0.98, dp in 1e-4_f64..0.01) {
            let t = StudentT::new(df).unwrap();
            prop_assert!(t.quantile(p).unwrap() < t.quantile(p + dp).unwrap());
            let chi = ChiSquared::new(df).unwrap();
            prop_assert!(chi.quantile(p).unwrap() < chi.quantile(p + dp).unwrap());
            let f = FisherF::new(df, df + 1.0).unwrap();
            prop_assert!(f.quantile(p).unwrap() < f.quantile(p + dp).unwrap());
        }
    }
}
