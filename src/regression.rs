//! Ordinary least squares and the normal order-statistic fit.
//!
//! [`least_squares`] solves the normal equations for an arbitrary design
//! matrix. [`normal_order_fit`] uses it to estimate the mean and standard
//! deviation of a normal sample by regressing the sorted observations on the
//! expected standard-normal order statistics.
//!
//! # Examples
//!
//! ```
//! use u_inference::linalg::Matrix;
//! use u_inference::regression::least_squares;
//!
//! let design = Matrix::from_rows(&[
//!     vec![1.0, 1.0],
//!     vec![1.0, 2.0],
//!     vec![1.0, 3.0],
//!     vec![1.0, 4.0],
//!     vec![1.0, 5.0],
//! ])
//! .unwrap();
//! let y = [2.1, 3.9, 6.1, 7.9, 10.1];
//! let fit = least_squares(&design, &y).unwrap();
//! assert!((fit.coefficients[1] - 2.0).abs() < 0.1);
//! assert!(fit.r_squared > 0.99);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use u_numflow::special;

use crate::error::{ensure_finite, InferenceError, Result};
use crate::linalg::Matrix;
use crate::result::{
    Characteristics, EstimationDetails, EstimationResult, NormalFitDetails, ParameterEstimate,
    ProcedureKind,
};
use crate::stats::Summary;

/// Result of an ordinary least-squares fit y = Xβ + ε.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeastSquaresFit {
    /// β, one entry per design column.
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub fitted: Vec<f64>,
    /// yᵢ − ŷᵢ.
    pub residuals: Vec<f64>,
    /// Σ residuals².
    pub sse: f64,
    /// SSE / (n − p).
    pub mse: f64,
    /// 1 − SSE/SST about the mean of y; 1 when y is constant.
    pub r_squared: f64,
    /// (XᵀX)⁻¹.
    pub design_inverse: Matrix,
    /// MSE · (XᵀX)⁻¹.
    pub covariance: Matrix,
}

/// Ordinary least squares via the normal equations, β = (XᵀX)⁻¹ Xᵀy.
///
/// R² is centered on the mean of y and so assumes the design carries an
/// intercept column.
///
/// # Errors
/// - `DimensionMismatch` if `design.rows() != y.len()`.
/// - `InsufficientData` unless there are more rows than columns.
/// - `InvalidParameter` for non-finite entries.
/// - `SingularMatrix` for a rank-deficient design.
pub fn least_squares(design: &Matrix, y: &[f64]) -> Result<LeastSquaresFit> {
    let (n, p) = design.shape();
    if n != y.len() {
        return Err(InferenceError::DimensionMismatch {
            left: design.shape(),
            right: (y.len(), 1),
        });
    }
    if n <= p {
        return Err(InferenceError::insufficient("least squares", p + 1, n));
    }
    ensure_finite(design.as_slice(), "design matrix")?;
    ensure_finite(y, "response")?;

    let xt = design.transpose();
    let design_inverse = xt.multiply(design)?.invert()?;
    let beta = design_inverse.multiply(&xt)?.multiply(&Matrix::column(y))?;
    let coefficients: Vec<f64> = beta.as_slice().to_vec();
    let fitted: Vec<f64> = design.multiply(&beta)?.as_slice().to_vec();

    let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(yi, fi)| yi - fi).collect();
    let sse: f64 = residuals.iter().map(|e| e * e).sum();
    let mse = sse / (n - p) as f64;
    let y_mean = y.iter().sum::<f64>() / n as f64;
    let sst: f64 = y.iter().map(|yi| (yi - y_mean).powi(2)).sum();
    let r_squared = if sst > 0.0 { 1.0 - sse / sst } else { 1.0 };

    let covariance = design_inverse.scaled(mse);
    let std_errors = covariance.diagonal().into_iter().map(f64::sqrt).collect();
    debug!(n, p, sse, r_squared, "least squares fit");

    Ok(LeastSquaresFit {
        coefficients,
        std_errors,
        fitted,
        residuals,
        sse,
        mse,
        r_squared,
        design_inverse,
        covariance,
    })
}

/// Approximate expected values of the standard-normal order statistics
/// E[Z₍ᵢ₎], i = 1..n.
///
/// # Algorithm
///
/// David–Johnson expansion of the quantile function Q = Φ⁻¹ around
/// pᵢ = i/(n + 1), with q = 1 − p and u = Q(p):
///
/// ```text
/// Q'' = u/φ²,  Q''' = (1 + 2u²)/φ³,  Q'''' = u(7 + 6u²)/φ⁴
/// E ≈ Q + pq Q''/(2(n+2)) + pq/(n+2)² [(q − p) Q'''/3 + pq Q''''/8]
/// ```
///
/// # References
///
/// David & Johnson (1954), "Statistical treatment of censored data, Part I",
/// *Biometrika* 41(1–2), 228–240.
pub fn expected_normal_order_statistics(n: usize) -> Vec<f64> {
    let n2 = n as f64 + 2.0;
    (1..=n)
        .map(|i| {
            let p = i as f64 / (n as f64 + 1.0);
            let q = 1.0 - p;
            let u = special::inverse_normal_cdf(p);
            let phi = special::standard_normal_pdf(u);
            let d2 = u / phi.powi(2);
            let d3 = (1.0 + 2.0 * u * u) / phi.powi(3);
            let d4 = u * (7.0 + 6.0 * u * u) / phi.powi(4);
            let pq = p * q;
            u + pq * d2 / (2.0 * n2) + pq / (n2 * n2) * ((q - p) * d3 / 3.0 + pq * d4 / 8.0)
        })
        .collect()
}

/// Estimates μ and σ of a normal sample by least squares on the order
/// statistics.
///
/// The sorted sample is regressed on [`expected_normal_order_statistics`];
/// the intercept estimates μ and the slope σ. The covariance of (μ, σ) is
/// MSE · (XᵀX)⁻¹.
///
/// # Errors
/// `InsufficientData` for n < 3, `InvalidParameter` for non-finite values.
///
/// # Examples
///
/// ```
/// use u_inference::regression::normal_order_fit;
///
/// let data = [4.12, 4.99, 5.12, 5.32, 5.55, 5.76, 5.87, 5.98, 6.03, 6.10];
/// let fit = normal_order_fit(&data).unwrap();
/// let mu = fit.parameter("mean").unwrap().value;
/// assert!((mu - 5.484).abs() < 1e-9);
/// ```
pub fn normal_order_fit(data: &[f64]) -> Result<EstimationResult> {
    let n = data.len();
    if n < 3 {
        return Err(InferenceError::insufficient("normal order fit", 3, n));
    }
    ensure_finite(data, "normal order fit")?;

    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let expected = expected_normal_order_statistics(n);
    let rows: Vec<Vec<f64>> = expected.iter().map(|&e| vec![1.0, e]).collect();
    let design = Matrix::from_rows(&rows)?;
    let fit = least_squares(&design, &sorted)?;

    let mu = fit.coefficients[0];
    let sigma = fit.coefficients[1];
    let summary =
        Summary::of(data).ok_or_else(|| InferenceError::insufficient("normal order fit", 3, n))?;
    let mut warnings = Vec::new();
    if summary.variance <= 0.0 {
        warnings.push("sample is constant; sigma estimated as 0".to_string());
    }
    debug!(mu, sigma, r_squared = fit.r_squared, "normal order fit");

    Ok(EstimationResult {
        procedure: ProcedureKind::NormalOrderFit,
        parameters: vec![
            ParameterEstimate::new("mean", mu, fit.std_errors[0]),
            ParameterEstimate::new("std_dev", sigma, fit.std_errors[1]),
        ],
        covariance: fit.covariance,
        characteristics: Characteristics {
            mean: mu,
            variance: sigma * sigma,
            median: mu,
            mode: mu,
        },
        details: EstimationDetails::Normal(NormalFitDetails {
            n,
            expected_order_statistics: expected,
            sorted,
            fitted: fit.fitted,
            sse: fit.sse,
            mse: fit.mse,
            r_squared: fit.r_squared,
            design_inverse: fit.design_inverse,
            sample_mean: summary.mean,
            sample_std_dev: summary.std_dev(),
        }),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_design(x: &[f64]) -> Matrix {
        let rows: Vec<Vec<f64>> = x.iter().map(|&xi| vec![1.0, xi]).collect();
        Matrix::from_rows(&rows).unwrap()
    }

    fn details(fit: &EstimationResult) -> &NormalFitDetails {
        match &fit.details {
            EstimationDetails::Normal(d) => d,
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn test_perfect_line() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [3.0, 5.0, 7.0, 9.0, 11.0];
        let fit = least_squares(&line_design(&x), &y).unwrap();
        assert!((fit.coefficients[0] - 1.0).abs() < 1e-10);
        assert!((fit.coefficients[1] - 2.0).abs() < 1e-10);
        assert!((fit.r_squared - 1.0).abs() < 1e-10);
        assert!(fit.sse < 1e-18);
    }

    #[test]
    fn test_noisy_line() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.1, 3.9, 6.1, 7.9, 10.1];
        let fit = least_squares(&line_design(&x), &y).unwrap();
        // Closed form: slope = Sxy/Sxx = 20/10, intercept = 6 - 2*3
        assert!((fit.coefficients[1] - 2.0).abs() < 1e-10);
        assert!((fit.coefficients[0] - 0.0).abs() < 1e-10);
        let sum: f64 = fit.residuals.iter().sum();
        assert!(sum.abs() < 1e-10);
        assert!((fit.mse - fit.sse / 3.0).abs() < 1e-15);
        // SE(slope) = sqrt(MSE / Sxx)
        assert!((fit.std_errors[1] - (fit.mse / 10.0).sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_least_squares_errors() {
        let design = line_design(&[1.0, 2.0, 3.0]);
        assert!(matches!(
            least_squares(&design, &[1.0, 2.0]),
            Err(InferenceError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            least_squares(&line_design(&[1.0, 2.0]), &[1.0, 2.0]),
            Err(InferenceError::InsufficientData { .. })
        ));
        // Constant regressor duplicates the intercept
        assert!(matches!(
            least_squares(&line_design(&[2.0, 2.0, 2.0]), &[1.0, 2.0, 3.0]),
            Err(InferenceError::SingularMatrix { .. })
        ));
        assert!(least_squares(&design, &[1.0, f64::NAN, 3.0]).is_err());
    }

    #[test]
    fn test_expected_order_statistics() {
        // Exact values for n = 5: ±1.16296, ±0.49502, 0
        let e = expected_normal_order_statistics(5);
        assert!((e[4] - 1.16296).abs() < 0.01, "E[Z(5)] = {}", e[4]);
        assert!((e[3] - 0.49502).abs() < 0.01, "E[Z(4)] = {}", e[3]);
        assert!(e[2].abs() < 1e-12);
        for i in 0..5 {
            assert!((e[i] + e[4 - i]).abs() < 1e-12);
        }
        let e = expected_normal_order_statistics(20);
        assert!(e.windows(2).all(|w| w[0] < w[1]));
        // E[Z(20)] for n = 20 is 1.86748
        assert!((e[19] - 1.86748).abs() < 0.01, "E[Z(20)] = {}", e[19]);
    }

    #[test]
    fn test_normal_fit_recovers_exact_scores() {
        let expected = expected_normal_order_statistics(12);
        let data: Vec<f64> = expected.iter().rev().map(|e| 50.0 + 4.0 * e).collect();
        let fit = normal_order_fit(&data).unwrap();
        let mu = fit.parameter("mean").unwrap();
        let sigma = fit.parameter("std_dev").unwrap();
        assert!((mu.value - 50.0).abs() < 1e-9);
        assert!((sigma.value - 4.0).abs() < 1e-9);
        assert!(sigma.std_error < 1e-6);
        let d = details(&fit);
        assert!((d.r_squared - 1.0).abs() < 1e-12);
        assert!(d.sorted.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_normal_fit_intercept_is_sample_mean() {
        let data = [4.12, 4.99, 5.12, 5.32, 5.55, 5.76, 5.87, 5.98, 6.03, 6.10];
        let fit = normal_order_fit(&data).unwrap();
        let d = details(&fit);
        let mu = fit.parameter("mean").unwrap().value;
        assert!((mu - d.sample_mean).abs() < 1e-9);
        let sigma = fit.parameter("std_dev").unwrap().value;
        assert!(sigma > 0.3 && sigma < 0.8, "sigma = {sigma}");
        assert!(d.r_squared > 0.8 && d.r_squared <= 1.0);
        assert_eq!(fit.covariance.shape(), (2, 2));
        assert!((fit.covariance[(1, 1)] - d.mse * d.design_inverse[(1, 1)]).abs() < 1e-15);
        assert_eq!(fit.characteristics.median, mu);
    }

    #[test]
    fn test_normal_fit_constant_sample() {
        let fit = normal_order_fit(&[3.0; 5]).unwrap();
        assert!(fit.parameter("std_dev").unwrap().value.abs() < 1e-12);
        assert_eq!(details(&fit).r_squared, 1.0);
        assert!(!fit.warnings.is_empty());
    }

    #[test]
    fn test_normal_fit_preconditions() {
        assert!(matches!(
            normal_order_fit(&[1.0, 2.0]),
            Err(InferenceError::InsufficientData { expected: 3, actual: 2, .. })
        ));
        assert!(normal_order_fit(&[1.0, f64::INFINITY, 2.0]).is_err());
    }
}
