//! Hypothesis tests.
//!
//! Every test is a pure function of its samples and a
//! [`TestConfig`](crate::config::TestConfig) and returns a
//! [`TestResult`](crate::result::TestResult): validate the input, compute the
//! statistic, look up the critical value, decide.
//!
//! | Test | H₀ | Function |
//! |---|---|---|
//! | Bartlett | equal variances across groups | [`bartlett_test`], [`bartlett_test_from_summary`] |
//! | Grubbs | no outlier at either extreme | [`grubbs_test`] |
//! | Fisher + Student | equal means (variance assumption from an F-test) | [`fisher_student_test`] |
//! | Student | equal means under a stated variance assumption | [`student_t_test`] |
//! | Variance ratio | equal variances of two samples | [`variance_ratio_test`] |
//! | Shapiro–Wilk | sample is normal | [`shapiro_wilk_test`] |
//! | Kruskal–Wallis | groups share one distribution | [`kruskal_wallis_test`] |
//! | Wilcoxon–Mann–Whitney | two samples share one distribution | [`mann_whitney_test`] |
//!
//! # Examples
//!
//! ```
//! use u_inference::config::TestConfig;
//! use u_inference::testing::fisher_student_test;
//!
//! let a = [220.0, 223.0, 234.0, 245.0, 257.0];
//! let b = [234.0, 246.0, 259.0, 262.0, 278.0, 280.0, 285.0, 290.0];
//! let r = fisher_student_test(&a, &b, &TestConfig::default()).unwrap();
//! assert!(r.rejects_null()); // means differ at 5 %
//! ```

mod bartlett;
mod grubbs;
mod kruskal_wallis;
mod mann_whitney;
mod mean_comparison;
mod shapiro_wilk;

pub use bartlett::{bartlett_test, bartlett_test_from_summary, GroupVariance};
pub use grubbs::grubbs_test;
pub use kruskal_wallis::kruskal_wallis_test;
pub use mann_whitney::mann_whitney_test;
pub use mean_comparison::{
    fisher_student_test, student_t_test, variance_ratio_test, VarianceAssumption,
};
pub use shapiro_wilk::{shapiro_wilk_coefficients, shapiro_wilk_test};

use crate::error::{ensure_finite, InferenceError, Result};
use crate::stats::Summary;

/// Size check, finiteness check and summary in one step.
pub(crate) fn checked_summary(
    data: &[f64],
    procedure: &'static str,
    min: usize,
) -> Result<Summary> {
    let min = min.max(2);
    if data.len() < min {
        return Err(InferenceError::insufficient(procedure, min, data.len()));
    }
    ensure_finite(data, procedure)?;
    Summary::of(data).ok_or_else(|| InferenceError::insufficient(procedure, min, data.len()))
}

/// Multi-group procedures need at least two groups.
pub(crate) fn check_group_count(groups: usize, procedure: &'static str) -> Result<()> {
    if groups < 2 {
        Err(InferenceError::insufficient(procedure, 2, groups))
    } else {
        Ok(())
    }
}
