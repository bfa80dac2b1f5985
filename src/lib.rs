//! # u-inference
//!
//! Classical statistical inference: hypothesis tests, exact rank
//! distributions and parameter estimators for Normal and Weibull models.
//!
//! Every procedure is a stateless function of its samples and a
//! configuration record. Nothing here performs I/O; results are plain
//! serde-serializable records for whatever reports them.
//!
//! ## Modules
//!
//! - [`testing`] — Bartlett, Grubbs, Fisher–Student, Student t, Shapiro–Wilk,
//!   Kruskal–Wallis, Wilcoxon–Mann–Whitney
//! - [`weibull`] — Weibull maximum likelihood under right-censoring
//! - [`regression`] — Least squares and the normal order-statistic fit
//! - [`procedure`] — One enum over all nine procedures, batch evaluation
//! - [`distribution`] — Normal, Student-t, Fisher-F, chi-squared, Weibull
//! - [`exact`] — Exact null distribution of the Mann–Whitney U (AS 62)
//! - [`optimize`] — Nelder–Mead simplex with cooperative cancellation
//! - [`rank`] — Mid-ranks, tie summaries, grouped rank sums
//! - [`linalg`] — Small dense matrices
//! - [`result`], [`config`], [`sample`], [`error`], [`stats`] — shared records
//!
//! ## Design Philosophy
//!
//! - **Typed failures**: malformed input is an [`error::InferenceError`];
//!   recoverable numeric conditions become warnings on the result
//! - **Numerical stability**: log-space likelihoods, Kahan/Welford summaries
//!   and normal special functions from `u-numflow`, incomplete beta/gamma
//!   functions from `statrs`
//! - **Research-backed**: all algorithms reference academic literature
//!
//! ## Example
//!
//! ```
//! use u_inference::config::TestConfig;
//! use u_inference::testing::grubbs_test;
//!
//! let data = [4.12, 4.99, 5.12, 5.32, 5.55, 5.76, 5.87, 5.98, 6.03, 6.10];
//! let r = grubbs_test(&data, &TestConfig::default()).unwrap();
//! assert!(!r.rejects_null());
//! ```

pub mod config;
pub mod distribution;
pub mod error;
pub mod exact;
pub mod linalg;
pub mod optimize;
pub mod procedure;
pub mod rank;
pub mod regression;
pub mod result;
pub mod sample;
pub mod stats;
pub mod testing;
pub mod weibull;

pub use config::{ExactConfig, InferenceConfig, OptimizerConfig, TestConfig};
pub use error::{InferenceError, Result};
pub use procedure::{run_all, Outcome, Procedure, StatisticalProcedure};
pub use result::{Decision, EstimationResult, ProcedureKind, TestResult};
pub use sample::Sample;
