//! Weibull parameter estimation for lifetime data with right-censoring.
//!
//! - [`initial_estimates`]: method-of-moments starting point
//! - [`weibull_mle`]: maximum likelihood fit with covariance and derived
//!   characteristics
//!
//! # References
//!
//! - Lawless, J.F. (2003). *Statistical Models and Methods for Lifetime
//!   Data*, 2nd ed.
//! - Abernethy, R.B. (2006). *The New Weibull Handbook*, 5th ed.

mod mle;

pub use mle::{initial_estimates, weibull_mle, weibull_mle_with_cancel};
