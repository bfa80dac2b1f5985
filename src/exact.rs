//! Exact null distribution of the Mann–Whitney U statistic.
//!
//! Under H₀ every one of the C(m+n, m) assignments of ranks to the two
//! samples is equally likely. [`UDistribution`] holds the number of
//! assignments producing each U ∈ {0, …, mn}, built with the recursion of
//! Dinneen & Blakesley (AS 62), which grows the table one observation of the
//! smaller sample at a time using a rolling work buffer of ⌈(mn+1)/2⌉ +
//! min(m, n) cells.
//!
//! The table costs O(mn) memory and O(min(m,n)·mn) time, so calls above
//! [`ExactConfig::cost_limit`] are rejected up front unless the caller opts
//! in with [`ExactConfig::allow_expensive`].
//!
//! Counts are held as `f64`, so totals are exact while C(m+n, m) < 2⁵³
//! (e.g. m = n = 28) and carry relative rounding error beyond that.
//!
//! # Reference
//! Dinneen & Blakesley (1973), "Algorithm AS 62: A generator for the
//! sampling distribution of the Mann-Whitney U statistic",
//! *Applied Statistics* 22(2), 269–273.

use tracing::{debug, instrument, warn};

use crate::config::ExactConfig;
use crate::error::{InferenceError, Result};

/// Cells that are never allocated, even with explicit opt-in (1 GiB of `f64`).
pub const HARD_CELL_LIMIT: u64 = 1 << 27;

/// Frequencies of U under H₀ for sample sizes (m, n).
#[derive(Debug, Clone, PartialEq)]
pub struct UDistribution {
    m: usize,
    n: usize,
    frequencies: Vec<f64>,
    total: f64,
}

/// Cells allocated by [`UDistribution::compute`]: the table plus the work buffer.
pub fn exact_cost(m: usize, n: usize) -> Option<u64> {
    let mn = (m as u64).checked_mul(n as u64)?;
    let table = mn.checked_add(1)?;
    let work = (table + 1) / 2 + m.min(n) as u64;
    table.checked_add(work)
}

impl UDistribution {
    /// Builds the frequency table for sample sizes `m` and `n`.
    ///
    /// # Errors
    /// - `InsufficientData` if either sample size is zero.
    /// - `ExactAlgorithmCostExceeded` if `m * n` exceeds the configured limit
    ///   without opt-in, or the hard allocation ceiling in any case.
    #[instrument(level = "debug", skip(config))]
    pub fn compute(m: usize, n: usize, config: &ExactConfig) -> Result<Self> {
        if m.min(n) == 0 {
            return Err(InferenceError::insufficient("exact U distribution", 1, 0));
        }

        let mn = (m as u64).saturating_mul(n as u64);
        let cost = exact_cost(m, n).unwrap_or(u64::MAX);
        if cost > HARD_CELL_LIMIT {
            return Err(InferenceError::ExactAlgorithmCostExceeded {
                m,
                n,
                cost,
                limit: HARD_CELL_LIMIT,
            });
        }
        if mn > config.cost_limit {
            if !config.allow_expensive {
                return Err(InferenceError::ExactAlgorithmCostExceeded {
                    m,
                    n,
                    cost: mn,
                    limit: config.cost_limit,
                });
            }
            warn!(
                m,
                n,
                cells = cost,
                limit = config.cost_limit,
                "computing exact U distribution above the configured cost limit"
            );
        }

        let frequencies = Self::generate(m, n);
        let total = frequencies.iter().sum();
        debug!(m, n, total, "exact U distribution ready");
        Ok(Self {
            m,
            n,
            frequencies,
            total,
        })
    }

    /// AS 62 recursion.
    fn generate(m: usize, n: usize) -> Vec<f64> {
        let min_mn = m.min(n);
        let max_mn = m.max(n);
        let len = m * n + 1;

        let mut freq = vec![0.0; len];
        // One observation in the smaller sample: U = 0..=max_mn equally often
        for f in freq.iter_mut().take(max_mn + 1) {
            *f = 1.0;
        }
        if min_mn == 1 {
            return freq;
        }

        let mut work = vec![0.0; (len + 1) / 2 + min_mn];
        let mut span = max_mn;
        for i in 2..=min_mn {
            work[i - 1] = 0.0;
            span += max_mn;
            let mut mirror = span + 2;
            let half = 1 + span / 2;
            let mut k = i;
            for j in 1..=half {
                k += 1;
                mirror -= 1;
                let sum = freq[j - 1] + work[j - 1];
                freq[j - 1] = sum;
                work[k - 1] = sum - freq[mirror - 1];
                freq[mirror - 1] = sum;
            }
        }
        freq
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Largest attainable U, m·n.
    pub fn max_u(&self) -> usize {
        self.m * self.n
    }

    /// Frequency of each U value, indexed by U.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Σ frequencies, equal to C(m+n, m).
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Rounds to the nearest attainable U (half-integers round up).
    fn index(&self, u: f64) -> usize {
        u.round().clamp(0.0, self.max_u() as f64) as usize
    }

    /// P(U ≤ u).
    pub fn left_tail(&self, u: f64) -> f64 {
        let idx = self.index(u);
        self.frequencies[..=idx].iter().sum::<f64>() / self.total
    }

    /// P(U ≥ u).
    pub fn right_tail(&self, u: f64) -> f64 {
        let idx = self.index(u);
        self.frequencies[idx..].iter().sum::<f64>() / self.total
    }

    /// min(1, 2 · min(P(U ≤ u), P(U ≥ u))).
    pub fn two_sided(&self, u: f64) -> f64 {
        (2.0 * self.left_tail(u).min(self.right_tail(u))).min(1.0)
    }

    /// Largest u with P(U ≤ u) ≤ `level`, if any.
    pub fn lower_critical_value(&self, level: f64) -> Option<usize> {
        let mut cumulative = 0.0;
        let mut critical = None;
        for (u, f) in self.frequencies.iter().enumerate() {
            cumulative += f;
            if cumulative / self.total <= level {
                critical = Some(u);
            } else {
                break;
            }
        }
        critical
    }
}
