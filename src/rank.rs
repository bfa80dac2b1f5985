//! Tie-aware ranking shared by the rank-based tests.
//!
//! Ranks run from 1 to N in ascending order of value. Every maximal run of
//! equal values receives the average of the ranks it spans (mid-ranks), so
//! the ranks always sum to N(N+1)/2.
//!
//! # Examples
//!
//! ```
//! use u_inference::rank::{rank, tie_correction};
//!
//! let r = rank(&[30.0, 10.0, 20.0, 10.0]);
//! assert_eq!(r, vec![4.0, 1.5, 3.0, 1.5]);
//! // One tie of size 2 among 4 values: 1 - (8 - 2) / (64 - 4)
//! assert!((tie_correction(&[30.0, 10.0, 20.0, 10.0]) - 0.9).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

/// Indices of `values` in ascending value order (stable for equal values).
fn sorted_order(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    order
}

/// Calls `visit(start, end)` for every run of equal values in sorted order.
fn for_each_run(values: &[f64], order: &[usize], mut visit: impl FnMut(usize, usize)) {
    let n = order.len();
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && values[order[j]] == values[order[i]] {
            j += 1;
        }
        visit(i, j);
        i = j;
    }
}

/// Mid-ranks of `values`, returned in input order.
pub fn rank(values: &[f64]) -> Vec<f64> {
    let order = sorted_order(values);
    let mut ranks = vec![0.0; values.len()];
    for_each_run(values, &order, |start, end| {
        // Positions start..end share rank (start+1 + end) / 2
        let mid = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = mid;
        }
    });
    ranks
}

/// Sizes of all tie groups with more than one member.
pub fn tie_sizes(values: &[f64]) -> Vec<usize> {
    let order = sorted_order(values);
    let mut sizes = Vec::new();
    for_each_run(values, &order, |start, end| {
        if end - start > 1 {
            sizes.push(end - start);
        }
    });
    sizes
}

/// T = Σ(t³ − t) over tie groups.
pub fn tie_term(values: &[f64]) -> f64 {
    tie_sizes(values)
        .into_iter()
        .map(|t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum()
}

fn correction_from_term(term: f64, n: usize) -> f64 {
    if n < 2 {
        return 1.0;
    }
    let n = n as f64;
    1.0 - term / (n * n * n - n)
}

/// 1 − T/(N³ − N); 1 when there are no ties or fewer than two values.
pub fn tie_correction(values: &[f64]) -> f64 {
    correction_from_term(tie_term(values), values.len())
}

/// Pooled ranking of several groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRanks {
    /// Sum of pooled ranks per group, in input order.
    pub rank_sums: Vec<f64>,
    /// Group sizes.
    pub sizes: Vec<usize>,
    /// Total number of observations N.
    pub total: usize,
    /// Σ(t³ − t) over ties in the pooled sample.
    pub tie_term: f64,
}

impl GroupRanks {
    /// 1 − T/(N³ − N) for the pooled sample.
    pub fn tie_correction(&self) -> f64 {
        correction_from_term(self.tie_term, self.total)
    }

    /// Mean rank of group `i`.
    pub fn mean_rank(&self, i: usize) -> f64 {
        self.rank_sums[i] / self.sizes[i] as f64
    }
}

/// Ranks the pooled observations of all groups and sums the ranks per group.
pub fn group_rank_sums(groups: &[&[f64]]) -> GroupRanks {
    let pooled: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let ranks = rank(&pooled);

    let mut rank_sums = Vec::with_capacity(groups.len());
    let mut offset = 0;
    for g in groups {
        rank_sums.push(ranks[offset..offset + g.len()].iter().sum());
        offset += g.len();
    }

    GroupRanks {
        rank_sums,
        sizes: groups.iter().map(|g| g.len()).collect(),
        total: pooled.len(),
        tie_term: tie_term(&pooled),
    }
}
