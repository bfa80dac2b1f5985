//! Nelder–Mead downhill simplex minimization.
//!
//! Derivative-free minimization of `f: ℝᵏ → ℝ` with the classical
//! coefficients (reflection 1, expansion 2, contraction ½, shrink ½).
//! The objective is any `FnMut(&[f64]) -> f64`, so data is captured by the
//! closure rather than shared through globals.
//!
//! Termination is reported, not raised: hitting the iteration cap or a
//! cancellation request still returns the best vertex found so far, with
//! [`Termination`] saying why the search stopped. Use
//! [`OptimizationResult::ensure_converged`] to turn that into an error.
//!
//! # Examples
//!
//! ```
//! use u_inference::config::OptimizerConfig;
//! use u_inference::optimize::NelderMead;
//!
//! let nm = NelderMead::new(OptimizerConfig::default().with_x_tolerance(1e-8)).unwrap();
//! let result = nm.minimize(|x| (x[0] - 3.0).powi(2), &[0.0]).unwrap();
//! assert!(result.converged());
//! assert!((result.point[0] - 3.0).abs() < 1e-6);
//! ```
//!
//! # Reference
//! Nelder & Mead (1965), "A simplex method for function minimization",
//! *The Computer Journal* 7(4).

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::OptimizerConfig;
use crate::error::{InferenceError, Result};

/// Reflection coefficient α.
pub const REFLECTION: f64 = 1.0;
/// Expansion coefficient γ.
pub const EXPANSION: f64 = 2.0;
/// Contraction coefficient ρ.
pub const CONTRACTION: f64 = 0.5;
/// Shrink coefficient σ.
pub const SHRINK: f64 = 0.5;

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Convergence criteria met.
    Converged,
    /// Iteration cap reached before convergence.
    MaxIterations,
    /// The cancellation flag was raised.
    Cancelled,
}

/// Outcome of a minimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Best vertex.
    pub point: Vec<f64>,
    /// Objective value at `point`.
    pub value: f64,
    /// Simplex iterations performed.
    pub iterations: usize,
    /// Objective evaluations performed.
    pub evaluations: usize,
    /// RMS deviation of vertex values from the best at termination.
    pub spread: f64,
    pub termination: Termination,
}

impl OptimizationResult {
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }

    /// Returns the result if converged, otherwise the matching error.
    pub fn ensure_converged(self) -> Result<Self> {
        match self.termination {
            Termination::Converged => Ok(self),
            Termination::MaxIterations => Err(InferenceError::ConvergenceFailure {
                iterations: self.iterations,
                spread: self.spread,
            }),
            Termination::Cancelled => Err(InferenceError::Cancelled {
                iterations: self.iterations,
            }),
        }
    }
}

/// Objective wrapper that counts calls and maps NaN to +∞.
struct Objective<F> {
    f: F,
    evaluations: usize,
}

impl<F: FnMut(&[f64]) -> f64> Objective<F> {
    fn eval(&mut self, x: &[f64]) -> f64 {
        self.evaluations += 1;
        let v = (self.f)(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    }
}

/// k+1 vertices with their objective values, kept sorted best-first.
struct Simplex {
    vertices: Vec<Vec<f64>>,
    values: Vec<f64>,
}

impl Simplex {
    fn initial<F: FnMut(&[f64]) -> f64>(x0: &[f64], step: f64, objective: &mut Objective<F>) -> Self {
        let mut vertices = Vec::with_capacity(x0.len() + 1);
        vertices.push(x0.to_vec());
        for i in 0..x0.len() {
            let mut v = x0.to_vec();
            v[i] = if v[i] == 0.0 {
                step
            } else {
                v[i] * (1.0 + step)
            };
            vertices.push(v);
        }
        let values = vertices.iter().map(|v| objective.eval(v)).collect();
        let mut simplex = Self { vertices, values };
        simplex.order();
        simplex
    }

    fn order(&mut self) {
        let mut idx: Vec<usize> = (0..self.values.len()).collect();
        idx.sort_by(|&a, &b| self.values[a].total_cmp(&self.values[b]));
        self.vertices = idx.iter().map(|&i| self.vertices[i].clone()).collect();
        self.values = idx.iter().map(|&i| self.values[i]).collect();
    }

    fn spread(&self) -> f64 {
        let best = self.values[0];
        let ss: f64 = self.values.iter().map(|v| (v - best).powi(2)).sum();
        (ss / self.values.len() as f64).sqrt()
    }

    /// Largest coordinate distance from the best vertex.
    fn diameter(&self) -> f64 {
        let best = &self.vertices[0];
        self.vertices[1..]
            .iter()
            .flat_map(|v| v.iter().zip(best).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max)
    }

    /// Centroid of all vertices except the worst.
    fn centroid(&self) -> Vec<f64> {
        let k = self.vertices.len() - 1;
        let mut c = vec![0.0; k];
        for v in &self.vertices[..k] {
            for (ci, vi) in c.iter_mut().zip(v) {
                *ci += vi;
            }
        }
        for ci in &mut c {
            *ci /= k as f64;
        }
        c
    }

    fn replace_worst(&mut self, point: Vec<f64>, value: f64) {
        let worst = self.vertices.len() - 1;
        self.vertices[worst] = point;
        self.values[worst] = value;
    }
}

/// `from + coef * (to - from)`.
fn along(from: &[f64], to: &[f64], coef: f64) -> Vec<f64> {
    from.iter().zip(to).map(|(a, b)| a + coef * (b - a)).collect()
}

/// Nelder–Mead minimizer.
#[derive(Debug, Clone, Copy)]
pub struct NelderMead {
    config: OptimizerConfig,
}

impl NelderMead {
    /// # Errors
    /// `InvalidParameter` if the configuration is invalid.
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Minimizes `f` starting from `x0`.
    ///
    /// # Errors
    /// `InvalidParameter` if `x0` is empty or not finite.
    pub fn minimize<F>(&self, f: F, x0: &[f64]) -> Result<OptimizationResult>
    where
        F: FnMut(&[f64]) -> f64,
    {
        self.run(f, x0, None)
    }

    /// Like [`minimize`](Self::minimize), polling `cancel` once per iteration.
    pub fn minimize_with_cancel<F>(
        &self,
        f: F,
        x0: &[f64],
        cancel: &AtomicBool,
    ) -> Result<OptimizationResult>
    where
        F: FnMut(&[f64]) -> f64,
    {
        self.run(f, x0, Some(cancel))
    }

    #[instrument(level = "debug", skip_all, fields(dim = x0.len()))]
    fn run<F>(&self, f: F, x0: &[f64], cancel: Option<&AtomicBool>) -> Result<OptimizationResult>
    where
        F: FnMut(&[f64]) -> f64,
    {
        if x0.is_empty() {
            return Err(InferenceError::InvalidParameter(
                "starting point must have at least one coordinate".into(),
            ));
        }
        crate::error::ensure_finite(x0, "starting point")?;

        let mut objective = Objective { f, evaluations: 0 };
        let mut simplex = Simplex::initial(x0, self.config.initial_step, &mut objective);
        let mut iterations = 0;

        let termination = loop {
            let x_ok = self
                .config
                .x_tolerance
                .map_or(true, |tol| simplex.diameter() < tol);
            if simplex.spread() < self.config.tolerance && x_ok {
                break Termination::Converged;
            }
            if iterations >= self.config.max_iterations {
                break Termination::MaxIterations;
            }
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                break Termination::Cancelled;
            }
            iterations += 1;
            self.step(&mut simplex, &mut objective);
        };

        let result = OptimizationResult {
            point: simplex.vertices[0].clone(),
            value: simplex.values[0],
            iterations,
            evaluations: objective.evaluations,
            spread: simplex.spread(),
            termination,
        };

        match termination {
            Termination::Converged => debug!(
                iterations,
                evaluations = result.evaluations,
                value = result.value,
                "simplex converged"
            ),
            Termination::MaxIterations => warn!(
                iterations,
                spread = result.spread,
                "simplex reached iteration cap without converging"
            ),
            Termination::Cancelled => debug!(iterations, "simplex cancelled"),
        }
        Ok(result)
    }

    fn step<F: FnMut(&[f64]) -> f64>(&self, simplex: &mut Simplex, objective: &mut Objective<F>) {
        let k = simplex.vertices.len() - 1;
        let best = simplex.values[0];
        let second_worst = simplex.values[k - 1];
        let worst = simplex.values[k];
        let centroid = simplex.centroid();

        let reflected = along(&centroid, &simplex.vertices[k], -REFLECTION);
        let f_reflected = objective.eval(&reflected);

        if f_reflected < best {
            let expanded = along(&centroid, &reflected, EXPANSION);
            let f_expanded = objective.eval(&expanded);
            if f_expanded < f_reflected {
                simplex.replace_worst(expanded, f_expanded);
            } else {
                simplex.replace_worst(reflected, f_reflected);
            }
        } else if f_reflected < second_worst {
            simplex.replace_worst(reflected, f_reflected);
        } else {
            let accepted = if f_reflected < worst {
                // Outside contraction
                let contracted = along(&centroid, &reflected, CONTRACTION);
                let f_contracted = objective.eval(&contracted);
                (f_contracted <= f_reflected).then_some((contracted, f_contracted))
            } else {
                // Inside contraction
                let contracted = along(&centroid, &simplex.vertices[k], CONTRACTION);
                let f_contracted = objective.eval(&contracted);
                (f_contracted < worst).then_some((contracted, f_contracted))
            };

            match accepted {
                Some((point, value)) => simplex.replace_worst(point, value),
                None => {
                    let anchor = simplex.vertices[0].clone();
                    for i in 1..=k {
                        let shrunk = along(&anchor, &simplex.vertices[i], SHRINK);
                        simplex.values[i] = objective.eval(&shrunk);
                        simplex.vertices[i] = shrunk;
                    }
                }
            }
        }
        simplex.order();
    }
}
