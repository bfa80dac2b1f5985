//! Uniform access to the nine procedures.
//!
//! A [`Procedure`] owns its inputs, so a harness can build a batch, hand it
//! to [`run_all`] and match on the [`Outcome`]s without knowing which
//! function backs each entry.
//!
//! # Examples
//!
//! ```
//! use u_inference::config::InferenceConfig;
//! use u_inference::procedure::{run_all, Procedure, StatisticalProcedure};
//!
//! let batch = vec![
//!     Procedure::Grubbs {
//!         data: vec![4.12, 4.99, 5.12, 5.32, 5.55, 5.76, 5.87, 5.98, 6.03, 6.10],
//!     },
//!     Procedure::NormalOrderFit {
//!         data: vec![9.8, 10.1, 10.0, 9.9, 10.2, 10.3, 9.7],
//!     },
//! ];
//! let outcomes = run_all(&batch, &InferenceConfig::default());
//! assert_eq!(outcomes.len(), 2);
//! assert!(outcomes.iter().all(|o| o.is_ok()));
//! ```

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::InferenceConfig;
use crate::error::Result;
use crate::regression::normal_order_fit;
use crate::result::{EstimationResult, ProcedureKind, TestResult};
use crate::sample::Sample;
use crate::testing::{
    bartlett_test, bartlett_test_from_summary, fisher_student_test, grubbs_test,
    kruskal_wallis_test, mann_whitney_test, shapiro_wilk_test, student_t_test, GroupVariance,
    VarianceAssumption,
};
use crate::weibull::weibull_mle;

/// Something that can be evaluated against an [`InferenceConfig`].
pub trait StatisticalProcedure {
    fn kind(&self) -> ProcedureKind;

    fn run(&self, config: &InferenceConfig) -> Result<Outcome>;
}

/// A procedure together with its owned inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Procedure {
    Bartlett {
        groups: Vec<Vec<f64>>,
    },
    /// Bartlett from per-group variances and sizes.
    BartlettSummary {
        groups: Vec<GroupVariance>,
    },
    Grubbs {
        data: Vec<f64>,
    },
    FisherStudent {
        a: Vec<f64>,
        b: Vec<f64>,
    },
    Student {
        a: Vec<f64>,
        b: Vec<f64>,
        assumption: VarianceAssumption,
    },
    ShapiroWilk {
        data: Vec<f64>,
    },
    KruskalWallis {
        groups: Vec<Vec<f64>>,
    },
    MannWhitney {
        a: Vec<f64>,
        b: Vec<f64>,
    },
    WeibullMle {
        sample: Sample,
    },
    NormalOrderFit {
        data: Vec<f64>,
    },
}

/// Result of running a [`Procedure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Test(TestResult),
    Estimation(EstimationResult),
}

impl Outcome {
    pub fn kind(&self) -> ProcedureKind {
        match self {
            Outcome::Test(r) => r.procedure,
            Outcome::Estimation(r) => r.procedure,
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            Outcome::Test(r) => &r.warnings,
            Outcome::Estimation(r) => &r.warnings,
        }
    }

    pub fn as_test(&self) -> Option<&TestResult> {
        match self {
            Outcome::Test(r) => Some(r),
            Outcome::Estimation(_) => None,
        }
    }

    pub fn as_estimation(&self) -> Option<&EstimationResult> {
        match self {
            Outcome::Estimation(r) => Some(r),
            Outcome::Test(_) => None,
        }
    }
}

fn slices(groups: &[Vec<f64>]) -> Vec<&[f64]> {
    groups.iter().map(Vec::as_slice).collect()
}

impl StatisticalProcedure for Procedure {
    fn kind(&self) -> ProcedureKind {
        match self {
            Procedure::Bartlett { .. } | Procedure::BartlettSummary { .. } => {
                ProcedureKind::Bartlett
            }
            Procedure::Grubbs { .. } => ProcedureKind::Grubbs,
            Procedure::FisherStudent { .. } => ProcedureKind::FisherStudent,
            Procedure::Student { .. } => ProcedureKind::Student,
            Procedure::ShapiroWilk { .. } => ProcedureKind::ShapiroWilk,
            Procedure::KruskalWallis { .. } => ProcedureKind::KruskalWallis,
            Procedure::MannWhitney { .. } => ProcedureKind::MannWhitney,
            Procedure::WeibullMle { .. } => ProcedureKind::WeibullMle,
            Procedure::NormalOrderFit { .. } => ProcedureKind::NormalOrderFit,
        }
    }

    #[instrument(level = "debug", skip_all, fields(kind = %self.kind()))]
    fn run(&self, config: &InferenceConfig) -> Result<Outcome> {
        config.validate()?;
        let test = &config.test;
        let outcome = match self {
            Procedure::Bartlett { groups } => Outcome::Test(bartlett_test(&slices(groups), test)?),
            Procedure::BartlettSummary { groups } => {
                Outcome::Test(bartlett_test_from_summary(groups, test)?)
            }
            Procedure::Grubbs { data } => Outcome::Test(grubbs_test(data, test)?),
            Procedure::FisherStudent { a, b } => Outcome::Test(fisher_student_test(a, b, test)?),
            Procedure::Student { a, b, assumption } => {
                Outcome::Test(student_t_test(a, b, *assumption, test)?)
            }
            Procedure::ShapiroWilk { data } => Outcome::Test(shapiro_wilk_test(data, test)?),
            Procedure::KruskalWallis { groups } => {
                Outcome::Test(kruskal_wallis_test(&slices(groups), test)?)
            }
            Procedure::MannWhitney { a, b } => {
                Outcome::Test(mann_whitney_test(a, b, test, &config.exact)?)
            }
            Procedure::WeibullMle { sample } => {
                Outcome::Estimation(weibull_mle(sample, &config.optimizer)?)
            }
            Procedure::NormalOrderFit { data } => Outcome::Estimation(normal_order_fit(data)?),
        };
        Ok(outcome)
    }
}

/// Runs every procedure against the same configuration.
///
/// Results keep the order of `procedures`. With the `parallel` feature the
/// batch is spread over rayon's thread pool; the outcomes are identical.
pub fn run_all(procedures: &[Procedure], config: &InferenceConfig) -> Vec<Result<Outcome>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        procedures.par_iter().map(|p| p.run(config)).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        procedures.iter().map(|p| p.run(config)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;

    fn demo() -> Vec<f64> {
        vec![4.12, 4.99, 5.12, 5.32, 5.55, 5.76, 5.87, 5.98, 6.03, 6.10]
    }

    fn batch() -> Vec<Procedure> {
        let a = vec![220.0, 223.0, 234.0, 245.0, 257.0];
        let b = vec![234.0, 246.0, 259.0, 262.0, 278.0, 280.0, 285.0, 290.0];
        vec![
            Procedure::Bartlett {
                groups: vec![a.clone(), b.clone()],
            },
            Procedure::BartlettSummary {
                groups: vec![
                    GroupVariance {
                        variance: 0.0225,
                        size: 10,
                    },
                    GroupVariance {
                        variance: 0.0729,
                        size: 11,
                    },
                ],
            },
            Procedure::Grubbs { data: demo() },
            Procedure::FisherStudent {
                a: a.clone(),
                b: b.clone(),
            },
            Procedure::Student {
                a: a.clone(),
                b: b.clone(),
                assumption: VarianceAssumption::Unequal,
            },
            Procedure::ShapiroWilk { data: demo() },
            Procedure::KruskalWallis {
                groups: vec![a.clone(), b.clone(), demo()],
            },
            Procedure::MannWhitney { a, b },
            Procedure::WeibullMle {
                sample: Sample::new(vec![
                    72.0, 82.0, 97.0, 103.0, 113.0, 117.0, 126.0, 127.0, 127.0, 139.0, 154.0,
                    159.0, 199.0, 207.0,
                ]),
            },
            Procedure::NormalOrderFit { data: demo() },
        ]
    }

    #[test]
    fn test_kind_matches_outcome() {
        let config = InferenceConfig::default();
        for p in batch() {
            let outcome = p.run(&config).unwrap();
            assert_eq!(outcome.kind(), p.kind());
            assert_eq!(outcome.as_test().is_some(), p.kind().is_test());
            assert_eq!(outcome.as_estimation().is_some(), !p.kind().is_test());
        }
    }

    #[test]
    fn test_every_kind_reachable() {
        let kinds: Vec<ProcedureKind> = batch().iter().map(|p| p.kind()).collect();
        for kind in ProcedureKind::ALL {
            assert!(kinds.contains(&kind), "{kind} missing");
        }
    }

    #[test]
    fn test_run_all_preserves_order() {
        let procedures = batch();
        let config = InferenceConfig::default();
        let outcomes = run_all(&procedures, &config);
        assert_eq!(outcomes.len(), procedures.len());
        for (p, outcome) in procedures.iter().zip(&outcomes) {
            assert_eq!(outcome.as_ref().unwrap(), &p.run(&config).unwrap());
        }
    }

    #[test]
    fn test_errors_stay_per_procedure() {
        let procedures = vec![
            Procedure::Grubbs { data: vec![1.0] },
            Procedure::Grubbs { data: demo() },
        ];
        let outcomes = run_all(&procedures, &InferenceConfig::default());
        assert!(matches!(
            outcomes[0],
            Err(InferenceError::InsufficientData { .. })
        ));
        assert!(outcomes[1].is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = InferenceConfig::default();
        config.test.alpha = 1.5;
        let err = Procedure::NormalOrderFit { data: demo() }
            .run(&config)
            .unwrap_err();
        assert!(matches!(err, InferenceError::InvalidParameter(_)));
    }

    #[test]
    fn test_procedure_serde() {
        let p = Procedure::Student {
            a: vec![1.0, 2.0, 3.0],
            b: vec![4.0, 5.0, 6.0],
            assumption: VarianceAssumption::Equal,
        };
        let json = serde_json::to_string(&p).unwrap();
        let back: Procedure = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_mismatched_censoring_rejected_on_input() {
        let json = r#"{"WeibullMle":{"sample":{"values":[1,2,3],"censored":[false]}}}"#;
        assert!(serde_json::from_str::<Procedure>(json).is_err());

        let json = r#"{"WeibullMle":{"sample":{"values":[1,2,3],"censored":[false,true,false]}}}"#;
        let p: Procedure = serde_json::from_str(json).unwrap();
        let outcome = p.run(&InferenceConfig::default()).unwrap();
        assert_eq!(outcome.kind(), ProcedureKind::WeibullMle);
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Procedure>();
        assert_send_sync::<Outcome>();
        assert_send_sync::<InferenceConfig>();
    }
}
