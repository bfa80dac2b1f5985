//! Observations with optional right-censoring flags.

use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, Result};

/// Ordered observations, optionally flagged as right-censored.
///
/// A censored observation only says the true value exceeds the recorded
/// one (e.g. a unit still running when the test stopped).
///
/// Deserialization goes through [`Sample::censored`], so a flag list whose
/// length differs from the values is rejected rather than stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSample")]
pub struct Sample {
    values: Vec<f64>,
    censored: Option<Vec<bool>>,
}

#[derive(Deserialize)]
struct RawSample {
    values: Vec<f64>,
    censored: Option<Vec<bool>>,
}

impl TryFrom<RawSample> for Sample {
    type Error = InferenceError;

    fn try_from(raw: RawSample) -> Result<Self> {
        match raw.censored {
            Some(flags) => Self::censored(raw.values, flags),
            None => Ok(Self::new(raw.values)),
        }
    }
}

impl Sample {
    /// Fully observed sample.
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            censored: None,
        }
    }

    /// Sample with one censoring flag per value (`true` = censored).
    ///
    /// # Errors
    /// `DimensionMismatch` if the lengths differ.
    pub fn censored(values: Vec<f64>, censored: Vec<bool>) -> Result<Self> {
        if values.len() != censored.len() {
            return Err(InferenceError::DimensionMismatch {
                left: (values.len(), 1),
                right: (censored.len(), 1),
            });
        }
        Ok(Self {
            values,
            censored: Some(censored),
        })
    }

    /// Sample with integer flags: 0 = observed, 1 = censored.
    ///
    /// # Errors
    /// `DimensionMismatch` on length mismatch, `InvalidParameter` for any
    /// flag other than 0 or 1.
    pub fn from_flags(values: Vec<f64>, flags: &[u8]) -> Result<Self> {
        let censored = flags
            .iter()
            .map(|&f| match f {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(InferenceError::InvalidParameter(format!(
                    "censoring flag must be 0 or 1, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Self::censored(values, censored)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_censored(&self, i: usize) -> bool {
        self.censored.as_ref().is_some_and(|c| c[i])
    }

    pub fn has_censoring(&self) -> bool {
        self.censored.as_ref().is_some_and(|c| c.iter().any(|&f| f))
    }

    /// Number of observed (uncensored) values.
    pub fn observed_count(&self) -> usize {
        (0..self.len()).filter(|&i| !self.is_censored(i)).count()
    }

    /// Observed (uncensored) values in order.
    pub fn observed(&self) -> Vec<f64> {
        self.values
            .iter()
            .enumerate()
            .filter(|&(i, _)| !self.is_censored(i))
            .map(|(_, &v)| v)
            .collect()
    }

    /// Pairs of (value, observed) in order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, bool)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &v)| (v, !self.is_censored(i)))
    }
}

impl From<Vec<f64>> for Sample {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}
