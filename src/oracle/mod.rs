// SPDX-License-Identifier: PMPL-1.0-or-later

//! Oracle access: single probes, repeated stability probes and the preflight.

pub mod command;
pub mod preflight;

use crate::error::OracleError;
use crate::types::ProbeOutcome;
use tracing::debug;

pub use command::CommandOracle;
pub use preflight::{run_preflight, UNSCORED_BASELINE};

/// An external scoring function. Implementations must be callable from
/// several probe threads at once.
pub trait Oracle: Send + Sync {
    /// Submit `candidate` once and return the oracle's score.
    fn run_once(&self, candidate: &str) -> Result<i64, OracleError>;
}

/// Oracle backed by an in-process closure.
pub struct FnOracle<F> {
    f: F,
}

/// Wrap a closure as an [`Oracle`].
pub fn from_fn<F>(f: F) -> FnOracle<F>
where
    F: Fn(&str) -> Result<i64, OracleError> + Send + Sync,
{
    FnOracle { f }
}

impl<F> Oracle for FnOracle<F>
where
    F: Fn(&str) -> Result<i64, OracleError> + Send + Sync,
{
    fn run_once(&self, candidate: &str) -> Result<i64, OracleError> {
        (self.f)(candidate)
    }
}

impl<O: Oracle + ?Sized> Oracle for std::sync::Arc<O> {
    fn run_once(&self, candidate: &str) -> Result<i64, OracleError> {
        (**self).run_once(candidate)
    }
}

/// Everything seen while submitting the same candidate several times.
#[derive(Debug, Clone, Default)]
pub struct Observation {
    pub scores: Vec<i64>,
    pub errors: Vec<OracleError>,
}

impl Observation {
    /// The common score if every attempt answered and all answers agree.
    pub fn agreed(&self, candidate: &str) -> Result<i64, OracleError> {
        match (self.scores.first(), self.errors.first()) {
            (None, Some(err)) => Err(err.clone()),
            (None, None) => Err(OracleError::Execution("no attempts made".to_string())),
            (Some(&first), None) if self.scores.iter().all(|&s| s == first) => Ok(first),
            _ => Err(OracleError::Instability {
                candidate: candidate.to_string(),
                scores: self.scores.clone(),
            }),
        }
    }

    /// Most frequent score; ties go to the score seen first.
    pub fn majority(&self) -> Option<i64> {
        let mut best: Option<(i64, usize)> = None;
        for &score in &self.scores {
            let count = self.scores.iter().filter(|&&s| s == score).count();
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((score, count));
            }
        }
        best.map(|(score, _)| score)
    }
}

/// Thin client around an [`Oracle`] adding repetition and classification.
pub struct OracleClient<O: Oracle> {
    oracle: O,
}

impl<O: Oracle> OracleClient<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn run_once(&self, candidate: &str) -> Result<i64, OracleError> {
        let result = self.oracle.run_once(candidate);
        match &result {
            Ok(score) => debug!(candidate, score, "oracle answered"),
            Err(err) => debug!(candidate, error = %err, "oracle failed"),
        }
        result
    }

    /// Submit `candidate` `repeat` times and collect every answer.
    pub fn observe(&self, candidate: &str, repeat: usize) -> Observation {
        let mut observation = Observation::default();
        for _ in 0..repeat {
            match self.run_once(candidate) {
                Ok(score) => observation.scores.push(score),
                Err(err) => observation.errors.push(err),
            }
        }
        observation
    }

    /// Score `candidate`, succeeding only when `repeat` attempts all agree.
    pub fn score(&self, candidate: &str, repeat: usize) -> Result<i64, OracleError> {
        self.observe(candidate, repeat).agreed(candidate)
    }

    /// Probe a trial once and classify the answer against `baseline`.
    pub fn probe(&self, trial: &str, baseline: i64) -> ProbeOutcome {
        match self.run_once(trial) {
            Ok(score) if score == baseline => ProbeOutcome::Accepted,
            Ok(score) => ProbeOutcome::Rejected { score },
            Err(err) => ProbeOutcome::Indeterminate(err),
        }
    }
}
