// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error taxonomy for oracle probes and guessing runs.

use std::time::Duration;
use thiserror::Error;

/// Failure of a single oracle invocation or of a repeated stability probe.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The oracle could not be started, or exited unsuccessfully.
    #[error("oracle execution failed: {0}")]
    Execution(String),

    /// The first line of the oracle output is not a decimal integer.
    #[error("oracle output is not a score: {line:?}")]
    Parse { line: String },

    /// Repeated probes of the same candidate returned different scores.
    #[error("oracle is unstable for {candidate:?}: observed scores {scores:?}")]
    Instability { candidate: String, scores: Vec<i64> },

    /// The oracle did not answer before the probe deadline.
    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),

    /// The run was cancelled before the probe was issued.
    #[error("probe cancelled")]
    Cancelled,
}

impl OracleError {
    /// Whether retrying the same probe could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, OracleError::Cancelled)
    }
}

/// Fatal errors that stop a guessing run before or during the search.
#[derive(Error, Debug)]
pub enum GuessError {
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No baseline score could be established from the positive marker.
    #[error("preflight failed for marker {marker:?}: {source}")]
    Preflight {
        marker: String,
        #[source]
        source: OracleError,
    },

    /// Preflight instability under the abort policy.
    #[error("oracle is unstable and the instability policy is abort: {0}")]
    Instability(#[source] OracleError),

    #[error("worker pool could not be built: {0}")]
    Pool(String),
}

pub type GuessResult<T> = std::result::Result<T, GuessError>;
