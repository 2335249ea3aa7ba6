// SPDX-License-Identifier: PMPL-1.0-or-later

//! Core type definitions shared by the oracle, engine and report layers.

use crate::error::OracleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Side of a candidate that is being extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Append characters at the end.
    Forward,
    /// Prepend characters at the start.
    Backward,
}

impl Direction {
    /// Build the trial string for `key` extended by `c` in this direction.
    pub fn extend(&self, key: &str, c: char) -> String {
        let mut trial = String::with_capacity(key.len() + c.len_utf8());
        match self {
            Direction::Forward => {
                trial.push_str(key);
                trial.push(c);
            }
            Direction::Backward => {
                trial.push(c);
                trial.push_str(key);
            }
        }
        trial
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Forward => "->",
            Direction::Backward => "<-",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.arrow())
    }
}

/// A string under test together with the side it is being extended on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub direction: Direction,
}

impl Candidate {
    pub fn new(text: impl Into<String>, direction: Direction) -> Self {
        Self {
            text: text.into(),
            direction,
        }
    }
}

/// Result of probing one trial string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The oracle answered with the baseline score.
    Accepted,
    /// The oracle answered with some other score.
    Rejected { score: i64 },
    /// The oracle could not be consulted; the answer is unknown.
    Indeterminate(OracleError),
}

/// Decision applied to a key after its probe round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundDecision {
    /// At least one extension was accepted.
    Extended,
    /// Nothing extended forward; the key goes back in tagged Backward.
    Flipped,
    /// Nothing extended in either direction; the key is a result.
    Completed,
    /// The key was a substring of a completed result and was skipped.
    Pruned,
}

/// One step of the search, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub key: String,
    pub direction: Direction,
    pub decision: RoundDecision,
    /// Trials that extended the key this round.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accepted: Vec<String>,
}

/// Scores observed while checking the oracle before the search starts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreflightSummary {
    pub positive_marker: String,
    pub negative_marker: String,
    pub baseline: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_score: Option<i64>,
    pub stable: bool,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Counters collected over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub rounds: u64,
    pub probes: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub indeterminate: u64,
    pub retries: u64,
    pub known: u64,
    pub pruned: u64,
    pub flipped: u64,
}

/// Everything a finished (or cancelled) run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessReport {
    pub created_at: String,
    pub preflight: PreflightSummary,
    /// Completed strings in discovery order.
    pub results: Vec<String>,
    pub stats: RunStats,
    #[serde(default)]
    pub rounds: Vec<RoundRecord>,
    pub elapsed: Duration,
    #[serde(default)]
    pub cancelled: bool,
}
