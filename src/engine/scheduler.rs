// SPDX-License-Identifier: PMPL-1.0-or-later

//! The bidirectional frontier search.
//!
//! Each selected key goes through `Forward -> Backward -> Completed`. A round
//! probes every alphabet extension of the key on the worker pool; only after
//! all of them have answered does the scheduler decide whether the key was
//! extended, flips direction, or becomes a result.

use super::frontier::Frontier;
use super::pool::WorkerPool;
use super::results::ResultSet;
use super::CancelToken;
use crate::error::OracleError;
use crate::oracle::{Oracle, OracleClient};
use crate::report::Reporter;
use crate::types::*;
use std::collections::HashSet;
use tracing::{debug, info};

/// What a search produced, complete or not.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub results: ResultSet,
    pub stats: RunStats,
    pub rounds: Vec<RoundRecord>,
    pub cancelled: bool,
}

pub struct FrontierScheduler<'a, O: Oracle> {
    client: &'a OracleClient<O>,
    pool: &'a WorkerPool,
    reporter: &'a Reporter,
    cancel: &'a CancelToken,
    alphabet: Vec<char>,
    seed: String,
    baseline: i64,
}

impl<'a, O: Oracle> FrontierScheduler<'a, O> {
    pub fn new(
        client: &'a OracleClient<O>,
        pool: &'a WorkerPool,
        reporter: &'a Reporter,
        cancel: &'a CancelToken,
        alphabet: Vec<char>,
        seed: String,
        baseline: i64,
    ) -> Self {
        Self {
            client,
            pool,
            reporter,
            cancel,
            alphabet,
            seed,
            baseline,
        }
    }

    /// Search until the frontier is empty or the run is cancelled.
    pub fn run(&self) -> SearchOutcome {
        let mut outcome = SearchOutcome::default();
        let mut frontier = Frontier::new();
        frontier.insert(self.seed.clone(), Direction::Forward);

        while let Some(Candidate { text: key, direction }) = frontier.pop() {
            if self.cancel.is_cancelled() {
                frontier.insert(key, direction);
                outcome.cancelled = true;
                break;
            }
            debug!(key = %key, direction = %direction, pending = frontier.len(), "next guess");

            if self.is_covered(&outcome.results, &key) {
                debug!(key = %key, "substring of a previous result, skipping");
                outcome.stats.pruned += 1;
                outcome.rounds.push(RoundRecord {
                    key,
                    direction,
                    decision: RoundDecision::Pruned,
                    accepted: Vec::new(),
                });
                continue;
            }

            self.reporter.progress(&key);
            match self.round(&key, direction, &mut frontier, &mut outcome) {
                Some(record) => outcome.rounds.push(record),
                None => {
                    // Interrupted mid-round: the key has not been decided.
                    frontier.insert(key, direction);
                    outcome.cancelled = true;
                    break;
                }
            }
        }

        self.reporter.finish();
        info!(
            results = outcome.results.len(),
            rounds = outcome.stats.rounds,
            probes = outcome.stats.probes,
            frontier_peak = frontier.high_water(),
            cancelled = outcome.cancelled,
            "search finished"
        );
        outcome
    }

    /// Probe every extension of `key` and apply the decision. Returns `None`
    /// if the round was cut short by cancellation.
    fn round(
        &self,
        key: &str,
        direction: Direction,
        frontier: &mut Frontier,
        outcome: &mut SearchOutcome,
    ) -> Option<RoundRecord> {
        outcome.stats.rounds += 1;
        let mut rejects: HashSet<String> = HashSet::new();
        let mut accepted = Vec::new();
        let trials: Vec<String> = self
            .alphabet
            .iter()
            .map(|&c| direction.extend(key, c))
            .collect();

        let probed = self
            .pool
            .run_round(self.client, trials, self.baseline, self.cancel);

        let mut interrupted = false;
        for p in probed {
            outcome.stats.probes += p.attempts as u64;
            outcome.stats.retries += p.attempts.saturating_sub(1) as u64;
            match p.outcome {
                ProbeOutcome::Accepted => {
                    debug!(trial = %p.trial, "right guess");
                    outcome.stats.accepted += 1;
                    if self.is_covered(&outcome.results, &p.trial) {
                        // Already inside a result; queuing it would only get
                        // it pruned.
                        outcome.stats.known += 1;
                    } else {
                        frontier.insert(p.trial.clone(), direction);
                    }
                    accepted.push(p.trial);
                }
                ProbeOutcome::Rejected { score } => {
                    debug!(trial = %p.trial, score, "wrong guess");
                    outcome.stats.rejected += 1;
                    rejects.insert(p.trial);
                }
                ProbeOutcome::Indeterminate(OracleError::Cancelled) => interrupted = true,
                ProbeOutcome::Indeterminate(err) => {
                    debug!(trial = %p.trial, attempts = p.attempts, error = %err, "probe gave no answer");
                    outcome.stats.indeterminate += 1;
                    self.reporter.warning(&format!(
                        "no answer for {:?} after {} attempt(s): {}; treating as wrong",
                        p.trial, p.attempts, err
                    ));
                    rejects.insert(p.trial);
                }
            }
        }

        if interrupted {
            return None;
        }

        let decision = if rejects.len() == self.alphabet.len() {
            match direction {
                Direction::Forward => {
                    debug!(key, "guessing in <- direction");
                    outcome.stats.flipped += 1;
                    frontier.insert(key.to_string(), Direction::Backward);
                    RoundDecision::Flipped
                }
                Direction::Backward => {
                    self.complete(key, &mut outcome.results);
                    RoundDecision::Completed
                }
            }
        } else {
            RoundDecision::Extended
        };

        Some(RoundRecord {
            key: key.to_string(),
            direction,
            decision,
            accepted,
        })
    }

    fn complete(&self, key: &str, results: &mut ResultSet) {
        if results.insert(key.to_string()) {
            info!(result = %key, "finished guessing");
            self.reporter.result(key);
        }
    }

    /// Longer than `seed + 1` and inside a completed result.
    fn is_covered(&self, results: &ResultSet, candidate: &str) -> bool {
        candidate.chars().count() > self.seed.chars().count() + 1 && results.covers(candidate)
    }
}
