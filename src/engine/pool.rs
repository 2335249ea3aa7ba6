// SPDX-License-Identifier: PMPL-1.0-or-later

//! Bounded fan-out of one probe round.
//!
//! A fixed-size rayon pool runs the probes, so at most `max_concurrency`
//! oracle calls are ever in flight. Each probe sends its outcome back over a
//! channel; the caller owns every piece of search state.

use super::CancelToken;
use crate::error::{GuessError, GuessResult, OracleError};
use crate::oracle::{Oracle, OracleClient};
use crate::types::ProbeOutcome;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Outcome of one trial after all of its attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probed {
    /// Position of the trial in the round, used to restore dispatch order.
    pub index: usize,
    pub trial: String,
    pub outcome: ProbeOutcome,
    /// Oracle calls spent on this trial (0 if cancelled before the first).
    pub attempts: usize,
}

pub struct WorkerPool {
    pool: ThreadPool,
    inter_probe_delay: Duration,
    retries: usize,
}

impl WorkerPool {
    pub fn new(
        max_concurrency: usize,
        inter_probe_delay: Duration,
        retries: usize,
    ) -> GuessResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(max_concurrency.max(1))
            .thread_name(|i| format!("probe-{}", i))
            .build()
            .map_err(|err| GuessError::Pool(err.to_string()))?;
        Ok(Self {
            pool,
            inter_probe_delay,
            retries,
        })
    }

    pub fn max_concurrency(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Probe every trial and return once all of them have finished.
    /// Results come back in the order the trials were given.
    pub fn run_round<O: Oracle>(
        &self,
        client: &OracleClient<O>,
        trials: Vec<String>,
        baseline: i64,
        cancel: &CancelToken,
    ) -> Vec<Probed> {
        let expected = trials.len();
        let (tx, rx) = mpsc::channel::<Probed>();

        // Runs on the calling thread; only spawned probes occupy pool slots.
        self.pool.in_place_scope(|scope| {
            for (index, trial) in trials.into_iter().enumerate() {
                if index > 0 && !self.inter_probe_delay.is_zero() {
                    thread::sleep(self.inter_probe_delay);
                }
                let tx = tx.clone();
                if cancel.is_cancelled() {
                    let _ = tx.send(Probed {
                        index,
                        trial,
                        outcome: ProbeOutcome::Indeterminate(OracleError::Cancelled),
                        attempts: 0,
                    });
                    continue;
                }
                let retries = self.retries;
                scope.spawn(move |_| {
                    let probed = probe_with_retries(client, index, trial, baseline, retries, cancel);
                    let _ = tx.send(probed);
                });
            }
        });
        drop(tx);

        let mut probed: Vec<Probed> = rx.iter().collect();
        debug_assert_eq!(probed.len(), expected);
        probed.sort_by_key(|p| p.index);
        probed
    }
}

fn probe_with_retries<O: Oracle>(
    client: &OracleClient<O>,
    index: usize,
    trial: String,
    baseline: i64,
    retries: usize,
    cancel: &CancelToken,
) -> Probed {
    let mut attempts = 0;
    let outcome = loop {
        if cancel.is_cancelled() {
            break ProbeOutcome::Indeterminate(OracleError::Cancelled);
        }
        attempts += 1;
        match client.probe(&trial, baseline) {
            ProbeOutcome::Indeterminate(err) if err.is_transient() && attempts <= retries => {
                debug!(trial = %trial, attempt = attempts, error = %err, "retrying probe");
            }
            outcome => break outcome,
        }
    };
    Probed {
        index,
        trial,
        outcome,
        attempts,
    }
}
