// SPDX-License-Identifier: PMPL-1.0-or-later

//! Guessing engine: preflight, then frontier search over a bounded pool.

pub mod frontier;
pub mod pool;
pub mod results;
pub mod scheduler;

use crate::config::GuessConfig;
use crate::error::GuessResult;
use crate::oracle::{run_preflight, Oracle, OracleClient};
use crate::report::{ReportGenerator, Reporter};
use crate::types::{GuessReport, PreflightSummary};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub use frontier::Frontier;
pub use pool::{Probed, WorkerPool};
pub use results::ResultSet;
pub use scheduler::{FrontierScheduler, SearchOutcome};

/// Shared flag that stops a run. Probes already in flight finish; nothing
/// new is dispatched.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Owns everything a run needs: configuration, oracle, pool and reporter.
pub struct Guesser<O: Oracle> {
    config: GuessConfig,
    client: OracleClient<O>,
    pool: WorkerPool,
    reporter: Reporter,
    cancel: CancelToken,
}

impl<O: Oracle> Guesser<O> {
    pub fn new(config: GuessConfig, oracle: O, reporter: Reporter) -> GuessResult<Self> {
        config.validate()?;
        let pool = WorkerPool::new(
            config.max_concurrency,
            config.inter_probe_delay,
            config.probe_retries,
        )?;
        Ok(Self {
            config,
            client: OracleClient::new(oracle),
            pool,
            reporter,
            cancel: CancelToken::new(),
        })
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &GuessConfig {
        &self.config
    }

    pub fn client(&self) -> &OracleClient<O> {
        &self.client
    }

    /// Establish the baseline score. Warnings are forwarded to the reporter.
    pub fn preflight(&self) -> GuessResult<PreflightSummary> {
        let summary = run_preflight(&self.client, &self.config)?;
        for warning in &summary.warnings {
            self.reporter.warning(warning);
        }
        Ok(summary)
    }

    /// Run the frontier search against a known baseline.
    pub fn search(&self, baseline: i64) -> SearchOutcome {
        FrontierScheduler::new(
            &self.client,
            &self.pool,
            &self.reporter,
            &self.cancel,
            self.config.charset(),
            self.config.seed.clone(),
            baseline,
        )
        .run()
    }

    /// Preflight followed by the search.
    pub fn run(&self) -> GuessResult<GuessReport> {
        let start = Instant::now();
        let preflight = self.preflight()?;
        info!(
            baseline = preflight.baseline,
            threads = self.pool.max_concurrency(),
            alphabet = %self.config.alphabet,
            seed = %self.config.seed,
            "starting search"
        );
        let outcome = self.search(preflight.baseline);
        Ok(ReportGenerator::new().generate(preflight, outcome, start.elapsed()))
    }
}

/// Convenience wrapper: build a [`Guesser`] and run it.
pub fn guess<O: Oracle>(
    config: GuessConfig,
    oracle: O,
    reporter: Reporter,
) -> GuessResult<GuessReport> {
    Guesser::new(config, oracle, reporter)?.run()
}
