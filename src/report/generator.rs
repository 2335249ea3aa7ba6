// SPDX-License-Identifier: PMPL-1.0-or-later

//! Report generation logic

use crate::engine::SearchOutcome;
use crate::types::*;
use std::time::Duration;

pub struct ReportGenerator;

impl ReportGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(
        &self,
        preflight: PreflightSummary,
        outcome: SearchOutcome,
        elapsed: Duration,
    ) -> GuessReport {
        GuessReport {
            created_at: chrono::Utc::now().to_rfc3339(),
            preflight,
            results: outcome.results.into_vec(),
            stats: outcome.stats,
            rounds: outcome.rounds,
            elapsed,
            cancelled: outcome.cancelled,
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}
