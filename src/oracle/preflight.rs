// SPDX-License-Identifier: PMPL-1.0-or-later

//! Stability preflight: fixes the baseline score before any guessing starts.
//!
//! Disagreeing repeats on either marker, or a positive marker that never
//! produces a score, are handled according to the configured
//! [`InstabilityPolicy`]. Under `Warn` the search always goes ahead.

use super::{Oracle, OracleClient};
use crate::config::{GuessConfig, InstabilityPolicy};
use crate::error::{GuessError, GuessResult, OracleError};
use crate::types::PreflightSummary;
use tracing::{debug, info};

/// Baseline used when the positive marker never produced a score. No oracle
/// answer is expected to match it, so every probe reads as wrong.
pub const UNSCORED_BASELINE: i64 = -1;

pub fn run_preflight<O: Oracle>(
    client: &OracleClient<O>,
    config: &GuessConfig,
) -> GuessResult<PreflightSummary> {
    let repeats = config.stability_repeats;
    let mut summary = PreflightSummary {
        positive_marker: config.positive_marker.clone(),
        negative_marker: config.negative_marker.clone(),
        stable: true,
        ..PreflightSummary::default()
    };

    info!(marker = %config.positive_marker, repeats, "checking stability: right guess");
    let positive = client.observe(&config.positive_marker, repeats);
    summary.baseline = match positive.agreed(&config.positive_marker) {
        Ok(score) => score,
        Err(err @ OracleError::Instability { .. }) => {
            handle_instability(&mut summary, config.instability_policy, err)?;
            // Majority exists: instability implies at least one score.
            positive.majority().unwrap_or_default()
        }
        Err(source) => match config.instability_policy {
            InstabilityPolicy::Abort => {
                return Err(GuessError::Preflight {
                    marker: config.positive_marker.clone(),
                    source,
                })
            }
            InstabilityPolicy::Warn => {
                summary.stable = false;
                push_warning(
                    &mut summary,
                    format!(
                        "positive marker could not be scored: {}; using baseline {}",
                        source, UNSCORED_BASELINE
                    ),
                );
                UNSCORED_BASELINE
            }
        },
    };

    info!(marker = %config.negative_marker, repeats, "checking stability: wrong guess");
    let negative = client.observe(&config.negative_marker, repeats);
    match negative.agreed(&config.negative_marker) {
        Ok(score) => summary.negative_score = Some(score),
        Err(err @ OracleError::Instability { .. }) => {
            handle_instability(&mut summary, config.instability_policy, err)?;
            summary.negative_score = negative.majority();
        }
        Err(err) => push_warning(
            &mut summary,
            format!("negative marker could not be scored: {}", err),
        ),
    }

    let baseline = summary.baseline;
    if summary.negative_score == Some(baseline) {
        push_warning(
            &mut summary,
            format!(
                "positive and negative markers both score {}; the oracle cannot tell them apart",
                baseline
            ),
        );
    }

    info!(
        baseline = summary.baseline,
        negative = ?summary.negative_score,
        stable = summary.stable,
        "preflight finished"
    );
    Ok(summary)
}

fn handle_instability(
    summary: &mut PreflightSummary,
    policy: InstabilityPolicy,
    err: OracleError,
) -> GuessResult<()> {
    summary.stable = false;
    match policy {
        InstabilityPolicy::Abort => Err(GuessError::Instability(err)),
        InstabilityPolicy::Warn => {
            push_warning(summary, format!("oracle seems to be unstable: {}", err));
            Ok(())
        }
    }
}

fn push_warning(summary: &mut PreflightSummary, message: String) {
    debug!("{}", message);
    summary.warnings.push(message);
}
