// SPDX-License-Identifier: PMPL-1.0-or-later

//! End-to-end tests of the guessing engine against in-process oracles.

use blind_guess::report::ReportEvent;
use blind_guess::{
    from_fn, guess, CancelToken, Direction, GuessConfig, GuessError, Guesser, InstabilityPolicy,
    Oracle, OracleError, Reporter, RoundDecision,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const HEX: &str = "0123456789abcdef";
const DIGITS: &str = "0123456789";

fn config(alphabet: &str) -> GuessConfig {
    GuessConfig {
        positive_marker: String::new(),
        negative_marker: "^".to_string(),
        alphabet: alphabet.to_string(),
        max_concurrency: 4,
        ..GuessConfig::default()
    }
}

/// Scores 1 when the trial is a prefix of the secret.
fn prefix_oracle(secret: &'static str) -> impl Oracle {
    from_fn(move |s: &str| Ok(if secret.starts_with(s) { 1 } else { 0 }))
}

/// Scores 1 when the trial is a prefix or a suffix of the secret.
fn edge_oracle(secret: &'static str) -> impl Oracle {
    from_fn(move |s: &str| {
        Ok(if secret.starts_with(s) || secret.ends_with(s) {
            1
        } else {
            0
        })
    })
}

/// Scores 1 when the trial appears anywhere in the secret, like `LIKE '%x%'`.
fn contains_oracle(secret: &'static str) -> impl Oracle {
    from_fn(move |s: &str| Ok(if secret.contains(s) { 1 } else { 0 }))
}

/// Wraps an oracle and remembers every candidate it was asked about.
struct Recording<O> {
    inner: O,
    log: Mutex<Vec<String>>,
}

impl<O: Oracle> Recording<O> {
    fn new(inner: O) -> Arc<Self> {
        Arc::new(Self {
            inner,
            log: Mutex::new(Vec::new()),
        })
    }

    fn probe_counts(&self, markers: &[&str]) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for candidate in self.log.lock().unwrap().iter() {
            if !markers.contains(&candidate.as_str()) {
                *counts.entry(candidate.clone()).or_insert(0) += 1;
            }
        }
        counts
    }
}

impl<O: Oracle> Oracle for Recording<O> {
    fn run_once(&self, candidate: &str) -> Result<i64, OracleError> {
        self.log.lock().unwrap().push(candidate.to_string());
        self.inner.run_once(candidate)
    }
}

#[test]
fn recovers_cafe_from_edge_oracle() {
    let report = guess(config(HEX), edge_oracle("cafe"), Reporter::silent())
        .expect("run should succeed");
    assert_eq!(report.results, vec!["cafe"]);
    assert_eq!(report.preflight.baseline, 1);
    assert!(!report.cancelled);
}

#[test]
fn recovers_42_from_prefix_oracle() {
    let report = guess(config(DIGITS), prefix_oracle("42"), Reporter::silent())
        .expect("run should succeed");
    assert_eq!(report.results, vec!["42"]);
    assert_eq!(report.preflight.negative_score, Some(0));
}

#[test]
fn recovers_cafe_from_contains_oracle() {
    let report = guess(config(HEX), contains_oracle("cafe"), Reporter::silent())
        .expect("run should succeed");
    assert_eq!(report.results, vec!["cafe"]);
    assert!(report.stats.known > 0, "accepted substrings of cafe should not be queued");
}

#[test]
fn repeated_runs_are_identical() {
    let first = guess(config(HEX), contains_oracle("deadbeef"), Reporter::silent()).unwrap();
    let second = guess(config(HEX), contains_oracle("deadbeef"), Reporter::silent()).unwrap();
    assert_eq!(first.results, second.results);
    assert_eq!(first.rounds, second.rounds);
    assert_eq!(first.stats, second.stats);
}

#[test]
fn keys_inside_a_result_are_never_expanded_again() {
    let report = guess(config(HEX), contains_oracle("cafe"), Reporter::silent()).unwrap();
    assert_eq!(report.results, vec!["cafe"]);

    let done = report
        .rounds
        .iter()
        .position(|r| r.decision == RoundDecision::Completed && r.key == "cafe")
        .expect("cafe should complete");
    for record in &report.rounds[done + 1..] {
        let covered = record.key.chars().count() > 1 && "cafe".contains(&record.key);
        assert!(
            !covered || record.decision == RoundDecision::Pruned,
            "{:?} was expanded after cafe completed",
            record
        );
    }
}

#[test]
fn covered_extensions_are_still_asked() {
    // "bc" lies inside "abcd" but the oracle rejects it, so "b" has to flip
    // and find "zb" going backward.
    let oracle = Recording::new(from_fn(|s: &str| {
        Ok(if "abcd".starts_with(s) || "zb".ends_with(s) {
            1
        } else {
            0
        })
    }));
    let report = guess(config("abcdz"), oracle.clone(), Reporter::silent()).unwrap();
    assert_eq!(report.results, vec!["abcd", "zb"]);

    let b_forward = report
        .rounds
        .iter()
        .find(|r| r.key == "b" && r.direction == Direction::Forward)
        .expect("b should be tried forward");
    assert_eq!(b_forward.decision, RoundDecision::Flipped);
    assert!(oracle.probe_counts(&[]).contains_key("bc"));

    // "ab" is accepted going backward from "b", but never queued.
    assert!(report.stats.known >= 1);
    assert!(!report.rounds.iter().any(|r| r.key == "ab" && r.direction == Direction::Backward));
}

#[test]
fn pending_keys_inside_a_result_are_pruned() {
    // "a" extends to both "ab" and "ac"; "ab" grows into "abac" first,
    // leaving "ac" waiting in the frontier.
    let secret = "abac";
    let oracle = from_fn(move |s: &str| Ok(if secret.contains(s) { 7 } else { 3 }));
    let report = guess(config("abc"), oracle, Reporter::silent()).unwrap();
    assert_eq!(report.results, vec!["abac"]);
    assert_eq!(report.preflight.baseline, 7);
    assert_eq!(report.stats.pruned, 1);

    let pruned: Vec<_> = report
        .rounds
        .iter()
        .filter(|r| r.decision == RoundDecision::Pruned)
        .map(|r| r.key.as_str())
        .collect();
    assert_eq!(pruned, vec!["ac"]);
}

#[test]
fn branching_yields_every_completed_string() {
    let secrets = ["ab", "ac"];
    let oracle = from_fn(move |s: &str| {
        Ok(if secrets.iter().any(|secret| secret.starts_with(s)) {
            1
        } else {
            0
        })
    });
    let report = guess(config("abc"), oracle, Reporter::silent()).unwrap();
    assert_eq!(report.results, vec!["ab", "ac"]);

    let branch = report
        .rounds
        .iter()
        .find(|r| r.key == "a" && r.direction == Direction::Forward)
        .expect("a should be extended forward");
    assert_eq!(branch.decision, RoundDecision::Extended);
    assert_eq!(branch.accepted, vec!["ab", "ac"]);
}

#[test]
fn exhausted_forward_keys_flip_exactly_once() {
    let report = guess(config(HEX), contains_oracle("c0ffee"), Reporter::silent()).unwrap();
    assert_eq!(report.results, vec!["c0ffee"]);

    for (i, record) in report.rounds.iter().enumerate() {
        if record.decision != RoundDecision::Flipped {
            continue;
        }
        assert_eq!(record.direction, Direction::Forward);
        let later: Vec<_> = report.rounds[i + 1..]
            .iter()
            .filter(|r| r.key == record.key)
            .collect();
        assert_eq!(later.len(), 1, "{:?} should come back once", record.key);
        assert_eq!(later[0].direction, Direction::Backward);
    }
    assert!(report.stats.flipped > 0);
}

#[test]
fn concurrency_stays_within_bound() {
    let live = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let oracle = {
        let live = live.clone();
        let peak = peak.clone();
        from_fn(move |s: &str| {
            let now = live.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2));
            live.fetch_sub(1, Ordering::SeqCst);
            Ok(if "cafe".starts_with(s) { 1 } else { 0 })
        })
    };
    let mut cfg = config(HEX);
    cfg.max_concurrency = 3;
    let report = guess(cfg, oracle, Reporter::silent()).unwrap();
    assert_eq!(report.results, vec!["cafe"]);
    assert!(peak.load(Ordering::SeqCst) <= 3);
}

#[test]
fn unstable_negative_marker_warns_and_continues() {
    let calls = AtomicUsize::new(0);
    let oracle = from_fn(move |s: &str| {
        if s == "^" {
            return Ok((calls.fetch_add(1, Ordering::SeqCst) % 2) as i64 + 5);
        }
        Ok(if "42".starts_with(s) { 1 } else { 0 })
    });
    let reporter = Reporter::capture();
    let report = guess(config(DIGITS), oracle, reporter.clone()).expect("warn policy proceeds");

    assert_eq!(report.results, vec!["42"]);
    assert!(!report.preflight.stable);
    assert!(reporter
        .events()
        .iter()
        .any(|e| matches!(e, ReportEvent::Warning(msg) if msg.contains("unstable"))));
}

#[test]
fn abort_policy_refuses_unstable_oracle() {
    let calls = AtomicUsize::new(0);
    let oracle = from_fn(move |_: &str| Ok((calls.fetch_add(1, Ordering::SeqCst) % 3) as i64));
    let mut cfg = config(DIGITS);
    cfg.instability_policy = InstabilityPolicy::Abort;
    assert!(matches!(
        guess(cfg, oracle, Reporter::silent()),
        Err(GuessError::Instability(_))
    ));
}

#[test]
fn results_are_emitted_as_they_complete() {
    let reporter = Reporter::capture();
    let report = guess(config(HEX), edge_oracle("cafe"), reporter.clone()).unwrap();
    let emitted: Vec<String> = reporter
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ReportEvent::Result(value) => Some(value),
            _ => None,
        })
        .collect();
    assert_eq!(emitted, report.results);
    assert!(reporter
        .events()
        .contains(&ReportEvent::Progress("caf".to_string())));
}

#[test]
fn persistent_probe_failures_count_as_rejections() {
    let oracle = from_fn(|s: &str| {
        if s == "43" {
            return Err(OracleError::Execution("connection reset".to_string()));
        }
        Ok(if "42".starts_with(s) { 1 } else { 0 })
    });
    let reporter = Reporter::capture();
    let report = guess(config(DIGITS), oracle, reporter.clone()).unwrap();

    assert_eq!(report.results, vec!["42"]);
    assert_eq!(report.stats.indeterminate, 1);
    // Default of two retries: three calls for the failing trial.
    assert!(report.stats.retries >= 2);
    let warnings: Vec<_> = reporter
        .events()
        .into_iter()
        .filter(|e| matches!(e, ReportEvent::Warning(_)))
        .collect();
    assert_eq!(warnings.len(), 1, "one warning per failed trial");
    assert!(matches!(&warnings[0], ReportEvent::Warning(msg) if msg.contains("\"43\"")));
}

#[test]
fn transient_probe_failures_are_retried() {
    let failures = AtomicUsize::new(0);
    let oracle = from_fn(move |s: &str| {
        if s == "4" && failures.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(OracleError::Timeout(Duration::from_secs(1)));
        }
        Ok(if "42".starts_with(s) { 1 } else { 0 })
    });
    let report = guess(config(DIGITS), oracle, Reporter::silent()).unwrap();
    assert_eq!(report.results, vec!["42"]);
    assert_eq!(report.stats.indeterminate, 0);
    assert_eq!(report.stats.retries, 1);
}

#[test]
fn seed_starts_the_search() {
    let oracle = Recording::new(contains_oracle("cafe"));
    let mut cfg = config(HEX);
    cfg.seed = "af".to_string();
    let report = guess(cfg, oracle.clone(), Reporter::silent()).unwrap();
    assert_eq!(report.results, vec!["cafe"]);
    assert_eq!(report.rounds[0].key, "af");

    // Nothing shorter than the seed is ever tried.
    let counts = oracle.probe_counts(&["", "^"]);
    assert!(counts.keys().all(|trial| trial.len() >= 3));
}

#[test]
fn exhausted_empty_seed_is_the_only_result() {
    let oracle = from_fn(|s: &str| Ok(if s.is_empty() { 1 } else { 0 }));
    let reporter = Reporter::capture();
    let report = guess(config("01"), oracle, reporter.clone()).unwrap();
    assert_eq!(report.results, vec![""]);
    assert_eq!(report.stats.flipped, 1);
    assert!(reporter
        .events()
        .contains(&ReportEvent::Result(String::new())));
}

#[test]
fn cancellation_returns_partial_results() {
    let cancel = CancelToken::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let oracle = {
        let cancel = cancel.clone();
        let calls = calls.clone();
        from_fn(move |s: &str| {
            if calls.fetch_add(1, Ordering::SeqCst) == 40 {
                cancel.cancel();
            }
            Ok(if "0123456789abcdef".starts_with(s) { 1 } else { 0 })
        })
    };
    let guesser = Guesser::new(config(HEX), oracle, Reporter::silent())
        .unwrap()
        .with_cancel_token(cancel.clone());
    let report = guesser.run().unwrap();

    assert!(report.cancelled);
    assert!(report.results.is_empty());
    // Within a few rounds of the cancel point.
    assert!(calls.load(Ordering::SeqCst) < 40 + 2 * HEX.len());
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let cfg = config("aa");
    assert!(matches!(
        Guesser::new(cfg, prefix_oracle("a"), Reporter::silent()),
        Err(GuessError::Config(_))
    ));
}
