// SPDX-License-Identifier: PMPL-1.0-or-later

//! Run configuration: defaults, profile loading and validation.

use crate::error::{GuessError, GuessResult};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_COMMAND: &str = "sh curl.sh";
pub const DEFAULT_POSITIVE_MARKER: &str = " ";
pub const DEFAULT_NEGATIVE_MARKER: &str = "^";
pub const DEFAULT_ALPHABET: &str = "0123456789abcdef";
pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_STABILITY_REPEATS: usize = 5;
pub const DEFAULT_PROBE_RETRIES: usize = 2;

/// What to do when the preflight finds the oracle unstable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstabilityPolicy {
    /// Report a warning and keep going.
    #[default]
    Warn,
    /// Stop before the search starts.
    Abort,
}

impl InstabilityPolicy {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "warn" | "proceed" | "continue" => Some(InstabilityPolicy::Warn),
            "abort" | "fail" | "stop" => Some(InstabilityPolicy::Abort),
            _ => None,
        }
    }
}

/// Everything the engine needs to know about a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuessConfig {
    /// Oracle command line, split on whitespace; the candidate goes to stdin.
    pub command: String,
    /// Input that makes the oracle answer "right".
    pub positive_marker: String,
    /// Input that makes the oracle answer "wrong".
    pub negative_marker: String,
    pub alphabet: String,
    /// Initial search string.
    pub seed: String,
    pub max_concurrency: usize,
    /// Pause before dispatching each probe. Bare numbers are milliseconds.
    #[serde(
        serialize_with = "serialize_duration",
        deserialize_with = "deserialize_delay"
    )]
    pub inter_probe_delay: Duration,
    /// Deadline for a single oracle invocation. Bare numbers are seconds.
    #[serde(
        serialize_with = "serialize_opt_duration",
        deserialize_with = "deserialize_timeout",
        skip_serializing_if = "Option::is_none"
    )]
    pub probe_timeout: Option<Duration>,
    pub stability_repeats: usize,
    pub instability_policy: InstabilityPolicy,
    /// Extra attempts for a probe whose outcome is indeterminate.
    pub probe_retries: usize,
    pub verbose: bool,
    /// Suppress all user-facing output.
    pub silent: bool,
}

impl Default for GuessConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            positive_marker: DEFAULT_POSITIVE_MARKER.to_string(),
            negative_marker: DEFAULT_NEGATIVE_MARKER.to_string(),
            alphabet: DEFAULT_ALPHABET.to_string(),
            seed: String::new(),
            max_concurrency: DEFAULT_CONCURRENCY,
            inter_probe_delay: Duration::ZERO,
            probe_timeout: None,
            stability_repeats: DEFAULT_STABILITY_REPEATS,
            instability_policy: InstabilityPolicy::Warn,
            probe_retries: DEFAULT_PROBE_RETRIES,
            verbose: false,
            silent: false,
        }
    }
}

impl GuessConfig {
    /// Load a profile from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading guess profile {}", path.display()))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("parsing json guess profile {}", path.display())),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("parsing yaml guess profile {}", path.display())),
            _ => Err(anyhow!(
                "unsupported guess profile extension for {}",
                path.display()
            )),
        }
    }

    /// Alphabet characters in configured order.
    pub fn charset(&self) -> Vec<char> {
        self.alphabet.chars().collect()
    }

    pub fn validate(&self) -> GuessResult<()> {
        if self.command.split_whitespace().next().is_none() {
            return Err(GuessError::Config("oracle command is empty".to_string()));
        }
        if self.alphabet.is_empty() {
            return Err(GuessError::Config("alphabet is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for c in self.alphabet.chars() {
            if !seen.insert(c) {
                return Err(GuessError::Config(format!(
                    "alphabet contains {:?} more than once",
                    c
                )));
            }
        }
        if self.max_concurrency == 0 {
            return Err(GuessError::Config(
                "max concurrency must be at least 1".to_string(),
            ));
        }
        if self.stability_repeats == 0 {
            return Err(GuessError::Config(
                "stability repeats must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse `"250ms"`, `"2s"`, `"1.5m"` or `"1h"`; a bare number uses `bare_unit`.
pub fn parse_duration(raw: &str, bare_unit: &str) -> Result<Duration> {
    let trimmed = raw.trim().to_ascii_lowercase();
    if trimmed.is_empty() {
        return Err(anyhow!("duration cannot be empty"));
    }

    let (value_str, unit) = if let Some(v) = trimmed.strip_suffix("ms") {
        (v, "ms")
    } else if let Some(v) = trimmed.strip_suffix('s') {
        (v, "s")
    } else if let Some(v) = trimmed.strip_suffix('m') {
        (v, "m")
    } else if let Some(v) = trimmed.strip_suffix('h') {
        (v, "h")
    } else {
        (trimmed.as_str(), bare_unit)
    };

    let value: f64 = value_str
        .trim()
        .parse()
        .with_context(|| format!("invalid duration '{}'", raw))?;
    if value.is_sign_negative() || !value.is_finite() {
        return Err(anyhow!("duration must be a non-negative number: {}", raw));
    }

    let millis = match unit {
        "ms" => value,
        "m" => value * 60_000.0,
        "h" => value * 3_600_000.0,
        _ => value * 1000.0,
    };
    Ok(Duration::from_millis(millis.round() as u64))
}

pub fn format_duration(duration: Duration) -> String {
    format!("{}ms", duration.as_millis())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Number(f64),
    Text(String),
}

impl RawDuration {
    fn into_duration(self, bare_unit: &str) -> Result<Duration> {
        match self {
            RawDuration::Number(n) => parse_duration(&n.to_string(), bare_unit),
            RawDuration::Text(s) => parse_duration(&s, bare_unit),
        }
    }
}

fn serialize_duration<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*value))
}

fn serialize_opt_duration<S: Serializer>(
    value: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(d) => serializer.serialize_str(&format_duration(*d)),
        None => serializer.serialize_none(),
    }
}

fn deserialize_delay<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    RawDuration::deserialize(deserializer)?
        .into_duration("ms")
        .map_err(serde::de::Error::custom)
}

fn deserialize_timeout<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Duration>, D::Error> {
    match Option::<RawDuration>::deserialize(deserializer)? {
        Some(raw) => raw
            .into_duration("s")
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
