// SPDX-License-Identifier: PMPL-1.0-or-later

//! blind-guess: recover a secret one character at a time from a pass/fail
//! oracle.
//!
//! The oracle is any command that reads a candidate on stdin and prints a
//! score as the first line of stdout. Candidates scoring like the "right"
//! marker are extended forward, then backward, until nothing more matches.

use anyhow::{Context, Result};
use blind_guess::config::parse_duration;
use blind_guess::report::{self, ReportOutputFormat};
use blind_guess::{CommandOracle, GuessConfig, Guesser, InstabilityPolicy, Reporter};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "blind-guess")]
#[command(version)]
#[command(about = "Recover secret strings through a boolean side-channel oracle")]
#[command(long_about = None)]
struct Cli {
    /// Profile file (.json, .yaml, .yml); flags below override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Command to run, candidate sent via stdin
    #[arg(long)]
    cmd: Option<String>,

    /// Term that makes the command give a right response
    #[arg(long)]
    right: Option<String>,

    /// Term that makes the command give a wrong response
    #[arg(long)]
    wrong: Option<String>,

    /// Characters used for guessing
    #[arg(long)]
    charset: Option<String>,

    /// Initial search string
    #[arg(long)]
    init: Option<String>,

    /// Maximum number of concurrent probes
    #[arg(long)]
    threads: Option<usize>,

    /// Delay between probe dispatches (e.g. 250ms, 1s; bare numbers are ms)
    #[arg(long)]
    delay: Option<String>,

    /// Kill an oracle invocation after this long (e.g. 5s)
    #[arg(long)]
    timeout: Option<String>,

    /// Extra attempts for a probe that gets no answer
    #[arg(long)]
    retries: Option<usize>,

    /// Repeats per marker during the stability check
    #[arg(long)]
    repeats: Option<usize>,

    /// What to do when the oracle looks unstable
    #[arg(long, value_enum)]
    on_unstable: Option<PolicyArg>,

    /// Write the run report here (.json or .yaml)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Report format; defaults to the --output extension
    #[arg(long, value_enum)]
    format: Option<ReportOutputFormat>,

    /// Print nothing but errors
    #[arg(short, long)]
    silent: bool,

    /// Keep the regular output (progress, results, summary) with --debug
    #[arg(long)]
    progress: bool,

    /// Print verbose output (debugging)
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Warn,
    Abort,
}

impl From<PolicyArg> for InstabilityPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Warn => InstabilityPolicy::Warn,
            PolicyArg::Abort => InstabilityPolicy::Abort,
        }
    }
}

struct Output {
    path: Option<PathBuf>,
    format: Option<ReportOutputFormat>,
}

impl Output {
    /// Destination and format, appending the format's extension to a bare path.
    fn resolve(self) -> Option<(PathBuf, ReportOutputFormat)> {
        let mut path = self.path?;
        let format = match self.format {
            Some(format) => {
                if path.extension().is_none() {
                    path.set_extension(format.extension());
                }
                format
            }
            None => ReportOutputFormat::for_path(&path),
        };
        Some((path, format))
    }
}

impl Cli {
    fn into_config(self) -> Result<(GuessConfig, Output, bool)> {
        let mut config = match &self.config {
            Some(path) => GuessConfig::load(path)?,
            None => GuessConfig::default(),
        };

        if let Some(cmd) = self.cmd {
            config.command = cmd;
        }
        if let Some(right) = self.right {
            config.positive_marker = right;
        }
        if let Some(wrong) = self.wrong {
            config.negative_marker = wrong;
        }
        if let Some(charset) = self.charset {
            config.alphabet = charset;
        }
        if let Some(init) = self.init {
            config.seed = init;
        }
        if let Some(threads) = self.threads {
            config.max_concurrency = threads;
        }
        if let Some(delay) = &self.delay {
            config.inter_probe_delay = parse_duration(delay, "ms").context("parsing --delay")?;
        }
        if let Some(timeout) = &self.timeout {
            config.probe_timeout = Some(parse_duration(timeout, "s").context("parsing --timeout")?);
        }
        if let Some(retries) = self.retries {
            config.probe_retries = retries;
        }
        if let Some(repeats) = self.repeats {
            config.stability_repeats = repeats;
        }
        if let Some(policy) = self.on_unstable {
            config.instability_policy = policy.into();
        }
        config.verbose |= self.debug;
        config.silent |= self.silent;

        let output = Output {
            path: self.output,
            format: self.format,
        };
        Ok((config, output, self.progress))
    }
}

/// Debug output replaces the regular user output unless asked for.
fn user_reporter(config: &GuessConfig, force_progress: bool) -> Reporter {
    if config.silent || (config.verbose && !force_progress) {
        Reporter::silent()
    } else {
        Reporter::console(true)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, output, force_progress) = cli.into_config()?;

    let level = if config.verbose {
        Level::DEBUG
    } else if config.silent {
        Level::ERROR
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let reporter = user_reporter(&config, force_progress);
    let quiet = reporter.is_silent();

    let oracle = CommandOracle::new(&config.command)
        .context("building oracle command")?
        .with_timeout(config.probe_timeout);

    let guesser = Guesser::new(config, oracle, reporter)?;
    let report = guesser.run()?;

    if !quiet {
        report::print_report(&report);
    }

    if let Some((path, format)) = output.resolve() {
        report::save_report_as(&report, &path, format)?;
        if !quiet {
            println!("Report saved to: {}", path.display());
        }
    }

    Ok(())
}
