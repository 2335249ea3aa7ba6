// SPDX-License-Identifier: PMPL-1.0-or-later

//! Subprocess oracle: the candidate goes to stdin, the score comes back as
//! the first line of stdout.

use super::Oracle;
use crate::error::OracleError;
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct CommandOracle {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandOracle {
    /// Build from a command line split on whitespace. No shell is involved.
    pub fn new(command: &str) -> Result<Self, OracleError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| OracleError::Execution("empty oracle command".to_string()))?;
        Ok(Self {
            program,
            args: parts.collect(),
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn spawn(&self) -> Result<Child, OracleError> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| {
                OracleError::Execution(format!("failed to start {}: {}", self.program, err))
            })
    }
}

impl Oracle for CommandOracle {
    fn run_once(&self, candidate: &str) -> Result<i64, OracleError> {
        let mut child = self.spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // An oracle that never reads its input closes the pipe early;
            // its answer still counts.
            let _ = stdin.write_all(format!("{}\n", candidate).as_bytes());
        }

        let (status, stdout) = match self.timeout {
            Some(limit) => wait_with_deadline(child, limit)?,
            None => {
                let output = child.wait_with_output().map_err(|err| {
                    OracleError::Execution(format!("waiting for {}: {}", self.program, err))
                })?;
                (output.status, output.stdout)
            }
        };

        if !status.success() {
            return Err(OracleError::Execution(format!(
                "{} exited with {}",
                self.program, status
            )));
        }

        parse_score(&stdout)
    }
}

/// Wait for `child`, killing it once `limit` has elapsed. Stdout is drained on
/// a helper thread so a chatty oracle cannot stall on a full pipe.
fn wait_with_deadline(mut child: Child, limit: Duration) -> Result<(ExitStatus, Vec<u8>), OracleError> {
    let reader = child.stdout.take().map(|mut stdout| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf);
            buf
        })
    });

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if start.elapsed() >= limit => {
                let _ = child.kill();
                let _ = child.wait();
                // Grandchildren may still hold the pipe; the reader exits
                // on its own once they close it.
                drop(reader);
                return Err(OracleError::Timeout(limit));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(err) => {
                let _ = child.kill();
                return Err(OracleError::Execution(format!("waiting for oracle: {}", err)));
            }
        }
    };

    let stdout = match reader {
        Some(handle) => handle.join().unwrap_or_default(),
        None => Vec::new(),
    };
    Ok((status, stdout))
}

/// Parse the first line of oracle output as a decimal score.
pub fn parse_score(stdout: &[u8]) -> Result<i64, OracleError> {
    let text = String::from_utf8_lossy(stdout);
    let first = text.lines().next().unwrap_or("").trim();
    first.parse::<i64>().map_err(|_| OracleError::Parse {
        line: first.to_string(),
    })
}
