// SPDX-License-Identifier: PMPL-1.0-or-later

//! Live user-facing output during a run.
//!
//! The engine never prints directly; it is handed a `Reporter` that decides
//! whether anything reaches the terminal.

use colored::*;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Progress(String),
    Result(String),
    Warning(String),
}

#[derive(Clone)]
enum Sink {
    Silent,
    Console { progress: bool },
    Capture(Arc<Mutex<Vec<ReportEvent>>>),
}

#[derive(Clone)]
pub struct Reporter {
    sink: Sink,
    /// Width of the progress line currently on screen.
    shown: Arc<AtomicUsize>,
}

impl Reporter {
    /// Print results and warnings to stdout; `progress` adds the live
    /// `\r`-rewritten line showing the key under test.
    pub fn console(progress: bool) -> Self {
        Self::with_sink(Sink::Console { progress })
    }

    pub fn silent() -> Self {
        Self::with_sink(Sink::Silent)
    }

    /// Record events in memory instead of printing them.
    pub fn capture() -> Self {
        Self::with_sink(Sink::Capture(Arc::new(Mutex::new(Vec::new()))))
    }

    fn with_sink(sink: Sink) -> Self {
        Self {
            sink,
            shown: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn is_silent(&self) -> bool {
        matches!(self.sink, Sink::Silent)
    }

    /// Events recorded by a capturing reporter (empty for other sinks).
    pub fn events(&self) -> Vec<ReportEvent> {
        match &self.sink {
            Sink::Capture(events) => events.lock().map(|e| e.clone()).unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    pub fn progress(&self, key: &str) {
        match &self.sink {
            Sink::Console { progress: true } => {
                self.clear_line();
                print!("\r{}", key.dimmed());
                let _ = io::stdout().flush();
                self.shown.store(key.chars().count(), Ordering::Relaxed);
            }
            Sink::Capture(events) => record(events, ReportEvent::Progress(key.to_string())),
            _ => {}
        }
    }

    /// Emit a completed string as soon as it is found. The console skips
    /// the empty string; there is nothing to show for it.
    pub fn result(&self, value: &str) {
        match &self.sink {
            Sink::Console { .. } if !value.is_empty() => {
                self.clear_line();
                println!("\r{}", value.green().bold());
            }
            Sink::Capture(events) => record(events, ReportEvent::Result(value.to_string())),
            _ => {}
        }
    }

    pub fn warning(&self, message: &str) {
        match &self.sink {
            Sink::Console { .. } => {
                self.clear_line();
                println!("\r{} {}", "warning:".yellow().bold(), message);
            }
            Sink::Capture(events) => record(events, ReportEvent::Warning(message.to_string())),
            Sink::Silent => {}
        }
    }

    /// Wipe the progress line at the end of a run.
    pub fn finish(&self) {
        if let Sink::Console { progress: true } = self.sink {
            self.clear_line();
            let _ = io::stdout().flush();
        }
    }

    fn clear_line(&self) {
        let width = self.shown.swap(0, Ordering::Relaxed);
        if width > 0 {
            print!("\r{}\r", " ".repeat(width));
        }
    }
}

fn record(events: &Mutex<Vec<ReportEvent>>, event: ReportEvent) {
    if let Ok(mut events) = events.lock() {
        events.push(event);
    }
}
