// SPDX-License-Identifier: PMPL-1.0-or-later

//! End-of-run summary printing

use crate::types::*;
use colored::*;

pub struct ReportFormatter;

impl ReportFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn print(&self, report: &GuessReport) {
        println!("\n{}", "=== BLIND-GUESS REPORT ===".bold().cyan());
        println!();

        self.print_preflight(&report.preflight);
        println!();

        self.print_results(report);
        println!();

        self.print_stats(&report.stats, report);
        println!();
    }

    fn print_preflight(&self, preflight: &PreflightSummary) {
        println!("{}", "PREFLIGHT".bold().yellow());
        println!(
            "  Right marker: {:?} -> {}",
            preflight.positive_marker, preflight.baseline
        );
        match preflight.negative_score {
            Some(score) => println!(
                "  Wrong marker: {:?} -> {}",
                preflight.negative_marker, score
            ),
            None => println!(
                "  Wrong marker: {:?} -> {}",
                preflight.negative_marker,
                "no score".dimmed()
            ),
        }
        let stability = if preflight.stable {
            "stable".green()
        } else {
            "UNSTABLE".red().bold()
        };
        println!("  Oracle: {}", stability);
        if !preflight.warnings.is_empty() {
            println!("  Warnings: {}", preflight.warnings.len().to_string().yellow());
        }
    }

    fn print_results(&self, report: &GuessReport) {
        println!("{}", "RESULTS".bold().yellow());
        if report.results.is_empty() {
            println!("  {}", "Nothing recovered".red());
            return;
        }
        for (i, result) in report.results.iter().enumerate() {
            println!("  {}. {}", i + 1, result.green().bold());
        }
    }

    fn print_stats(&self, stats: &RunStats, report: &GuessReport) {
        println!("{}", "STATISTICS".bold().yellow());
        println!("  Rounds: {}", stats.rounds);
        println!(
            "  Probes: {} (accepted {}, rejected {}, retries {})",
            stats.probes, stats.accepted, stats.rejected, stats.retries
        );
        if stats.indeterminate > 0 {
            println!(
                "  Indeterminate: {}",
                stats.indeterminate.to_string().red().bold()
            );
        }
        println!(
            "  Pruned keys: {}  |  Covered extensions: {}  |  Direction flips: {}",
            stats.pruned, stats.known, stats.flipped
        );
        println!("  Duration: {:.2}s", report.elapsed.as_secs_f64());
        if report.cancelled {
            println!("  {}", "Run was cancelled; results are partial".red());
        }
    }
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new()
    }
}
