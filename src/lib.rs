// SPDX-License-Identifier: PMPL-1.0-or-later

//! Blind-Guess: recover secret strings through a boolean oracle.
//!
//! The engine treats the oracle as an opaque scoring function: a candidate
//! goes in, an integer comes out, and a candidate is "right" when the score
//! matches the baseline established during the preflight.
//!
//! ENGINE PILLARS:
//! 1. **Oracle**: single probes, repeated stability probes, the preflight.
//! 2. **Engine**: longest-first frontier, bidirectional extension, pruning
//!    against completed results, bounded probe rounds.
//! 3. **Report**: live output through a `Reporter`, JSON/YAML export.

pub mod config;
pub mod engine;
pub mod error;
pub mod oracle;
pub mod report;
pub mod types;

pub use config::{GuessConfig, InstabilityPolicy};
pub use engine::{guess, CancelToken, Guesser};
pub use error::{GuessError, OracleError};
pub use oracle::{from_fn, CommandOracle, Oracle, OracleClient};
pub use report::Reporter;
pub use types::*;
