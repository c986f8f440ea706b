//! shotdiff Diff Runner
//!
//! Orchestrates a visual-regression run for a pull request:
//! - builds the project and captures a report against the configured diff base
//! - skips the run when the pull request changed no files
//! - derives the pull-request check status and the process exit code
//! - re-diffs the captured screenshots against the stable reference branch
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      DiffOrchestrator                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  BuildSource::run()                                          │
//! │  diff_pass(diff_base, None)         -> ReportData (primary)  │
//! │    ├── ReportController  init / upload / capture / render    │
//! │    └── StatusReporter    publish_status × 3                  │
//! │  check_is_testable(primary)         -> Testability           │
//! │  exit_code(primary, network)        -> ExitCode              │
//! │  diff_pass(stable, Some(captured))  -> ReportData (stable)   │
//! │    └── compare_and_merge            ResultComparer × N       │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod build_source;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod exit_code;
pub mod gate;
pub mod github;
pub mod merge;
pub mod network;
pub mod orchestrator;
pub mod policy;
pub mod report;
pub mod visual;

#[cfg(test)]
pub(crate) mod testing;

pub use collaborators::{
    BuildSource, CliConfig, Collaborators, ReportController, ResultComparer, StatusReporter,
};
pub use config::{ResolvedCliConfig, RunnerConfig};
pub use error::{RunError, RunResult};
pub use exit_code::{exit_code, ExitCode};
pub use gate::{check_is_testable, Testability};
pub use orchestrator::{DiffOrchestrator, RunOutcome};
