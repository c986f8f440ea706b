//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use shotdiff_common::ReportData;
use shotdiff_runner::{ExitCode, RunOutcome};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

/// Screenshot counts of one diff pass
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PassSummary {
    pub diff_base: String,
    pub changed: usize,
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub compared: usize,
}

impl PassSummary {
    pub fn from_report(report: &ReportData) -> Self {
        let table = &report.screenshots;
        Self {
            diff_base: report.meta.diff_base.clone(),
            changed: table.changed.len(),
            added: table.added.len(),
            removed: table.removed.len(),
            unchanged: table.unchanged.len(),
            compared: table.comparable.len(),
        }
    }
}

impl TableDisplay for PassSummary {
    fn headers() -> Vec<&'static str> {
        vec!["Diff Base", "Changed", "Added", "Removed", "Unchanged", "Compared"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.diff_base.clone(),
            self.changed.to_string(),
            self.added.to_string(),
            self.removed.to_string(),
            self.unchanged.to_string(),
            self.compared.to_string(),
        ]
    }
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    exit_code: i32,
    skipped: bool,
    pr_number: Option<u64>,
    passes: &'a [PassSummary],
}

/// Summaries of every pass that ran, primary first
pub fn summarize(outcome: &RunOutcome) -> Vec<PassSummary> {
    std::iter::once(&outcome.primary)
        .chain(outcome.stable.as_ref())
        .map(PassSummary::from_report)
        .collect()
}

/// Print the outcome of a run
pub fn print_outcome(outcome: &RunOutcome, format: OutputFormat) {
    let passes = summarize(outcome);

    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(PassSummary::headers());
            for pass in &passes {
                table.add_row(pass.row());
            }

            println!("{table}");

            if !outcome.testability.is_testable {
                print_info("Pull request changed no files; screenshot tests skipped");
            } else if outcome.exit_code == ExitCode::ChangesFound {
                print_warning("Screenshot changes found");
            } else {
                print_success("Screenshot tests passed");
            }
        }
        OutputFormat::Json => {
            let summary = RunSummary {
                exit_code: outcome.exit_code.code(),
                skipped: !outcome.testability.is_testable,
                pr_number: outcome.testability.pr_number,
                passes: &passes,
            };
            println!("{}", serde_json::to_string_pretty(&summary).unwrap_or_default());
        }
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "!".yellow().bold(), message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}
