//! Testability gate
//!
//! A pull-request run that changed no files has nothing to screenshot.

use shotdiff_common::ReportData;

/// Outcome of the testability gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Testability {
    pub is_testable: bool,
    pub pr_number: Option<u64>,
}

/// Decide whether a report's diff base warrants screenshot testing
pub fn check_is_testable(report: &ReportData) -> Testability {
    let Some(revision) = report.git_revision() else {
        return Testability {
            is_testable: true,
            pr_number: None,
        };
    };

    let nothing_changed = revision.is_ci_pull_request() && revision.pr_file_paths.is_empty();

    Testability {
        is_testable: !nothing_changed,
        pr_number: revision.pr_number,
    }
}
