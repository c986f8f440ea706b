//! Exit code derivation

use shotdiff_common::ReportData;

/// Process exit status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok,
    /// Screenshots changed and the run is connected, i.e. the build should fail
    ChangesFound,
}

impl ExitCode {
    /// Exit status of a run that ended in an unrecovered error
    pub const FAILURE_CODE: i32 = 2;

    pub fn code(self) -> i32 {
        match self {
            ExitCode::Ok => 0,
            ExitCode::ChangesFound => 1,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitCode::Ok => write!(f, "ok"),
            ExitCode::ChangesFound => write!(f, "changes found"),
        }
    }
}

/// Derive the exit code of a report.
///
/// Offline runs never fail on detected differences.
pub fn exit_code(report: &ReportData, network_reachable: bool) -> ExitCode {
    let num_changes = report.screenshots.num_changes();
    if network_reachable && num_changes > 0 {
        ExitCode::ChangesFound
    } else {
        ExitCode::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shotdiff_common::{Category, DiffImageResult, ReportMeta, Screenshot, UserAgent};
    use test_case::test_case;

    fn report(changed: usize, added: usize, removed: usize, unchanged: usize) -> ReportData {
        let mut report = ReportData::new(ReportMeta::new("origin/feature"));
        let table = &mut report.screenshots;
        for i in 0..changed {
            let id = table.insert_into(
                Category::Actual,
                Screenshot::new(format!("/changed-{i}.html"), UserAgent::new("chrome")),
            );
            table.record_comparison(id, DiffImageResult::changed(None, 2.0));
        }
        for i in 0..unchanged {
            let id = table.insert_into(
                Category::Actual,
                Screenshot::new(format!("/same-{i}.html"), UserAgent::new("chrome")),
            );
            table.record_comparison(id, DiffImageResult::unchanged());
        }
        for i in 0..added {
            table.insert_into(
                Category::Added,
                Screenshot::new(format!("/added-{i}.html"), UserAgent::new("chrome")),
            );
        }
        for i in 0..removed {
            table.insert_into(
                Category::Removed,
                Screenshot::new(format!("/removed-{i}.html"), UserAgent::new("chrome")),
            );
        }
        report
    }

    #[test_case(0, 0, 0, 0, true, ExitCode::Ok ; "empty report online")]
    #[test_case(0, 0, 0, 5, true, ExitCode::Ok ; "unchanged screenshots never count")]
    #[test_case(0, 0, 0, 0, false, ExitCode::Ok ; "empty report offline")]
    #[test_case(1, 0, 0, 0, true, ExitCode::ChangesFound ; "changed online")]
    #[test_case(0, 1, 0, 0, true, ExitCode::ChangesFound ; "added online")]
    #[test_case(0, 0, 1, 0, true, ExitCode::ChangesFound ; "removed online")]
    #[test_case(2, 1, 1, 3, false, ExitCode::Ok ; "changes offline")]
    fn test_exit_code(
        changed: usize,
        added: usize,
        removed: usize,
        unchanged: usize,
        online: bool,
        expected: ExitCode,
    ) {
        assert_eq!(exit_code(&report(changed, added, removed, unchanged), online), expected);
    }

    #[test]
    fn test_codes_are_distinct() {
        assert_eq!(ExitCode::Ok.code(), 0);
        assert_ne!(ExitCode::ChangesFound.code(), 0);
        assert_ne!(ExitCode::ChangesFound.code(), ExitCode::FAILURE_CODE);
    }
}
