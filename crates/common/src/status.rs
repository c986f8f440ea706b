//! Pull-request check status derived from report state

use serde::{Deserialize, Serialize};

use crate::types::{Category, ReportData};

/// Check state, serialized the way the GitHub commit status API expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Pending,
    Success,
    Failure,
    Error,
}

impl std::fmt::Display for CheckState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckState::Pending => write!(f, "pending"),
            CheckState::Success => write!(f, "success"),
            CheckState::Failure => write!(f, "failure"),
            CheckState::Error => write!(f, "error"),
        }
    }
}

/// A status ready to be published for a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckStatus {
    pub state: CheckState,
    pub description: String,
}

impl CheckStatus {
    /// Derive the status from the current state of a report.
    ///
    /// Screenshots still waiting for capture keep the check pending. Removed
    /// screenshots are never captured and do not count.
    pub fn from_report(report: &ReportData) -> Self {
        let table = &report.screenshots;
        let expected: Vec<_> = table
            .ids(Category::Actual)
            .iter()
            .filter(|id| !table.contains(Category::Removed, **id))
            .filter_map(|id| table.get(*id))
            .collect();
        let pending = expected
            .iter()
            .filter(|s| !s.is_captured() && s.diff_image_result.is_none())
            .count();
        let total = expected.len();

        if pending > 0 {
            return Self {
                state: CheckState::Pending,
                description: format!("Capturing {} of {} screenshots", pending, total),
            };
        }

        if table.num_changes() == 0 {
            return Self {
                state: CheckState::Success,
                description: format!("No visual changes in {} screenshots", table.comparable.len()),
            };
        }

        Self {
            state: CheckState::Failure,
            description: format!(
                "{} changed, {} added, {} removed",
                table.changed.len(),
                table.added.len(),
                table.removed.len()
            ),
        }
    }

    /// Terminal status published when a pass fails
    pub fn error() -> Self {
        Self {
            state: CheckState::Error,
            description: "Failed to run screenshot tests".to_string(),
        }
    }
}
