//! Concurrent comparison merge
//!
//! Compares the baseline screenshots of a report against screenshots captured
//! in an earlier pass, without capturing again.

use futures::future::try_join_all;
use shotdiff_common::{Category, Error, ReportData, Result, Screenshot, ScreenshotId};
use tracing::{debug, info};

use crate::collaborators::ResultComparer;

/// Merge `captured` into the baseline (`actual`) screenshots of `report`.
///
/// Every baseline screenshot with a captured counterpart (same HTML file and
/// user-agent alias) receives the captured artifacts and is compared. All
/// comparisons run concurrently and must all succeed; results are then filed
/// into `changed`/`unchanged` and `comparable`. Baseline screenshots without
/// a counterpart are left untouched.
///
/// Returns the number of screenshots compared.
pub async fn compare_and_merge(
    report: &mut ReportData,
    captured: &[Screenshot],
    comparer: &dyn ResultComparer,
) -> Result<usize> {
    let matched = attach_captures(report, captured);
    if matched.is_empty() {
        debug!("No captured screenshots match the baseline of {}", report.meta.diff_base);
        return Ok(0);
    }

    info!(
        "Comparing {} screenshot(s) against {}",
        matched.len(),
        report.meta.diff_base
    );

    let results = {
        let meta = &report.meta;
        let table = &report.screenshots;
        let comparisons = matched.iter().map(|&id| async move {
            let screenshot = table
                .get(id)
                .ok_or_else(|| Error::NotFound(format!("screenshot {}", id)))?;
            let result = comparer.compare_one_screenshot(meta, screenshot).await?;
            debug!("Compared {}: changed={}", screenshot, result.has_changed);
            Ok::<_, Error>((id, result))
        });
        try_join_all(comparisons).await?
    };

    let compared = results.len();
    for (id, result) in results {
        report.screenshots.record_comparison(id, result);
    }
    Ok(compared)
}

/// Copy captured artifacts onto every matching baseline screenshot and return
/// the matched handles in baseline order
fn attach_captures(report: &mut ReportData, captured: &[Screenshot]) -> Vec<ScreenshotId> {
    let baseline = report.screenshots.ids(Category::Actual).to_vec();
    let mut matched = Vec::new();

    for id in baseline {
        let Some(screenshot) = report.screenshots.get_mut(id) else {
            continue;
        };
        for candidate in captured {
            if screenshot.matches(candidate) {
                screenshot.copy_capture_from(candidate);
                if !matched.contains(&id) {
                    matched.push(id);
                }
            }
        }
    }

    matched
}
