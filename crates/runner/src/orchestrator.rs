//! Diff orchestrator: build, primary pass, gate, status, stable-branch pass

use shotdiff_common::{ReportData, Screenshot};
use tracing::{debug, error, info, warn};

use crate::collaborators::Collaborators;
use crate::error::{RunError, RunResult};
use crate::exit_code::{exit_code, ExitCode};
use crate::gate::{check_is_testable, Testability};
use crate::merge::compare_and_merge;
use crate::policy::is_stable_reference_branch;

/// Result of a complete run
#[derive(Debug)]
pub struct RunOutcome {
    pub exit_code: ExitCode,
    pub testability: Testability,
    /// Report of the pass against the configured diff base
    pub primary: ReportData,
    /// Report of the pass against the stable reference branch, if it ran
    pub stable: Option<ReportData>,
}

/// Drives a visual-regression run through its collaborators
pub struct DiffOrchestrator {
    ctx: Collaborators,
}

impl DiffOrchestrator {
    pub fn new(ctx: Collaborators) -> Self {
        Self { ctx }
    }

    /// Run and return only the exit code
    pub async fn run(&self) -> RunResult<ExitCode> {
        Ok(self.execute().await?.exit_code)
    }

    /// Run and keep the reports of every pass
    pub async fn execute(&self) -> RunResult<RunOutcome> {
        info!("Waiting for build to complete...");
        self.ctx.build.run().await.map_err(RunError::Build)?;

        let config = &self.ctx.config;
        let diff_base = config.diff_base().to_string();
        let network_reachable = config.is_network_reachable();

        let primary = self.diff_pass(&diff_base, None).await?;

        let testability = check_is_testable(&primary);
        if !testability.is_testable {
            let pr = testability
                .pr_number
                .map(|n| format!("#{}", n))
                .unwrap_or_else(|| "(unknown)".to_string());
            info!("Skipping screenshot tests: pull request {} changed no files", pr);
            return Ok(RunOutcome {
                exit_code: ExitCode::Ok,
                testability,
                primary,
                stable: None,
            });
        }

        self.ctx
            .status
            .publish_status(&primary)
            .await
            .map_err(RunError::Status)?;

        let stable_branch = config.stable_branch().to_string();
        if is_stable_reference_branch(&diff_base, &stable_branch) {
            info!("{} is the stable reference branch; not diffing it against itself", diff_base);
            return Ok(RunOutcome {
                exit_code: ExitCode::Ok,
                testability,
                primary,
                stable: None,
            });
        }

        let code = exit_code(&primary, network_reachable);
        if code != ExitCode::Ok {
            info!(
                "{} screenshot change(s) against {}",
                primary.screenshots.num_changes(),
                diff_base
            );
            return Ok(RunOutcome {
                exit_code: code,
                testability,
                primary,
                stable: None,
            });
        }

        let captured = primary.screenshots.categorized();
        info!(
            "Comparing {} captured screenshot(s) against {}",
            captured.len(),
            stable_branch
        );
        let stable = self.diff_pass(&stable_branch, Some(&captured)).await?;

        // Informational only; the run already passed against its diff base.
        let stable_code = exit_code(&stable, network_reachable);
        info!(
            "{} screenshot change(s) against {} ({})",
            stable.screenshots.num_changes(),
            stable_branch,
            stable_code
        );

        Ok(RunOutcome {
            exit_code: ExitCode::Ok,
            testability,
            primary,
            stable: Some(stable),
        })
    }

    /// Run one diff pass against `diff_base`.
    ///
    /// Without `captured` screenshots the pass captures every page; with them
    /// it reuses those captures and only compares. A failure publishes the
    /// error status once and is returned with the pass context.
    pub async fn diff_pass(
        &self,
        diff_base: &str,
        captured: Option<&[Screenshot]>,
    ) -> RunResult<ReportData> {
        match self.try_diff_pass(diff_base, captured).await {
            Ok(report) => Ok(report),
            Err(source) => {
                error!("Screenshot tests against {} failed: {}", diff_base, source);
                if let Err(e) = self.ctx.status.publish_error().await {
                    warn!("Failed to publish error status: {}", e);
                }
                Err(RunError::Pass {
                    diff_base: diff_base.to_string(),
                    source,
                })
            }
        }
    }

    async fn try_diff_pass(
        &self,
        diff_base: &str,
        captured: Option<&[Screenshot]>,
    ) -> shotdiff_common::Result<ReportData> {
        let reports = &self.ctx.reports;
        let status = &self.ctx.status;

        debug!("Initializing report for {}", diff_base);
        let mut report = reports.init_for_capture(diff_base).await?;

        match captured {
            None => {
                status.publish_status(&report).await?;
                reports.upload_all_assets(&report).await?;
                reports.capture_all_pages(&mut report).await?;
                status.publish_status(&report).await?;
            }
            Some(captured) => {
                compare_and_merge(&mut report, captured, self.ctx.comparer.as_ref()).await?;
            }
        }

        reports.populate_maps(&mut report).await?;
        reports.upload_all_images(&report).await?;
        reports.generate_report_page(&report).await?;

        if captured.is_none() {
            status.publish_status(&report).await?;
        }

        Ok(report)
    }
}
