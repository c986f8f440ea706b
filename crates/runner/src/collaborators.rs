//! Interfaces of the collaborators a diff run drives
//!
//! Each collaborator is constructed once at process entry and handed to the
//! orchestrator through [`Collaborators`].

use std::sync::Arc;

use async_trait::async_trait;
use shotdiff_common::{DiffImageResult, ReportData, ReportMeta, Result, Screenshot};

/// Builds the project before anything is captured
#[async_trait]
pub trait BuildSource: Send + Sync {
    async fn run(&self) -> Result<()>;
}

/// Resolved command-line settings
pub trait CliConfig: Send + Sync {
    /// Branch or revision the primary pass diffs against
    fn diff_base(&self) -> &str;

    /// Whether the run can reach the network (CI) or is a local/offline run
    fn is_network_reachable(&self) -> bool;

    /// Branch the secondary pass diffs against
    fn stable_branch(&self) -> &str {
        shotdiff_common::DEFAULT_STABLE_BRANCH
    }
}

/// Owns the capture, upload and report lifecycle of a pass
#[async_trait]
pub trait ReportController: Send + Sync {
    /// Create a report whose `actual` list holds the baseline screenshots of `diff_base`
    async fn init_for_capture(&self, diff_base: &str) -> Result<ReportData>;

    async fn upload_all_assets(&self, report: &ReportData) -> Result<()>;

    /// Capture every page and file the screenshots into their categories
    async fn capture_all_pages(&self, report: &mut ReportData) -> Result<()>;

    async fn populate_maps(&self, report: &mut ReportData) -> Result<()>;

    async fn upload_all_images(&self, report: &ReportData) -> Result<()>;

    async fn generate_report_page(&self, report: &ReportData) -> Result<()>;
}

/// Computes the pixel diff of one screenshot against its baseline
#[async_trait]
pub trait ResultComparer: Send + Sync {
    async fn compare_one_screenshot(
        &self,
        meta: &ReportMeta,
        screenshot: &Screenshot,
    ) -> Result<DiffImageResult>;
}

/// Publishes the pull-request check status
#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn publish_status(&self, report: &ReportData) -> Result<()>;

    /// Publish the terminal error status
    async fn publish_error(&self) -> Result<()>;
}

/// Collaborators of one run
#[derive(Clone)]
pub struct Collaborators {
    pub build: Arc<dyn BuildSource>,
    pub config: Arc<dyn CliConfig>,
    pub reports: Arc<dyn ReportController>,
    pub comparer: Arc<dyn ResultComparer>,
    pub status: Arc<dyn StatusReporter>,
}
