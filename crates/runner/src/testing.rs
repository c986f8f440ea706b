//! In-memory collaborators for unit tests

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use shotdiff_common::{
    CaptureState, Category, CheckState, CheckStatus, DiffImageResult, Error, ReportData,
    ReportMeta, Result, Screenshot, UserAgent,
};

use crate::collaborators::{
    BuildSource, CliConfig, Collaborators, ReportController, ResultComparer, StatusReporter,
};

type Key = (String, String);

fn key(path: &str, ua: &str) -> Key {
    (path.to_string(), ua.to_string())
}

#[derive(Default)]
pub struct FakeBuild {
    pub fail: bool,
    runs: AtomicUsize,
}

impl FakeBuild {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BuildSource for FakeBuild {
    async fn run(&self) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Build("npm run build exited with 1".to_string()));
        }
        Ok(())
    }
}

pub struct FakeConfig {
    pub diff_base: String,
    pub online: bool,
    pub stable: String,
}

impl FakeConfig {
    pub fn new(diff_base: &str, online: bool) -> Self {
        Self {
            diff_base: diff_base.to_string(),
            online,
            stable: "origin/master".to_string(),
        }
    }
}

impl CliConfig for FakeConfig {
    fn diff_base(&self) -> &str {
        &self.diff_base
    }

    fn is_network_reachable(&self) -> bool {
        self.online
    }

    fn stable_branch(&self) -> &str {
        &self.stable
    }
}

#[derive(Default)]
pub struct FakeComparer {
    changed: HashSet<Key>,
    failing: HashSet<Key>,
    calls: AtomicUsize,
}

impl FakeComparer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_changed(mut self, path: &str, ua: &str) -> Self {
        self.changed.insert(key(path, ua));
        self
    }

    pub fn failing_for(mut self, path: &str, ua: &str) -> Self {
        self.failing.insert(key(path, ua));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultComparer for FakeComparer {
    async fn compare_one_screenshot(
        &self,
        _meta: &ReportMeta,
        screenshot: &Screenshot,
    ) -> Result<DiffImageResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let (path, ua) = screenshot.key();
        let key = key(path, ua);
        if self.failing.contains(&key) {
            return Err(Error::compare(screenshot.to_string(), "baseline image is corrupt"));
        }
        if self.changed.contains(&key) {
            let diff = PathBuf::from(format!("diffs/{}.png", screenshot.slug()));
            return Ok(DiffImageResult::changed(Some(diff), 12.5));
        }
        Ok(DiffImageResult::unchanged())
    }
}

/// Report controller serving canned baselines and captures
#[derive(Default)]
pub struct FakeReports {
    baselines: HashMap<String, Vec<String>>,
    golden: HashMap<String, shotdiff_common::GoldenDiffBase>,
    changed_on_capture: HashSet<String>,
    added_on_capture: Vec<String>,
    removed_on_capture: HashSet<String>,
    fail_at: Option<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl FakeReports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Baseline pages (rendered in `chrome`) of `diff_base`
    pub fn with_baseline(mut self, diff_base: &str, pages: &[&str]) -> Self {
        self.baselines
            .insert(diff_base.to_string(), pages.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn with_golden(mut self, diff_base: &str, golden: shotdiff_common::GoldenDiffBase) -> Self {
        self.golden.insert(diff_base.to_string(), golden);
        self
    }

    pub fn changing(mut self, pages: &[&str]) -> Self {
        self.changed_on_capture = pages.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn adding(mut self, pages: &[&str]) -> Self {
        self.added_on_capture = pages.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Baseline pages that are no longer captured
    pub fn removing(mut self, pages: &[&str]) -> Self {
        self.removed_on_capture = pages.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn failing_at(mut self, step: &'static str) -> Self {
        self.fail_at = Some(step);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String, step: &'static str) -> Result<()> {
        self.calls.lock().push(call);
        if self.fail_at == Some(step) {
            return Err(Error::Capture(format!("{} failed", step)));
        }
        Ok(())
    }
}

fn captured(path: &str) -> Screenshot {
    let mut shot = Screenshot::new(path, UserAgent::new("chrome"));
    shot.actual_image_file = Some(PathBuf::from(format!("captures/{}.png", shot.slug())));
    shot.capture_state = CaptureState::Done;
    shot
}

#[async_trait]
impl ReportController for FakeReports {
    async fn init_for_capture(&self, diff_base: &str) -> Result<ReportData> {
        self.record(format!("init:{}", diff_base), "init")?;
        let mut meta = ReportMeta::new(diff_base);
        meta.golden_diff_base = self.golden.get(diff_base).cloned();
        let mut report = ReportData::new(meta);
        for page in self.baselines.get(diff_base).into_iter().flatten() {
            report
                .screenshots
                .insert_into(Category::Actual, Screenshot::new(page.as_str(), UserAgent::new("chrome")));
        }
        Ok(report)
    }

    async fn upload_all_assets(&self, _report: &ReportData) -> Result<()> {
        self.record("upload_assets".to_string(), "upload_assets")
    }

    async fn capture_all_pages(&self, report: &mut ReportData) -> Result<()> {
        self.record("capture".to_string(), "capture")?;
        let ids = report.screenshots.ids(Category::Actual).to_vec();
        for id in ids {
            let Some(shot) = report.screenshots.get_mut(id) else {
                continue;
            };
            if self.removed_on_capture.contains(&shot.html_file_path) {
                report.screenshots.push(Category::Removed, id);
                continue;
            }
            let capture = captured(&shot.html_file_path);
            shot.copy_capture_from(&capture);
            let result = if self.changed_on_capture.contains(&shot.html_file_path) {
                DiffImageResult::changed(None, 4.0)
            } else {
                DiffImageResult::unchanged()
            };
            report.screenshots.record_comparison(id, result);
        }
        for page in &self.added_on_capture {
            report.screenshots.insert_into(Category::Added, captured(page));
        }
        Ok(())
    }

    async fn populate_maps(&self, report: &mut ReportData) -> Result<()> {
        self.record("populate_maps".to_string(), "populate_maps")?;
        report.populate_maps();
        Ok(())
    }

    async fn upload_all_images(&self, _report: &ReportData) -> Result<()> {
        self.record("upload_images".to_string(), "upload_images")
    }

    async fn generate_report_page(&self, report: &ReportData) -> Result<()> {
        self.record(format!("generate:{}", report.meta.diff_base), "generate")
    }
}

#[derive(Default)]
pub struct FakeStatus {
    pub fail: bool,
    published: Mutex<Vec<CheckState>>,
    errors: AtomicUsize,
}

impl FakeStatus {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn published(&self) -> Vec<CheckState> {
        self.published.lock().clone()
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusReporter for FakeStatus {
    async fn publish_status(&self, report: &ReportData) -> Result<()> {
        if self.fail {
            return Err(Error::Status("502 Bad Gateway".to_string()));
        }
        self.published.lock().push(CheckStatus::from_report(report).state);
        Ok(())
    }

    async fn publish_error(&self) -> Result<()> {
        self.errors.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fakes wired together, kept around for inspection after a run
pub struct Harness {
    pub build: Arc<FakeBuild>,
    pub config: Arc<FakeConfig>,
    pub reports: Arc<FakeReports>,
    pub comparer: Arc<FakeComparer>,
    pub status: Arc<FakeStatus>,
}

impl Harness {
    pub fn new(config: FakeConfig, reports: FakeReports) -> Self {
        Self {
            build: Arc::new(FakeBuild::default()),
            config: Arc::new(config),
            reports: Arc::new(reports),
            comparer: Arc::new(FakeComparer::new()),
            status: Arc::new(FakeStatus::default()),
        }
    }

    pub fn with_build(mut self, build: FakeBuild) -> Self {
        self.build = Arc::new(build);
        self
    }

    pub fn with_comparer(mut self, comparer: FakeComparer) -> Self {
        self.comparer = Arc::new(comparer);
        self
    }

    pub fn with_status(mut self, status: FakeStatus) -> Self {
        self.status = Arc::new(status);
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            build: self.build.clone(),
            config: self.config.clone(),
            reports: self.reports.clone(),
            comparer: self.comparer.clone(),
            status: self.status.clone(),
        }
    }
}
