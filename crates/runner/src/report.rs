//! Directory-backed report lifecycle
//!
//! Layout:
//!
//! ```text
//! <baseline_dir>/<diff base slug>/manifest.json   baseline screenshots of a diff base
//! <capture_dir>/manifest.json                     screenshots of the current capture
//! <output_dir>/<diff base slug>/                  report.json, index.html, images/
//! ```
//!
//! Image paths in a manifest are relative to the manifest's directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shotdiff_common::{
    slugify, CaptureState, Category, Error, GoldenDiffBase, ReportData, ReportMeta, Result,
    Screenshot, UserAgent,
};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::collaborators::{ReportController, ResultComparer};
use crate::merge::compare_and_merge;

const MANIFEST_FILE: &str = "manifest.json";

/// Screenshot listing written by the capture tool or stored with a baseline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenshotManifest {
    #[serde(default)]
    pub golden_diff_base: Option<GoldenDiffBase>,
    pub screenshots: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub html_file_path: String,
    pub user_agent: UserAgent,
    pub image_file: PathBuf,
    #[serde(default)]
    pub html_file: Option<PathBuf>,
}

impl ScreenshotManifest {
    /// Load `manifest.json` from `dir`, or `None` when there is none
    pub async fn load_from(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(MANIFEST_FILE);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

/// Report controller working on local directories
pub struct LocalReportController {
    baseline_dir: PathBuf,
    capture_dir: PathBuf,
    assets_dir: Option<PathBuf>,
    output_dir: PathBuf,
    comparer: Arc<dyn ResultComparer>,
}

impl LocalReportController {
    pub fn new(
        baseline_dir: impl Into<PathBuf>,
        capture_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        comparer: Arc<dyn ResultComparer>,
    ) -> Self {
        Self {
            baseline_dir: baseline_dir.into(),
            capture_dir: capture_dir.into(),
            assets_dir: None,
            output_dir: output_dir.into(),
            comparer,
        }
    }

    pub fn with_assets(mut self, assets_dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = Some(assets_dir.into());
        self
    }

    /// Output directory of the report for `diff_base`
    pub fn report_dir(&self, diff_base: &str) -> PathBuf {
        self.output_dir.join(slugify(diff_base))
    }

    async fn load_captures(&self) -> Result<Vec<Screenshot>> {
        let manifest = ScreenshotManifest::load_from(&self.capture_dir)
            .await?
            .ok_or_else(|| {
                Error::Capture(format!(
                    "no capture manifest in {}",
                    self.capture_dir.display()
                ))
            })?;

        let mut captures = Vec::with_capacity(manifest.screenshots.len());
        for entry in manifest.screenshots {
            let mut shot = Screenshot::new(entry.html_file_path, entry.user_agent);
            let image = self.capture_dir.join(&entry.image_file);
            // A failed capture has no image; comparing it reports a change.
            if tokio::fs::try_exists(&image).await? {
                shot.capture_state = CaptureState::Done;
                shot.actual_image_file = Some(image);
            } else {
                warn!("Captured image {} is missing", image.display());
                shot.capture_state = CaptureState::Failed;
            }
            shot.actual_html_file = entry.html_file.map(|f| self.capture_dir.join(f));
            captures.push(shot);
        }
        Ok(captures)
    }
}

#[async_trait]
impl ReportController for LocalReportController {
    async fn init_for_capture(&self, diff_base: &str) -> Result<ReportData> {
        let dir = self.baseline_dir.join(slugify(diff_base));
        let mut meta = ReportMeta::new(diff_base);

        let manifest = match ScreenshotManifest::load_from(&dir).await? {
            Some(manifest) => manifest,
            None => {
                warn!("No baseline for {} in {}", diff_base, dir.display());
                ScreenshotManifest::default()
            }
        };
        meta.golden_diff_base = manifest.golden_diff_base;

        let mut report = ReportData::new(meta);
        for entry in manifest.screenshots {
            let mut shot = Screenshot::new(entry.html_file_path, entry.user_agent);
            shot.expected_image_file = Some(dir.join(entry.image_file));
            report.screenshots.insert_into(Category::Actual, shot);
        }

        info!(
            "Initialized report for {} with {} baseline screenshot(s)",
            diff_base,
            report.screenshots.len()
        );
        Ok(report)
    }

    async fn upload_all_assets(&self, report: &ReportData) -> Result<()> {
        let Some(assets) = self.assets_dir.clone() else {
            return Ok(());
        };
        let target = self.report_dir(&report.meta.diff_base).join("assets");
        let destination = target.clone();
        let copied = tokio::task::spawn_blocking(move || copy_tree(&assets, &destination))
            .await
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;
        info!("Copied {} asset(s) to {}", copied, target.display());
        Ok(())
    }

    async fn capture_all_pages(&self, report: &mut ReportData) -> Result<()> {
        let captured = self.load_captures().await?;
        info!("Loaded {} captured screenshot(s)", captured.len());

        compare_and_merge(report, &captured, self.comparer.as_ref()).await?;

        let baseline = report.screenshots.ids(Category::Actual).to_vec();
        for id in baseline {
            let Some(shot) = report.screenshots.get(id) else {
                continue;
            };
            if !captured.iter().any(|c| c.matches(shot)) {
                debug!("{} was removed", shot);
                report.screenshots.push(Category::Removed, id);
            }
        }

        for shot in captured {
            let known = report
                .screenshots
                .iter(Category::Actual)
                .any(|baseline| baseline.matches(&shot));
            if !known {
                debug!("{} was added", shot);
                report.screenshots.insert_into(Category::Added, shot);
            }
        }

        Ok(())
    }

    async fn populate_maps(&self, report: &mut ReportData) -> Result<()> {
        report.populate_maps();
        Ok(())
    }

    async fn upload_all_images(&self, report: &ReportData) -> Result<()> {
        let images_dir = self.report_dir(&report.meta.diff_base).join("images");
        tokio::fs::create_dir_all(&images_dir).await?;

        let mut copied = 0;
        for (_, shot) in report.screenshots.entries() {
            for (kind, source) in [
                (ImageKind::Actual, &shot.actual_image_file),
                (ImageKind::Diff, &shot.diff_image_file),
            ] {
                let Some(source) = source else {
                    continue;
                };
                if !tokio::fs::try_exists(source).await? {
                    warn!("Image {} does not exist; not uploading", source.display());
                    continue;
                }
                tokio::fs::copy(source, images_dir.join(report_image_name(shot, kind, source)))
                    .await?;
                copied += 1;
            }
        }

        info!("Copied {} image(s) to {}", copied, images_dir.display());
        Ok(())
    }

    async fn generate_report_page(&self, report: &ReportData) -> Result<()> {
        let dir = self.report_dir(&report.meta.diff_base);
        tokio::fs::create_dir_all(&dir).await?;

        let json = serde_json::to_string_pretty(report)?;
        tokio::fs::write(dir.join("report.json"), json).await?;
        tokio::fs::write(dir.join("index.html"), render_html(report)).await?;

        info!("Report written to: {}", dir.display());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum ImageKind {
    Actual,
    Diff,
}

/// File name of a screenshot image inside `images/`, unique per screenshot
fn report_image_name(shot: &Screenshot, kind: ImageKind, source: &Path) -> String {
    let suffix = match kind {
        ImageKind::Actual => "actual",
        ImageKind::Diff => "diff",
    };
    let extension = source
        .extension()
        .map(|ext| ext.to_string_lossy().to_string())
        .unwrap_or_else(|| "png".to_string());
    format!("{}-{}.{}", shot.slug(), suffix, extension)
}

/// Copy every file below `from` into `to`, keeping relative paths
fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| Error::NotFound(e.to_string()))?;
        let target = to.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(entry.path(), &target)?;
        copied += 1;
    }
    Ok(copied)
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn image_cell(shot: &Screenshot, kind: ImageKind, source: Option<&PathBuf>) -> String {
    match source {
        Some(source) => {
            let name = escape_html(&report_image_name(shot, kind, source));
            format!(r#"<a href="images/{0}"><img src="images/{0}" width="240"></a>"#, name)
        }
        None => "&ndash;".to_string(),
    }
}

fn render_html(report: &ReportData) -> String {
    let table = &report.screenshots;
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>Screenshots against {}</title>\n</head>\n<body>\n",
        escape_html(&report.meta.diff_base)
    ));
    html.push_str(&format!(
        "<h1>Screenshots against {}</h1>\n<p>{} changed, {} added, {} removed, {} unchanged</p>\n",
        escape_html(&report.meta.diff_base),
        table.changed.len(),
        table.added.len(),
        table.removed.len(),
        table.unchanged.len()
    ));

    for (title, category) in [
        ("Changed", Category::Changed),
        ("Added", Category::Added),
        ("Removed", Category::Removed),
        ("Unchanged", Category::Unchanged),
    ] {
        if table.ids(category).is_empty() {
            continue;
        }
        html.push_str(&format!("<h2>{}</h2>\n<table>\n", title));
        html.push_str("<tr><th>Page</th><th>User agent</th><th>Actual</th><th>Diff</th></tr>\n");
        for shot in table.iter(category) {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&shot.html_file_path),
                escape_html(&shot.user_agent.alias),
                image_cell(shot, ImageKind::Actual, shot.actual_image_file.as_ref()),
                image_cell(shot, ImageKind::Diff, shot.diff_image_file.as_ref()),
            ));
        }
        html.push_str("</table>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}
