//! Core types for shotdiff
//!
//! A [`ReportData`] owns every screenshot of one diff pass in a single arena
//! ([`ScreenshotTable`]). The category lists (`changed`, `added`, ...) hold
//! [`ScreenshotId`] handles into that arena, so a comparison result attached
//! to a screenshot is observed through every list that references it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Replace everything but ASCII alphanumerics, `.` and `-` with `_`
pub fn slugify(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}

/// Handle of a screenshot inside its owning [`ScreenshotTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenshotId(pub usize);

impl std::fmt::Display for ScreenshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Browser profile a page was rendered with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAgent {
    /// Short identifier used for matching, e.g. `chrome` or `ios-safari`
    pub alias: String,
    /// Full user-agent string
    #[serde(default)]
    pub name: String,
}

impl UserAgent {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            name: String::new(),
        }
    }
}

/// Capture state of a screenshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    Pending,
    Done,
    Failed,
}

impl Default for CaptureState {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureState::Pending => write!(f, "pending"),
            CaptureState::Done => write!(f, "done"),
            CaptureState::Failed => write!(f, "failed"),
        }
    }
}

/// Output of comparing one screenshot against its baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffImageResult {
    pub has_changed: bool,
    /// Generated diff artifact, absent when nothing differed
    pub diff_image_file: Option<PathBuf>,
    /// Percentage of pixels that differ
    #[serde(default)]
    pub diff_percent: f64,
}

impl DiffImageResult {
    pub fn unchanged() -> Self {
        Self {
            has_changed: false,
            diff_image_file: None,
            diff_percent: 0.0,
        }
    }

    pub fn changed(diff_image_file: Option<PathBuf>, diff_percent: f64) -> Self {
        Self {
            has_changed: true,
            diff_image_file,
            diff_percent,
        }
    }
}

/// One rendered page variant, identified by `(html_file_path, user_agent)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screenshot {
    pub html_file_path: String,
    pub user_agent: UserAgent,

    /// Baseline image this screenshot is compared against
    #[serde(default)]
    pub expected_image_file: Option<PathBuf>,

    #[serde(default)]
    pub actual_html_file: Option<PathBuf>,
    #[serde(default)]
    pub actual_image_file: Option<PathBuf>,
    #[serde(default)]
    pub capture_state: CaptureState,

    #[serde(default)]
    pub diff_image_result: Option<DiffImageResult>,
    #[serde(default)]
    pub diff_image_file: Option<PathBuf>,
}

impl Screenshot {
    pub fn new(html_file_path: impl Into<String>, user_agent: UserAgent) -> Self {
        Self {
            html_file_path: html_file_path.into(),
            user_agent,
            expected_image_file: None,
            actual_html_file: None,
            actual_image_file: None,
            capture_state: CaptureState::Pending,
            diff_image_result: None,
            diff_image_file: None,
        }
    }

    /// Key two screenshots are matched on across reports
    pub fn key(&self) -> (&str, &str) {
        (&self.html_file_path, &self.user_agent.alias)
    }

    pub fn matches(&self, other: &Screenshot) -> bool {
        self.key() == other.key()
    }

    /// Filesystem-safe name, e.g. `chrome__docs_index.html`
    pub fn slug(&self) -> String {
        format!(
            "{}__{}",
            slugify(&self.user_agent.alias),
            slugify(self.html_file_path.trim_start_matches('/'))
        )
    }

    /// Copy the captured artifacts of `captured` onto this screenshot
    pub fn copy_capture_from(&mut self, captured: &Screenshot) {
        self.actual_html_file = captured.actual_html_file.clone();
        self.actual_image_file = captured.actual_image_file.clone();
        self.capture_state = captured.capture_state;
    }

    pub fn is_captured(&self) -> bool {
        self.capture_state == CaptureState::Done
    }

    /// Attach a comparison result, mirroring its artifact onto the screenshot
    pub fn set_diff_result(&mut self, result: DiffImageResult) {
        self.diff_image_file = result.diff_image_file.clone();
        self.diff_image_result = Some(result);
    }
}

impl std::fmt::Display for Screenshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.html_file_path, self.user_agent.alias)
    }
}

/// Kind of source a diff base was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionType {
    CiPullRequest,
    LocalCommit,
    LocalBranch,
    RemoteBranch,
}

/// Git revision a diff base was resolved from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitRevision {
    #[serde(rename = "type")]
    pub revision_type: RevisionType,
    #[serde(default)]
    pub pr_number: Option<u64>,
    /// Files changed by the pull request
    #[serde(default)]
    pub pr_file_paths: Vec<String>,
    #[serde(default)]
    pub sha: Option<String>,
}

impl GitRevision {
    pub fn ci_pull_request(pr_number: u64, pr_file_paths: Vec<String>) -> Self {
        Self {
            revision_type: RevisionType::CiPullRequest,
            pr_number: Some(pr_number),
            pr_file_paths,
            sha: None,
        }
    }

    pub fn is_ci_pull_request(&self) -> bool {
        self.revision_type == RevisionType::CiPullRequest
    }
}

/// Provenance of the golden images a report is diffed against
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoldenDiffBase {
    #[serde(default)]
    pub git_revision: Option<GitRevision>,
}

/// Report metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub diff_base: String,
    #[serde(default)]
    pub golden_diff_base: Option<GoldenDiffBase>,
    pub created_at: i64,
}

impl ReportMeta {
    pub fn new(diff_base: impl Into<String>) -> Self {
        Self {
            diff_base: diff_base.into(),
            golden_diff_base: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_golden_diff_base(mut self, golden: GoldenDiffBase) -> Self {
        self.golden_diff_base = Some(golden);
        self
    }

    pub fn git_revision(&self) -> Option<&GitRevision> {
        self.golden_diff_base
            .as_ref()
            .and_then(|golden| golden.git_revision.as_ref())
    }
}

/// Named screenshot lists of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Changed,
    Added,
    Removed,
    Unchanged,
    Comparable,
    Actual,
}

/// Arena of screenshots plus the category lists referencing it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenshotTable {
    arena: Vec<Screenshot>,
    pub changed: Vec<ScreenshotId>,
    pub added: Vec<ScreenshotId>,
    pub removed: Vec<ScreenshotId>,
    pub unchanged: Vec<ScreenshotId>,
    pub comparable: Vec<ScreenshotId>,
    pub actual: Vec<ScreenshotId>,
}

impl ScreenshotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a screenshot without filing it into any list
    pub fn insert(&mut self, screenshot: Screenshot) -> ScreenshotId {
        let id = ScreenshotId(self.arena.len());
        self.arena.push(screenshot);
        id
    }

    /// Store a screenshot and file it into `category`
    pub fn insert_into(&mut self, category: Category, screenshot: Screenshot) -> ScreenshotId {
        let id = self.insert(screenshot);
        self.push(category, id);
        id
    }

    pub fn get(&self, id: ScreenshotId) -> Option<&Screenshot> {
        self.arena.get(id.0)
    }

    pub fn get_mut(&mut self, id: ScreenshotId) -> Option<&mut Screenshot> {
        self.arena.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn ids(&self, category: Category) -> &[ScreenshotId] {
        match category {
            Category::Changed => &self.changed,
            Category::Added => &self.added,
            Category::Removed => &self.removed,
            Category::Unchanged => &self.unchanged,
            Category::Comparable => &self.comparable,
            Category::Actual => &self.actual,
        }
    }

    fn ids_mut(&mut self, category: Category) -> &mut Vec<ScreenshotId> {
        match category {
            Category::Changed => &mut self.changed,
            Category::Added => &mut self.added,
            Category::Removed => &mut self.removed,
            Category::Unchanged => &mut self.unchanged,
            Category::Comparable => &mut self.comparable,
            Category::Actual => &mut self.actual,
        }
    }

    /// Screenshots filed under `category`, in list order
    pub fn iter(&self, category: Category) -> impl Iterator<Item = &Screenshot> + '_ {
        self.ids(category).iter().filter_map(move |id| self.get(*id))
    }

    /// Every stored screenshot with its handle
    pub fn entries(&self) -> impl Iterator<Item = (ScreenshotId, &Screenshot)> + '_ {
        self.arena
            .iter()
            .enumerate()
            .map(|(index, screenshot)| (ScreenshotId(index), screenshot))
    }

    /// File `id` under `category` unless it is already there
    pub fn push(&mut self, category: Category, id: ScreenshotId) {
        let list = self.ids_mut(category);
        if !list.contains(&id) {
            list.push(id);
        }
    }

    pub fn contains(&self, category: Category, id: ScreenshotId) -> bool {
        self.ids(category).contains(&id)
    }

    /// Attach a comparison result and file the screenshot accordingly.
    ///
    /// The screenshot ends up in exactly one of `changed`/`unchanged` and in
    /// `comparable`; recording the same result twice leaves the lists as they
    /// were.
    pub fn record_comparison(&mut self, id: ScreenshotId, result: DiffImageResult) -> bool {
        let has_changed = result.has_changed;
        match self.get_mut(id) {
            Some(screenshot) => screenshot.set_diff_result(result),
            None => return false,
        }

        let (target, other) = if has_changed {
            (Category::Changed, Category::Unchanged)
        } else {
            (Category::Unchanged, Category::Changed)
        };
        self.ids_mut(other).retain(|existing| *existing != id);
        self.push(target, id);
        self.push(Category::Comparable, id);
        true
    }

    /// Owned copies of every screenshot filed as changed, added, removed or
    /// unchanged, i.e. the full captured set of a pass
    pub fn categorized(&self) -> Vec<Screenshot> {
        [
            Category::Changed,
            Category::Added,
            Category::Removed,
            Category::Unchanged,
        ]
        .into_iter()
        .flat_map(|category| self.iter(category).cloned())
        .collect()
    }

    /// Number of changed, added and removed screenshots
    pub fn num_changes(&self) -> usize {
        self.changed.len() + self.added.len() + self.removed.len()
    }
}

/// Lookup maps derived from the screenshot table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMaps {
    pub by_html_file: BTreeMap<String, Vec<ScreenshotId>>,
    pub by_user_agent: BTreeMap<String, Vec<ScreenshotId>>,
}

/// Aggregate root of one diff pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub meta: ReportMeta,
    pub screenshots: ScreenshotTable,
    #[serde(default)]
    pub maps: ReportMaps,
}

impl ReportData {
    pub fn new(meta: ReportMeta) -> Self {
        Self {
            meta,
            screenshots: ScreenshotTable::new(),
            maps: ReportMaps::default(),
        }
    }

    pub fn git_revision(&self) -> Option<&GitRevision> {
        self.meta.git_revision()
    }

    /// Rebuild [`ReportMaps`] from the current screenshot table
    pub fn populate_maps(&mut self) {
        let mut maps = ReportMaps::default();
        for (id, screenshot) in self.screenshots.entries() {
            maps.by_html_file
                .entry(screenshot.html_file_path.clone())
                .or_default()
                .push(id);
            maps.by_user_agent
                .entry(screenshot.user_agent.alias.clone())
                .or_default()
                .push(id);
        }
        self.maps = maps;
    }
}
