//! Runner configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shotdiff_common::{Error, Result, DEFAULT_STABLE_BRANCH};

use crate::collaborators::CliConfig;
use crate::visual::VisualConfig;

/// Settings of a run, loadable from `shotdiff.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Branch the stable comparison pass diffs against
    pub stable_branch: String,

    /// Shell command that builds the project; no build when unset
    pub build_command: Option<String>,

    /// Directory holding one `<diff base>/manifest.json` per diff base
    pub baseline_dir: PathBuf,

    /// Directory the capture tool writes `manifest.json` and images into
    pub capture_dir: PathBuf,

    /// Static assets copied next to the report
    pub assets_dir: Option<PathBuf>,

    /// Output directory for reports
    pub output_dir: PathBuf,

    /// Visual comparison settings
    pub visual: VisualConfig,

    /// GitHub commit status settings; statuses are only logged when unset
    pub github: Option<GitHubConfig>,

    /// Address probed to decide whether the run is connected
    pub network_probe: String,

    pub network_probe_timeout_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            stable_branch: DEFAULT_STABLE_BRANCH.to_string(),
            build_command: None,
            baseline_dir: PathBuf::from("screenshots/baselines"),
            capture_dir: PathBuf::from("screenshots/captures"),
            assets_dir: None,
            output_dir: PathBuf::from("screenshot-report"),
            visual: VisualConfig::default(),
            github: None,
            network_probe: "api.github.com:443".to_string(),
            network_probe_timeout_ms: 2000,
        }
    }
}

impl RunnerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stable_branch.trim().is_empty() {
            return Err(Error::InvalidConfig("stable_branch must not be empty".to_string()));
        }
        if !(0.0..=100.0).contains(&self.visual.threshold) {
            return Err(Error::InvalidConfig(format!(
                "visual.threshold must be between 0 and 100, got {}",
                self.visual.threshold
            )));
        }
        if let Some(github) = &self.github {
            if !github.repository.contains('/') {
                return Err(Error::InvalidConfig(format!(
                    "github.repository must be owner/name, got {}",
                    github.repository
                )));
            }
        }
        Ok(())
    }
}

/// GitHub commit status settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// `owner/name`
    pub repository: String,

    /// Commit the status is attached to
    pub sha: String,

    /// Environment variable holding the API token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    #[serde(default = "default_context")]
    pub context: String,

    /// Link shown next to the status, usually the uploaded report
    #[serde(default)]
    pub target_url: Option<String>,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_context() -> String {
    "shotdiff/screenshots".to_string()
}

/// Command-line settings resolved at process entry
#[derive(Debug, Clone)]
pub struct ResolvedCliConfig {
    pub diff_base: String,
    pub network_reachable: bool,
    pub stable_branch: String,
}

impl CliConfig for ResolvedCliConfig {
    fn diff_base(&self) -> &str {
        &self.diff_base
    }

    fn is_network_reachable(&self) -> bool {
        self.network_reachable
    }

    fn stable_branch(&self) -> &str {
        &self.stable_branch
    }
}
