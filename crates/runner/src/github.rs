//! Pull-request status publication

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use shotdiff_common::{CheckState, CheckStatus, Error, ReportData, Result};
use tracing::{debug, info};

use crate::collaborators::StatusReporter;
use crate::config::GitHubConfig;

/// GitHub rejects status descriptions longer than this
const MAX_DESCRIPTION_LEN: usize = 140;

#[derive(Debug, Serialize)]
struct StatusPayload<'a> {
    state: CheckState,
    description: &'a str,
    context: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_url: Option<&'a str>,
}

/// Publishes commit statuses through the GitHub REST API
pub struct GitHubStatusReporter {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    context: String,
    target_url: Option<String>,
}

impl GitHubStatusReporter {
    /// Create a reporter, reading the token from the configured environment variable
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let token = std::env::var(&config.token_env).map_err(|_| {
            Error::InvalidConfig(format!("{} is not set", config.token_env))
        })?;
        Self::with_token(config, token)
    }

    pub fn with_token(config: &GitHubConfig, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(format!("shotdiff/{}", shotdiff_common::VERSION))
            .build()?;
        Ok(Self::with_client(config, token, client))
    }

    pub fn with_client(config: &GitHubConfig, token: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/repos/{}/statuses/{}",
                config.api_url.trim_end_matches('/'),
                config.repository,
                config.sha
            ),
            token: token.into(),
            context: config.context.clone(),
            target_url: config.target_url.clone(),
        }
    }

    async fn post(&self, status: &CheckStatus) -> Result<()> {
        let description = truncate(&status.description, MAX_DESCRIPTION_LEN);
        let payload = StatusPayload {
            state: status.state,
            description: &description,
            context: &self.context,
            target_url: self.target_url.as_deref(),
        };

        debug!("POST {} ({})", self.endpoint, status.state);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let code = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status(format!("GitHub returned {}: {}", code, body)));
        }

        info!("Published status {}: {}", status.state, description);
        Ok(())
    }
}

#[async_trait]
impl StatusReporter for GitHubStatusReporter {
    async fn publish_status(&self, report: &ReportData) -> Result<()> {
        self.post(&CheckStatus::from_report(report)).await
    }

    async fn publish_error(&self) -> Result<()> {
        self.post(&CheckStatus::error()).await
    }
}

/// Logs statuses instead of publishing them, for offline and local runs
pub struct LogStatusReporter;

#[async_trait]
impl StatusReporter for LogStatusReporter {
    async fn publish_status(&self, report: &ReportData) -> Result<()> {
        let status = CheckStatus::from_report(report);
        info!("Status [{}]: {}", status.state, status.description);
        Ok(())
    }

    async fn publish_error(&self) -> Result<()> {
        let status = CheckStatus::error();
        info!("Status [{}]: {}", status.state, status.description);
        Ok(())
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}
