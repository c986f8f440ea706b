//! Project build before capture

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use shotdiff_common::{Error, Result};
use tokio::process::Command;
use tracing::{debug, info};

use crate::collaborators::BuildSource;

/// Lines of stderr kept in a build error
const STDERR_TAIL_LINES: usize = 20;

/// Runs a shell build command
pub struct CommandBuild {
    command: String,
    workdir: Option<PathBuf>,
}

impl CommandBuild {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            workdir: None,
        }
    }

    pub fn in_dir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }
}

#[async_trait]
impl BuildSource for CommandBuild {
    async fn run(&self) -> Result<()> {
        let start = Instant::now();
        info!("Building: {}", self.command);

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&self.command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| Error::Build(format!("failed to spawn `{}`: {}", self.command, e)))?;

        debug!("Build output:\n{}", String::from_utf8_lossy(&output.stdout));

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
            return Err(Error::Build(format!(
                "`{}` exited with {}: {}",
                self.command, output.status, tail
            )));
        }

        info!("Build finished in {} ms", start.elapsed().as_millis());
        Ok(())
    }
}

/// Used when the project is already built
pub struct NoopBuild;

#[async_trait]
impl BuildSource for NoopBuild {
    async fn run(&self) -> Result<()> {
        debug!("No build command configured");
        Ok(())
    }
}
