//! shotdiff CLI - Main Entry Point
//!
//! Builds the project, captures screenshots, diffs them against the
//! configured base and the stable branch, and exits with the run's code.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use shotdiff_runner::build_source::{CommandBuild, NoopBuild};
use shotdiff_runner::github::{GitHubStatusReporter, LogStatusReporter};
use shotdiff_runner::report::LocalReportController;
use shotdiff_runner::visual::ImageDiffer;
use shotdiff_runner::{
    network, BuildSource, Collaborators, DiffOrchestrator, ExitCode, ResolvedCliConfig,
    ResultComparer, RunOutcome, RunnerConfig, StatusReporter,
};
use tracing::{info, warn};

mod output;

const DEFAULT_CONFIG_FILE: &str = "shotdiff.toml";

/// shotdiff - visual-regression runs for pull requests
#[derive(Parser)]
#[command(name = "shotdiff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Git reference the screenshots are diffed against
    #[arg(long, env = "SHOTDIFF_DIFF_BASE")]
    diff_base: String,

    /// Configuration file (defaults to ./shotdiff.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Build command, overriding the configured one
    #[arg(long, env = "SHOTDIFF_BUILD_COMMAND")]
    build_command: Option<String>,

    /// Do not run any build step
    #[arg(long, conflicts_with = "build_command")]
    skip_build: bool,

    /// Stable reference branch, overriding the configured one
    #[arg(long)]
    stable_branch: Option<String>,

    /// Report output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Treat the network as unreachable; changes never fail the run
    #[arg(long)]
    offline: bool,

    /// Output format
    #[arg(long, default_value = "table")]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let format = cli.format;
    match run(cli).await {
        Ok(outcome) => {
            output::print_outcome(&outcome, format);
            std::process::exit(outcome.exit_code.code());
        }
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            std::process::exit(ExitCode::FAILURE_CODE);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<RunOutcome> {
    let config = load_config(&cli)?;

    let network_reachable = if cli.offline {
        false
    } else {
        network::is_reachable(
            &config.network_probe,
            Duration::from_millis(config.network_probe_timeout_ms),
        )
        .await
    };
    if !network_reachable {
        warn!("Network unreachable; screenshot changes will not fail this run");
    }

    let ctx = collaborators(&cli, config, network_reachable)?;
    let outcome = DiffOrchestrator::new(ctx).execute().await?;
    info!("Run finished: {}", outcome.exit_code);
    Ok(outcome)
}

fn load_config(cli: &Cli) -> anyhow::Result<RunnerConfig> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => read_config(Path::new(DEFAULT_CONFIG_FILE))?,
        None => RunnerConfig::default(),
    };

    if let Some(stable) = &cli.stable_branch {
        config.stable_branch = stable.clone();
    }
    if let Some(command) = &cli.build_command {
        config.build_command = Some(command.clone());
    }
    if cli.skip_build {
        config.build_command = None;
    }
    if let Some(output) = &cli.output {
        config.visual.diff_dir = output.join("diffs");
        config.output_dir = output.clone();
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn read_config(path: &Path) -> anyhow::Result<RunnerConfig> {
    RunnerConfig::load(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

fn collaborators(
    cli: &Cli,
    config: RunnerConfig,
    network_reachable: bool,
) -> anyhow::Result<Collaborators> {
    let comparer: Arc<dyn ResultComparer> = Arc::new(
        ImageDiffer::new(config.visual.clone()).context("failed to prepare diff directory")?,
    );

    let mut reports = LocalReportController::new(
        &config.baseline_dir,
        &config.capture_dir,
        &config.output_dir,
        comparer.clone(),
    );
    if let Some(assets) = &config.assets_dir {
        reports = reports.with_assets(assets);
    }

    let build: Arc<dyn BuildSource> = match &config.build_command {
        Some(command) => Arc::new(CommandBuild::new(command)),
        None => Arc::new(NoopBuild),
    };

    let status: Arc<dyn StatusReporter> = match &config.github {
        Some(github) if network_reachable => Arc::new(
            GitHubStatusReporter::new(github).context("failed to set up GitHub status reporting")?,
        ),
        _ => Arc::new(LogStatusReporter),
    };

    Ok(Collaborators {
        build,
        config: Arc::new(ResolvedCliConfig {
            diff_base: cli.diff_base.clone(),
            network_reachable,
            stable_branch: config.stable_branch,
        }),
        reports: Arc::new(reports),
        comparer,
        status,
    })
}
