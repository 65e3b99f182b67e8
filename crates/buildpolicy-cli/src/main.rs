//! buildpolicy - apply build policies and decide the publish channel
//!
//! ## Commands
//!
//! - `decide`: print the publish channel for the current CI signals
//! - `configure`: apply every policy to a task manifest and print the report
//! - `show-config`: print the effective policy configuration

use anyhow::{Context, Result};
use buildpolicy_core::{
    decide, Build, BuildManifest, Channel, EnvSnapshot, PolicyConfig, PolicySet, PullRequestFlag,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "buildpolicy")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deferred build policies and publish-channel gating", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// CI signal overrides. When a flag is absent the variable named in the
/// configuration's `signals` section is read instead.
#[derive(Args, Debug, Default)]
struct SignalArgs {
    /// Release tag of this build
    #[arg(long)]
    release_tag: Option<String>,

    /// Branch being built
    #[arg(long)]
    branch: Option<String>,

    /// Whether this is a pull-request build ("true" or "false")
    #[arg(long)]
    pull_request: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the publish channel selected by the CI signals
    Decide {
        #[command(flatten)]
        signals: SignalArgs,

        /// Policy configuration file (JSON)
        #[arg(short, long, env = "BUILDPOLICY_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Apply all policies to a task manifest and print the resulting report
    Configure {
        /// Task manifest (JSON)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Policy configuration file (JSON)
        #[arg(short, long, env = "BUILDPOLICY_CONFIG")]
        config: Option<PathBuf>,

        #[command(flatten)]
        signals: SignalArgs,
    },

    /// Print the effective policy configuration
    ShowConfig {
        /// Policy configuration file (JSON)
        #[arg(short, long, env = "BUILDPOLICY_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
struct DecideOutput {
    channel: Channel,
    release_tag: Option<String>,
    branch: Option<String>,
    pull_request: PullRequestFlag,
}

impl DecideOutput {
    fn evaluate(signals: &SignalArgs, config: &PolicyConfig) -> Self {
        let snapshot = snapshot_from(signals, config);
        Self {
            channel: decide(&snapshot),
            release_tag: snapshot.release_tag().map(str::to_string),
            branch: snapshot.branch_name().map(str::to_string),
            pull_request: snapshot.is_pull_request(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    buildpolicy_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Decide { signals, config } => cmd_decide(&signals, config.as_deref()),
        Commands::Configure {
            manifest,
            config,
            signals,
        } => cmd_configure(&manifest, config.as_deref(), &signals),
        Commands::ShowConfig { config } => cmd_show_config(config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<PolicyConfig> {
    match path {
        Some(path) => PolicyConfig::load(path)
            .with_context(|| format!("Failed to load policy config {}", path.display())),
        None => Ok(PolicyConfig::default()),
    }
}

/// Flags take precedence over the environment, one signal at a time.
fn snapshot_from(args: &SignalArgs, config: &PolicyConfig) -> EnvSnapshot {
    let env = EnvSnapshot::from_env(&config.signals);
    let release_tag = args
        .release_tag
        .clone()
        .or_else(|| env.release_tag().map(str::to_string));
    let branch = args
        .branch
        .clone()
        .or_else(|| env.branch_name().map(str::to_string));
    let pull_request = match &args.pull_request {
        Some(raw) => PullRequestFlag::parse(Some(raw.as_str())),
        None => env.is_pull_request(),
    };
    EnvSnapshot::new(release_tag, branch, pull_request)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}

fn cmd_decide(signals: &SignalArgs, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let output = DecideOutput::evaluate(signals, &config);
    info!(channel = %output.channel, "Publish channel decided");
    print_json(&output)
}

fn cmd_configure(manifest: &Path, config: Option<&Path>, signals: &SignalArgs) -> Result<()> {
    let config = load_config(config)?;
    let manifest = BuildManifest::load(manifest)
        .with_context(|| format!("Failed to load task manifest {}", manifest.display()))?;
    let mut build = Build::from_manifest(manifest).context("Invalid task manifest")?;
    let snapshot = snapshot_from(signals, &config);

    let report = PolicySet::new(config)
        .configure(&mut build, &snapshot)
        .context("Configuration phase failed")?;

    info!(
        invocation_id = %report.invocation_id,
        gate_state = %report.gate_state,
        tasks = report.tasks.len(),
        "Build configured"
    );
    print_json(&report)
}

fn cmd_show_config(config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    print_json(&config)
}
