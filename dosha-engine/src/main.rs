//! dosha-engine command-line front end
//!
//! Reads a JSON assessment request from a file and writes the result to
//! stdout. `init-config` writes the compiled defaults as a starting config
//! file. Configuration follows the usual resolution order (`--config`,
//! `DOSHA_CONFIG`, platform config file, compiled defaults).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dosha_common::config::{write_default_config, ConfigResolver};
use dosha_common::logging::init_logging;
use dosha_engine::report::render_text;
use dosha_engine::workflow::PulseInput;
use dosha_engine::{AssessmentPipeline, AssessmentRequest};
use tracing::info;

/// Command-line arguments for dosha-engine
#[derive(Parser, Debug)]
#[command(name = "dosha-engine")]
#[command(about = "Multi-modal dosha assessment from pulse, tongue and symptom data")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overrides the configuration file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full multi-modal assessment
    Assess {
        /// JSON assessment request
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Pulse feature vector only
    Features {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Pulse features and rule-based score report
    Score {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Write the default configuration file
    InitConfig {
        /// Target path (platform config path when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let resolved = ConfigResolver::new()
        .with_cli_path(cli.config.clone())
        .resolve()
        .context("Failed to load configuration")?;
    let mut config = resolved.config;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_logging(&config.logging).context("Failed to initialize logging")?;

    info!("dosha-engine {}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", resolved.source);

    let build_pipeline = || AssessmentPipeline::from_config(&config).context("Failed to build pipeline");

    match cli.command {
        Command::Assess { input, format } => {
            let request = read_request(&input)?;
            let assessment = build_pipeline()?.assess(request).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&assessment)?),
                OutputFormat::Text => print!("{}", render_text(&assessment)),
            }
        }
        Command::Features { input } => {
            let pulse = read_pulse(&input)?;
            let analysis = build_pipeline()?.analyze_pulse(&pulse).await?;
            println!("{}", serde_json::to_string_pretty(&analysis.features)?);
        }
        Command::Score { input } => {
            let pulse = read_pulse(&input)?;
            let analysis = build_pipeline()?.analyze_pulse(&pulse).await?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Command::InitConfig { output, force } => {
            let path = write_default_config(output.as_deref(), force)?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn read_request(path: &Path) -> Result<AssessmentRequest> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid assessment request in {}", path.display()))
}

/// Waveform from the `pulse` field of a request file
fn read_pulse(path: &Path) -> Result<PulseInput> {
    read_request(path)?
        .pulse
        .with_context(|| format!("{} contains no pulse waveform", path.display()))
}
