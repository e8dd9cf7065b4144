//! Daemon configuration: command-line flags with environment fallbacks.

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use designforge_core::{LogFormat, OrchestratorConfig, ScoringRubric};
use tracing::Level;

/// URL prefix persisted images are served under.
pub const IMAGE_URL_PREFIX: &str = "/api/images";

#[derive(Debug, Clone, Parser)]
#[command(name = "designforged")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "DesignForge product design generation API", long_about = None)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = "DESIGNFORGE_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Directory generated images are written to and served from
    #[arg(
        long,
        env = "DESIGNFORGE_OUTPUT_DIR",
        default_value = "outputs/generated_designs"
    )]
    pub output_dir: PathBuf,

    /// Generation calls allowed in flight at once during a variant run
    #[arg(long, env = "DESIGNFORGE_MAX_PARALLEL_AGENTS", default_value = "4")]
    pub max_parallel_agents: NonZeroUsize,

    /// Largest variant count a single request may ask for
    #[arg(long, env = "DESIGNFORGE_MAX_VARIANTS", default_value = "12")]
    pub max_variants: NonZeroUsize,

    /// Variant count used when a request does not name one
    #[arg(long, env = "DESIGNFORGE_DEFAULT_VARIANTS", default_value = "4")]
    pub default_variants: NonZeroUsize,

    /// Abort variant runs after this many seconds
    #[arg(long, env = "DESIGNFORGE_RUN_TIMEOUT_SECS")]
    pub run_timeout_secs: Option<u64>,

    /// Designs kept addressable by id; the oldest are forgotten first
    #[arg(long, env = "DESIGNFORGE_MAX_DESIGNS", default_value = "1024")]
    pub max_designs: NonZeroUsize,

    /// JSON file overriding the default scoring rubric
    #[arg(long, env = "DESIGNFORGE_RUBRIC")]
    pub rubric: Option<PathBuf>,

    /// Emit JSON-formatted log lines
    #[arg(long, env = "DESIGNFORGE_LOG_JSON")]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServerArgs {
    pub fn log_format(&self) -> LogFormat {
        if self.json {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }

    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let max_variants = self.max_variants.get();
        OrchestratorConfig {
            max_concurrency: self.max_parallel_agents.get(),
            max_variants,
            default_variants: self.default_variants.get().min(max_variants),
            run_timeout: self.run_timeout_secs.map(Duration::from_secs),
            ..OrchestratorConfig::default()
        }
    }

    /// The rubric from `--rubric`, or the built-in one.
    pub fn load_rubric(&self) -> Result<ScoringRubric> {
        let Some(path) = &self.rubric else {
            return Ok(ScoringRubric::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rubric file {}", path.display()))?;
        ScoringRubric::from_json(&raw)
            .with_context(|| format!("Invalid rubric in {}", path.display()))
    }
}
