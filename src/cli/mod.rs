//! Command-line interface for the housing prediction service.

use crate::compute::FittedArtifacts;
use crate::config::ServiceConfig;
use crate::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// California Housing price prediction service.
#[derive(Parser)]
#[command(name = "housing-serve")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "HOUSING_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error) [default: info]
    #[arg(short, long, env = "HOUSING_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Fitted artifact locations, overriding the configuration file.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ArtifactArgs {
    /// Fitted model artifact
    #[arg(long, env = "HOUSING_MODEL_PATH")]
    pub model: Option<PathBuf>,

    /// Fitted scaler artifact
    #[arg(long, env = "HOUSING_SCALER_PATH")]
    pub scaler: Option<PathBuf>,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Serve the prediction API
    Serve {
        /// Bind address for the HTTP API
        #[arg(long, env = "HOUSING_BIND_ADDR")]
        bind: Option<String>,

        #[command(flatten)]
        artifacts: ArtifactArgs,

        /// Prediction log database
        #[arg(long, env = "HOUSING_DB_PATH")]
        db: Option<PathBuf>,

        /// Disable the /metrics endpoint
        #[arg(long)]
        no_metrics: bool,
    },

    /// Load the fitted artifacts and report whether they can be served
    Check {
        #[command(flatten)]
        artifacts: ArtifactArgs,
    },

    /// Print logged predictions as JSON
    Logs {
        /// Prediction log database
        #[arg(long, env = "HOUSING_DB_PATH")]
        db: Option<PathBuf>,

        /// Only show the most recent entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Load the configuration file, if any, and apply global overrides.
    pub fn load_config(&self) -> Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::from_file(path)?,
            None => ServiceConfig::default(),
        };
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        Ok(config)
    }
}

/// Validate the configuration and load the artifacts it names.
pub fn check_artifacts(config: &ServiceConfig) -> Result<FittedArtifacts> {
    config.validate()?;
    FittedArtifacts::load(&config.artifacts)
}

impl ArtifactArgs {
    /// Apply overrides to `config`.
    pub fn apply(&self, config: &mut ServiceConfig) {
        if let Some(model) = &self.model {
            config.artifacts.model_path = model.clone();
        }
        if let Some(scaler) = &self.scaler {
            config.artifacts.scaler_path = scaler.clone();
        }
    }
}
