//! housing-serve CLI - Main entry point.

use housing_serve::cli::{check_artifacts, Cli, Commands};
use housing_serve::observability;
use housing_serve::prediction_log;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    // Load or create configuration
    let mut config = cli.load_config()?;

    match cli.command {
        Commands::Serve {
            bind,
            artifacts,
            db,
            no_metrics,
        } => {
            if let Some(bind) = bind {
                config.server.bind_addr = bind.parse()?;
            }
            artifacts.apply(&mut config);
            if let Some(db) = db {
                config.prediction_log.db_path = db;
            }
            if no_metrics {
                config.observability.metrics_enabled = false;
            }
            config.validate()?;

            observability::init(&config.observability)?;
            housing_serve::run(config).await?;
        }

        Commands::Check { artifacts } => {
            artifacts.apply(&mut config);
            observability::init(&config.observability)?;

            match check_artifacts(&config) {
                Ok(loaded) => {
                    println!("Model:   {} ({})", config.artifacts.model_path.display(), loaded.model().kind());
                    println!("Scaler:  {} ({} columns)", config.artifacts.scaler_path.display(), loaded.scaler().n_features());
                    println!("Status:  OK");
                }
                Err(e) => {
                    eprintln!("Status:  FAILED ({})", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Logs { db, limit } => {
            let path = db.unwrap_or(config.prediction_log.db_path);
            let entries = prediction_log::read_entries(&path, limit)?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    Ok(())
}
