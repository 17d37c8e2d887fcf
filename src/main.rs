use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sentiscope::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "sentiscope",
    version,
    about = "Social media sentiment explorer with linear classifiers and a web dashboard",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (defaults to environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the config file
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the sentiment dashboard
    Serve {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Start without verifying the API credentials
        #[arg(long, default_value = "false")]
        skip_auth_check: bool,
    },

    /// Train both classifiers from a labelled CSV
    Train {
        /// CSV with Text and Sentiment columns (overrides config)
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Directory for the model artifacts (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a single query and print the sentiment breakdown
    Query {
        /// Search term
        term: String,

        /// Only posts since this date (YYYY-MM-DD)
        #[arg(short, long)]
        since: Option<String>,

        /// Region code or name, or "world"
        #[arg(short, long, default_value = "world")]
        location: String,

        /// Print the full report as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Score live posts from a region with the polarity lexicon
    Stream {
        /// Region code or name
        #[arg(short, long, default_value = "IE")]
        region: String,

        /// Explicit bounding box: lon_min,lat_min,lon_max,lat_max
        #[arg(long)]
        bbox: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::debug!(config = ?config, "Configuration loaded");

    match cli.command {
        Commands::Serve {
            host,
            port,
            skip_auth_check,
        } => {
            tracing::info!(
                host = ?host,
                port = ?port,
                skip_auth_check = %skip_auth_check,
                "Starting serve command"
            );
            commands::serve(
                config,
                commands::ServeParams {
                    host,
                    port,
                    skip_auth_check,
                },
            )
            .await?;
        }

        Commands::Train { dataset, output } => {
            tracing::info!(dataset = ?dataset, output = ?output, "Starting train command");
            commands::train(config, dataset, output)?;
        }

        Commands::Query {
            term,
            since,
            location,
            json,
        } => {
            tracing::info!(
                term = %term,
                since = ?since,
                location = %location,
                "Starting query command"
            );
            commands::query(config, term, since, location, json).await?;
        }

        Commands::Stream { region, bbox } => {
            tracing::info!(region = %region, bbox = ?bbox, "Starting stream command");
            commands::stream(config, region, bbox).await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("sentiscope=debug,tower_http=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("sentiscope={level},warn"))?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}
