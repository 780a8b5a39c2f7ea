#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the crash map tools.
//!
//! Runs the API server or answers the same ranking and data questions
//! offline, straight from the CSV.
//!
//! Uses `indicatif-log-bridge` (via [`crash_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and the load spinner never fight for the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use crash_map_analytics::{RankingRequest, rank_crashes};
use crash_map_analytics_models::FilterParams;
use crash_map_cli_utils::{IndicatifProgress, MultiProgress};
use crash_map_dataset::CrashDataset;
use crash_map_server::config::resolve_config_path;
use crash_map_server::{AppState, CrashMapConfig};

#[derive(Parser)]
#[command(name = "crash_map_cli", about = "Traffic crash map tools")]
struct Cli {
    /// Path to a TOML config file (overrides `CRASH_MAP_CONFIG`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the dataset and start the HTTP API
    Serve,
    /// Print a street or location ranking as JSON
    Rank {
        /// `frequency`, `weighted` or `dangerous`
        #[arg(long, default_value = "frequency")]
        rank_type: String,
        /// `street` or `location`
        #[arg(long, default_value = "street")]
        group_by: String,
        /// Maximum rows (defaults to `ranking.default_limit`)
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List the dataset's columns
    Columns,
    /// Print the first rows of the dataset as JSON
    Sample {
        /// Number of rows
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

/// Filter flags shared with the HTTP endpoints.
#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Earliest crash date (YYYY-MM-DD)
    #[arg(long)]
    date_start: Option<String>,
    /// Latest crash date (YYYY-MM-DD)
    #[arg(long)]
    date_end: Option<String>,
    /// Comma-separated damage values
    #[arg(long)]
    damage: Option<String>,
    /// Comma-separated crash types
    #[arg(long)]
    crash_type: Option<String>,
    /// Comma-separated injury tags (`none`, `non_incapacitating`, ...)
    #[arg(long)]
    injuries: Option<String>,
    /// Comma-separated cause classes (`user`, `non_user`, `vehicle`)
    #[arg(long)]
    cause: Option<String>,
    /// Comma-separated lighting conditions
    #[arg(long)]
    lighting: Option<String>,
}

impl From<FilterArgs> for FilterParams {
    fn from(a: FilterArgs) -> Self {
        Self {
            date_start: a.date_start,
            date_end: a.date_end,
            damage: a.damage,
            crash_type: a.crash_type,
            injuries: a.injuries,
            cause: a.cause,
            lighting: a.lighting,
        }
    }
}

fn load_dataset(
    multi: &MultiProgress,
    config: &CrashMapConfig,
) -> Result<CrashDataset, Box<dyn std::error::Error>> {
    let progress = IndicatifProgress::rows_spinner(multi, "Loading crashes");
    Ok(CrashDataset::load(&config.data.csv_path, &progress)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = crash_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config);
    let config = CrashMapConfig::load(config_path.as_deref())?;

    match cli.command {
        Commands::Serve => {
            let dataset = load_dataset(&multi, &config)?;
            let state = AppState {
                dataset: Arc::new(dataset),
                config,
            };
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(crash_map_server::run_server(state))
            })
            .await??;
        }
        Commands::Rank {
            rank_type,
            group_by,
            limit,
            filters,
        } => {
            let dataset = load_dataset(&multi, &config)?;
            let request = RankingRequest {
                filters: filters.into(),
                rank_type,
                group_by,
                limit: limit.unwrap_or(config.ranking.default_limit),
            };
            let result = rank_crashes(&dataset, &request, config.ranking.default_period())?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Columns => {
            let dataset = load_dataset(&multi, &config)?;
            for column in dataset.columns() {
                println!("{column}");
            }
        }
        Commands::Sample { limit } => {
            let dataset = load_dataset(&multi, &config)?;
            println!("{}", serde_json::to_string_pretty(&dataset.sample(limit))?);
        }
    }

    Ok(())
}
