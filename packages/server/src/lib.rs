#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crash map application.
//!
//! Loads the crash CSV once at startup and serves filtered heatmaps,
//! street and spatial-bin rankings, and raw data previews from the shared
//! in-memory dataset. Handlers never mutate the dataset; each request
//! builds its own filtered view.

pub mod config;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use crash_map_dataset::progress::ProgressCallback;
use crash_map_dataset::{CrashDataset, DatasetError};
use thiserror::Error;

pub use config::{ConfigError, CrashMapConfig};

/// Errors that can stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The dataset could not be loaded.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Binding or serving failed.
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application state.
pub struct AppState {
    /// Read-only crash dataset.
    pub dataset: Arc<CrashDataset>,
    /// Effective configuration.
    pub config: CrashMapConfig,
}

impl AppState {
    /// Loads the dataset named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the CSV cannot be loaded.
    pub fn load(
        config: CrashMapConfig,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<Self, DatasetError> {
        let dataset = CrashDataset::load(&config.data.csv_path, progress)?;
        Ok(Self {
            dataset: Arc::new(dataset),
            config,
        })
    }
}

/// Registers every API route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(handlers::query_error))
        .route("/", web::get().to(handlers::status))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health))
                .service(
                    web::resource("/map")
                        .app_data(
                            web::QueryConfig::default().error_handler(handlers::map_query_error),
                        )
                        .route(web::get().to(handlers::map)),
                )
                .route("/ranking", web::get().to(handlers::ranking))
                .route("/data/sample", web::get().to(handlers::sample))
                .route("/columns", web::get().to(handlers::columns)),
        );
}

/// Starts the crash map API server with an already-loaded state.
///
/// This is a regular async function; the caller is responsible for
/// providing the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(state: AppState) -> std::io::Result<()> {
    let bind_addr = state.config.server.bind_addr.clone();
    let port = state.config.server.port;
    let state = web::Data::new(state);

    log::info!(
        "Starting server on {bind_addr}:{port} ({} crashes loaded)",
        state.dataset.len()
    );

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

/// Loads configuration and the dataset, then serves until shutdown.
///
/// # Errors
///
/// Returns [`ServerError`] if configuration or dataset loading fails, or
/// the server cannot bind.
#[allow(clippy::future_not_send)]
pub async fn run(
    config_path: Option<std::path::PathBuf>,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<(), ServerError> {
    let config_path = config::resolve_config_path(config_path);
    let config = CrashMapConfig::load(config_path.as_deref())?;
    let state = AppState::load(config, progress)?;
    run_server(state).await?;
    Ok(())
}
