#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone entry point for the crash map API server.
//!
//! Reads the config file named by `CRASH_MAP_CONFIG` (if set), loads the
//! dataset and serves until interrupted.

use crash_map_dataset::progress::null_progress;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    if let Err(e) = crash_map_server::run(None, &null_progress()).await {
        log::error!("{e}");
        return Err(e.into());
    }

    Ok(())
}
