use std::env;

use clap::Parser;
use delling_map::DellingResult;
use delling_map::config::args::Args;
use delling_map::config::env::OsEnv;
use delling_map::config::{Config, read_config};
use delling_map::logging::{LOG_FORMAT_ENV, ensure_mbtiles_log_level_matches, init_tracing};
use delling_map::srv::new_server;
use log::log_enabled;
use tracing::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

async fn start(args: Args) -> DellingResult<()> {
    info!("Starting Delling map server v{VERSION}");

    let env = OsEnv::default();
    let mut config = if let Some(ref cfg_filename) = args.meta.config {
        info!("Using {}", cfg_filename.display());
        read_config(cfg_filename, &env)?
    } else {
        info!("Config file is not specified, using command line and environment only");
        Config::default()
    };

    args.merge_into_config(&mut config, &env);
    config.finalize()?;
    let state = config.resolve()?;

    let media = config.media_config();
    match state.datasets.locate().await {
        Some(dir) => info!("Serving datasets from {}", dir.display()),
        None => info!(
            "No dataset directory under {}, waiting for removable media",
            media.root.display()
        ),
    }
    info!("Forwarding live positions to {}", state.ships.url());

    let (server, listen_addresses) = new_server(config.srv, state)?;
    info!("Delling map server has been started on {listen_addresses}.");
    info!("Use http://{listen_addresses}/api/tilesets to get the list of available datasets.");

    server.await
}

#[tokio::main]
async fn main() {
    let filter = ensure_mbtiles_log_level_matches(env::var("RUST_LOG").ok(), "delling_map=");
    init_tracing(&filter, env::var(LOG_FORMAT_ENV).ok());

    let args = Args::parse();
    if let Err(e) = start(args).await {
        // Ensure the message is printed, even if the logging is disabled
        if log_enabled!(log::Level::Error) {
            error!("{e}");
        } else {
            eprintln!("{e}");
        }
        std::process::exit(1);
    }
}
