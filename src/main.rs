use std::sync::Arc;

use clap::Parser;

use longcat_studio::cli::Args;
use longcat_studio::config::Config;
use longcat_studio::fal::{FalClient, FalError, FAL_API_KEY_ENV};
use longcat_studio::web::{serve, AppState};

/// Load .env file without overriding existing environment variables.
fn load_env() {
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[tokio::main]
async fn main() {
    load_env();
    init_logging();

    let args = Args::parse();

    let cfg = match Config::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    // CLI > config file > built-in defaults
    let bind = args.bind.unwrap_or(cfg.server.bind);

    let client = match FalClient::from_env(cfg.fal.settings()) {
        Ok(client) => Some(client),
        Err(FalError::MissingApiKey) => {
            log::error!(
                "{} is not set. The UI will start, but generation is disabled.",
                FAL_API_KEY_ENV
            );
            None
        }
        Err(e) => {
            log::error!("Failed to create fal.ai client: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState::new(client).with_max_upload_bytes(cfg.server.max_upload_bytes);

    if let Err(e) = serve(bind, Arc::new(state)).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
