//! Livetable CLI

use std::{process, sync::Arc};

use livetable::products::GraphQlProductsService;

use crate::config::CliConfig;

mod commands;
mod config;
mod observability;
mod render;

/// Livetable CLI entry point
#[tokio::main]
pub async fn main() {
    // Load configuration from .env and CLI arguments
    let config = match CliConfig::load() {
        Ok(config) => config,
        Err(error) if !error.use_stderr() => error.exit(),
        Err(error) => {
            #[expect(
                clippy::print_stderr,
                reason = "logging not initialized yet, must use eprintln for config errors"
            )]
            {
                eprintln!("Configuration error: {error}");
            }

            process::exit(2);
        }
    };

    if let Err(error) = observability::init_subscriber(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialize, must use eprintln"
        )]
        {
            eprintln!("{error}");
        }

        process::exit(1);
    }

    let service = Arc::new(GraphQlProductsService::from_config(
        &config.backend.to_client_config(),
    ));

    if let Err(error) = commands::run(config.command, service).await {
        tracing::debug!(?error, "command failed");

        #[expect(clippy::print_stderr, reason = "user facing command failure")]
        {
            eprintln!("error: {error}");
        }

        process::exit(1);
    }
}
