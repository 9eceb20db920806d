//! CLI configuration module

use clap::Parser;

use crate::{
    commands::Command,
    config::{backend::BackendConfig, logging::LoggingConfig},
};

pub(crate) mod backend;
pub(crate) mod logging;

pub(crate) use logging::LogFormat;

/// Livetable CLI configuration
#[derive(Debug, Parser)]
#[command(name = "livetable", about = "Live product table client", long_about = None)]
pub struct CliConfig {
    /// Backend endpoints and credentials.
    #[command(flatten)]
    pub backend: BackendConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_backend_and_command() -> TestResult {
        let config = CliConfig::try_parse_from([
            "livetable",
            "--admin-secret",
            "myadminsecretkey",
            "--http-endpoint",
            "http://backend:8080/v1/graphql",
            "--reconnect-attempts",
            "2",
            "delete",
            "7",
            "--yes",
        ])?;

        let client = config.backend.to_client_config();

        assert_eq!(client.http_endpoint, "http://backend:8080/v1/graphql");
        assert_eq!(client.reconnect.max_attempts, 2);
        assert_eq!(client.admin_secret.expose(), "myadminsecretkey");
        assert!(
            matches!(config.command, Command::Delete(ref args) if args.id == 7 && args.yes),
            "expected delete 7 --yes, got {:?}",
            config.command
        );

        Ok(())
    }

    #[test]
    fn add_requires_every_field() {
        let result = CliConfig::try_parse_from([
            "livetable",
            "--admin-secret",
            "s",
            "add",
            "--name",
            "Widget",
        ]);

        assert!(result.is_err(), "add without category/price/date must fail");
    }
}
