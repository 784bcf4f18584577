//! Configuration management

use anyhow::{Context, Result};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// NATS server URL
    pub nats_url: String,

    /// PostgreSQL connection string. Optional: without it the worker runs
    /// compute-only and persistence operations report storage unavailable.
    pub database_url: Option<String>,

    /// Path to a VROOM-compatible optimizer binary (optional, the naive
    /// simulation runs regardless)
    pub optimizer_bin: Option<String>,

    /// Hard timeout around one external optimizer invocation
    pub optimizer_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let nats_url = std::env::var("NATS_URL")
            .unwrap_or_else(|_| "nats://localhost:4222".to_string());

        let database_url = std::env::var("DATABASE_URL").ok();

        let optimizer_bin = std::env::var("VROOM_BIN").ok();

        let optimizer_timeout_secs = match std::env::var("VROOM_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("VROOM_TIMEOUT_SECS must be a positive integer")?,
            Err(_) => 30,
        };

        Ok(Self {
            nats_url,
            database_url,
            optimizer_bin,
            optimizer_timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_optimizer_bin_some_when_set() {
        std::env::set_var("VROOM_BIN", "/usr/local/bin/vroom");

        let config = Config::from_env().unwrap();
        assert_eq!(config.optimizer_bin, Some("/usr/local/bin/vroom".to_string()));

        // Cleanup
        std::env::remove_var("VROOM_BIN");
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_timeout_defaults_to_30() {
        std::env::remove_var("VROOM_TIMEOUT_SECS");

        let config = Config::from_env().unwrap();
        assert_eq!(config.optimizer_timeout_secs, 30);
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_timeout_rejects_garbage() {
        std::env::set_var("VROOM_TIMEOUT_SECS", "soon");

        assert!(Config::from_env().is_err());

        // Cleanup
        std::env::remove_var("VROOM_TIMEOUT_SECS");
    }
}
