//! Application configuration loaded from environment variables.
//!
//! Loaded once at startup. A `.env` file is honored for local development.

use std::env;
use std::time::Duration;

/// Default number of trips returned by history queries.
pub const DEFAULT_TRIP_HISTORY_LIMIT: u32 = 50;
/// Default time without fixes after which a session is closed.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Trips returned by history queries when no limit is given
    pub trip_history_limit: u32,
    /// Sessions without fixes for this long are closed and their open
    /// drive stored as unfinished
    pub session_idle_timeout: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            trip_history_limit: DEFAULT_TRIP_HISTORY_LIMIT,
            session_idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
        }
    }
}

impl Config {
    /// Config for tests.
    pub fn test_default() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let trip_history_limit = match env::var("TRIP_HISTORY_LIMIT") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or(ConfigError::Invalid("TRIP_HISTORY_LIMIT"))?,
            Err(_) => DEFAULT_TRIP_HISTORY_LIMIT,
        };

        // Seconds
        let session_idle_timeout = match env::var("SESSION_IDLE_TIMEOUT") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid("SESSION_IDLE_TIMEOUT"))?,
            Err(_) => DEFAULT_SESSION_IDLE_TIMEOUT,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            trip_history_limit,
            session_idle_timeout,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
