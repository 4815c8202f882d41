//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development.

use std::env;
use std::str::FromStr;

/// Loopback only; set `HOST=0.0.0.0` to accept outside connections.
const DEFAULT_HOST: &str = "127.0.0.1";

/// Which document store backs the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    /// In-process store; nothing survives a restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::Invalid("MALL_STORE", other.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface the server binds to
    pub host: String,
    /// Server port
    pub port: u16,
    pub store: StoreBackend,
    /// GCP project ID (Firestore database owner)
    pub gcp_project_id: String,
    /// Firebase Web API key; without one the in-process provider is used
    pub firebase_api_key: Option<String>,
    /// Host:port of the Firebase Auth emulator
    pub auth_emulator_host: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store = match non_empty_var("MALL_STORE") {
            Some(value) => value.parse()?,
            None => StoreBackend::Firestore,
        };

        let gcp_project_id = match (store, non_empty_var("GCP_PROJECT_ID")) {
            (_, Some(project)) => project,
            (StoreBackend::Firestore, None) => return Err(ConfigError::Missing("GCP_PROJECT_ID")),
            (StoreBackend::Memory, None) => "local-dev".to_string(),
        };

        Ok(Self {
            host: non_empty_var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            store,
            gcp_project_id,
            firebase_api_key: non_empty_var("FIREBASE_API_KEY").map(|v| v.trim().to_string()),
            auth_emulator_host: non_empty_var("FIREBASE_AUTH_EMULATOR_HOST"),
        })
    }

    /// Config for tests: in-memory store, local auth.
    pub fn test_default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: 8080,
            store: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            firebase_api_key: None,
            auth_emulator_host: None,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
