//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development.

use std::env;
use std::path::PathBuf;

/// Ledger queries a report runs at once when nothing else is configured.
pub const DEFAULT_REPORT_QUERY_CONCURRENCY: usize = 8;

/// Which storage backend the engine runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process maps, optionally seeded from a JSON file
    Memory { seed_file: Option<PathBuf> },
    /// Cloud Firestore (or the emulator when FIRESTORE_EMULATOR_HOST is set)
    Firestore { project_id: String },
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    /// Upper bound on concurrent ledger queries per report
    pub report_query_concurrency: usize,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::Memory { seed_file: None },
            report_query_concurrency: DEFAULT_REPORT_QUERY_CONCURRENCY,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = lookup("STORE_BACKEND").unwrap_or_else(|| "memory".to_string());
        let store_backend = match backend.trim().to_ascii_lowercase().as_str() {
            "memory" => StoreBackend::Memory {
                seed_file: lookup("SEED_FILE").map(PathBuf::from),
            },
            "firestore" => StoreBackend::Firestore {
                project_id: lookup("GCP_PROJECT_ID")
                    .ok_or(ConfigError::Missing("GCP_PROJECT_ID"))?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    key: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let report_query_concurrency = match lookup("REPORT_QUERY_CONCURRENCY") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "REPORT_QUERY_CONCURRENCY",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_REPORT_QUERY_CONCURRENCY,
        };

        Ok(Self {
            store_backend,
            report_query_concurrency,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}
