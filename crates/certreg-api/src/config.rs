//! # Service Configuration
//!
//! Command-line flags with environment fallbacks, parsed by `clap`.
//!
//! | Flag | Environment | Default |
//! |---|---|---|
//! | `--port` | `PORT` | `8080` |
//! | `--bootstrap-admin` | `CERTREG_BOOTSTRAP_ADMIN` | required |
//! | `--seed-admins` | `CERTREG_SEED_ADMINS` | none |
//! | `--api-keys` | `CERTREG_API_KEYS` | none |
//! | `--database-url` | `DATABASE_URL` | in-memory only |
//! | `--log-format` | `CERTREG_LOG_FORMAT` | `text` |

use clap::{Parser, ValueEnum};
use thiserror::Error;

use certreg_core::Address;

use crate::auth::ApiKey;

/// Errors raised while interpreting configuration values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid API key entry: {0}")]
    InvalidApiKey(String),

    #[error("duplicate API token (second use by {0})")]
    DuplicateToken(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Runtime configuration for `certreg-api`.
#[derive(Parser, Clone)]
#[command(name = "certreg-api", version, about = "Certificate registry ledger service")]
pub struct ServeConfig {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Address that becomes the first admin at ledger genesis.
    #[arg(long, env = "CERTREG_BOOTSTRAP_ADMIN")]
    pub bootstrap_admin: Address,

    /// Additional admins granted by the bootstrap admin at genesis.
    #[arg(long, env = "CERTREG_SEED_ADMINS", value_delimiter = ',')]
    pub seed_admins: Vec<Address>,

    /// Comma-separated `address=token` credentials.
    #[arg(long, env = "CERTREG_API_KEYS", value_delimiter = ',', hide_env_values = true)]
    pub api_keys: Vec<ApiKey>,

    /// Postgres connection string. Without it the ledger lives in memory.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[arg(long, env = "CERTREG_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl std::fmt::Debug for ServeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServeConfig")
            .field("port", &self.port)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .field("seed_admins", &self.seed_admins)
            .field("api_keys", &self.api_keys.len())
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("log_format", &self.log_format)
            .finish()
    }
}
