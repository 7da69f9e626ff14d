//! Configuration for scaffold-steward
//!
//! CLI arguments and environment variable handling using clap.

use std::path::PathBuf;

use chrono::Duration;
use clap::{Parser, Subcommand};

use crate::http::HttpServiceConfig;
use crate::types::ScaffoldError;

/// scaffold-steward - lifecycle operations for deployed scaffold contracts
#[derive(Parser, Debug, Clone)]
#[command(name = "scaffold-steward")]
#[command(about = "Compile, deploy and manage scaffold contracts")]
pub struct Args {
    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "scaffolds.db")]
    pub database_path: PathBuf,

    /// Base URL of the blockchain processor service
    #[arg(long, env = "PROCESSOR_URL", default_value = "http://localhost:8545")]
    pub processor_url: String,

    /// Base URL of the state tracking service
    #[arg(long, env = "STATE_URL", default_value = "http://localhost:8090")]
    pub state_url: String,

    /// Disabled scaffolds a user may hold before compile is refused
    #[arg(long, env = "ALLOWED_DISABLED_CONTRACTS", default_value = "10")]
    pub allowed_disabled_contracts: u64,

    /// Minutes a cached scaffold summary stays fresh
    #[arg(long, env = "CACHE_PERIOD_IN_MINUTES", default_value = "10")]
    pub cache_period_in_minutes: i64,

    /// Request timeout in milliseconds for external services
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Operator commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Register a user with an API key
    CreateUser {
        #[arg(long)]
        google_id: String,
        #[arg(long)]
        open_key: String,
    },
    /// List a user's API keys and their tracking accounts
    Keys {
        #[arg(long)]
        google_id: String,
    },
    /// Show the disabled scaffold quota of the key's owner
    Quota {
        #[arg(long)]
        open_key: String,
    },
    /// List the key owner's scaffolds
    List {
        #[arg(long)]
        open_key: String,
        #[arg(long, default_value = "0")]
        offset: u32,
        #[arg(long, default_value = "20")]
        limit: u32,
    },
    /// Show a scaffold summary
    Summary {
        #[arg(long)]
        open_key: String,
        address: String,
        /// Bypass the summary cache
        #[arg(long)]
        force: bool,
    },
    /// Compile a scaffold from a JSON request file
    Compile { request: PathBuf },
    /// Deploy a scaffold from a JSON request file
    Deploy { request: PathBuf },
    Activate {
        #[arg(long)]
        open_key: String,
        address: String,
    },
    Deactivate {
        #[arg(long)]
        open_key: String,
        address: String,
    },
    /// Replace a scaffold's description
    Update {
        #[arg(long)]
        open_key: String,
        address: String,
        #[arg(long)]
        description: String,
    },
    SetWebHook {
        #[arg(long)]
        open_key: String,
        address: String,
        #[arg(long)]
        web_hook: String,
    },
    AddShareHolder {
        #[arg(long)]
        open_key: String,
        address: String,
        #[arg(long)]
        holder: String,
        #[arg(long)]
        percent: u32,
    },
    UpdateShareHolder {
        #[arg(long)]
        open_key: String,
        address: String,
        #[arg(long)]
        holder: String,
        #[arg(long)]
        percent: u32,
    },
    RemoveShareHolder {
        #[arg(long)]
        open_key: String,
        address: String,
        #[arg(long)]
        holder: String,
    },
}

/// Settings the scaffold services run under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaffoldSettings {
    pub allowed_disabled_contracts: u64,
    pub cache_period: Duration,
}

impl Default for ScaffoldSettings {
    fn default() -> Self {
        Self {
            allowed_disabled_contracts: 10,
            cache_period: Duration::minutes(10),
        }
    }
}

impl Args {
    pub fn scaffold_settings(&self) -> ScaffoldSettings {
        ScaffoldSettings {
            allowed_disabled_contracts: self.allowed_disabled_contracts,
            cache_period: Duration::minutes(self.cache_period_in_minutes),
        }
    }

    pub fn processor_config(&self) -> HttpServiceConfig {
        HttpServiceConfig::new(&self.processor_url, self.request_timeout_ms)
    }

    pub fn state_config(&self) -> HttpServiceConfig {
        HttpServiceConfig::new(&self.state_url, self.request_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ScaffoldError> {
        if self.cache_period_in_minutes <= 0 {
            return Err(ScaffoldError::Config(
                "CACHE_PERIOD_IN_MINUTES must be positive".to_string(),
            ));
        }

        if self.processor_url.trim().is_empty() {
            return Err(ScaffoldError::Config("PROCESSOR_URL must not be empty".to_string()));
        }

        if self.state_url.trim().is_empty() {
            return Err(ScaffoldError::Config("STATE_URL must not be empty".to_string()));
        }

        Ok(())
    }
}
