//! Daemon settings
//!
//! Built-in defaults overlaid by `OFFLINE_QUEUE_*` environment variables,
//! e.g. `OFFLINE_QUEUE_MAX_QUEUE_SIZE=500`.

use anyhow::{Context, Result};
use config::{Config, Environment};
use offline_queue_api_rpc::server::{DEFAULT_RPC_HOST, DEFAULT_RPC_PORT};
use offline_queue_core::application::worker::constants::{
    DEFAULT_CLEANUP_INTERVAL, DEFAULT_MAX_REQUEST_AGE, DEFAULT_PROCESS_INTERVAL,
};
use offline_queue_core::domain::{DEFAULT_STORAGE_KEY, MAX_QUEUE_SIZE, MAX_RETRIES};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const ENV_PREFIX: &str = "OFFLINE_QUEUE";
const DEFAULT_DB_PATH: &str = "~/.offline-queue/queue.db";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: String,
    pub storage_key: String,
    pub max_queue_size: usize,
    pub max_retries: u32,

    pub rpc_host: String,
    pub rpc_port: u16,

    pub api_base_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,

    pub process_interval_secs: u64,
    pub cleanup_interval_secs: u64,
    pub max_request_age_secs: u64,

    pub probe_host: String,
    pub probe_port: u16,
    pub probe_timeout_ms: u64,
    pub probe_interval_secs: u64,

    /// `pretty` or `json`
    pub log_format: String,
    /// Daily-rolling JSON log files are written here when set
    pub log_dir: Option<String>,
}

impl Settings {
    /// Load from the process environment
    pub fn load() -> Result<Self> {
        Self::from_env(None)
    }

    /// Load with an explicit environment (tests), `None` reads the process env
    pub fn from_env(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let settings: Settings = Config::builder()
            .set_default("db_path", DEFAULT_DB_PATH)?
            .set_default("storage_key", DEFAULT_STORAGE_KEY)?
            .set_default("max_queue_size", MAX_QUEUE_SIZE as i64)?
            .set_default("max_retries", i64::from(MAX_RETRIES))?
            .set_default("rpc_host", DEFAULT_RPC_HOST)?
            .set_default("rpc_port", i64::from(DEFAULT_RPC_PORT))?
            .set_default("api_base_url", "http://127.0.0.1:8080")?
            .set_default("request_timeout_secs", 30_i64)?
            .set_default("process_interval_secs", secs(DEFAULT_PROCESS_INTERVAL))?
            .set_default("cleanup_interval_secs", secs(DEFAULT_CLEANUP_INTERVAL))?
            .set_default("max_request_age_secs", secs(DEFAULT_MAX_REQUEST_AGE))?
            .set_default("probe_host", "1.1.1.1")?
            .set_default("probe_port", 443_i64)?
            .set_default("probe_timeout_ms", 2000_i64)?
            .set_default("probe_interval_secs", 10_i64)?
            .set_default("log_format", "pretty")?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(vars),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.max_queue_size == 0 {
            anyhow::bail!("{}_MAX_QUEUE_SIZE must be at least 1", ENV_PREFIX);
        }
        if self.process_interval_secs == 0 || self.cleanup_interval_secs == 0 {
            anyhow::bail!("Worker intervals must be at least 1 second");
        }
        Ok(())
    }

    /// Database path with `~` expanded
    pub fn expanded_db_path(&self) -> String {
        shellexpand::tilde(&self.db_path).into_owned()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn process_interval(&self) -> Duration {
        Duration::from_secs(self.process_interval_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    pub fn max_request_age(&self) -> Duration {
        Duration::from_secs(self.max_request_age_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }
}

fn secs(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}
