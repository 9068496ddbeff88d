use ampli_order::{DispatchPolicy, SweepPolicy};
use ampli_provider::SyncPolicy;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub dispatch: DispatchConfig,
    pub sweep: SweepConfig,
    pub providers: ProviderSyncConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DispatchConfig {
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
}

impl DispatchConfig {
    pub fn policy(&self) -> DispatchPolicy {
        DispatchPolicy {
            max_attempts: self.max_attempts,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SweepConfig {
    pub interval_seconds: u64,
    pub batch_size: usize,
    pub batch_pause_ms: u64,
}

impl SweepConfig {
    pub fn policy(&self) -> SweepPolicy {
        SweepPolicy {
            interval: Duration::from_secs(self.interval_seconds),
            batch_size: self.batch_size,
            batch_pause: Duration::from_millis(self.batch_pause_ms),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSyncConfig {
    pub failure_threshold: u32,
    pub request_timeout_seconds: u64,
}

impl ProviderSyncConfig {
    pub fn policy(&self) -> SyncPolicy {
        SyncPolicy {
            failure_threshold: self.failure_threshold,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub cache_ttl_seconds: u64,
}

impl DashboardConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of AMPLI)
            .add_source(config::Environment::with_prefix("AMPLI").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
