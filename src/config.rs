// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration loading from environment variables.
//!
//! Values come from `PARTREG_*` variables. Missing or invalid values fall
//! back to defaults without failing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `PARTREG_WAIT_TIMEOUT_MS` | 30000 | Max wait on another caller's in-progress partition |
//! | `PARTREG_LOG_LEVEL` | info | Tracing filter directive |
//! | `PARTREG_LOG_FORMAT` | json | `json`, `pretty` or `compact` |

use std::time::Duration;

use crate::partition::RegistryConfig;
use crate::telemetry::{LogConfig, LogFormat};

pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FORMAT: &str = "json";

/// Effective configuration summary, as printed by `partreg config show`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub wait_timeout_ms: u64,
    pub log_level: String,
    pub log_format: String,
}

/// All configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub registry: RegistryConfig,
    pub logging: LogConfig,
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

fn load_registry_config() -> RegistryConfig {
    let wait_ms = parse_u64("PARTREG_WAIT_TIMEOUT_MS", DEFAULT_WAIT_TIMEOUT_MS);
    let wait_ms = wait_ms.max(1); // floor: 1ms
    RegistryConfig {
        wait_timeout: Duration::from_millis(wait_ms),
    }
}

fn load_log_config() -> LogConfig {
    let level = std::env::var("PARTREG_LOG_LEVEL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    let format = std::env::var("PARTREG_LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse::<LogFormat>().ok())
        .unwrap_or_default();
    LogConfig { format, level }
}

/// Load all configuration from environment variables.
pub fn load() -> EnvConfig {
    EnvConfig {
        registry: load_registry_config(),
        logging: load_log_config(),
    }
}

impl EnvConfig {
    pub fn effective_config(&self) -> EffectiveConfig {
        let log_format = match self.logging.format {
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
            LogFormat::Compact => "compact",
        };
        EffectiveConfig {
            wait_timeout_ms: self.registry.wait_timeout.as_millis() as u64,
            log_level: self.logging.level.clone(),
            log_format: log_format.to_string(),
        }
    }
}
