// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Config CLI subcommands: show, defaults.

use crate::config::{self, EffectiveConfig, DEFAULT_LOG_FORMAT, DEFAULT_LOG_LEVEL, DEFAULT_WAIT_TIMEOUT_MS};

/// Print effective config as key-value pairs to stdout.
pub fn run_show() {
    let cfg = config::load().effective_config();
    print_config(&cfg);
}

/// Print default config values (no env overrides) to stdout.
pub fn run_defaults() {
    print_config(&EffectiveConfig {
        wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
        log_level: DEFAULT_LOG_LEVEL.to_string(),
        log_format: DEFAULT_LOG_FORMAT.to_string(),
    });
}

fn print_config(cfg: &EffectiveConfig) {
    for line in format_config(cfg) {
        println!("{}", line);
    }
}

fn format_config(cfg: &EffectiveConfig) -> Vec<String> {
    vec![
        format!("PARTREG_WAIT_TIMEOUT_MS={}", cfg.wait_timeout_ms),
        format!("PARTREG_LOG_LEVEL={}", cfg.log_level),
        format!("PARTREG_LOG_FORMAT={}", cfg.log_format),
    ]
}
