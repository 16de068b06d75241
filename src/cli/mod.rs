// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI subcommands for `partreg`.
//!
//! ## Usage
//!
//! ```bash
//! partreg range 202112                          # print the month's bounds
//! partreg plan schema.toml 202101 202112        # print attach DDL for a span
//! partreg plan schema.toml 202101 202112 --json # same, as JSON instructions
//! partreg config show                           # effective configuration
//! ```

pub mod config_cmd;
pub mod partitions_cmd;

pub use partitions_cmd::{plan_instructions, run_plan, run_range, PlanError};
