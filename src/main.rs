// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! `partreg` entry point.
//!
//! ## Subcommands
//!
//! - `partreg range <label>` - Print a month label's bounds
//! - `partreg plan <schema.toml> <first> <last> [--json]` - Print attach DDL
//! - `partreg config show|defaults` - Print configuration

use std::path::Path;
use std::process::ExitCode;

use partition_registry::cli::{config_cmd, run_plan, run_range};
use partition_registry::config as partreg_config;
use partition_registry::telemetry::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    let env = partreg_config::load();
    if let Err(e) = init_logging(&env.logging) {
        eprintln!("Logging disabled: {}", e);
    }

    match command {
        "range" => match args.get(2) {
            Some(label) => ExitCode::from(run_range(label) as u8),
            None => {
                print_command_help("range");
                ExitCode::FAILURE
            }
        },
        "plan" => {
            let positional: Vec<&str> = args[2..]
                .iter()
                .map(|s| s.as_str())
                .filter(|s| !s.starts_with("--"))
                .collect();
            let json = args[2..].iter().any(|s| s == "--json");
            match positional.as_slice() {
                [schema, first, last] => {
                    let code = run_plan(Path::new(schema), first, last, json).await;
                    ExitCode::from(code as u8)
                }
                _ => {
                    print_command_help("plan");
                    ExitCode::FAILURE
                }
            }
        }
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    config_cmd::run_show();
                    ExitCode::SUCCESS
                }
                "defaults" => {
                    config_cmd::run_defaults();
                    ExitCode::SUCCESS
                }
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_command_help("config");
                    ExitCode::FAILURE
                }
            }
        }
        "help" | "--help" | "-h" => {
            if let Some(subcommand) = args.get(2) {
                print_command_help(subcommand);
            } else {
                print_usage();
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("partreg {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "partreg - monthly partition planner v{}

USAGE:
    partreg [COMMAND] [OPTIONS]

COMMANDS:
    range      Print the [start, end) dates of a YYYYMM label
    plan       Print the attach DDL for a span of months
    config     Show configuration (show, defaults)
    version    Show version information
    help       Show this help message

ENVIRONMENT:
    PARTREG_WAIT_TIMEOUT_MS  Max wait on an in-progress partition (default: 30000)
    PARTREG_LOG_LEVEL        Log filter (default: info)
    PARTREG_LOG_FORMAT       json, pretty or compact (default: json)

EXIT CODES:
    0  Success
    1  Invalid input
    2  Planning failure
",
        version
    );
}

fn print_command_help(command: &str) {
    match command {
        "range" => eprintln!(
            "partreg range - Print a month's bounds

USAGE:
    partreg range <YYYYMM>

EXAMPLES:
    partreg range 202112    # 2021-12-01 2022-01-01
"
        ),
        "plan" => eprintln!(
            "partreg plan - Print attach DDL for a span of months

USAGE:
    partreg plan <schema.toml> <first YYYYMM> <last YYYYMM> [--json]

DESCRIPTION:
    Declares every RANGE table in the schema file and ensures one partition
    per month from first through last, inclusive. Prints the dependency and
    ALTER TABLE ... ATTACH PARTITION instructions in emission order.

EXAMPLES:
    partreg plan schema.toml 202101 202112
    partreg plan schema.toml 202101 202103 --json
"
        ),
        "config" => eprintln!(
            "partreg config - Show configuration

USAGE:
    partreg config show       # effective values
    partreg config defaults   # built-in defaults
"
        ),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
        }
    }
}
