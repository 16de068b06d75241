// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Partition CLI subcommands: range, plan.
//!
//! `plan` runs the registry against a [`RecordingExecutor`], so it prints
//! exactly the instructions a live executor would receive without touching
//! a database.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::config;
use crate::partition::{
    labels_between, range_for, PartitionError, PartitionKind, PartitionLabel, PartitionRegistry,
    RecordingExecutor, RegistryConfig, SchemaError, SchemaFile, SchemaInstruction,
};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Partition(#[from] PartitionError),
    #[error("Last label {last} precedes first label {first}")]
    EmptySpan { first: String, last: String },
}

/// Run `range <label>`. Returns 0 on success, 1 on an invalid label.
pub fn run_range(label: &str) -> i32 {
    match range_for(label) {
        Ok(range) => {
            println!("{} {}", range.start.format("%Y-%m-%d"), range.end.format("%Y-%m-%d"));
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

/// Ensure every month in `first..=last` on every RANGE table of `schema`
/// and return the instructions emitted, in order.
///
/// LIST-partitioned root tables have no monthly labels and are skipped.
pub async fn plan_instructions(
    schema: &SchemaFile,
    first: PartitionLabel,
    last: PartitionLabel,
    registry_config: RegistryConfig,
) -> Result<Vec<SchemaInstruction>, PlanError> {
    let labels = labels_between(first, last);
    if labels.is_empty() {
        return Err(PlanError::EmptySpan {
            first: first.to_string(),
            last: last.to_string(),
        });
    }

    let executor = Arc::new(RecordingExecutor::new());
    let registry = PartitionRegistry::with_config(executor.clone(), registry_config);

    for table in &schema.tables {
        if table.partition_type != PartitionKind::Range {
            tracing::info!(table = %table.name, "skipping non-range table");
            continue;
        }
        let root = table.declare();
        for label in &labels {
            registry
                .ensure_partition(&root, &label.to_string(), table.sub_strategy())
                .await?;
        }
    }

    Ok(executor.drain())
}

/// Run `plan <schema> <first> <last> [--json]`.
///
/// Returns exit code: 0 on success, 1 on invalid input, 2 on planning failure.
pub async fn run_plan(schema_path: &Path, first: &str, last: &str, json: bool) -> i32 {
    let schema = match SchemaFile::from_file(schema_path) {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let (first, last) = match (first.parse::<PartitionLabel>(), last.parse::<PartitionLabel>()) {
        (Ok(first), Ok(last)) => (first, last),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let instructions = match plan_instructions(&schema, first, last, config::load().registry).await {
        Ok(instructions) => instructions,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 2;
        }
    };

    if json {
        match serde_json::to_string_pretty(&instructions) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 2;
            }
        }
    } else {
        print_instructions(&instructions);
    }
    0
}

fn print_instructions(instructions: &[SchemaInstruction]) {
    for instruction in instructions {
        println!("{}", format_instruction(instruction));
    }
}

fn format_instruction(instruction: &SchemaInstruction) -> String {
    match instruction {
        SchemaInstruction::Dependency { child, parent } => {
            format!("-- {} depends on {}", child, parent)
        }
        SchemaInstruction::PartitionedBy { table, partition_by } => {
            format!("-- {} is PARTITION BY {}", table, partition_by)
        }
        SchemaInstruction::DeferredDdl { statement, .. } => format!("{}\n", statement),
    }
}
