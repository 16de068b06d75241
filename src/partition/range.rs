// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Monthly partition bounds.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::LabelError;
use super::label::PartitionLabel;

/// Half-open `[start, end)` span covering exactly one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PartitionRange {
    /// The month `year-month`. `None` if the month is not 1-12 or the dates
    /// cannot be represented.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = if month < 12 {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
        };
        Some(Self { start, end })
    }

    /// Range of the month containing `date`.
    pub fn containing(date: NaiveDate) -> Option<Self> {
        Self::month(date.year(), date.month())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// True if the two ranges share at least one day.
    pub fn overlaps(&self, other: &PartitionRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// `FOR VALUES FROM ('YYYY-MM-DD') TO ('YYYY-MM-DD')`
    pub fn bound_clause(&self) -> String {
        format!(
            "FOR VALUES FROM ('{}') TO ('{}')",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

impl fmt::Display for PartitionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Range for a `YYYYMM` label.
pub fn range_for(label: &str) -> Result<PartitionRange, LabelError> {
    Ok(label.parse::<PartitionLabel>()?.range())
}
