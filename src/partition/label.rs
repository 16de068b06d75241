// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! `YYYYMM` partition labels.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::LabelError;
use super::range::PartitionRange;

/// A validated month label such as `202112`.
///
/// Ordering follows the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartitionLabel {
    year: i32,
    month: u32,
    range: PartitionRange,
}

impl PartitionLabel {
    /// Parse a label. It must be exactly six ASCII digits with month 01-12.
    pub fn parse(label: &str) -> Result<Self, LabelError> {
        if label.len() != 6 {
            return Err(LabelError::WrongLength {
                label: label.to_string(),
                len: label.chars().count(),
            });
        }
        if !label.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LabelError::NotNumeric {
                label: label.to_string(),
            });
        }

        // Six ASCII digits always parse.
        let year: i32 = label[..4].parse().map_err(|_| LabelError::NotNumeric {
            label: label.to_string(),
        })?;
        let month: u32 = label[4..].parse().map_err(|_| LabelError::NotNumeric {
            label: label.to_string(),
        })?;
        if !(1..=12).contains(&month) {
            return Err(LabelError::MonthOutOfRange {
                label: label.to_string(),
                month,
            });
        }

        let range = PartitionRange::month(year, month).ok_or_else(|| {
            LabelError::Unrepresentable {
                label: label.to_string(),
            }
        })?;
        Ok(Self { year, month, range })
    }

    /// Label of the month containing `date`. `None` for dates outside
    /// years 0000-9999.
    pub fn for_date(date: NaiveDate) -> Option<Self> {
        if !(0..=9999).contains(&date.year()) {
            return None;
        }
        let range = PartitionRange::containing(date)?;
        Some(Self {
            year: date.year(),
            month: date.month(),
            range,
        })
    }

    /// The following month, rolling December into January of the next year.
    pub fn next(&self) -> Option<Self> {
        Self::for_date(self.range.end)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month this label covers.
    pub fn range(&self) -> PartitionRange {
        self.range
    }
}

impl fmt::Display for PartitionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

impl FromStr for PartitionLabel {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PartitionLabel {
    type Error = LabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PartitionLabel> for String {
    fn from(label: PartitionLabel) -> Self {
        label.to_string()
    }
}

/// Every month label from `first` through `last`, in calendar order.
/// Empty when `last` precedes `first`.
pub fn labels_between(first: PartitionLabel, last: PartitionLabel) -> Vec<PartitionLabel> {
    let mut labels = Vec::new();
    let mut current = Some(first);
    while let Some(label) = current {
        if label > last {
            break;
        }
        labels.push(label);
        current = label.next();
    }
    labels
}

/// Check a LIST partition value: non-empty ASCII letters, digits or `_`.
pub fn validate_list_value(value: &str) -> Result<(), LabelError> {
    let valid = !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(LabelError::InvalidListValue {
            label: value.to_string(),
        })
    }
}

fn partition_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^.+_[0-9]{6}$").expect("partition name pattern is valid"))
}

/// True for table names that look like generated monthly partitions
/// (`events_202101`). Schema tooling uses this to skip them.
pub fn is_partition_table_name(name: &str) -> bool {
    partition_name_pattern().is_match(name)
}
