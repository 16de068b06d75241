// Copyright 2026 partition-registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Composite construction keys.
//!
//! A key is the normalized tuple of positional arguments followed by keyword
//! arguments sorted by name. Two keys built from the same arguments compare
//! equal regardless of the order keywords were supplied in.

use std::collections::BTreeMap;
use std::fmt;

/// A single hashable argument value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyValue {
    Unit,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<KeyValue>),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => write!(f, "()"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::UInt(u) => write!(f, "{}", u),
            Self::Str(s) => write!(f, "{:?}", s),
            Self::Bytes(b) => write!(f, "b[{} bytes]", b.len()),
            Self::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<()> for KeyValue {
    fn from(_: ()) -> Self {
        Self::Unit
    }
}

impl From<bool> for KeyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for KeyValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for KeyValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for KeyValue {
    fn from(v: u32) -> Self {
        Self::UInt(v as u64)
    }
}

impl From<u64> for KeyValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<&str> for KeyValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<u8>> for KeyValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Vec<KeyValue>> for KeyValue {
    fn from(v: Vec<KeyValue>) -> Self {
        Self::Tuple(v)
    }
}

/// Normalized construction key: positional arguments, then sorted keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    args: Vec<KeyValue>,
    kwargs: BTreeMap<String, KeyValue>,
}

impl CacheKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<KeyValue>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a keyword argument. Supplying the same name twice keeps the last value.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    pub fn args(&self) -> &[KeyValue] {
        &self.args
    }

    /// Keyword arguments in name order.
    pub fn kwargs(&self) -> impl Iterator<Item = (&str, &KeyValue)> {
        self.kwargs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let mut first = true;
        for arg in &self.args {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
            first = false;
        }
        for (name, value) in &self.kwargs {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
            first = false;
        }
        write!(f, ")")
    }
}
