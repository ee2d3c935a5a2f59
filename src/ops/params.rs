// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use super::OperationError;

/// A typed parameter value, already decoded by the calling tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Flag(bool),
}

impl ParamValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Flag(_) => "flag",
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Operation-specific arguments keyed by their wire name (`slideIndex`, `text`, ...).
///
/// Handlers only read the keys they declare; accessors turn a missing or mistyped key into a
/// validation error so nothing is mutated on bad input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationParameters {
    values: BTreeMap<String, ParamValue>,
}

impl OperationParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn insert_opt<V: Into<ParamValue>>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Required keys that are absent, in declaration order.
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required.iter().copied().filter(|key| !self.contains(key)).collect()
    }

    pub fn text(&self, key: &str) -> Result<&str, OperationError> {
        self.opt_text(key)?.ok_or_else(|| missing(key))
    }

    pub fn opt_text(&self, key: &str) -> Result<Option<&str>, OperationError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(ParamValue::Text(value)) => Ok(Some(value)),
            Some(other) => Err(mistyped(key, "text", other)),
        }
    }

    /// A zero-based position; negative integers are rejected.
    pub fn index(&self, key: &str) -> Result<usize, OperationError> {
        self.opt_index(key)?.ok_or_else(|| missing(key))
    }

    pub fn opt_index(&self, key: &str) -> Result<Option<usize>, OperationError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(ParamValue::Integer(value)) => match usize::try_from(*value) {
                Ok(index) => Ok(Some(index)),
                Err(_) => Err(OperationError::validation(format!(
                    "{key} must be a non-negative integer"
                ))),
            },
            Some(other) => Err(mistyped(key, "integer", other)),
        }
    }

    pub fn opt_flag(&self, key: &str) -> Result<Option<bool>, OperationError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(ParamValue::Flag(value)) => Ok(Some(*value)),
            Some(other) => Err(mistyped(key, "flag", other)),
        }
    }
}

fn missing(key: &str) -> OperationError {
    OperationError::validation(format!("missing required parameter '{key}'"))
}

fn mistyped(key: &str, expected: &str, found: &ParamValue) -> OperationError {
    OperationError::validation(format!(
        "parameter '{key}' must be {expected}, got {}",
        found.type_name()
    ))
}
