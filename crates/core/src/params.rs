// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job-kind specific extra parameters
//!
//! Jobs may carry a flat bag of string/number/bool parameters. The raw
//! payload is resolved exactly once, at claim time; every later read goes
//! through typed accessors with an explicit default.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors resolving an extra-parameter payload
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("extra parameters are not a JSON object: {0}")]
    NotAnObject(String),
    #[error("extra parameter '{key}' is nested; only flat string/number/bool values are allowed")]
    Nested { key: String },
    #[error("invalid extra parameters: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// A single flat parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

/// A resolved, validated extra-parameter bag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraParams {
    values: BTreeMap<String, ParamValue>,
}

impl ExtraParams {
    /// Resolve the raw payload stored on a job row.
    ///
    /// Absent payloads, JSON `null`, and degenerate values no longer than
    /// an empty object (`{}`) all resolve to the empty bag rather than an
    /// error. Null-valued keys are dropped.
    pub fn resolve(raw: Option<&str>) -> Result<Self, ParamsError> {
        let Some(raw) = raw else {
            return Ok(Self::default());
        };
        let trimmed = raw.trim();
        if trimmed.len() <= 2 {
            return Ok(Self::default());
        }

        let value: Value = serde_json::from_str(trimmed)?;
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(map) => {
                let mut values = BTreeMap::new();
                for (key, v) in map {
                    let parsed = match v {
                        Value::String(s) => ParamValue::Str(s),
                        Value::Number(n) => ParamValue::Num(n.as_f64().unwrap_or_default()),
                        Value::Bool(b) => ParamValue::Bool(b),
                        Value::Null => continue,
                        Value::Array(_) | Value::Object(_) => {
                            return Err(ParamsError::Nested { key })
                        }
                    };
                    values.insert(key, parsed);
                }
                Ok(Self { values })
            }
            other => Err(ParamsError::NotAnObject(other.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    /// String value for `key`, or `default` when absent or not a string
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.values.get(key) {
            Some(ParamValue::Str(s)) => s.as_str(),
            _ => default,
        }
    }

    /// Boolean value for `key`, or `default` when absent or not a bool
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(ParamValue::Bool(b)) => *b,
            _ => default,
        }
    }

    /// Integer value for `key` (numbers are truncated), or `default`
    pub fn i64_or(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(ParamValue::Num(n)) => *n as i64,
            _ => default,
        }
    }

    /// Whether `key` is present with exactly this string value
    pub fn is_set(&self, key: &str, expected: &str) -> bool {
        matches!(self.values.get(key), Some(ParamValue::Str(s)) if s == expected)
    }
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
