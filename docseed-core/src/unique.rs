//! Duplicate-key error normalization.
//!
//! MongoDB reports a unique index violation as a write error with code
//! `11000` (or `11001` on old servers) and a message like:
//!
//! ```text
//! E11000 duplicate key error collection: db.users index: email_1 dup key: { email: "a@b.c" }
//! ```
//!
//! [`normalize_unique_error`] turns that into a [`ValidationError`] keyed by
//! the offending paths, so callers can report it the same way as any other
//! per-field validation failure.

use std::collections::BTreeMap;

use bson::{Bson, Document};
use regex_lite::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::document::{DocumentExt, ID_KEY};

/// Duplicate key error code.
pub const DUPLICATE_KEY: i32 = 11000;

/// Legacy duplicate key error code (updates on pre-2.6 servers).
pub const DUPLICATE_KEY_LEGACY: i32 = 11001;

/// HTTP-like status attached to validation errors.
pub const VALIDATION_STATUS: u16 = 400;

/// A single path failing validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatorError {
    /// Kind of validator that failed (`unique`).
    pub kind: String,
    /// The offending path.
    pub path: String,
    /// The offending value.
    pub value: Bson,
    /// Human readable message.
    pub message: String,
    /// The raw driver message.
    pub reason: String,
    /// Name of the violated index.
    pub index: String,
}

/// A structured validation error keyed by path.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{message}")]
pub struct ValidationError {
    /// Status code, always 400.
    pub status: u16,
    /// Summary message.
    pub message: String,
    /// Per-path errors.
    pub errors: BTreeMap<String, ValidatorError>,
}

impl ValidationError {
    /// Paths with errors, sorted.
    pub fn paths(&self) -> Vec<&str> {
        self.errors.keys().map(String::as_str).collect()
    }
}

/// Check whether a server error code denotes a duplicate key.
pub fn is_duplicate_key(code: i32) -> bool {
    code == DUPLICATE_KEY || code == DUPLICATE_KEY_LEGACY
}

/// Normalize a duplicate-key error into a [`ValidationError`].
///
/// `record` is the document being written; when given, only paths present
/// in it are reported and their values are taken from it. Returns `None`
/// when the error is not a duplicate-key error or when no path or value
/// could be parsed, in which case the raw error should be surfaced as is.
pub fn normalize_unique_error(
    code: i32,
    message: &str,
    record: Option<&Document>,
) -> Option<ValidationError> {
    if !is_duplicate_key(code) || message.is_empty() {
        return None;
    }

    let index = index_name(message)?;
    let paths = error_paths(&index, record);
    let values = error_values(message, paths.len());
    if paths.is_empty() || values.is_empty() {
        return None;
    }

    let mut errors = BTreeMap::new();
    for (position, path) in paths.iter().enumerate() {
        let value = record
            .and_then(|r| r.get_path(path).cloned())
            .or_else(|| values.get(position).cloned().map(Bson::String))
            .unwrap_or(Bson::Null);
        let error = ValidatorError {
            kind: "unique".to_string(),
            path: path.clone(),
            message: format!("Path `{path}` ({}) is not unique.", display_value(&value)),
            value,
            reason: message.to_string(),
            index: index.clone(),
        };
        errors.insert(path.clone(), error);
    }

    let summary = errors
        .values()
        .map(|e| format!("{}: {}", e.path, e.message))
        .collect::<Vec<_>>()
        .join(", ");

    Some(ValidationError {
        status: VALIDATION_STATUS,
        message: format!("Validation failed: {summary}"),
        errors,
    })
}

fn index_name(message: &str) -> Option<String> {
    let pattern = Regex::new(r"index: (.+?) dup key:").ok()?;
    let captures = pattern.captures(message)?;
    Some(captures.get(1)?.as_str().to_string())
}

fn error_paths(index: &str, record: Option<&Document>) -> Vec<String> {
    let name = index.rsplit('$').next().unwrap_or(index);

    let mut paths: Vec<String> = Vec::new();
    let mut push = |path: &str| {
        if !paths.iter().any(|p| p == path) {
            paths.push(path.to_string());
        }
    };
    let parts: Vec<&str> = name.split('_').collect();
    for part in &parts {
        push(part);
    }
    for part in &parts {
        if *part == "id" {
            push(ID_KEY);
        }
    }

    paths.retain(|path| match record {
        Some(record) => !path.is_empty() && record.get_path(path).is_some(),
        None => !path.is_empty() && path.parse::<i64>().is_err(),
    });
    paths
}

fn error_values(message: &str, path_count: usize) -> Vec<String> {
    let Ok(dup_key) = Regex::new(r"dup key: \{ (.+?) \}") else {
        return Vec::new();
    };
    let Some(body) = dup_key
        .captures(message)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
    else {
        return Vec::new();
    };

    let mut values: Vec<String> = Vec::new();
    for pattern in [r"'(.+?)'", r#""(.+?)""#] {
        let Ok(quoted) = Regex::new(pattern) else {
            continue;
        };
        for captures in quoted.captures_iter(body) {
            if let Some(value) = captures.get(1) {
                let value = value.as_str().to_string();
                if !values.contains(&value) {
                    values.push(value);
                }
            }
        }
    }

    if path_count == 1 && !values.is_empty() {
        vec![values.join(" ")]
    } else {
        values
    }
}

fn display_value(value: &Bson) -> String {
    match value {
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}
