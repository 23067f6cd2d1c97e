// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Request Shape Validation
//!
//! Optional pre-check for the `filename` field of a read request. It reports
//! every failed constraint as an itemized [`FieldError`] so clients can fix
//! their input.
//!
//! Shape validation is a quality layer only. It never replaces containment:
//! a value that passes here is still resolved through
//! [`PathContainment`](crate::domain::path_containment::PathContainment)
//! before any filesystem access, and routes that skip this step lose nothing
//! in safety.
//!
//! | Rule | Message |
//! |------|---------|
//! | `Required` | `filename required` |
//! | `IsString` | `filename must be a string` |
//! | `NotEmpty` | `filename must not be empty` |
//! | `NoNullByte` | `null byte not allowed` |

use serde::Serialize;
use serde_json::Value;

/// A single constraint applied to a request field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Field must be present
    Required,
    /// Field must be a JSON string
    IsString,
    /// String must contain something other than whitespace
    NotEmpty,
    /// String must not embed `\0`
    NoNullByte,
}

impl FieldRule {
    fn message(self, field: &str) -> String {
        match self {
            FieldRule::Required => format!("{field} required"),
            FieldRule::IsString => format!("{field} must be a string"),
            FieldRule::NotEmpty => format!("{field} must not be empty"),
            FieldRule::NoNullByte => "null byte not allowed".to_string(),
        }
    }
}

/// Itemized validation failure, shaped like the field errors web clients
/// already expect: `{type, location, path, msg, value}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub location: &'static str,
    pub path: String,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// All failures for one request, in rule order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.msg.as_str()).collect()
    }
}

/// Validates the file name field of a read request
#[derive(Debug, Clone)]
pub struct FilenameValidator {
    field: String,
    rules: Vec<FieldRule>,
}

impl FilenameValidator {
    /// The full rule set for the `filename` body field
    pub fn new() -> Self {
        Self::with_rules(
            "filename",
            vec![
                FieldRule::Required,
                FieldRule::IsString,
                FieldRule::NotEmpty,
                FieldRule::NoNullByte,
            ],
        )
    }

    pub fn with_rules(field: impl Into<String>, rules: Vec<FieldRule>) -> Self {
        Self {
            field: field.into(),
            rules,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Check `value` against every rule.
    ///
    /// On success the trimmed string is returned.
    pub fn validate<'a>(&self, value: Option<&'a Value>) -> Result<&'a str, ValidationErrors> {
        let mut errors = Vec::new();

        // Presence and type gate the string rules; there is nothing to trim
        // or scan without a string.
        let text = match value {
            None => {
                if self.rules.contains(&FieldRule::Required) {
                    errors.push(self.error(FieldRule::Required, None));
                }
                None
            }
            Some(Value::String(s)) => Some(s.as_str()),
            Some(other) => {
                if self.rules.contains(&FieldRule::IsString) {
                    errors.push(self.error(FieldRule::IsString, Some(other.clone())));
                }
                None
            }
        };

        if let Some(text) = text {
            for rule in &self.rules {
                let failed = match rule {
                    FieldRule::NotEmpty => text.trim().is_empty(),
                    FieldRule::NoNullByte => text.contains('\0'),
                    FieldRule::Required | FieldRule::IsString => false,
                };
                if failed {
                    errors.push(self.error(*rule, Some(Value::String(text.to_string()))));
                }
            }
        }

        match (text, errors.is_empty()) {
            (Some(text), true) => Ok(text.trim()),
            // Only reachable when the rule set omits Required/IsString.
            (None, true) => Ok(""),
            (_, false) => Err(ValidationErrors { errors }),
        }
    }

    fn error(&self, rule: FieldRule, value: Option<Value>) -> FieldError {
        FieldError {
            kind: "field",
            location: "body",
            path: self.field.clone(),
            msg: rule.message(&self.field),
            value,
        }
    }
}

impl Default for FilenameValidator {
    fn default() -> Self {
        Self::new()
    }
}
