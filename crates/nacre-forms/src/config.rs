#![forbid(unsafe_code)]

//! Policy-as-data loading of form descriptors from TOML (`config` feature).
//!
//! Patterns arrive as strings and are compiled at load time; a bad pattern
//! is a typed error, not a panic.

use regex::Regex;
use serde::Deserialize;

use crate::rules::{FieldRule, FormDescriptor, STOCK_SUBMIT_DELAY_MS};
use crate::submit::{GENERIC_FAILURE_MESSAGE, GENERIC_SUCCESS_MESSAGE, Outcome, Submission};

/// Errors from descriptor loading.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// The TOML source could not be parsed.
    Parse(String),
    /// A field's pattern failed to compile.
    Pattern { field: String, detail: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(detail) => write!(f, "config parse error: {detail}"),
            Self::Pattern { field, detail } => {
                write!(f, "invalid pattern for field '{field}': {detail}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize)]
struct FormsFile {
    #[serde(default)]
    forms: Vec<FormEntry>,
}

#[derive(Debug, Deserialize)]
struct FormEntry {
    name: String,
    submission: SubmissionEntry,
    #[serde(default)]
    fields: Vec<FieldEntry>,
}

#[derive(Debug, Deserialize)]
struct FieldEntry {
    field: String,
    #[serde(default)]
    required: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SubmissionEntry {
    Mail {
        recipient: String,
    },
    Simulated {
        #[serde(default = "default_delay")]
        delay_ms: u64,
        success_rate: Option<f64>,
        message: Option<String>,
        success: Option<String>,
        failure: Option<String>,
    },
}

fn default_delay() -> u64 {
    STOCK_SUBMIT_DELAY_MS
}

/// Parse descriptors from TOML source.
pub fn descriptors_from_toml(source: &str) -> Result<Vec<FormDescriptor>, ConfigError> {
    let file: FormsFile = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
    file.forms.into_iter().map(build_descriptor).collect()
}

fn build_descriptor(entry: FormEntry) -> Result<FormDescriptor, ConfigError> {
    let mut rules = Vec::with_capacity(entry.fields.len());
    for field in entry.fields {
        let pattern = field
            .pattern
            .map(|raw| {
                Regex::new(&raw).map_err(|e| ConfigError::Pattern {
                    field: field.field.clone(),
                    detail: e.to_string(),
                })
            })
            .transpose()?;
        rules.push(FieldRule {
            field: field.field,
            required: field.required,
            min_length: field.min_length,
            max_length: field.max_length,
            pattern,
            message: field.message,
        });
    }

    let submission = match entry.submission {
        SubmissionEntry::Mail { recipient } => Submission::MailClient { recipient },
        SubmissionEntry::Simulated {
            delay_ms,
            success_rate,
            message,
            success,
            failure,
        } => {
            let outcome = match success_rate {
                Some(rate) => Outcome::Flaky {
                    success_rate: rate,
                    success: success
                        .or(message)
                        .unwrap_or_else(|| GENERIC_SUCCESS_MESSAGE.to_owned()),
                    failure: failure.unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_owned()),
                },
                None => Outcome::Always {
                    message: message
                        .or(success)
                        .unwrap_or_else(|| GENERIC_SUCCESS_MESSAGE.to_owned()),
                },
            };
            Submission::Simulated { delay_ms, outcome }
        }
    };

    Ok(FormDescriptor::new(entry.name, rules, submission))
}
