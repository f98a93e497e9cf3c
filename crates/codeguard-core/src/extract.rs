//! Turning validator responses into a typed `ValidationResult`.
//!
//! Two shapes reach us: a bare JSON object (model output decoded directly)
//! and a text body that embeds the object in a ```` ```json ```` fence,
//! sometimes with a second layer of string escaping on top. Both go through
//! [`decode_validation`] / [`extract_validation`] and come back as an
//! [`Extraction`].

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::{Error, ParseError, Result, ValidationResult};

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Parsed {
        result: ValidationResult,
        /// Optional `passed` flag from the payload; only picks notice wording.
        passed: Option<bool>,
    },
    Failed(ParseError),
}

impl Extraction {
    pub fn into_result(self) -> Result<ValidationOutcome> {
        match self {
            Extraction::Parsed { result, passed } => Ok(ValidationOutcome { result, passed }),
            Extraction::Failed(e) => Err(Error::Parse(e)),
        }
    }
}

/// A successfully extracted validation result.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub result: ValidationResult,
    pub passed: Option<bool>,
}

impl ValidationOutcome {
    pub fn headline(&self) -> &'static str {
        if self.passed == Some(true) {
            "Code Passed Validation"
        } else {
            "Validation Complete"
        }
    }

    pub fn detail(&self) -> &str {
        if self.result.summary.is_empty() {
            "Validation finished."
        } else {
            &self.result.summary
        }
    }
}

/// Interior of the first ```` ```json ```` fence, without surrounding whitespace.
pub fn fenced_json(raw: &str) -> Option<&str> {
    JSON_FENCE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Remove one layer of string escaping: `\n`, `\"`, `\t`, `\r` and `\\`.
/// Anything else after a backslash is left as written.
pub fn unescape_layer(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('"') => out.push('"'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Extract the result from a text body that carries it in a `json` fence.
pub fn extract_validation(raw: &str) -> Extraction {
    let Some(captured) = fenced_json(raw) else {
        return Extraction::Failed(ParseError::MissingFence);
    };
    match parse_fenced(captured) {
        Ok(value) => from_value(value),
        Err(e) => Extraction::Failed(e),
    }
}

/// Decode model output that is either the bare result object or a fenced one.
pub fn decode_validation(raw: &str) -> Extraction {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return from_value(value);
        }
    }
    extract_validation(raw)
}

/// Undo `\n`, `\"` and `\t` in turn, leaving every other backslash alone.
pub fn replace_common_escapes(text: &str) -> String {
    text.replace("\\n", "\n")
        .replace("\\\"", "\"")
        .replace("\\t", "\t")
}

/// As written, then with the common escapes replaced, then with one full
/// layer of escaping removed. The last error is the one reported.
fn parse_fenced(captured: &str) -> std::result::Result<Value, ParseError> {
    if let Ok(value) = serde_json::from_str::<Value>(captured) {
        return Ok(value);
    }
    if let Ok(value) = serde_json::from_str::<Value>(&replace_common_escapes(captured)) {
        return Ok(value);
    }
    serde_json::from_str(&unescape_layer(captured)).map_err(|e| ParseError::Json(e.to_string()))
}

fn from_value(value: Value) -> Extraction {
    let passed = value.get("passed").and_then(Value::as_bool);
    match serde_json::from_value::<ValidationResult>(value) {
        Ok(result) => Extraction::Parsed { result, passed },
        Err(e) => Extraction::Failed(ParseError::Shape(e.to_string())),
    }
}
