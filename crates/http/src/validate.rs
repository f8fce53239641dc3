//! Declarative checks over a JSON request body.
//!
//! Handlers read only the fields they ask [`BodyRules`] for, so anything else
//! in the body is ignored. All failures are collected and returned together
//! as a single 422 response.

use std::ops::RangeInclusive;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AppError;

/// One failed rule, reported to the client under `data`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub location: &'static str,
    pub param: String,
    pub msg: String,
}

impl FieldError {
    fn body(param: &str, msg: impl Into<String>) -> Self {
        Self {
            location: "body",
            param: param.to_string(),
            msg: msg.into(),
        }
    }
}

pub struct BodyRules<'a> {
    body: Option<&'a Map<String, Value>>,
    errors: Vec<FieldError>,
}

impl<'a> BodyRules<'a> {
    pub fn new(body: &'a Value) -> Self {
        let body = body.as_object();
        let mut errors = Vec::new();
        if body.is_none() {
            errors.push(FieldError::body("", "request body must be a JSON object"));
        }
        Self { body, errors }
    }

    /// Positive integer id; numeric strings such as `"4"` are accepted.
    pub fn required_id(&mut self, name: &str) -> Option<i64> {
        let value = match self.field(name) {
            Some(value) => value,
            None => {
                self.fail(name, "is required");
                return None;
            }
        };

        let id = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match id.filter(|id| *id > 0) {
            Some(id) => Some(id),
            None => {
                self.fail(name, "must be a positive integer");
                None
            }
        }
    }

    /// Trimmed string whose character count lies in `len`.
    pub fn required_text(&mut self, name: &str, len: RangeInclusive<usize>) -> Option<String> {
        self.string(name, len, true, true)
    }

    pub fn optional_text(&mut self, name: &str, len: RangeInclusive<usize>) -> Option<String> {
        self.string(name, len, false, true)
    }

    /// Untrimmed string whose byte length lies in `len`.
    pub fn required_secret(&mut self, name: &str, len: RangeInclusive<usize>) -> Option<String> {
        self.string(name, len, true, false)
    }

    pub fn optional_secret(&mut self, name: &str, len: RangeInclusive<usize>) -> Option<String> {
        self.string(name, len, false, false)
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Turn collected failures into a 422.
    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            return Ok(());
        }

        let details = self
            .errors
            .iter()
            .filter_map(|e| serde_json::to_value(e).ok())
            .collect();
        Err(AppError::validation(details, "request failed validation"))
    }

    fn field(&self, name: &str) -> Option<&'a Value> {
        self.body
            .and_then(|body| body.get(name))
            .filter(|value| !value.is_null())
    }

    fn fail(&mut self, name: &str, msg: impl Into<String>) {
        // A non-object body has already been reported once.
        if self.body.is_some() {
            self.errors.push(FieldError::body(name, msg));
        }
    }

    fn string(
        &mut self,
        name: &str,
        len: RangeInclusive<usize>,
        required: bool,
        trim: bool,
    ) -> Option<String> {
        let raw = match self.field(name) {
            Some(Value::String(s)) => s,
            Some(_) => {
                self.fail(name, "must be a string");
                return None;
            }
            None => {
                if required {
                    self.fail(name, "is required");
                }
                return None;
            }
        };

        let (value, measured, unit) = if trim {
            let t = raw.trim();
            (t.to_string(), t.chars().count(), "characters")
        } else {
            (raw.clone(), raw.len(), "bytes")
        };

        if !len.contains(&measured) {
            self.fail(
                name,
                format!(
                    "must be between {} and {} {} long",
                    len.start(),
                    len.end(),
                    unit
                ),
            );
            return None;
        }

        Some(value)
    }
}
