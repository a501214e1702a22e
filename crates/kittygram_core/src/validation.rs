//! Field-level validation rules and the per-field error collection.
//!
//! # Invariants
//! - Errors are keyed by wire field name, so callers can render them as
//!   `{"field": ["message", ...]}` without remapping.
//! - A cat may be at most [`MAX_CAT_AGE`] years old; exactly that age is valid.

use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MAX_CAT_AGE: i32 = 30;
pub const CAT_NAME_MAX_CHARS: usize = 16;
pub const ACHIEVEMENT_NAME_MAX_CHARS: usize = 64;

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_BLANK: &str = "This field may not be blank.";
pub const MSG_TOO_OLD: &str = "cat cannot be older than 30 years";

/// Validation failures grouped by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single-message error.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages recorded for one field.
    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

/// Checks the age bound for `birth_year` against `current_year`.
///
/// The difference is taken in `i64`, so no `i32` input can overflow it.
pub fn validate_birth_year(birth_year: i32, current_year: i32) -> Result<i32, &'static str> {
    if i64::from(current_year) - i64::from(birth_year) > i64::from(MAX_CAT_AGE) {
        return Err(MSG_TOO_OLD);
    }
    Ok(birth_year)
}

/// Trims and checks a text field.
///
/// Returns `Ok(None)` only for an absent, non-required value.
pub fn validate_text(
    value: Option<&str>,
    required: bool,
    max_chars: usize,
) -> Result<Option<String>, String> {
    let Some(raw) = value else {
        return if required {
            Err(MSG_REQUIRED.to_string())
        } else {
            Ok(None)
        };
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MSG_BLANK.to_string());
    }
    if trimmed.chars().count() > max_chars {
        return Err(format!(
            "Ensure this field has no more than {max_chars} characters."
        ));
    }
    Ok(Some(trimmed.to_string()))
}

/// Records a missing required value for `field` when `value` is `None`.
pub fn require<T>(errors: &mut ValidationErrors, field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        errors.add(field, MSG_REQUIRED);
    }
    value
}
