//! Declared per-field input constraints
//!
//! Each tool input implements [`Validate`] and states its constraints
//! explicitly, field by field. Violations are collected, not short-circuited,
//! so the caller sees every problem with its input at once.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{ToolError, Violation};

/// The largest page size the Admin API accepts
pub const MAX_PAGE_SIZE: u32 = 250;

/// The page size used when `first` is omitted
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Input constraints checked before any remote call is made
pub trait Validate {
    fn check(&self, checks: &mut Checks);

    fn validate(&self) -> Result<(), ToolError> {
        let mut checks = Checks::default();
        self.check(&mut checks);
        checks.into_result()
    }
}

/// Accumulates constraint violations
#[derive(Debug, Default)]
pub struct Checks {
    violations: Vec<Violation>,
}

impl Checks {
    pub fn violation(&mut self, field: impl Into<String>, constraint: impl Into<String>) {
        self.violations.push(Violation {
            field: field.into(),
            constraint: constraint.into(),
        });
    }

    /// The string must have at least `min` characters after trimming
    pub fn min_len(&mut self, field: &str, value: &str, min: usize) {
        if value.trim().chars().count() < min {
            if min == 1 {
                self.violation(field, "must not be empty");
            } else {
                self.violation(field, format!("must be at least {min} characters"));
            }
        }
    }

    pub fn len_between(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.trim().chars().count();
        if len < min || len > max {
            self.violation(field, format!("must be between {min} and {max} characters"));
        }
    }

    pub fn optional_min_len(&mut self, field: &str, value: Option<&str>, min: usize) {
        if let Some(value) = value {
            self.min_len(field, value, min);
        }
    }

    pub fn range(&mut self, field: &str, value: i64, min: i64, max: i64) {
        if value < min || value > max {
            self.violation(field, format!("must be between {min} and {max}"));
        }
    }

    pub fn items(&mut self, field: &str, len: usize, min: usize, max: usize) {
        if len < min {
            if min == 1 {
                self.violation(field, "must contain at least one item");
            } else {
                self.violation(field, format!("must contain at least {min} items"));
            }
        } else if len > max {
            self.violation(field, format!("must contain at most {max} items"));
        }
    }

    /// Standard `first` / `after` pagination arguments
    pub fn page(&mut self, first: Option<i64>, after: Option<&str>, max: u32) {
        if let Some(first) = first {
            self.range("first", first, 1, i64::from(max));
        }
        self.optional_min_len("after", after, 1);
    }

    /// Exactly one of the named selectors must be supplied
    pub fn exactly_one(&mut self, fields: &[(&str, bool)]) {
        let supplied = fields.iter().filter(|(_, present)| *present).count();
        if supplied != 1 {
            let names = fields
                .iter()
                .map(|(name, _)| format!("`{name}`"))
                .collect::<Vec<_>>()
                .join(" or ");
            self.violation(
                fields.first().map(|(name, _)| *name).unwrap_or("input"),
                format!("exactly one of {names} must be supplied"),
            );
        }
    }

    /// At least one of the named fields must be supplied
    pub fn any_of(&mut self, fields: &[(&str, bool)]) {
        if !fields.iter().any(|(_, present)| *present) {
            let names = fields
                .iter()
                .map(|(name, _)| format!("`{name}`"))
                .collect::<Vec<_>>()
                .join(", ");
            self.violation("input", format!("at least one of {names} must be supplied"));
        }
    }

    pub fn into_result(self) -> Result<(), ToolError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ToolError::InvalidInput(self.violations))
        }
    }
}

/// The page size to request, given an optional caller-supplied `first`.
///
/// Only called once `first` has passed its range check.
pub fn page_size(first: Option<i64>) -> u32 {
    first
        .and_then(|first| u32::try_from(first).ok())
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

/// Deserialize raw tool arguments into a typed input.
///
/// A missing required field, an unknown enum value or a wrongly typed value
/// is reported as an input violation on the path of the offending argument.
pub fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_path_to_error::deserialize(arguments).map_err(|e| {
        let path = e.path().to_string();
        // The root path renders as "."
        let field = if path == "." { "arguments".to_string() } else { path };
        ToolError::invalid(field, e.into_inner().to_string())
    })
}
