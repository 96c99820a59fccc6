//! Leaf error types shared across the workspace.
//!
//! The engine wraps these into its own taxonomy; members and
//! configurations raise them directly.

use thiserror::Error;

/// Failure raised by a member while an injection point is being assigned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot assign injection point '{point}': {reason}")]
pub struct SetPointError {
    pub point: String,
    pub reason: String,
}

impl SetPointError {
    pub fn new(point: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            point: point.into(),
            reason: reason.into(),
        }
    }

    /// The member does not declare this point.
    pub fn unknown(point: impl Into<String>) -> Self {
        Self::new(point, "no such injection point")
    }

    /// The supplied value has the wrong concrete type.
    pub fn type_mismatch(point: impl Into<String>, expected: &str) -> Self {
        Self::new(point, format!("expected a value of type {expected}"))
    }
}

/// Failure raised from a member lifecycle callback
/// (`init_ui`, `group_init`, `group_destroy`).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct CallbackError(String);

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Invalid group configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("group type name must not be blank")]
    BlankType,

    #[error("duplicate member name '{0}' in group configuration")]
    DuplicateMember(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl ConfigError {
    /// Creates a parse error for string-to-type conversion failures.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_point_error_display() {
        let err = SetPointError::unknown("widget");
        assert_eq!(
            err.to_string(),
            "cannot assign injection point 'widget': no such injection point"
        );
    }

    #[test]
    fn test_type_mismatch_names_expected_type() {
        let err = SetPointError::type_mismatch("count", "u32");
        assert!(err.to_string().contains("u32"));
    }
}
