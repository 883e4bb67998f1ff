//! Error types for ECS/SSM interactions.

use std::fmt;

use thiserror::Error;

use crate::api::Operation;

/// Result type alias for cloud control operations.
pub type EcsResult<T> = Result<T, EcsError>;

/// Errors that can occur while talking to the cloud control interface.
#[derive(Debug, Error)]
pub enum EcsError {
    /// The remote API (or the transport) rejected a call.
    #[error("{operation} failed: {message}")]
    Api { operation: Operation, message: String },

    /// A request did not match the operation's request shape.
    #[error("{0}")]
    Validation(ValidationReport),

    #[error("client configuration error: {0}")]
    Config(String),
}

impl EcsError {
    pub fn api(operation: Operation, message: impl fmt::Display) -> Self {
        Self::Api {
            operation,
            message: message.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<ValidationReport> for EcsError {
    fn from(report: ValidationReport) -> Self {
        Self::Validation(report)
    }
}

/// A single request member that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Per-field report produced when a request fails shape validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub operation: Operation,
    pub violations: Vec<FieldViolation>,
}

impl ValidationReport {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            violations: Vec::new(),
        }
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// `Ok(())` when no violations were recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {} request ({} violation{})",
            self.operation,
            self.violations.len(),
            if self.violations.len() == 1 { "" } else { "s" }
        )?;
        for v in &self.violations {
            write!(f, "\n  - {}: {}", v.field, v.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}
