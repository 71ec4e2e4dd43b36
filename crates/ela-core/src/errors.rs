//! Structured error types shared across ELA crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`ElaError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (dimensions, sizes, option values).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the ELA engine.
///
/// Numerical degeneracies (zero ranges, empty bins, coincident points) are never
/// reported through this type; they surface as NaN or infinite feature values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum ElaError {
    /// Malformed or degenerate search-space bounds.
    #[error("invalid bounds: {0}")]
    InvalidBounds(ErrorInfo),
    /// A filtering step left fewer observations than an algorithm requires.
    #[error("insufficient sample: {0}")]
    InsufficientSample(ErrorInfo),
    /// Every local-search start failed to produce a finite optimum.
    #[error("optimization diverged: {0}")]
    OptimizationDiverged(ErrorInfo),
    /// Option values outside their admissible range or unknown method tags.
    #[error("invalid parameter: {0}")]
    InvalidParameter(ErrorInfo),
    /// Serialization, schema and file I/O errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl ElaError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            ElaError::InvalidBounds(info)
            | ElaError::InsufficientSample(info)
            | ElaError::OptimizationDiverged(info)
            | ElaError::InvalidParameter(info)
            | ElaError::Serde(info) => info,
        }
    }

    /// Shorthand for an [`ElaError::InvalidParameter`] naming the offending option.
    pub fn invalid_parameter(
        code: &str,
        name: &str,
        value: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        ElaError::InvalidParameter(
            ErrorInfo::new(code, message)
                .with_context("parameter", name)
                .with_context("value", value.to_string()),
        )
    }
}
