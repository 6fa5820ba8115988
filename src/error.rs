//! Error handling for the differential execution engine.
//!
//! All engine errors are mapped to one of a small set of `ErrorKind` categories.
//! Structured details and a human-readable suggestion can be attached via
//! `ErrorContext`, so a caller surfacing these as JSON has something to render
//! beyond a flat message string.

use serde_json::json;
use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{kind}: {message}")]
    Internal {
        kind: ErrorKind,
        message: Cow<'static, str>,
        context: Option<ErrorContext>,
    },
}

/// Error categories for consolidated error handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configured add-on raised an error during one of its pipeline stages.
    AddOn,
    /// Structured diff computation failed (malformed tree, unsupported value).
    Diff,
    /// Trial dispatch / URL construction failed before any HTTP call was made.
    Dispatch,
    /// Writing or reading an artifact on disk (body dump, props file, symlink).
    Artifact,
    /// A resolved `Config` failed validation.
    Configuration,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AddOn => "AddOn",
            Self::Diff => "Diff",
            Self::Dispatch => "Dispatch",
            Self::Artifact => "Artifact",
            Self::Configuration => "Configuration",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Additional context for an `Error::Internal`.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub details: Option<serde_json::Value>,
    pub suggestion: Option<Cow<'static, str>>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(details: Option<serde_json::Value>, suggestion: Option<Cow<'static, str>>) -> Self {
        Self { details, suggestion }
    }

    #[must_use]
    pub const fn with_details(details: serde_json::Value) -> Self {
        Self {
            details: Some(details),
            suggestion: None,
        }
    }

    #[must_use]
    pub const fn with_suggestion(suggestion: Cow<'static, str>) -> Self {
        Self {
            details: None,
            suggestion: Some(suggestion),
        }
    }

    #[must_use]
    pub fn with_detail(key: &str, value: impl serde::Serialize) -> Self {
        Self {
            details: Some(json!({ key: value })),
            suggestion: None,
        }
    }
}

impl Error {
    #[must_use]
    pub fn addon(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Internal {
            kind: ErrorKind::AddOn,
            message: message.into(),
            context: None,
        }
    }

    #[must_use]
    pub fn addon_named(stage: &str, name: &str, reason: impl std::fmt::Display) -> Self {
        Self::Internal {
            kind: ErrorKind::AddOn,
            message: Cow::Owned(format!("add-on '{name}' failed at stage '{stage}': {reason}")),
            context: Some(ErrorContext::with_detail("stage", stage)),
        }
    }

    #[must_use]
    pub fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Internal {
            kind: ErrorKind::Configuration,
            message: message.into(),
            context: None,
        }
    }

    #[must_use]
    pub fn artifact(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Internal {
            kind: ErrorKind::Artifact,
            message: message.into(),
            context: None,
        }
    }
}
