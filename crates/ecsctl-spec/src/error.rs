//! Spec loading errors.

use thiserror::Error;

use ecsctl_core::EcsError;

use crate::transform::SpecKind;

pub type SpecResult<T> = Result<T, SpecError>;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    EnvFile {
        path: String,
        line: usize,
        message: String,
    },

    #[error("failed to parse JSON variables from {path}: {source}")]
    JsonFile {
        path: String,
        source: serde_json::Error,
    },

    #[error("'{0}': variable has to be in format variable=value")]
    InvalidVar(String),

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("cannot transform `{path}`: {message}")]
    Transform { path: String, message: String },

    #[error("{kind} spec does not match the API shape: {message}")]
    Schema { kind: SpecKind, message: String },

    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error(transparent)]
    Api(#[from] EcsError),
}
