//! Spec file loading: read, render, parse, transform, deserialize.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use ecsctl_core::{ServiceSpec, TaskDefinitionSpec};

use crate::error::{SpecError, SpecResult};
use crate::template;
use crate::transform::{self, SpecKind};

/// Loads spec files against one set of template variables.
#[derive(Debug, Clone, Default)]
pub struct SpecLoader {
    vars: Map<String, Value>,
}

impl SpecLoader {
    pub fn new(vars: Map<String, Value>) -> Self {
        Self { vars }
    }

    pub fn vars(&self) -> &Map<String, Value> {
        &self.vars
    }

    /// Load a file into a transformed JSON document.
    pub fn load(&self, path: &Path, kind: SpecKind) -> SpecResult<Value> {
        let raw = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.load_str(&raw, &path.display().to_string(), kind)
    }

    /// Same as [`load`](Self::load) for text already in memory. `origin`
    /// names the source in errors.
    pub fn load_str(&self, raw: &str, origin: &str, kind: SpecKind) -> SpecResult<Value> {
        let rendered = template::render(raw, &self.vars)?;
        let mut document: Value =
            serde_yaml::from_str(&rendered).map_err(|source| SpecError::Yaml {
                path: origin.to_string(),
                source,
            })?;
        transform::apply(kind, &mut document)?;
        debug!(origin, kind = kind.label(), "spec loaded");
        Ok(document)
    }

    pub fn task_definition(&self, path: &Path) -> SpecResult<TaskDefinitionSpec> {
        typed(self.load(path, SpecKind::TaskDefinition)?, SpecKind::TaskDefinition)
    }

    pub fn service(&self, path: &Path) -> SpecResult<ServiceSpec> {
        typed(self.load(path, SpecKind::Service)?, SpecKind::Service)
    }

    /// Top-level `name: value` pairs. Scalars are stored as their text;
    /// anything else is rejected.
    pub fn secrets(&self, path: &Path) -> SpecResult<Vec<(String, String)>> {
        let document = self.load(path, SpecKind::Secrets)?;
        secrets_from_document(document)
    }
}

fn typed<T: DeserializeOwned>(document: Value, kind: SpecKind) -> SpecResult<T> {
    serde_json::from_value(document).map_err(|e| SpecError::Schema {
        kind,
        message: e.to_string(),
    })
}

fn secrets_from_document(document: Value) -> SpecResult<Vec<(String, String)>> {
    let schema = |message: String| SpecError::Schema {
        kind: SpecKind::Secrets,
        message,
    };
    let Value::Object(map) = document else {
        return Err(schema("expected a mapping of parameter names to values".into()));
    };
    map.into_iter()
        .map(|(name, value)| match value {
            Value::String(s) => Ok((name, s)),
            Value::Number(n) => Ok((name, n.to_string())),
            Value::Bool(b) => Ok((name, b.to_string())),
            _ => Err(schema(format!("`{name}` must be a scalar value"))),
        })
        .collect()
}
