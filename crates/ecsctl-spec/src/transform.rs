//! YAML-friendly shorthands rewritten into API payload shapes.
//!
//! Spec files may write environment variables, secrets, proxy properties
//! and tags as plain mappings (`LOG_LEVEL: debug`) or `"k=v"` strings.
//! The API wants lists of `{name, value}` / `{key, value}` objects, and
//! task-level `cpu`/`memory` as strings. Each [`SpecKind`] has a fixed set
//! of rewrites applied to the parsed document before it is deserialized.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{SpecError, SpecResult};

/// What a spec file describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    TaskDefinition,
    Service,
    Secrets,
}

impl SpecKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::TaskDefinition => "task definition",
            Self::Service => "service",
            Self::Secrets => "secrets",
        }
    }

    fn rewrites(self) -> &'static [(&'static str, Rewrite)] {
        match self {
            Self::TaskDefinition => &[
                (
                    "containerDefinitions.*.environment",
                    Rewrite::KeyValue("name", "value"),
                ),
                (
                    "containerDefinitions.*.secrets",
                    Rewrite::KeyValue("name", "valueFrom"),
                ),
                (
                    "proxyConfiguration.properties",
                    Rewrite::KeyValue("name", "value"),
                ),
                ("tags", Rewrite::KeyValue("key", "value")),
                ("cpu", Rewrite::Stringify),
                ("memory", Rewrite::Stringify),
            ],
            Self::Service => &[("tags", Rewrite::KeyValue("key", "value"))],
            Self::Secrets => &[],
        }
    }
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy)]
enum Rewrite {
    KeyValue(&'static str, &'static str),
    Stringify,
}

impl Rewrite {
    fn apply(self, value: &mut Value, path: &str) -> SpecResult<()> {
        match self {
            Self::KeyValue(key_field, value_field) => {
                let expanded = expand_key_value_list(value, key_field, value_field)
                    .map_err(|message| SpecError::Transform {
                        path: path.to_string(),
                        message,
                    })?;
                *value = expanded;
            }
            Self::Stringify => {
                if let Value::Number(n) = value {
                    *value = Value::String(n.to_string());
                }
            }
        }
        Ok(())
    }
}

/// Apply the rewrites for `kind` in place.
pub fn apply(kind: SpecKind, document: &mut Value) -> SpecResult<()> {
    for (path, rewrite) in kind.rewrites() {
        let segments: Vec<&str> = path.split('.').collect();
        visit(document, &segments, &mut |v| rewrite.apply(v, path))?;
    }
    Ok(())
}

/// Call `f` on every value at `segments`; `*` fans out over array items.
/// Absent keys are skipped.
fn visit(
    value: &mut Value,
    segments: &[&str],
    f: &mut dyn FnMut(&mut Value) -> SpecResult<()>,
) -> SpecResult<()> {
    let Some((head, rest)) = segments.split_first() else {
        return f(value);
    };
    match (*head, value) {
        ("*", Value::Array(items)) => {
            for item in items {
                visit(item, rest, f)?;
            }
            Ok(())
        }
        (key, Value::Object(map)) => match map.get_mut(key) {
            Some(child) if !child.is_null() => visit(child, rest, f),
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

/// Expand a mapping or a list of `"k=v"` strings into
/// `[{key_field: k, value_field: v}]`. Objects already in list form pass
/// through. Scalar values become strings; null stays null.
pub fn expand_key_value_list(
    value: &Value,
    key_field: &str,
    value_field: &str,
) -> Result<Value, String> {
    let pair = |k: &str, v: Value| {
        let mut entry = Map::new();
        entry.insert(key_field.to_string(), Value::String(k.to_string()));
        entry.insert(value_field.to_string(), v);
        Value::Object(entry)
    };

    match value {
        Value::Object(map) => Ok(Value::Array(
            map.iter().map(|(k, v)| pair(k, scalar_to_string(v))).collect(),
        )),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => match s.split_once('=') {
                    Some((k, v)) => Ok(pair(k, Value::String(v.to_string()))),
                    None => Err(format!("`{s}` is not in k=v form")),
                },
                Value::Object(_) => Ok(item.clone()),
                other => Err(format!("unexpected list item {other}")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Err(format!("expected a mapping or a list, got {other}")),
    }
}

fn scalar_to_string(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        other => other.clone(),
    }
}
