//! Template variable sources.
//!
//! Variables come from dotenv-style files, JSON files, `name=value` pairs
//! and optionally the process environment. Sources are merged into one
//! JSON object; later sources override earlier ones in this order:
//! system environment, env files, JSON files, inline vars.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{SpecError, SpecResult};

/// Collects variable sources and merges them.
#[derive(Debug, Clone, Default)]
pub struct VarsLoader {
    env_files: Vec<PathBuf>,
    json_files: Vec<PathBuf>,
    vars: Vec<String>,
    sys_env: bool,
}

impl VarsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn env_files(mut self, files: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.env_files.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn json_files(mut self, files: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.json_files.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn vars(mut self, vars: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.vars.extend(vars.into_iter().map(Into::into));
        self
    }

    pub fn sys_env(mut self, enabled: bool) -> Self {
        self.sys_env = enabled;
        self
    }

    pub fn load(&self) -> SpecResult<Map<String, Value>> {
        let mut merged = Map::new();

        if self.sys_env {
            for (k, v) in std::env::vars() {
                merged.insert(k, Value::String(v));
            }
        }
        for path in &self.env_files {
            merged.extend(load_env_file(path)?);
        }
        for path in &self.json_files {
            merged.extend(load_json_file(path)?);
        }
        for var in &self.vars {
            let (name, value) = parse_var(var)?;
            merged.insert(name.to_string(), Value::String(value.to_string()));
        }

        debug!(count = merged.len(), "template variables loaded");
        Ok(merged)
    }
}

/// Split `name=value`; the name must be non-empty, the value may be.
pub fn parse_var(var: &str) -> SpecResult<(&str, &str)> {
    match var.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name, value)),
        _ => Err(SpecError::InvalidVar(var.to_string())),
    }
}

fn read(path: &Path) -> SpecResult<String> {
    std::fs::read_to_string(path).map_err(|source| SpecError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Parse a dotenv-style file: `KEY=VALUE` lines, `#` comments, blank
/// lines, optional `export ` prefix and optional surrounding quotes.
pub fn load_env_file(path: &Path) -> SpecResult<Map<String, Value>> {
    parse_env(&read(path)?, &path.display().to_string())
}

fn parse_env(content: &str, path: &str) -> SpecResult<Map<String, Value>> {
    let mut vars = Map::new();
    for (i, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            return Err(SpecError::EnvFile {
                path: path.to_string(),
                line: i + 1,
                message: "expected KEY=VALUE".to_string(),
            });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(SpecError::EnvFile {
                path: path.to_string(),
                line: i + 1,
                message: "empty variable name".to_string(),
            });
        }
        vars.insert(key.to_string(), Value::String(unquote(value.trim()).to_string()));
    }
    Ok(vars)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Load a JSON object whose top-level keys become variables.
pub fn load_json_file(path: &Path) -> SpecResult<Map<String, Value>> {
    let content = read(path)?;
    let value: Value = serde_json::from_str(&content).map_err(|source| SpecError::JsonFile {
        path: path.display().to_string(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SpecError::EnvFile {
            path: path.display().to_string(),
            line: 1,
            message: "top-level JSON value must be an object".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parses_env_lines() {
        let vars = parse_env(
            "# comment\n\nENV=test\nexport REGION = eu-west-1\nQUOTED=\"a b\"\nEMPTY=\nURL=postgres://u:p@h/db?x=1\n",
            "test.env",
        )
        .unwrap();
        assert_eq!(vars["ENV"], "test");
        assert_eq!(vars["REGION"], "eu-west-1");
        assert_eq!(vars["QUOTED"], "a b");
        assert_eq!(vars["EMPTY"], "");
        assert_eq!(vars["URL"], "postgres://u:p@h/db?x=1");
    }

    #[test]
    fn env_errors_carry_line_numbers() {
        let err = parse_env("A=1\nnot a pair\n", "bad.env").unwrap_err();
        assert_eq!(err.to_string(), "bad.env:2: expected KEY=VALUE");
    }

    #[test]
    fn parse_var_requires_name() {
        assert_eq!(parse_var("tag=v1=final").unwrap(), ("tag", "v1=final"));
        assert_eq!(parse_var("empty=").unwrap(), ("empty", ""));
        assert!(parse_var("=value").is_err());
        assert!(parse_var("novalue").is_err());
    }

    #[test]
    fn later_sources_override_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let env = dir.path().join("vars.env");
        let json = dir.path().join("tf-output.json");
        fs::write(&env, "env=from-env\nregion=eu-west-1\n").unwrap();
        fs::write(&json, r#"{"env": "from-json", "cluster": {"value": "ecs-test"}}"#).unwrap();

        let vars = VarsLoader::new()
            .env_files([&env])
            .json_files([&json])
            .vars(["image_tag=1.2.3"])
            .load()
            .unwrap();

        assert_eq!(vars["env"], "from-json");
        assert_eq!(vars["region"], "eu-west-1");
        assert_eq!(vars["cluster"]["value"], "ecs-test");
        assert_eq!(vars["image_tag"], "1.2.3");

        let vars = VarsLoader::new()
            .json_files([&json])
            .vars(["env=inline"])
            .load()
            .unwrap();
        assert_eq!(vars["env"], "inline");
    }

    #[test]
    fn json_file_must_hold_an_object() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("list.json");
        fs::write(&json, "[1, 2]").unwrap();
        assert!(load_json_file(&json).is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = VarsLoader::new().env_files(["/nonexistent/vars.env"]).load().unwrap_err();
        assert!(matches!(err, SpecError::Io { .. }));
    }
}
