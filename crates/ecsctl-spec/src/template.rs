//! `{{ name }}` substitution over spec file text.
//!
//! Names are dotted paths into the variable object (`cluster.value`,
//! `subnets.0`). A name that does not resolve renders as an empty string.

use regex::{Captures, Regex};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::SpecResult;

/// Render every placeholder in `text`.
pub fn render(text: &str, vars: &Map<String, Value>) -> SpecResult<String> {
    let placeholder = Regex::new(r"\{\{\s*([A-Za-z0-9_][A-Za-z0-9_.\-]*)\s*\}\}")?;
    let rendered = placeholder
        .replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            match lookup(vars, name) {
                Some(value) => to_text(value),
                None => {
                    debug!(variable = name, "undefined template variable");
                    String::new()
                }
            }
        })
        .into_owned();
    Ok(rendered)
}

/// Resolve a dotted name. A top-level key containing dots wins over
/// traversal.
pub fn lookup<'v>(vars: &'v Map<String, Value>, name: &str) -> Option<&'v Value> {
    if let Some(value) = vars.get(name) {
        return Some(value);
    }
    let mut parts = name.split('.');
    let mut current = vars.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars() -> Map<String, Value> {
        match json!({
            "env": "test",
            "replicas": 3,
            "cluster": {"value": "ecs-test"},
            "subnets": {"value": ["subnet-a", "subnet-b"]},
            "dotted.key": "flat",
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn substitutes_scalars_and_paths() {
        let out = render(
            "family: web-{{ env }}\ndesiredCount: {{replicas}}\ncluster: {{ cluster.value }}",
            &vars(),
        )
        .unwrap();
        assert_eq!(out, "family: web-test\ndesiredCount: 3\ncluster: ecs-test");
    }

    #[test]
    fn indexes_into_arrays() {
        assert_eq!(render("{{ subnets.value.1 }}", &vars()).unwrap(), "subnet-b");
        assert_eq!(render("{{ subnets.value.9 }}", &vars()).unwrap(), "");
    }

    #[test]
    fn collections_render_as_json() {
        assert_eq!(
            render("subnets: {{ subnets.value }}", &vars()).unwrap(),
            r#"subnets: ["subnet-a","subnet-b"]"#
        );
    }

    #[test]
    fn flat_dotted_keys_take_precedence() {
        assert_eq!(render("{{ dotted.key }}", &vars()).unwrap(), "flat");
    }

    #[test]
    fn undefined_renders_empty() {
        assert_eq!(render("image: app:{{ image_tag }}", &vars()).unwrap(), "image: app:");
        assert_eq!(render("{{ env.missing }}", &vars()).unwrap(), "");
    }

    #[test]
    fn leaves_other_text_alone() {
        let text = "command: [\"sh\", \"-c\", \"echo {not a var}\"]";
        assert_eq!(render(text, &vars()).unwrap(), text);
    }
}
