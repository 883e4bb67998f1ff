//! SSM secret helpers: existence checks and dumps back to a spec file.
//!
//! A dump is written so it can be fed to `secrets store` again. Parameter
//! names containing a variable's value have that value replaced by the
//! variable's `{{ path }}` expression, so a dump taken in one environment
//! renders into another.

use std::io::Write;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, info};

use ecsctl_core::{DescribeParametersRequest, GetParameterRequest, SsmApi};

use crate::error::{SpecError, SpecResult};

/// Names from `references` that do not exist as SSM parameters, in order.
pub async fn find_missing_secrets<S: SsmApi>(
    client: &S,
    references: &[&str],
) -> SpecResult<Vec<String>> {
    let mut missing = Vec::new();
    for name in references {
        let request = DescribeParametersRequest {
            name_equals: Some(name.to_string()),
            next_token: None,
        };
        let response = client.describe_parameters(&request).await?;
        if !response.names.iter().any(|found| found == name) {
            missing.push(name.to_string());
        }
    }
    debug!(checked = references.len(), missing = missing.len(), "secret references checked");
    Ok(missing)
}

/// Every parameter name, following continuation tokens.
pub async fn list_parameter_names<S: SsmApi>(client: &S) -> SpecResult<Vec<String>> {
    let mut names = Vec::new();
    let mut request = DescribeParametersRequest::default();
    loop {
        let response = client.describe_parameters(&request).await?;
        names.extend(response.names);
        match response.next_token {
            Some(token) => request.next_token = Some(token),
            None => break,
        }
    }
    Ok(names)
}

/// Decrypted `(name, value)` pairs for parameters whose name matches
/// `filter` at its start. Non-matching parameters are never read.
pub async fn dump_secrets<S: SsmApi>(
    client: &S,
    filter: Option<&str>,
) -> SpecResult<Vec<(String, String)>> {
    let filter = filter
        .map(|pattern| Regex::new(&format!("^(?:{pattern})")))
        .transpose()?;

    let mut secrets = Vec::new();
    for name in list_parameter_names(client).await? {
        if filter.as_ref().is_some_and(|re| !re.is_match(&name)) {
            continue;
        }
        let response = client
            .get_parameter(&GetParameterRequest {
                name: name.clone(),
                with_decryption: true,
            })
            .await?;
        secrets.push((name, response.value.unwrap_or_default()));
    }
    info!(count = secrets.len(), "secrets read");
    Ok(secrets)
}

/// Leaf values of a variable object with their dotted paths. Array items
/// use their index as the path segment.
pub fn flat_dict_items(value: &Value) -> Vec<(String, String)> {
    fn walk(value: &Value, path: &str, out: &mut Vec<(String, String)>) {
        let join = |segment: &str| {
            if path.is_empty() {
                segment.to_string()
            } else {
                format!("{path}.{segment}")
            }
        };
        match value {
            Value::Object(map) => {
                for (k, v) in map {
                    walk(v, &join(k), out);
                }
            }
            Value::Array(items) => {
                for (i, v) in items.iter().enumerate() {
                    walk(v, &join(&i.to_string()), out);
                }
            }
            Value::String(s) => out.push((path.to_string(), s.clone())),
            Value::Null => out.push((path.to_string(), String::new())),
            other => out.push((path.to_string(), other.to_string())),
        }
    }

    let mut out = Vec::new();
    walk(value, "", &mut out);
    out
}

/// Value → variable path lookup, longest value first.
#[derive(Debug, Clone, Default)]
pub struct VarLut {
    entries: Vec<(String, String)>,
}

impl VarLut {
    /// Empty values are skipped; for duplicate values the first path wins.
    pub fn new(vars: &Map<String, Value>) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();
        for (path, value) in flat_dict_items(&Value::Object(vars.clone())) {
            if value.is_empty() || entries.iter().any(|(v, _)| *v == value) {
                continue;
            }
            entries.push((value, path));
        }
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { entries }
    }

    /// Replace the longest variable value found in `name` with its
    /// `{{ path }}` expression. At most one variable is substituted.
    pub fn substitute(&self, name: &str) -> String {
        for (value, path) in &self.entries {
            if name.contains(value.as_str()) {
                return name.replace(value.as_str(), &format!("{{{{ {path} }}}}"));
            }
        }
        name.to_string()
    }
}

/// Write `key: value` lines, keys rewritten through `lut`. Both sides are
/// emitted as quoted scalars so templated keys stay valid YAML. Returns the
/// rewritten keys.
pub fn render_dumped_secrets(
    secrets: &[(String, String)],
    lut: &VarLut,
    out: &mut impl Write,
) -> SpecResult<Vec<String>> {
    let io_err = |source| SpecError::Io {
        path: "<dump>".to_string(),
        source,
    };
    let mut keys = Vec::with_capacity(secrets.len());
    for (name, value) in secrets {
        let key = lut.substitute(name);
        writeln!(out, "{}: {}", quote(&key), quote(value)).map_err(io_err)?;
        keys.push(key);
    }
    Ok(keys)
}

fn quote(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use ecsctl_core::{
        DescribeParametersResponse, EcsResult, GetParameterResponse, PutParameterRequest,
        PutParameterResponse,
    };

    /// In-memory parameter store paging two names at a time.
    #[derive(Default)]
    struct FakeSsm {
        params: BTreeMap<String, String>,
        reads: Mutex<Vec<String>>,
    }

    impl FakeSsm {
        fn with(params: &[(&str, &str)]) -> Self {
            Self {
                params: params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Default::default()
            }
        }
    }

    impl SsmApi for FakeSsm {
        async fn put_parameter(
            &self,
            _request: &PutParameterRequest,
        ) -> EcsResult<PutParameterResponse> {
            Ok(PutParameterResponse { version: 1 })
        }

        async fn describe_parameters(
            &self,
            request: &DescribeParametersRequest,
        ) -> EcsResult<DescribeParametersResponse> {
            if let Some(name) = &request.name_equals {
                let names = self.params.keys().filter(|k| *k == name).cloned().collect();
                return Ok(DescribeParametersResponse {
                    names,
                    next_token: None,
                });
            }
            let start: usize = request
                .next_token
                .as_deref()
                .map_or(0, |t| t.parse().unwrap());
            let names: Vec<String> = self.params.keys().skip(start).take(2).cloned().collect();
            let next_token = (start + 2 < self.params.len()).then(|| (start + 2).to_string());
            Ok(DescribeParametersResponse { names, next_token })
        }

        async fn get_parameter(
            &self,
            request: &GetParameterRequest,
        ) -> EcsResult<GetParameterResponse> {
            assert!(request.with_decryption);
            self.reads.lock().unwrap().push(request.name.clone());
            Ok(GetParameterResponse {
                value: self.params.get(&request.name).cloned(),
            })
        }
    }

    fn vars(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn reports_missing_references() {
        let ssm = FakeSsm::with(&[("/test/db/password", "x")]);
        let missing = find_missing_secrets(&ssm, &["/test/db/password", "/test/api/key"])
            .await
            .unwrap();
        assert_eq!(missing, vec!["/test/api/key"]);
    }

    #[tokio::test]
    async fn lists_across_pages() {
        let ssm = FakeSsm::with(&[("/a", "1"), ("/b", "2"), ("/c", "3"), ("/d", "4"), ("/e", "5")]);
        let names = list_parameter_names(&ssm).await.unwrap();
        assert_eq!(names, vec!["/a", "/b", "/c", "/d", "/e"]);
    }

    #[tokio::test]
    async fn dump_filters_before_reading() {
        let ssm = FakeSsm::with(&[
            ("/prod/db/password", "p"),
            ("/test/db/password", "t"),
            ("/test/api/key", "k"),
        ]);
        let secrets = dump_secrets(&ssm, Some("/test/")).await.unwrap();
        assert_eq!(
            secrets,
            vec![
                ("/test/api/key".to_string(), "k".to_string()),
                ("/test/db/password".to_string(), "t".to_string()),
            ]
        );
        assert_eq!(ssm.reads.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn filter_is_anchored_at_start() {
        let ssm = FakeSsm::with(&[("/app/test", "1")]);
        assert!(dump_secrets(&ssm, Some("test")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_filter_is_an_error() {
        let ssm = FakeSsm::default();
        let err = dump_secrets(&ssm, Some("(")).await.unwrap_err();
        assert!(matches!(err, SpecError::Regex(_)));
    }

    #[test]
    fn flattens_nested_values() {
        let items = flat_dict_items(&json!({
            "env": "test",
            "cluster": {"value": "ecs-test"},
            "subnets": ["a", "b"],
            "port": 5432,
        }));
        assert_eq!(
            items,
            vec![
                ("cluster.value".to_string(), "ecs-test".to_string()),
                ("env".to_string(), "test".to_string()),
                ("port".to_string(), "5432".to_string()),
                ("subnets.0".to_string(), "a".to_string()),
                ("subnets.1".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn substitutes_longest_value_once() {
        let lut = VarLut::new(&vars(json!({
            "env": "test",
            "app": "test-app",
            "empty": "",
        })));
        assert_eq!(lut.substitute("/test-app/test/key"), "/{{ app }}/test/key");
        assert_eq!(lut.substitute("/test/db"), "/{{ env }}/db");
        assert_eq!(lut.substitute("/other"), "/other");
    }

    #[test]
    fn renders_reloadable_lines() {
        let lut = VarLut::new(&vars(json!({"env": "test"})));
        let secrets = vec![("/test/db/password".to_string(), "p: w".to_string())];
        let mut out = Vec::new();
        let keys = render_dumped_secrets(&secrets, &lut, &mut out).unwrap();
        assert_eq!(keys, vec!["/{{ env }}/db/password"]);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\"/{{ env }}/db/password\": \"p: w\"\n"
        );
    }
}
