//! ecsctl-spec: spec files and their inputs.
//!
//! Spec files are YAML with `{{ var }}` placeholders. Variables come from
//! env files, JSON files, `--var` pairs and the process environment; the
//! rendered YAML is rewritten into API payload shape and deserialized into
//! the typed payloads from `ecsctl-core`. Secret dumps run the other way.

pub mod error;
pub mod loader;
pub mod secrets;
pub mod template;
pub mod transform;
pub mod vars;

pub use error::{SpecError, SpecResult};
pub use loader::SpecLoader;
pub use secrets::{
    VarLut, dump_secrets, find_missing_secrets, flat_dict_items, list_parameter_names,
    render_dumped_secrets,
};
pub use transform::SpecKind;
pub use vars::{VarsLoader, parse_var};
