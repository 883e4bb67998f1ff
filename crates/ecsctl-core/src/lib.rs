//! ecsctl-core: shared model and cloud control interface for ecsctl.
//!
//! Defines the service/task/deployment snapshot types the rollout engine
//! reasons about, the typed ECS and SSM operations ([`EcsApi`],
//! [`SsmApi`]), the request-shape validation used by simulate mode, and the
//! `ecsctl.toml` configuration.

pub mod api;
pub mod arn;
pub mod config;
pub mod error;
pub mod payload;
pub mod types;
pub mod validate;

pub use api::*;
pub use arn::TaskDefinitionFamily;
pub use config::{AwsConfig, EcsctlConfig, WaitConfig};
pub use error::{EcsError, EcsResult, FieldViolation, ValidationReport};
pub use payload::*;
pub use types::*;
pub use validate::Validate;
