//! ecsctl-client: implementations of the ECS and SSM interfaces.
//!
//! [`live`] talks to AWS through the official SDK; [`simulate`] validates
//! requests and answers locally for `--dry-run`. [`Clients`] picks one per
//! invocation and is passed explicitly to every component.

mod convert;

pub mod client;
pub mod live;
pub mod simulate;

pub use client::{Clients, EcsClient, SsmClient};
pub use live::{AwsEcs, AwsSsm, load_sdk_config};
pub use simulate::{SimulatedCall, Simulator};
