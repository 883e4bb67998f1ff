//! Process exit codes.

use std::process::ExitCode;

use ecsctl_core::EcsError;
use ecsctl_rollout::RolloutError;
use ecsctl_spec::SpecError;

pub const FAILURE: u8 = 1;
pub const VALIDATION: u8 = 2;
pub const CRITICAL: u8 = 3;
pub const TIMED_OUT: u8 = 4;

/// Map an error to its exit code by the first typed cause in the chain.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<RolloutError>() {
            return match e {
                RolloutError::Api(api) => ecs_code(api),
                RolloutError::Critical { .. } => CRITICAL,
                RolloutError::TimedOut { .. } => TIMED_OUT,
            };
        }
        if let Some(e) = cause.downcast_ref::<EcsError>() {
            return ecs_code(e);
        }
        if let Some(e) = cause.downcast_ref::<SpecError>() {
            return match e {
                SpecError::Api(api) => ecs_code(api),
                SpecError::Schema { .. } => VALIDATION,
                _ => FAILURE,
            };
        }
    }
    FAILURE
}

fn ecs_code(err: &EcsError) -> u8 {
    if err.is_validation() { VALIDATION } else { FAILURE }
}

pub fn to_exit_code(err: &anyhow::Error) -> ExitCode {
    ExitCode::from(exit_code(err))
}
