//! Command implementations and the arguments they share.

pub mod secrets;
pub mod service;
pub mod task_definition;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::info;

use ecsctl_client::Clients;
use ecsctl_core::{EcsctlConfig, ServiceRef, WaitConfig};
use ecsctl_rollout::{RolloutWaiter, group_by_cluster};
use ecsctl_spec::{SpecLoader, VarsLoader};

use crate::progress::TerminalProgress;

/// Everything a command needs: clients for this run and the loaded config.
pub struct Context {
    pub clients: Clients,
    pub config: EcsctlConfig,
}

/// Template variable sources, shared by every command that reads a spec.
#[derive(Args, Debug, Clone, Default)]
pub struct SpecVars {
    /// Path to env-style file with variables
    #[arg(short = 'e', long = "env-file")]
    pub env_files: Vec<PathBuf>,

    /// Path to JSON file with variables
    #[arg(short = 'j', long = "json-file")]
    pub json_files: Vec<PathBuf>,

    /// Single variable in format name=value
    #[arg(short = 'v', long = "var", value_parser = parse_var_arg)]
    pub vars: Vec<String>,

    /// Use the process environment as a (lowest precedence) variable source
    #[arg(long)]
    pub sys_env: bool,
}

fn parse_var_arg(value: &str) -> Result<String, String> {
    ecsctl_spec::parse_var(value)
        .map(|_| value.to_string())
        .map_err(|e| e.to_string())
}

impl SpecVars {
    pub fn loader(&self) -> Result<SpecLoader> {
        let vars = VarsLoader::new()
            .env_files(&self.env_files)
            .json_files(&self.json_files)
            .vars(&self.vars)
            .sys_env(self.sys_env)
            .load()
            .context("loading template variables")?;
        Ok(SpecLoader::new(vars))
    }
}

/// Rollout wait flags. Unset values fall back to `ecsctl.toml`, then to
/// built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct WaitArgs {
    /// Wait for updated services to finish rolling out
    #[arg(short = 'w', long = "wait", visible_alias = "wait-for-update")]
    pub wait: bool,

    /// Give up waiting after this many seconds
    #[arg(long, value_name = "SECS")]
    pub wait_timeout: Option<u64>,

    /// Seconds between poll cycles
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval: Option<u64>,

    /// Tasks younger than this many seconds do not count as settled
    #[arg(long, value_name = "SECS")]
    pub min_task_age: Option<u64>,
}

impl WaitArgs {
    pub fn resolve(&self, base: &WaitConfig) -> WaitConfig {
        WaitConfig {
            timeout_secs: self.wait_timeout.unwrap_or(base.timeout_secs),
            poll_interval_secs: self.poll_interval.unwrap_or(base.poll_interval_secs),
            min_task_age_secs: self.min_task_age.unwrap_or(base.min_task_age_secs),
        }
    }
}

/// Run the rollout waiter over `services` when `--wait` was given.
pub async fn wait_if_requested(
    ctx: &Context,
    services: Vec<ServiceRef>,
    args: &WaitArgs,
) -> Result<()> {
    if !args.wait {
        return Ok(());
    }
    if ctx.clients.is_simulated() {
        info!(services = services.len(), "dry run: not waiting for rollout");
        return Ok(());
    }
    if services.is_empty() {
        println!("🤷 No services to wait for.");
        return Ok(());
    }

    let config = args.resolve(&ctx.config.wait);
    let grouped = group_by_cluster(services);
    let summary = RolloutWaiter::new(&ctx.clients.ecs, config)
        .with_progress(TerminalProgress::new())
        .wait_for_all(&grouped)
        .await?;
    println!(
        "✅ {} service(s) settled after {} poll cycle(s) ({}s).",
        summary.services,
        summary.cycles,
        summary.elapsed.as_secs()
    );
    Ok(())
}
