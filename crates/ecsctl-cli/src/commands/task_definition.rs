//! `ecsctl task-definition register`.

use std::path::Path;

use anyhow::{Context as _, Result};
use tracing::{debug, warn};

use ecsctl_core::{EcsApi, TaskDefinitionSpec};
use ecsctl_rollout::ServiceLocator;
use ecsctl_spec::find_missing_secrets;

use super::{Context, SpecVars, WaitArgs, wait_if_requested};

/// Register the task definition, roll it out to every service of its
/// family in `clusters`, and optionally wait for those services.
pub async fn register(
    ctx: &Context,
    spec_file: &Path,
    vars: &SpecVars,
    clusters: &[String],
    wait: &WaitArgs,
) -> Result<()> {
    let spec = vars
        .loader()?
        .task_definition(spec_file)
        .with_context(|| format!("loading {}", spec_file.display()))?;

    let task_definition_arn = register_spec(ctx, &spec).await?;

    let locator = ServiceLocator::new(&ctx.clients.ecs);
    let mut updated = Vec::new();
    for cluster in clusters {
        let services = locator
            .update_services(&task_definition_arn, cluster)
            .await
            .with_context(|| format!("updating services in cluster {cluster}"))?;
        if services.is_empty() {
            println!("🤷 No services in cluster {cluster} run family {}.", spec.family);
        }
        for service in &services {
            println!("🔁 Updated service {} in cluster {cluster}.", service.service_name);
        }
        updated.extend(services);
    }

    wait_if_requested(ctx, updated, wait).await
}

/// Warn about missing secrets, then register. Returns the new revision's ARN.
pub async fn register_spec(ctx: &Context, spec: &TaskDefinitionSpec) -> Result<String> {
    check_secrets(ctx, spec).await;

    println!("🗂  Registering task definition {}.", spec.family);
    let response = ctx
        .clients
        .ecs
        .register_task_definition(spec)
        .await
        .with_context(|| format!("registering task definition {}", spec.family))?;
    println!(
        "\t✅ done, task definition arn: {}.",
        response.task_definition_arn
    );
    Ok(response.task_definition_arn)
}

/// Missing secrets are reported, never fatal.
async fn check_secrets(ctx: &Context, spec: &TaskDefinitionSpec) {
    let references = spec.secret_references();
    if references.is_empty() {
        return;
    }
    if ctx.clients.is_simulated() {
        debug!(secrets = references.len(), "dry run: skipping secret check");
        return;
    }
    match find_missing_secrets(&ctx.clients.ssm, &references).await {
        Ok(missing) if missing.is_empty() => {}
        Ok(missing) => {
            warn!(family = %spec.family, missing = ?missing, "task definition references missing secrets");
            println!(
                "🔴🔑 Missing secrets required by task definition: {}",
                missing.join(", ")
            );
        }
        Err(e) => warn!(error = %e, "could not check secret references"),
    }
}
