//! `ecsctl service create|update|create-or-update|deploy`.

use std::path::Path;

use anyhow::{Context as _, Result};
use tracing::info;

use ecsctl_core::{DescribeServicesRequest, EcsApi, ServiceRef, ServiceSpec};

use super::{Context, SpecVars, WaitArgs, task_definition, wait_if_requested};

/// Cluster ECS uses when a request names none.
const DEFAULT_CLUSTER: &str = "default";

fn load(spec_file: &Path, vars: &SpecVars) -> Result<ServiceSpec> {
    vars.loader()?
        .service(spec_file)
        .with_context(|| format!("loading {}", spec_file.display()))
}

pub async fn create(ctx: &Context, spec_file: &Path, vars: &SpecVars) -> Result<()> {
    let spec = load(spec_file, vars)?;
    create_spec(ctx, &spec).await?;
    Ok(())
}

pub async fn update(ctx: &Context, spec_file: &Path, vars: &SpecVars, wait: &WaitArgs) -> Result<()> {
    let spec = load(spec_file, vars)?;
    let service = update_spec(ctx, spec).await?;
    wait_if_requested(ctx, vec![service], wait).await
}

pub async fn create_or_update(
    ctx: &Context,
    spec_file: &Path,
    vars: &SpecVars,
    wait: &WaitArgs,
) -> Result<()> {
    let spec = load(spec_file, vars)?;
    let service = apply(ctx, spec).await?;
    wait_if_requested(ctx, vec![service], wait).await
}

/// Register a task definition, then create or update the service to run
/// the new revision.
pub async fn deploy(
    ctx: &Context,
    task_spec_file: &Path,
    service_spec_file: &Path,
    vars: &SpecVars,
    wait: &WaitArgs,
) -> Result<()> {
    let loader = vars.loader()?;
    let task_spec = loader
        .task_definition(task_spec_file)
        .with_context(|| format!("loading {}", task_spec_file.display()))?;
    let mut service_spec = loader
        .service(service_spec_file)
        .with_context(|| format!("loading {}", service_spec_file.display()))?;

    let task_definition_arn = task_definition::register_spec(ctx, &task_spec).await?;
    service_spec.task_definition = Some(task_definition_arn);

    let service = apply(ctx, service_spec).await?;
    wait_if_requested(ctx, vec![service], wait).await
}

async fn apply(ctx: &Context, spec: ServiceSpec) -> Result<ServiceRef> {
    if service_exists(ctx, &spec).await? {
        update_spec(ctx, spec).await
    } else {
        create_spec(ctx, &spec).await
    }
}

async fn service_exists(ctx: &Context, spec: &ServiceSpec) -> Result<bool> {
    let cluster = spec.cluster.as_deref().unwrap_or(DEFAULT_CLUSTER);
    let response = ctx
        .clients
        .ecs
        .describe_services(&DescribeServicesRequest {
            cluster: cluster.to_string(),
            services: vec![spec.service_name.clone()],
        })
        .await
        .with_context(|| format!("looking up service {}", spec.service_name))?;
    let exists = response
        .services
        .iter()
        .any(|s| s.service_name == spec.service_name && s.is_active());
    info!(service = %spec.service_name, %cluster, exists, "service lookup");
    Ok(exists)
}

async fn create_spec(ctx: &Context, spec: &ServiceSpec) -> Result<ServiceRef> {
    println!("🏸 Creating service {}.", spec.service_name);
    let response = ctx
        .clients
        .ecs
        .create_service(spec)
        .await
        .with_context(|| format!("creating service {}", spec.service_name))?;
    println!("\t✅ done.");
    Ok(ServiceRef::new(
        &response.service_arn,
        &spec.service_name,
        spec.cluster.as_deref().unwrap_or(DEFAULT_CLUSTER),
    ))
}

async fn update_spec(ctx: &Context, spec: ServiceSpec) -> Result<ServiceRef> {
    println!("🏸 Updating service {}.", spec.service_name);
    let name = spec.service_name.clone();
    let cluster = spec
        .cluster
        .clone()
        .unwrap_or_else(|| DEFAULT_CLUSTER.to_string());
    let response = ctx
        .clients
        .ecs
        .update_service(&spec.into_update())
        .await
        .with_context(|| format!("updating service {name}"))?;
    println!("\t✅ done.");
    Ok(ServiceRef::new(&response.service_arn, &name, &cluster))
}
