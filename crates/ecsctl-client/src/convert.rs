//! Conversions between ecsctl payloads and AWS SDK model types.
//!
//! SDK builders for shapes with required members return `Result`; those
//! errors surface as [`BuildError`] and are mapped to the failing
//! operation by the caller.

use std::collections::HashMap;

use aws_sdk_ecs::error::BuildError;
use aws_sdk_ecs::types as ecs;

use ecsctl_core::{
    ApiFailure, AwsVpcConfigurationSpec, ContainerDefinitionSpec, Deployment,
    DeploymentConfigurationSpec, DeploymentControllerSpec, DeploymentStatus, LoadBalancerSpec,
    NameValue, NetworkConfigurationSpec, ProxyConfigurationSpec, RolloutState, ServiceDescription,
    TagSpec, TaskSnapshot,
};

// ── payload → SDK ───────────────────────────────────────────────

pub(crate) fn key_value_pairs(items: &[NameValue]) -> Vec<ecs::KeyValuePair> {
    items
        .iter()
        .map(|kv| {
            ecs::KeyValuePair::builder()
                .name(&kv.name)
                .set_value(kv.value.clone())
                .build()
        })
        .collect()
}

pub(crate) fn tags(items: &[TagSpec]) -> Vec<ecs::Tag> {
    items
        .iter()
        .map(|t| ecs::Tag::builder().key(&t.key).set_value(t.value.clone()).build())
        .collect()
}

pub(crate) fn container_definition(
    spec: &ContainerDefinitionSpec,
) -> Result<ecs::ContainerDefinition, BuildError> {
    let mut builder = ecs::ContainerDefinition::builder()
        .name(&spec.name)
        .image(&spec.image)
        .set_cpu(spec.cpu)
        .set_memory(spec.memory)
        .set_memory_reservation(spec.memory_reservation)
        .set_essential(spec.essential)
        .set_command(spec.command.clone())
        .set_entry_point(spec.entry_point.clone())
        .set_working_directory(spec.working_directory.clone())
        .set_stop_timeout(spec.stop_timeout)
        .set_docker_labels(
            spec.docker_labels
                .as_ref()
                .map(|labels| labels.clone().into_iter().collect::<HashMap<_, _>>()),
        );

    if let Some(env) = &spec.environment {
        builder = builder.set_environment(Some(key_value_pairs(env)));
    }
    if let Some(secrets) = &spec.secrets {
        let secrets = secrets
            .iter()
            .map(|s| {
                ecs::Secret::builder()
                    .name(&s.name)
                    .value_from(&s.value_from)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;
        builder = builder.set_secrets(Some(secrets));
    }
    if let Some(ports) = &spec.port_mappings {
        let ports = ports
            .iter()
            .map(|p| {
                ecs::PortMapping::builder()
                    .container_port(p.container_port)
                    .set_host_port(p.host_port)
                    .set_protocol(p.protocol.as_deref().map(ecs::TransportProtocol::from))
                    .build()
            })
            .collect();
        builder = builder.set_port_mappings(Some(ports));
    }
    if let Some(log) = &spec.log_configuration {
        builder = builder.log_configuration(
            ecs::LogConfiguration::builder()
                .log_driver(ecs::LogDriver::from(log.log_driver.as_str()))
                .set_options(
                    log.options
                        .as_ref()
                        .map(|o| o.clone().into_iter().collect::<HashMap<_, _>>()),
                )
                .build()?,
        );
    }
    if let Some(hc) = &spec.health_check {
        builder = builder.health_check(
            ecs::HealthCheck::builder()
                .set_command(Some(hc.command.clone()))
                .set_interval(hc.interval)
                .set_timeout(hc.timeout)
                .set_retries(hc.retries)
                .set_start_period(hc.start_period)
                .build()?,
        );
    }
    if let Some(deps) = &spec.depends_on {
        let deps = deps
            .iter()
            .map(|d| {
                ecs::ContainerDependency::builder()
                    .container_name(&d.container_name)
                    .condition(ecs::ContainerCondition::from(d.condition.as_str()))
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;
        builder = builder.set_depends_on(Some(deps));
    }
    Ok(builder.build())
}

pub(crate) fn proxy_configuration(
    spec: &ProxyConfigurationSpec,
) -> Result<ecs::ProxyConfiguration, BuildError> {
    ecs::ProxyConfiguration::builder()
        .container_name(&spec.container_name)
        .set_type(spec.proxy_type.as_deref().map(ecs::ProxyConfigurationType::from))
        .set_properties(spec.properties.as_deref().map(key_value_pairs))
        .build()
}

pub(crate) fn load_balancers(items: &[LoadBalancerSpec]) -> Vec<ecs::LoadBalancer> {
    items
        .iter()
        .map(|lb| {
            ecs::LoadBalancer::builder()
                .set_target_group_arn(lb.target_group_arn.clone())
                .set_load_balancer_name(lb.load_balancer_name.clone())
                .set_container_name(lb.container_name.clone())
                .set_container_port(lb.container_port)
                .build()
        })
        .collect()
}

pub(crate) fn network_configuration(
    spec: &NetworkConfigurationSpec,
) -> Result<ecs::NetworkConfiguration, BuildError> {
    let AwsVpcConfigurationSpec {
        subnets,
        security_groups,
        assign_public_ip,
    } = &spec.awsvpc_configuration;
    let vpc = ecs::AwsVpcConfiguration::builder()
        .set_subnets(Some(subnets.clone()))
        .set_security_groups(security_groups.clone())
        .set_assign_public_ip(assign_public_ip.as_deref().map(ecs::AssignPublicIp::from))
        .build()?;
    Ok(ecs::NetworkConfiguration::builder()
        .awsvpc_configuration(vpc)
        .build())
}

pub(crate) fn deployment_configuration(
    spec: &DeploymentConfigurationSpec,
) -> Result<ecs::DeploymentConfiguration, BuildError> {
    let breaker = spec
        .deployment_circuit_breaker
        .as_ref()
        .map(|cb| {
            ecs::DeploymentCircuitBreaker::builder()
                .enable(cb.enable)
                .rollback(cb.rollback)
                .build()
        });
    Ok(ecs::DeploymentConfiguration::builder()
        .set_maximum_percent(spec.maximum_percent)
        .set_minimum_healthy_percent(spec.minimum_healthy_percent)
        .set_deployment_circuit_breaker(breaker)
        .build())
}

pub(crate) fn deployment_controller(
    spec: &DeploymentControllerSpec,
) -> Result<ecs::DeploymentController, BuildError> {
    ecs::DeploymentController::builder()
        .r#type(ecs::DeploymentControllerType::from(
            spec.controller_type.as_str(),
        ))
        .build()
}

// ── SDK → core model ────────────────────────────────────────────

/// `cluster` is the name the caller asked about; the SDK only returns the
/// cluster ARN.
pub(crate) fn service_description(service: &ecs::Service, cluster: &str) -> ServiceDescription {
    ServiceDescription {
        service_arn: service.service_arn().unwrap_or_default().to_string(),
        service_name: service.service_name().unwrap_or_default().to_string(),
        cluster_name: cluster.to_string(),
        status: service.status().unwrap_or_default().to_string(),
        task_definition: service.task_definition().unwrap_or_default().to_string(),
        desired_count: service.desired_count(),
        running_count: service.running_count(),
        pending_count: service.pending_count(),
        deployments: service
            .deployments()
            .iter()
            .map(|d| Deployment {
                status: DeploymentStatus::parse(d.status().unwrap_or_default()),
                rollout_state: d.rollout_state().map(|s| RolloutState::parse(s.as_str())),
            })
            .collect(),
    }
}

pub(crate) fn api_failure(failure: &ecs::Failure) -> ApiFailure {
    ApiFailure {
        arn: failure.arn().unwrap_or_default().to_string(),
        reason: failure.reason().unwrap_or_default().to_string(),
    }
}

pub(crate) fn task_snapshot(task: &ecs::Task) -> TaskSnapshot {
    TaskSnapshot {
        task_arn: task.task_arn().unwrap_or_default().to_string(),
        task_definition_arn: task.task_definition_arn().unwrap_or_default().to_string(),
        created_at: task.created_at().map_or(0, |t| t.secs()),
    }
}
