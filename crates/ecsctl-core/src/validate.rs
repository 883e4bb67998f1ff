//! Request-shape validation.
//!
//! Mirrors the constraints the ECS and SSM APIs publish for their request
//! members (required members, lengths, collection sizes, enum values) so a
//! simulated call fails exactly where the real call would be rejected.

use crate::api::*;
use crate::error::ValidationReport;
use crate::payload::*;

const NETWORK_MODES: &[&str] = &["bridge", "host", "awsvpc", "none"];
const COMPATIBILITIES: &[&str] = &["EC2", "FARGATE", "EXTERNAL"];
const LAUNCH_TYPES: &[&str] = &["EC2", "FARGATE", "EXTERNAL"];
const PROTOCOLS: &[&str] = &["tcp", "udp"];
const LOG_DRIVERS: &[&str] = &[
    "json-file",
    "syslog",
    "journald",
    "gelf",
    "fluentd",
    "awslogs",
    "splunk",
    "awsfirelens",
];
const SCHEDULING_STRATEGIES: &[&str] = &["REPLICA", "DAEMON"];
const PROPAGATE_TAGS: &[&str] = &["TASK_DEFINITION", "SERVICE", "NONE"];
const CONTROLLER_TYPES: &[&str] = &["ECS", "CODE_DEPLOY", "EXTERNAL"];
const ASSIGN_PUBLIC_IP: &[&str] = &["ENABLED", "DISABLED"];
const DEPENDENCY_CONDITIONS: &[&str] = &["START", "COMPLETE", "SUCCESS", "HEALTHY"];

/// A request with a published shape.
pub trait Validate {
    const OPERATION: Operation;

    /// Record every violation found in `report`.
    fn validate(&self, report: &mut ValidationReport);

    fn check(&self) -> Result<(), ValidationReport> {
        let mut report = ValidationReport::new(Self::OPERATION);
        self.validate(&mut report);
        report.into_result()
    }
}

fn non_empty(report: &mut ValidationReport, field: &str, value: &str) {
    if value.trim().is_empty() {
        report.push(field, "must not be empty");
    }
}

fn resource_name(report: &mut ValidationReport, field: &str, value: &str) {
    if value.is_empty() || value.len() > 255 {
        report.push(field, "must be 1 to 255 characters long");
    } else if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        report.push(field, "may only contain letters, numbers, hyphens and underscores");
    }
}

fn one_of(report: &mut ValidationReport, field: &str, value: &str, allowed: &[&str]) {
    if !allowed.contains(&value) {
        report.push(
            field,
            format!("'{value}' is not one of [{}]", allowed.join(", ")),
        );
    }
}

fn opt_one_of(report: &mut ValidationReport, field: &str, value: Option<&String>, allowed: &[&str]) {
    if let Some(value) = value {
        one_of(report, field, value, allowed);
    }
}

fn count_between(report: &mut ValidationReport, field: &str, len: usize, min: usize, max: usize) {
    if len < min {
        report.push(field, format!("at least {min} member(s) required, got {len}"));
    } else if len > max {
        report.push(field, format!("at most {max} members allowed, got {len}"));
    }
}

fn non_negative(report: &mut ValidationReport, field: &str, value: Option<i32>) {
    if let Some(v) = value {
        if v < 0 {
            report.push(field, format!("must not be negative, got {v}"));
        }
    }
}

fn tags(report: &mut ValidationReport, tags: Option<&Vec<TagSpec>>) {
    let Some(tags) = tags else { return };
    count_between(report, "tags", tags.len(), 0, 50);
    for (i, tag) in tags.iter().enumerate() {
        if tag.key.is_empty() || tag.key.len() > 128 {
            report.push(format!("tags[{i}].key"), "must be 1 to 128 characters long");
        }
        if tag.value.as_ref().is_some_and(|v| v.len() > 256) {
            report.push(format!("tags[{i}].value"), "must be at most 256 characters long");
        }
    }
}

fn load_balancers(report: &mut ValidationReport, lbs: Option<&Vec<LoadBalancerSpec>>) {
    let Some(lbs) = lbs else { return };
    for (i, lb) in lbs.iter().enumerate() {
        if lb.target_group_arn.is_none() && lb.load_balancer_name.is_none() {
            report.push(
                format!("loadBalancers[{i}]"),
                "one of targetGroupArn or loadBalancerName is required",
            );
        }
    }
}

fn network(report: &mut ValidationReport, network: Option<&NetworkConfigurationSpec>) {
    let Some(network) = network else { return };
    let vpc = &network.awsvpc_configuration;
    let prefix = "networkConfiguration.awsvpcConfiguration";
    count_between(report, &format!("{prefix}.subnets"), vpc.subnets.len(), 1, 16);
    if let Some(groups) = &vpc.security_groups {
        count_between(report, &format!("{prefix}.securityGroups"), groups.len(), 0, 5);
    }
    opt_one_of(
        report,
        &format!("{prefix}.assignPublicIp"),
        vpc.assign_public_ip.as_ref(),
        ASSIGN_PUBLIC_IP,
    );
}

fn deployment_configuration(
    report: &mut ValidationReport,
    config: Option<&DeploymentConfigurationSpec>,
) {
    let Some(config) = config else { return };
    non_negative(
        report,
        "deploymentConfiguration.maximumPercent",
        config.maximum_percent,
    );
    non_negative(
        report,
        "deploymentConfiguration.minimumHealthyPercent",
        config.minimum_healthy_percent,
    );
}

impl Validate for TaskDefinitionSpec {
    const OPERATION: Operation = Operation::RegisterTaskDefinition;

    fn validate(&self, report: &mut ValidationReport) {
        resource_name(report, "family", &self.family);
        count_between(
            report,
            "containerDefinitions",
            self.container_definitions.len(),
            1,
            10,
        );
        opt_one_of(report, "networkMode", self.network_mode.as_ref(), NETWORK_MODES);
        for (i, c) in self
            .requires_compatibilities
            .iter()
            .flatten()
            .enumerate()
        {
            one_of(
                report,
                &format!("requiresCompatibilities[{i}]"),
                c,
                COMPATIBILITIES,
            );
        }
        if let Some(proxy) = &self.proxy_configuration {
            non_empty(report, "proxyConfiguration.containerName", &proxy.container_name);
        }
        tags(report, self.tags.as_ref());

        for (i, c) in self.container_definitions.iter().enumerate() {
            let prefix = format!("containerDefinitions[{i}]");
            resource_name(report, &format!("{prefix}.name"), &c.name);
            non_empty(report, &format!("{prefix}.image"), &c.image);
            non_negative(report, &format!("{prefix}.cpu"), c.cpu);
            non_negative(report, &format!("{prefix}.memory"), c.memory);
            non_negative(report, &format!("{prefix}.memoryReservation"), c.memory_reservation);
            for (j, env) in c.environment.iter().flatten().enumerate() {
                non_empty(report, &format!("{prefix}.environment[{j}].name"), &env.name);
            }
            for (j, secret) in c.secrets.iter().flatten().enumerate() {
                non_empty(report, &format!("{prefix}.secrets[{j}].name"), &secret.name);
                non_empty(
                    report,
                    &format!("{prefix}.secrets[{j}].valueFrom"),
                    &secret.value_from,
                );
            }
            for (j, port) in c.port_mappings.iter().flatten().enumerate() {
                if !(0..=65535).contains(&port.container_port) {
                    report.push(
                        format!("{prefix}.portMappings[{j}].containerPort"),
                        format!("{} is not a valid port", port.container_port),
                    );
                }
                opt_one_of(
                    report,
                    &format!("{prefix}.portMappings[{j}].protocol"),
                    port.protocol.as_ref(),
                    PROTOCOLS,
                );
            }
            if let Some(log) = &c.log_configuration {
                one_of(
                    report,
                    &format!("{prefix}.logConfiguration.logDriver"),
                    &log.log_driver,
                    LOG_DRIVERS,
                );
            }
            if let Some(hc) = &c.health_check {
                count_between(
                    report,
                    &format!("{prefix}.healthCheck.command"),
                    hc.command.len(),
                    1,
                    usize::MAX,
                );
            }
            for (j, dep) in c.depends_on.iter().flatten().enumerate() {
                non_empty(
                    report,
                    &format!("{prefix}.dependsOn[{j}].containerName"),
                    &dep.container_name,
                );
                one_of(
                    report,
                    &format!("{prefix}.dependsOn[{j}].condition"),
                    &dep.condition,
                    DEPENDENCY_CONDITIONS,
                );
            }
        }
    }
}

impl Validate for ServiceSpec {
    const OPERATION: Operation = Operation::CreateService;

    fn validate(&self, report: &mut ValidationReport) {
        resource_name(report, "serviceName", &self.service_name);
        if let Some(cluster) = &self.cluster {
            non_empty(report, "cluster", cluster);
        }
        non_negative(report, "desiredCount", self.desired_count);
        non_negative(
            report,
            "healthCheckGracePeriodSeconds",
            self.health_check_grace_period_seconds,
        );
        opt_one_of(report, "launchType", self.launch_type.as_ref(), LAUNCH_TYPES);
        opt_one_of(
            report,
            "schedulingStrategy",
            self.scheduling_strategy.as_ref(),
            SCHEDULING_STRATEGIES,
        );
        opt_one_of(report, "propagateTags", self.propagate_tags.as_ref(), PROPAGATE_TAGS);
        if let Some(controller) = &self.deployment_controller {
            one_of(
                report,
                "deploymentController.type",
                &controller.controller_type,
                CONTROLLER_TYPES,
            );
        }
        load_balancers(report, self.load_balancers.as_ref());
        network(report, self.network_configuration.as_ref());
        deployment_configuration(report, self.deployment_configuration.as_ref());
        tags(report, self.tags.as_ref());
    }
}

impl Validate for UpdateServiceRequest {
    const OPERATION: Operation = Operation::UpdateService;

    fn validate(&self, report: &mut ValidationReport) {
        non_empty(report, "service", &self.service);
        if let Some(cluster) = &self.cluster {
            non_empty(report, "cluster", cluster);
        }
        if let Some(td) = &self.task_definition {
            non_empty(report, "taskDefinition", td);
        }
        non_negative(report, "desiredCount", self.desired_count);
        non_negative(
            report,
            "healthCheckGracePeriodSeconds",
            self.health_check_grace_period_seconds,
        );
        opt_one_of(report, "propagateTags", self.propagate_tags.as_ref(), PROPAGATE_TAGS);
        load_balancers(report, self.load_balancers.as_ref());
        network(report, self.network_configuration.as_ref());
        deployment_configuration(report, self.deployment_configuration.as_ref());
    }
}

impl Validate for ListServicesRequest {
    const OPERATION: Operation = Operation::ListServices;

    fn validate(&self, report: &mut ValidationReport) {
        non_empty(report, "cluster", &self.cluster);
        if !(1..=100).contains(&self.max_results) {
            report.push(
                "maxResults",
                format!("must be between 1 and 100, got {}", self.max_results),
            );
        }
    }
}

impl Validate for DescribeServicesRequest {
    const OPERATION: Operation = Operation::DescribeServices;

    fn validate(&self, report: &mut ValidationReport) {
        non_empty(report, "cluster", &self.cluster);
        count_between(report, "services", self.services.len(), 1, MAX_DESCRIBE_SERVICES);
        for (i, s) in self.services.iter().enumerate() {
            non_empty(report, &format!("services[{i}]"), s);
        }
    }
}

impl Validate for ListTasksRequest {
    const OPERATION: Operation = Operation::ListTasks;

    fn validate(&self, report: &mut ValidationReport) {
        non_empty(report, "cluster", &self.cluster);
        non_empty(report, "serviceName", &self.service_name);
    }
}

impl Validate for DescribeTasksRequest {
    const OPERATION: Operation = Operation::DescribeTasks;

    fn validate(&self, report: &mut ValidationReport) {
        non_empty(report, "cluster", &self.cluster);
        count_between(report, "tasks", self.tasks.len(), 1, MAX_DESCRIBE_TASKS);
    }
}

impl Validate for PutParameterRequest {
    const OPERATION: Operation = Operation::PutParameter;

    fn validate(&self, report: &mut ValidationReport) {
        if self.name.is_empty() || self.name.len() > 2048 {
            report.push("Name", "must be 1 to 2048 characters long");
        }
        if self.value.len() > 4096 {
            report.push(
                "Value",
                format!("must be at most 4096 bytes, got {}", self.value.len()),
            );
        }
    }
}

impl Validate for DescribeParametersRequest {
    const OPERATION: Operation = Operation::DescribeParameters;

    fn validate(&self, report: &mut ValidationReport) {
        if let Some(name) = &self.name_equals {
            non_empty(report, "ParameterFilters[0].Values[0]", name);
        }
    }
}

impl Validate for GetParameterRequest {
    const OPERATION: Operation = Operation::GetParameter;

    fn validate(&self, report: &mut ValidationReport) {
        non_empty(report, "Name", &self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(name: &str, image: &str) -> ContainerDefinitionSpec {
        serde_json::from_value(serde_json::json!({"name": name, "image": image})).unwrap()
    }

    #[test]
    fn describe_services_enforces_batch_limit() {
        let req = DescribeServicesRequest {
            cluster: "prod".to_string(),
            services: (0..11).map(|i| format!("svc-{i}")).collect(),
        };
        let report = req.check().unwrap_err();
        assert_eq!(report.operation, Operation::DescribeServices);
        assert!(report.has_field("services"));

        let ok = DescribeServicesRequest {
            cluster: "prod".to_string(),
            services: (0..10).map(|i| format!("svc-{i}")).collect(),
        };
        assert!(ok.check().is_ok());
    }

    #[test]
    fn list_services_page_size_bounds() {
        let mut req = ListServicesRequest::first_page("prod");
        assert!(req.check().is_ok());
        req.max_results = 0;
        assert!(req.check().unwrap_err().has_field("maxResults"));
        req.max_results = 101;
        assert!(req.check().unwrap_err().has_field("maxResults"));
    }

    #[test]
    fn task_definition_reports_every_violation() {
        let mut spec = TaskDefinitionSpec {
            family: "web app".to_string(),
            container_definitions: vec![container("web", "")],
            task_role_arn: None,
            execution_role_arn: None,
            network_mode: Some("overlay".to_string()),
            cpu: None,
            memory: None,
            requires_compatibilities: Some(vec!["FARGATE".to_string()]),
            proxy_configuration: None,
            tags: None,
        };
        let report = spec.check().unwrap_err();
        assert!(report.has_field("family"));
        assert!(report.has_field("networkMode"));
        assert!(report.has_field("containerDefinitions[0].image"));
        assert_eq!(report.violations.len(), 3);

        spec.family = "web".to_string();
        spec.network_mode = Some("awsvpc".to_string());
        spec.container_definitions = vec![container("web", "nginx:1.27")];
        assert!(spec.check().is_ok());
    }

    #[test]
    fn empty_task_definition_is_rejected() {
        let spec: TaskDefinitionSpec = serde_json::from_value(serde_json::json!({
            "family": "web",
            "containerDefinitions": []
        }))
        .unwrap();
        assert!(spec.check().unwrap_err().has_field("containerDefinitions"));
    }

    #[test]
    fn service_enum_members_are_checked() {
        let spec: ServiceSpec = serde_json::from_value(serde_json::json!({
            "serviceName": "web",
            "launchType": "LAMBDA",
            "deploymentController": {"type": "ECS"},
            "networkConfiguration": {"awsvpcConfiguration": {"subnets": [], "assignPublicIp": "YES"}}
        }))
        .unwrap();
        let report = spec.check().unwrap_err();
        assert!(report.has_field("launchType"));
        assert!(report.has_field("networkConfiguration.awsvpcConfiguration.subnets"));
        assert!(report.has_field("networkConfiguration.awsvpcConfiguration.assignPublicIp"));
        assert!(!report.has_field("deploymentController.type"));
    }

    #[test]
    fn update_requires_service() {
        let req = UpdateServiceRequest::task_definition_only("prod", "", "arn:td/web:2");
        assert!(req.check().unwrap_err().has_field("service"));
    }

    #[test]
    fn ssm_requests() {
        assert!(PutParameterRequest::secure("/app/key", "v").check().is_ok());
        assert!(PutParameterRequest::secure("", "v").check().unwrap_err().has_field("Name"));
        let req = GetParameterRequest {
            name: String::new(),
            with_decryption: true,
        };
        assert!(req.check().is_err());
    }
}
