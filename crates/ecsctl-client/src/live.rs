//! Live AWS clients backed by `aws-sdk-ecs` and `aws-sdk-ssm`.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_ecs::error::DisplayErrorContext;
use aws_sdk_ssm::types::{ParameterStringFilter, ParameterType as SsmParameterType};
use tracing::debug;

use ecsctl_core::{
    AwsConfig, CreateServiceResponse, DescribeParametersRequest, DescribeParametersResponse,
    DescribeServicesRequest, DescribeServicesResponse, DescribeTasksRequest,
    DescribeTasksResponse, EcsApi, EcsError, EcsResult, GetParameterRequest, GetParameterResponse,
    ListServicesRequest, ListServicesResponse, ListTasksRequest, ListTasksResponse, Operation,
    PutParameterRequest, PutParameterResponse, RegisterTaskDefinitionResponse, ServiceSpec,
    SsmApi, TaskDefinitionSpec, UpdateServiceRequest, UpdateServiceResponse,
};

use crate::convert;

/// Resolve credentials and region the standard AWS way, with optional
/// overrides from `ecsctl.toml`.
#[tracing::instrument(level = "debug", skip_all)]
pub async fn load_sdk_config(aws: &AwsConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &aws.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(profile) = &aws.profile {
        loader = loader.profile_name(profile);
    }
    loader.load().await
}

fn sdk_err<E>(operation: Operation) -> impl FnOnce(E) -> EcsError
where
    E: std::error::Error,
{
    move |err| EcsError::api(operation, DisplayErrorContext(err))
}

/// ECS over the network.
#[derive(Debug, Clone)]
pub struct AwsEcs {
    client: aws_sdk_ecs::Client,
}

impl AwsEcs {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_ecs::Client::new(config),
        }
    }
}

impl EcsApi for AwsEcs {
    async fn register_task_definition(
        &self,
        spec: &TaskDefinitionSpec,
    ) -> EcsResult<RegisterTaskDefinitionResponse> {
        let op = Operation::RegisterTaskDefinition;
        let containers = spec
            .container_definitions
            .iter()
            .map(convert::container_definition)
            .collect::<Result<Vec<_>, _>>()
            .map_err(sdk_err(op))?;
        let proxy = spec
            .proxy_configuration
            .as_ref()
            .map(convert::proxy_configuration)
            .transpose()
            .map_err(sdk_err(op))?;

        let output = self
            .client
            .register_task_definition()
            .family(&spec.family)
            .set_container_definitions(Some(containers))
            .set_task_role_arn(spec.task_role_arn.clone())
            .set_execution_role_arn(spec.execution_role_arn.clone())
            .set_network_mode(spec.network_mode.as_deref().map(Into::into))
            .set_cpu(spec.cpu.clone())
            .set_memory(spec.memory.clone())
            .set_requires_compatibilities(
                spec.requires_compatibilities
                    .as_ref()
                    .map(|c| c.iter().map(|s| s.as_str().into()).collect()),
            )
            .set_proxy_configuration(proxy)
            .set_tags(spec.tags.as_deref().map(convert::tags))
            .send()
            .await
            .map_err(sdk_err(op))?;

        let task_definition_arn = output
            .task_definition()
            .and_then(|td| td.task_definition_arn())
            .ok_or_else(|| EcsError::api(op, "response carried no task definition ARN"))?
            .to_string();
        debug!(%task_definition_arn, "task definition registered");
        Ok(RegisterTaskDefinitionResponse {
            task_definition_arn,
        })
    }

    async fn create_service(&self, spec: &ServiceSpec) -> EcsResult<CreateServiceResponse> {
        let op = Operation::CreateService;
        let network = spec
            .network_configuration
            .as_ref()
            .map(convert::network_configuration)
            .transpose()
            .map_err(sdk_err(op))?;
        let deployment = spec
            .deployment_configuration
            .as_ref()
            .map(convert::deployment_configuration)
            .transpose()
            .map_err(sdk_err(op))?;
        let controller = spec
            .deployment_controller
            .as_ref()
            .map(convert::deployment_controller)
            .transpose()
            .map_err(sdk_err(op))?;

        let output = self
            .client
            .create_service()
            .service_name(&spec.service_name)
            .set_cluster(spec.cluster.clone())
            .set_task_definition(spec.task_definition.clone())
            .set_desired_count(spec.desired_count)
            .set_launch_type(spec.launch_type.as_deref().map(Into::into))
            .set_platform_version(spec.platform_version.clone())
            .set_load_balancers(spec.load_balancers.as_deref().map(convert::load_balancers))
            .set_network_configuration(network)
            .set_deployment_configuration(deployment)
            .set_deployment_controller(controller)
            .set_scheduling_strategy(spec.scheduling_strategy.as_deref().map(Into::into))
            .set_health_check_grace_period_seconds(spec.health_check_grace_period_seconds)
            .set_enable_ecs_managed_tags(spec.enable_ecs_managed_tags)
            .set_enable_execute_command(spec.enable_execute_command)
            .set_propagate_tags(spec.propagate_tags.as_deref().map(Into::into))
            .set_tags(spec.tags.as_deref().map(convert::tags))
            .send()
            .await
            .map_err(sdk_err(op))?;

        let service_arn = output
            .service()
            .and_then(|s| s.service_arn())
            .unwrap_or_default()
            .to_string();
        Ok(CreateServiceResponse { service_arn })
    }

    async fn update_service(
        &self,
        request: &UpdateServiceRequest,
    ) -> EcsResult<UpdateServiceResponse> {
        let op = Operation::UpdateService;
        let network = request
            .network_configuration
            .as_ref()
            .map(convert::network_configuration)
            .transpose()
            .map_err(sdk_err(op))?;
        let deployment = request
            .deployment_configuration
            .as_ref()
            .map(convert::deployment_configuration)
            .transpose()
            .map_err(sdk_err(op))?;

        let output = self
            .client
            .update_service()
            .service(&request.service)
            .set_cluster(request.cluster.clone())
            .set_task_definition(request.task_definition.clone())
            .set_desired_count(request.desired_count)
            .set_platform_version(request.platform_version.clone())
            .set_load_balancers(request.load_balancers.as_deref().map(convert::load_balancers))
            .set_network_configuration(network)
            .set_deployment_configuration(deployment)
            .set_health_check_grace_period_seconds(request.health_check_grace_period_seconds)
            .set_enable_ecs_managed_tags(request.enable_ecs_managed_tags)
            .set_enable_execute_command(request.enable_execute_command)
            .set_propagate_tags(request.propagate_tags.as_deref().map(Into::into))
            .set_force_new_deployment(request.force_new_deployment)
            .send()
            .await
            .map_err(sdk_err(op))?;

        let service_arn = output
            .service()
            .and_then(|s| s.service_arn())
            .unwrap_or_default()
            .to_string();
        Ok(UpdateServiceResponse { service_arn })
    }

    async fn list_services(&self, request: &ListServicesRequest) -> EcsResult<ListServicesResponse> {
        let output = self
            .client
            .list_services()
            .cluster(&request.cluster)
            .max_results(request.max_results)
            .set_next_token(request.next_token.clone())
            .send()
            .await
            .map_err(sdk_err(Operation::ListServices))?;
        Ok(ListServicesResponse {
            service_arns: output.service_arns().to_vec(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn describe_services(
        &self,
        request: &DescribeServicesRequest,
    ) -> EcsResult<DescribeServicesResponse> {
        let output = self
            .client
            .describe_services()
            .cluster(&request.cluster)
            .set_services(Some(request.services.clone()))
            .send()
            .await
            .map_err(sdk_err(Operation::DescribeServices))?;
        Ok(DescribeServicesResponse {
            services: output
                .services()
                .iter()
                .map(|s| convert::service_description(s, &request.cluster))
                .collect(),
            failures: output.failures().iter().map(convert::api_failure).collect(),
        })
    }

    async fn list_tasks(&self, request: &ListTasksRequest) -> EcsResult<ListTasksResponse> {
        let output = self
            .client
            .list_tasks()
            .cluster(&request.cluster)
            .service_name(&request.service_name)
            .set_next_token(request.next_token.clone())
            .send()
            .await
            .map_err(sdk_err(Operation::ListTasks))?;
        Ok(ListTasksResponse {
            task_arns: output.task_arns().to_vec(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn describe_tasks(&self, request: &DescribeTasksRequest) -> EcsResult<DescribeTasksResponse> {
        let output = self
            .client
            .describe_tasks()
            .cluster(&request.cluster)
            .set_tasks(Some(request.tasks.clone()))
            .send()
            .await
            .map_err(sdk_err(Operation::DescribeTasks))?;
        Ok(DescribeTasksResponse {
            tasks: output.tasks().iter().map(convert::task_snapshot).collect(),
        })
    }
}

/// SSM Parameter Store over the network.
#[derive(Debug, Clone)]
pub struct AwsSsm {
    client: aws_sdk_ssm::Client,
}

impl AwsSsm {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_ssm::Client::new(config),
        }
    }
}

impl SsmApi for AwsSsm {
    async fn put_parameter(&self, request: &PutParameterRequest) -> EcsResult<PutParameterResponse> {
        let output = self
            .client
            .put_parameter()
            .name(&request.name)
            .value(&request.value)
            .r#type(SsmParameterType::from(request.parameter_type.as_str()))
            .overwrite(request.overwrite)
            .send()
            .await
            .map_err(sdk_err(Operation::PutParameter))?;
        Ok(PutParameterResponse {
            version: output.version(),
        })
    }

    async fn describe_parameters(
        &self,
        request: &DescribeParametersRequest,
    ) -> EcsResult<DescribeParametersResponse> {
        let op = Operation::DescribeParameters;
        let filter = request
            .name_equals
            .as_ref()
            .map(|name| {
                ParameterStringFilter::builder()
                    .key("Name")
                    .option("Equals")
                    .values(name)
                    .build()
            })
            .transpose()
            .map_err(sdk_err(op))?;

        let output = self
            .client
            .describe_parameters()
            .set_parameter_filters(filter.map(|f| vec![f]))
            .set_next_token(request.next_token.clone())
            .send()
            .await
            .map_err(sdk_err(op))?;
        Ok(DescribeParametersResponse {
            names: output
                .parameters()
                .iter()
                .filter_map(|p| p.name().map(str::to_string))
                .collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn get_parameter(&self, request: &GetParameterRequest) -> EcsResult<GetParameterResponse> {
        let output = self
            .client
            .get_parameter()
            .name(&request.name)
            .with_decryption(request.with_decryption)
            .send()
            .await
            .map_err(sdk_err(Operation::GetParameter))?;
        Ok(GetParameterResponse {
            value: output
                .parameter()
                .and_then(|p| p.value())
                .map(str::to_string),
        })
    }
}
