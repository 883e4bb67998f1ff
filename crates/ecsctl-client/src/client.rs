//! Mode-selecting clients: live AWS or the dry-run simulator.

use std::sync::Arc;

use tracing::info;

use ecsctl_core::{
    AwsConfig, CreateServiceResponse, DescribeParametersRequest, DescribeParametersResponse,
    DescribeServicesRequest, DescribeServicesResponse, DescribeTasksRequest,
    DescribeTasksResponse, EcsApi, EcsResult, GetParameterRequest, GetParameterResponse,
    ListServicesRequest, ListServicesResponse, ListTasksRequest, ListTasksResponse,
    PutParameterRequest, PutParameterResponse, RegisterTaskDefinitionResponse, ServiceSpec,
    SsmApi, TaskDefinitionSpec, UpdateServiceRequest, UpdateServiceResponse,
};

use crate::live::{AwsEcs, AwsSsm, load_sdk_config};
use crate::simulate::Simulator;

#[derive(Debug, Clone)]
pub enum EcsClient {
    Live(AwsEcs),
    Simulated(Arc<Simulator>),
}

#[derive(Debug, Clone)]
pub enum SsmClient {
    Live(AwsSsm),
    Simulated(Arc<Simulator>),
}

/// The ECS and SSM clients for one invocation. In dry-run mode both share
/// a single simulator.
#[derive(Debug, Clone)]
pub struct Clients {
    pub ecs: EcsClient,
    pub ssm: SsmClient,
}

impl Clients {
    pub async fn connect(aws: &AwsConfig, dry_run: bool) -> Self {
        if dry_run {
            info!("dry run: requests are validated and logged, nothing is sent");
            return Self::simulated(Arc::new(Simulator::new()));
        }
        let config = load_sdk_config(aws).await;
        Self {
            ecs: EcsClient::Live(AwsEcs::new(&config)),
            ssm: SsmClient::Live(AwsSsm::new(&config)),
        }
    }

    pub fn simulated(simulator: Arc<Simulator>) -> Self {
        Self {
            ecs: EcsClient::Simulated(Arc::clone(&simulator)),
            ssm: SsmClient::Simulated(simulator),
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self.ecs, EcsClient::Simulated(_))
    }
}

impl EcsApi for EcsClient {
    async fn register_task_definition(
        &self,
        spec: &TaskDefinitionSpec,
    ) -> EcsResult<RegisterTaskDefinitionResponse> {
        match self {
            Self::Live(c) => c.register_task_definition(spec).await,
            Self::Simulated(c) => c.register_task_definition(spec).await,
        }
    }

    async fn create_service(&self, spec: &ServiceSpec) -> EcsResult<CreateServiceResponse> {
        match self {
            Self::Live(c) => c.create_service(spec).await,
            Self::Simulated(c) => c.create_service(spec).await,
        }
    }

    async fn update_service(
        &self,
        request: &UpdateServiceRequest,
    ) -> EcsResult<UpdateServiceResponse> {
        match self {
            Self::Live(c) => c.update_service(request).await,
            Self::Simulated(c) => c.update_service(request).await,
        }
    }

    async fn list_services(&self, request: &ListServicesRequest) -> EcsResult<ListServicesResponse> {
        match self {
            Self::Live(c) => c.list_services(request).await,
            Self::Simulated(c) => c.list_services(request).await,
        }
    }

    async fn describe_services(
        &self,
        request: &DescribeServicesRequest,
    ) -> EcsResult<DescribeServicesResponse> {
        match self {
            Self::Live(c) => c.describe_services(request).await,
            Self::Simulated(c) => c.describe_services(request).await,
        }
    }

    async fn list_tasks(&self, request: &ListTasksRequest) -> EcsResult<ListTasksResponse> {
        match self {
            Self::Live(c) => c.list_tasks(request).await,
            Self::Simulated(c) => c.list_tasks(request).await,
        }
    }

    async fn describe_tasks(&self, request: &DescribeTasksRequest) -> EcsResult<DescribeTasksResponse> {
        match self {
            Self::Live(c) => c.describe_tasks(request).await,
            Self::Simulated(c) => c.describe_tasks(request).await,
        }
    }
}

impl SsmApi for SsmClient {
    async fn put_parameter(&self, request: &PutParameterRequest) -> EcsResult<PutParameterResponse> {
        match self {
            Self::Live(c) => c.put_parameter(request).await,
            Self::Simulated(c) => c.put_parameter(request).await,
        }
    }

    async fn describe_parameters(
        &self,
        request: &DescribeParametersRequest,
    ) -> EcsResult<DescribeParametersResponse> {
        match self {
            Self::Live(c) => c.describe_parameters(request).await,
            Self::Simulated(c) => c.describe_parameters(request).await,
        }
    }

    async fn get_parameter(&self, request: &GetParameterRequest) -> EcsResult<GetParameterResponse> {
        match self {
            Self::Live(c) => c.get_parameter(request).await,
            Self::Simulated(c) => c.get_parameter(request).await,
        }
    }
}
