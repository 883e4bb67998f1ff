//! Dry-run mode: validate every request, log it, answer with canned data.
//!
//! Nothing here touches the network. A request that violates its
//! operation's shape fails with [`EcsError::Validation`]; a valid one is
//! logged as pretty JSON and recorded so callers can inspect what would
//! have been sent.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use ecsctl_core::{
    CreateServiceResponse, DescribeParametersRequest, DescribeParametersResponse,
    DescribeServicesRequest, DescribeServicesResponse, DescribeTasksRequest,
    DescribeTasksResponse, EcsApi, EcsError, EcsResult, GetParameterRequest, GetParameterResponse,
    ListServicesRequest, ListServicesResponse, ListTasksRequest, ListTasksResponse, Operation,
    PutParameterRequest, PutParameterResponse, RegisterTaskDefinitionResponse, ServiceSpec,
    SsmApi, TaskDefinitionSpec, UpdateServiceRequest, UpdateServiceResponse, Validate,
};

/// Account and region placeholder used in synthesized ARNs.
const SIMULATED_ARN_PREFIX: &str = "arn:aws:ecs:simulated:000000000000";

/// A call the simulator accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedCall {
    pub operation: Operation,
    pub request: Value,
}

#[derive(Debug, Default)]
pub struct Simulator {
    calls: Mutex<Vec<SimulatedCall>>,
}

impl Simulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls accepted so far, in order.
    pub fn calls(&self) -> Vec<SimulatedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn accept<R: Validate + Serialize>(&self, request: &R) -> EcsResult<()> {
        request.check()?;
        let operation = R::OPERATION;
        let body = serde_json::to_value(request).map_err(|e| EcsError::api(operation, e))?;
        let pretty = serde_json::to_string_pretty(&body).map_err(|e| EcsError::api(operation, e))?;
        info!(%operation, "dry run, would call:\n{pretty}");
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SimulatedCall {
                operation,
                request: body,
            });
        Ok(())
    }
}

fn service_arn(cluster: Option<&str>, service: &str) -> String {
    if service.starts_with("arn:") {
        return service.to_string();
    }
    let cluster = cluster.unwrap_or("default");
    format!("{SIMULATED_ARN_PREFIX}:service/{cluster}/{service}")
}

impl EcsApi for Simulator {
    async fn register_task_definition(
        &self,
        spec: &TaskDefinitionSpec,
    ) -> EcsResult<RegisterTaskDefinitionResponse> {
        self.accept(spec)?;
        Ok(RegisterTaskDefinitionResponse {
            task_definition_arn: format!("{SIMULATED_ARN_PREFIX}:task-definition/{}:0", spec.family),
        })
    }

    async fn create_service(&self, spec: &ServiceSpec) -> EcsResult<CreateServiceResponse> {
        self.accept(spec)?;
        Ok(CreateServiceResponse {
            service_arn: service_arn(spec.cluster.as_deref(), &spec.service_name),
        })
    }

    async fn update_service(
        &self,
        request: &UpdateServiceRequest,
    ) -> EcsResult<UpdateServiceResponse> {
        self.accept(request)?;
        Ok(UpdateServiceResponse {
            service_arn: service_arn(request.cluster.as_deref(), &request.service),
        })
    }

    async fn list_services(&self, request: &ListServicesRequest) -> EcsResult<ListServicesResponse> {
        self.accept(request)?;
        Ok(ListServicesResponse::default())
    }

    async fn describe_services(
        &self,
        request: &DescribeServicesRequest,
    ) -> EcsResult<DescribeServicesResponse> {
        self.accept(request)?;
        Ok(DescribeServicesResponse::default())
    }

    async fn list_tasks(&self, request: &ListTasksRequest) -> EcsResult<ListTasksResponse> {
        self.accept(request)?;
        Ok(ListTasksResponse::default())
    }

    async fn describe_tasks(&self, request: &DescribeTasksRequest) -> EcsResult<DescribeTasksResponse> {
        self.accept(request)?;
        Ok(DescribeTasksResponse::default())
    }
}

impl SsmApi for Simulator {
    async fn put_parameter(&self, request: &PutParameterRequest) -> EcsResult<PutParameterResponse> {
        self.accept(request)?;
        Ok(PutParameterResponse { version: 0 })
    }

    async fn describe_parameters(
        &self,
        request: &DescribeParametersRequest,
    ) -> EcsResult<DescribeParametersResponse> {
        self.accept(request)?;
        Ok(DescribeParametersResponse::default())
    }

    async fn get_parameter(&self, request: &GetParameterRequest) -> EcsResult<GetParameterResponse> {
        self.accept(request)?;
        Ok(GetParameterResponse::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_definition() -> TaskDefinitionSpec {
        serde_json::from_value(json!({
            "family": "web",
            "containerDefinitions": [{"name": "app", "image": "app:1"}],
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn register_returns_revision_zero() {
        let sim = Simulator::new();
        let response = sim.register_task_definition(&task_definition()).await.unwrap();
        assert_eq!(
            response.task_definition_arn,
            "arn:aws:ecs:simulated:000000000000:task-definition/web:0"
        );
        let calls = sim.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].operation, Operation::RegisterTaskDefinition);
        assert_eq!(calls[0].request["family"], "web");
    }

    #[tokio::test]
    async fn simulated_arn_keeps_the_family_rule() {
        let sim = Simulator::new();
        let response = sim.register_task_definition(&task_definition()).await.unwrap();
        let family = ecsctl_core::TaskDefinitionFamily::from_arn(&response.task_definition_arn);
        assert_eq!(family.unwrap().as_str(), "web");
    }

    #[tokio::test]
    async fn update_echoes_service_identity() {
        let sim = Simulator::new();
        let request = UpdateServiceRequest::task_definition_only(
            "prod",
            "web",
            "arn:aws:ecs:simulated:000000000000:task-definition/web:0",
        );
        let response = sim.update_service(&request).await.unwrap();
        assert_eq!(
            response.service_arn,
            "arn:aws:ecs:simulated:000000000000:service/prod/web"
        );

        let arn = "arn:aws:ecs:eu-west-1:1:service/prod/api";
        let request = UpdateServiceRequest::task_definition_only("prod", arn, "td:1");
        assert_eq!(sim.update_service(&request).await.unwrap().service_arn, arn);
    }

    #[tokio::test]
    async fn reads_come_back_empty() {
        let sim = Simulator::new();
        let listed = sim
            .list_services(&ListServicesRequest::first_page("prod"))
            .await
            .unwrap();
        assert!(listed.service_arns.is_empty());
        assert!(listed.next_token.is_none());

        let described = sim
            .describe_services(&DescribeServicesRequest {
                cluster: "prod".into(),
                services: vec!["web".into()],
            })
            .await
            .unwrap();
        assert!(described.services.is_empty());

        let version = sim
            .put_parameter(&PutParameterRequest::secure("/test/db", "x"))
            .await
            .unwrap()
            .version;
        assert_eq!(version, 0);
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected_without_recording() {
        let sim = Simulator::new();
        let request = DescribeServicesRequest {
            cluster: "prod".into(),
            services: (0..11).map(|i| format!("svc-{i}")).collect(),
        };
        let err = sim.describe_services(&request).await.unwrap_err();
        match err {
            EcsError::Validation(report) => {
                assert_eq!(report.operation, Operation::DescribeServices);
                assert!(report.has_field("services"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(sim.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_page_size_is_rejected() {
        let sim = Simulator::new();
        let mut request = ListServicesRequest::first_page("prod");
        request.max_results = 0;
        assert!(sim.list_services(&request).await.unwrap_err().is_validation());
    }
}
