//! The cloud control interface: one typed method per ECS/SSM operation.
//!
//! Components receive an implementation explicitly (live AWS client,
//! simulator, or a test fake); there is no shared global client.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::EcsResult;
use crate::payload::{ServiceSpec, TaskDefinitionSpec, UpdateServiceRequest};
use crate::types::{ServiceDescription, TaskSnapshot};

/// Page size used when listing services.
pub const LIST_SERVICES_PAGE_SIZE: i32 = 10;

/// ECS refuses `DescribeServices` calls naming more than this many services.
pub const MAX_DESCRIBE_SERVICES: usize = 10;

/// ECS refuses `DescribeTasks` calls naming more than this many tasks.
pub const MAX_DESCRIBE_TASKS: usize = 100;

/// Every remote operation ecsctl performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    RegisterTaskDefinition,
    CreateService,
    UpdateService,
    ListServices,
    DescribeServices,
    ListTasks,
    DescribeTasks,
    PutParameter,
    DescribeParameters,
    GetParameter,
}

impl Operation {
    /// API operation name as published by AWS.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::RegisterTaskDefinition => "RegisterTaskDefinition",
            Operation::CreateService => "CreateService",
            Operation::UpdateService => "UpdateService",
            Operation::ListServices => "ListServices",
            Operation::DescribeServices => "DescribeServices",
            Operation::ListTasks => "ListTasks",
            Operation::DescribeTasks => "DescribeTasks",
            Operation::PutParameter => "PutParameter",
            Operation::DescribeParameters => "DescribeParameters",
            Operation::GetParameter => "GetParameter",
        }
    }

    /// AWS service the operation belongs to.
    pub fn service(&self) -> &'static str {
        match self {
            Operation::PutParameter | Operation::DescribeParameters | Operation::GetParameter => {
                "ssm"
            }
            _ => "ecs",
        }
    }

    /// Whether the operation changes remote state.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Operation::RegisterTaskDefinition
                | Operation::CreateService
                | Operation::UpdateService
                | Operation::PutParameter
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.service(), self.name())
    }
}

// ── ECS requests / responses ────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTaskDefinitionResponse {
    pub task_definition_arn: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceResponse {
    pub service_arn: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceResponse {
    pub service_arn: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListServicesRequest {
    pub cluster: String,
    pub max_results: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl ListServicesRequest {
    pub fn first_page(cluster: &str) -> Self {
        Self {
            cluster: cluster.to_string(),
            max_results: LIST_SERVICES_PAGE_SIZE,
            next_token: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListServicesResponse {
    pub service_arns: Vec<String>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeServicesRequest {
    pub cluster: String,
    /// Service ARNs or names.
    pub services: Vec<String>,
}

/// A service ECS could not describe (for example `MISSING`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFailure {
    pub arn: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeServicesResponse {
    pub services: Vec<ServiceDescription>,
    pub failures: Vec<ApiFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksRequest {
    pub cluster: String,
    pub service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksResponse {
    pub task_arns: Vec<String>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeTasksRequest {
    pub cluster: String,
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeTasksResponse {
    pub tasks: Vec<TaskSnapshot>,
}

// ── SSM requests / responses ────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterType {
    String,
    StringList,
    SecureString,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::String => "String",
            ParameterType::StringList => "StringList",
            ParameterType::SecureString => "SecureString",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutParameterRequest {
    pub name: String,
    pub value: String,
    #[serde(rename = "Type")]
    pub parameter_type: ParameterType,
    pub overwrite: bool,
}

impl PutParameterRequest {
    pub fn secure(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            parameter_type: ParameterType::SecureString,
            overwrite: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutParameterResponse {
    pub version: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeParametersRequest {
    /// Restrict the listing to the parameter with exactly this name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_equals: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeParametersResponse {
    pub names: Vec<String>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetParameterRequest {
    pub name: String,
    pub with_decryption: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetParameterResponse {
    pub value: Option<String>,
}

// ── Interfaces ──────────────────────────────────────────────────

/// ECS operations used by ecsctl.
///
/// Calls are awaited one at a time by every caller in this workspace.
pub trait EcsApi: Sync {
    fn register_task_definition(
        &self,
        request: &TaskDefinitionSpec,
    ) -> impl Future<Output = EcsResult<RegisterTaskDefinitionResponse>> + Send;

    fn create_service(
        &self,
        request: &ServiceSpec,
    ) -> impl Future<Output = EcsResult<CreateServiceResponse>> + Send;

    fn update_service(
        &self,
        request: &UpdateServiceRequest,
    ) -> impl Future<Output = EcsResult<UpdateServiceResponse>> + Send;

    fn list_services(
        &self,
        request: &ListServicesRequest,
    ) -> impl Future<Output = EcsResult<ListServicesResponse>> + Send;

    fn describe_services(
        &self,
        request: &DescribeServicesRequest,
    ) -> impl Future<Output = EcsResult<DescribeServicesResponse>> + Send;

    fn list_tasks(
        &self,
        request: &ListTasksRequest,
    ) -> impl Future<Output = EcsResult<ListTasksResponse>> + Send;

    fn describe_tasks(
        &self,
        request: &DescribeTasksRequest,
    ) -> impl Future<Output = EcsResult<DescribeTasksResponse>> + Send;
}

/// SSM Parameter Store operations used for secrets.
pub trait SsmApi: Sync {
    fn put_parameter(
        &self,
        request: &PutParameterRequest,
    ) -> impl Future<Output = EcsResult<PutParameterResponse>> + Send;

    fn describe_parameters(
        &self,
        request: &DescribeParametersRequest,
    ) -> impl Future<Output = EcsResult<DescribeParametersResponse>> + Send;

    fn get_parameter(
        &self,
        request: &GetParameterRequest,
    ) -> impl Future<Output = EcsResult<GetParameterResponse>> + Send;
}
