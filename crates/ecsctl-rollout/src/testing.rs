//! In-memory ECS fake for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use ecsctl_core::*;

#[derive(Default)]
struct FakeState {
    /// Scripted list pages per cluster, returned in order.
    pages: HashMap<String, Vec<ListServicesResponse>>,
    /// Per-service descriptions; the nth describe returns the nth entry
    /// (the last one repeats).
    scripts: HashMap<String, Vec<ServiceDescription>>,
    describe_counts: HashMap<String, usize>,
    tasks: HashMap<String, Vec<TaskSnapshot>>,
    calls: Vec<Operation>,
    list_requests: Vec<ListServicesRequest>,
    describe_batches: Vec<usize>,
    updates: Vec<UpdateServiceRequest>,
    fail_on: Option<Operation>,
}

#[derive(Default)]
pub struct FakeEcs {
    state: Mutex<FakeState>,
}

impl FakeEcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&self, cluster: &str, arns: &[String], next_token: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        state
            .pages
            .entry(cluster.to_string())
            .or_default()
            .push(ListServicesResponse {
                service_arns: arns.to_vec(),
                next_token: next_token.map(str::to_string),
            });
    }

    pub fn set_service(&self, desc: ServiceDescription) {
        self.script_service(vec![desc]);
    }

    pub fn script_service(&self, script: Vec<ServiceDescription>) {
        let arn = script[0].service_arn.clone();
        self.state.lock().unwrap().scripts.insert(arn, script);
    }

    /// Answer describes for `identifier` with `desc`, whatever its ARN.
    pub fn set_service_as(&self, identifier: &str, desc: ServiceDescription) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(identifier.to_string(), vec![desc]);
    }

    pub fn set_tasks(&self, service_name: &str, tasks: Vec<TaskSnapshot>) {
        self.state
            .lock()
            .unwrap()
            .tasks
            .insert(service_name.to_string(), tasks);
    }

    pub fn fail_on(&self, op: Operation) {
        self.state.lock().unwrap().fail_on = Some(op);
    }

    pub fn calls(&self, op: Operation) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == op)
            .count()
    }

    pub fn list_requests(&self) -> Vec<ListServicesRequest> {
        self.state.lock().unwrap().list_requests.clone()
    }

    pub fn describe_batches(&self) -> Vec<usize> {
        self.state.lock().unwrap().describe_batches.clone()
    }

    pub fn updates(&self) -> Vec<UpdateServiceRequest> {
        self.state.lock().unwrap().updates.clone()
    }

    fn record(&self, op: Operation) -> EcsResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(op);
        if state.fail_on == Some(op) {
            return Err(EcsError::api(op, "injected failure"));
        }
        Ok(())
    }
}

impl EcsApi for FakeEcs {
    async fn register_task_definition(
        &self,
        request: &TaskDefinitionSpec,
    ) -> EcsResult<RegisterTaskDefinitionResponse> {
        self.record(Operation::RegisterTaskDefinition)?;
        Ok(RegisterTaskDefinitionResponse {
            task_definition_arn: format!("arn:aws:ecs:r:1:task-definition/{}:1", request.family),
        })
    }

    async fn create_service(&self, request: &ServiceSpec) -> EcsResult<CreateServiceResponse> {
        self.record(Operation::CreateService)?;
        Ok(CreateServiceResponse {
            service_arn: format!("arn:aws:ecs:r:1:service/{}", request.service_name),
        })
    }

    async fn update_service(
        &self,
        request: &UpdateServiceRequest,
    ) -> EcsResult<UpdateServiceResponse> {
        self.record(Operation::UpdateService)?;
        self.state.lock().unwrap().updates.push(request.clone());
        Ok(UpdateServiceResponse {
            service_arn: request.service.clone(),
        })
    }

    async fn list_services(&self, request: &ListServicesRequest) -> EcsResult<ListServicesResponse> {
        self.record(Operation::ListServices)?;
        let mut state = self.state.lock().unwrap();
        state.list_requests.push(request.clone());
        let page_index = state
            .list_requests
            .iter()
            .filter(|r| r.cluster == request.cluster)
            .count()
            - 1;
        Ok(state
            .pages
            .get(&request.cluster)
            .and_then(|pages| pages.get(page_index))
            .cloned()
            .unwrap_or_default())
    }

    async fn describe_services(
        &self,
        request: &DescribeServicesRequest,
    ) -> EcsResult<DescribeServicesResponse> {
        self.record(Operation::DescribeServices)?;
        let mut state = self.state.lock().unwrap();
        state.describe_batches.push(request.services.len());

        let mut response = DescribeServicesResponse::default();
        for arn in &request.services {
            let n = *state.describe_counts.entry(arn.clone()).or_default();
            match state.scripts.get(arn) {
                Some(script) => {
                    let mut desc = script[n.min(script.len() - 1)].clone();
                    desc.cluster_name = request.cluster.clone();
                    response.services.push(desc);
                }
                None => response.failures.push(ApiFailure {
                    arn: arn.clone(),
                    reason: "MISSING".to_string(),
                }),
            }
            *state.describe_counts.get_mut(arn).unwrap() += 1;
        }
        Ok(response)
    }

    async fn list_tasks(&self, request: &ListTasksRequest) -> EcsResult<ListTasksResponse> {
        self.record(Operation::ListTasks)?;
        let state = self.state.lock().unwrap();
        Ok(ListTasksResponse {
            task_arns: state
                .tasks
                .get(&request.service_name)
                .map(|tasks| tasks.iter().map(|t| t.task_arn.clone()).collect())
                .unwrap_or_default(),
            next_token: None,
        })
    }

    async fn describe_tasks(&self, request: &DescribeTasksRequest) -> EcsResult<DescribeTasksResponse> {
        self.record(Operation::DescribeTasks)?;
        let state = self.state.lock().unwrap();
        let tasks = state
            .tasks
            .values()
            .flatten()
            .filter(|t| request.tasks.contains(&t.task_arn))
            .cloned()
            .collect();
        Ok(DescribeTasksResponse { tasks })
    }
}

// ── Builders ────────────────────────────────────────────────────

pub const TD_V1: &str = "arn:aws:ecs:eu-west-1:1:task-definition/web:1";
pub const TD_V2: &str = "arn:aws:ecs:eu-west-1:1:task-definition/web:2";

pub fn service(name: &str, desired: i32, running: i32, pending: i32, state: RolloutState) -> ServiceDescription {
    ServiceDescription {
        service_arn: format!("arn:aws:ecs:eu-west-1:1:service/prod/{name}"),
        service_name: name.to_string(),
        cluster_name: "prod".to_string(),
        status: "ACTIVE".to_string(),
        task_definition: TD_V2.to_string(),
        desired_count: desired,
        running_count: running,
        pending_count: pending,
        deployments: vec![
            Deployment {
                status: DeploymentStatus::Primary,
                rollout_state: Some(state),
            },
            Deployment {
                status: DeploymentStatus::Active,
                rollout_state: Some(RolloutState::Completed),
            },
        ],
    }
}

pub fn task(id: &str, task_definition: &str, created_at: i64) -> TaskSnapshot {
    TaskSnapshot {
        task_arn: format!("arn:aws:ecs:eu-west-1:1:task/prod/{id}"),
        task_definition_arn: task_definition.to_string(),
        created_at,
    }
}
