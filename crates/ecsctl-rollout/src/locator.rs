//! Service discovery by task-definition family.
//!
//! Pages through every service of a cluster and keeps the ones whose
//! current task definition belongs to the same family as a given ARN.

use tracing::{debug, info, warn};

use ecsctl_core::*;

/// Finds (and optionally updates) the services running a task family.
pub struct ServiceLocator<'a, C> {
    client: &'a C,
}

impl<'a, C: EcsApi> ServiceLocator<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Every service in `cluster` whose task definition shares the family
    /// of `task_definition_arn`, in API response order.
    ///
    /// API errors propagate unchanged; nothing is retried here.
    pub async fn find_services_for_family(
        &self,
        task_definition_arn: &str,
        cluster: &str,
    ) -> EcsResult<Vec<ServiceRef>> {
        let Some(family) = TaskDefinitionFamily::from_arn(task_definition_arn) else {
            warn!(arn = %task_definition_arn, "not a task-definition ARN, no service can match");
            return Ok(Vec::new());
        };

        let mut found = Vec::new();
        let mut request = ListServicesRequest::first_page(cluster);
        loop {
            let page = self.client.list_services(&request).await?;
            debug!(
                %cluster,
                services = page.service_arns.len(),
                more = page.next_token.is_some(),
                "listed services page"
            );

            for batch in page.service_arns.chunks(MAX_DESCRIBE_SERVICES) {
                let described = self
                    .client
                    .describe_services(&DescribeServicesRequest {
                        cluster: cluster.to_string(),
                        services: batch.to_vec(),
                    })
                    .await?;

                for service in described.services {
                    if family.matches(&service.task_definition) {
                        found.push(ServiceRef::new(
                            &service.service_arn,
                            &service.service_name,
                            cluster,
                        ));
                    }
                }
            }

            match page.next_token {
                Some(token) => request.next_token = Some(token),
                None => break,
            }
        }

        info!(%cluster, %family, matched = found.len(), "located services for task family");
        Ok(found)
    }

    /// Locate the family's services in `cluster` and point each at
    /// `task_definition_arn`. Returns the services that were updated.
    pub async fn update_services(
        &self,
        task_definition_arn: &str,
        cluster: &str,
    ) -> EcsResult<Vec<ServiceRef>> {
        let services = self
            .find_services_for_family(task_definition_arn, cluster)
            .await?;

        for service in &services {
            info!(
                cluster = %service.cluster_name,
                service = %service.service_name,
                task_definition = %task_definition_arn,
                "updating service"
            );
            self.client
                .update_service(&UpdateServiceRequest::task_definition_only(
                    cluster,
                    &service.service_arn,
                    task_definition_arn,
                ))
                .await?;
        }

        Ok(services)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn with_definition(name: &str, task_definition: &str) -> ServiceDescription {
        let mut desc = service(name, 1, 1, 0, RolloutState::Completed);
        desc.task_definition = task_definition.to_string();
        desc
    }

    fn arn(name: &str) -> String {
        format!("arn:aws:ecs:eu-west-1:1:service/prod/{name}")
    }

    #[tokio::test]
    async fn matches_by_family_across_pages() {
        let fake = FakeEcs::new();
        fake.add_page("prod", &[arn("web"), arn("worker")], Some("t1"));
        fake.add_page("prod", &[arn("web-canary")], Some("t2"));
        fake.add_page("prod", &[arn("api")], None);
        fake.set_service(with_definition("web", TD_V1));
        fake.set_service(with_definition("worker", "arn:aws:ecs:eu-west-1:1:task-definition/worker:9"));
        fake.set_service(with_definition("web-canary", "arn:aws:ecs:eu-west-1:1:task-definition/web:17"));
        fake.set_service(with_definition("api", "arn:aws:ecs:eu-west-1:1:task-definition/web-api:1"));

        let found = ServiceLocator::new(&fake)
            .find_services_for_family(TD_V2, "prod")
            .await
            .unwrap();

        let names: Vec<_> = found.iter().map(|s| s.service_name.as_str()).collect();
        assert_eq!(names, vec!["web", "web-canary"]);
        assert!(found.iter().all(|s| s.cluster_name == "prod"));

        assert_eq!(fake.calls(Operation::ListServices), 3);
        let requests = fake.list_requests();
        assert_eq!(requests[0].next_token, None);
        assert_eq!(requests[1].next_token.as_deref(), Some("t1"));
        assert_eq!(requests[2].next_token.as_deref(), Some("t2"));
        assert!(requests.iter().all(|r| r.max_results == 10));
    }

    #[tokio::test]
    async fn single_page_lists_once() {
        let fake = FakeEcs::new();
        fake.add_page("prod", &[arn("web")], None);
        fake.set_service(with_definition("web", TD_V1));

        let found = ServiceLocator::new(&fake)
            .find_services_for_family(TD_V2, "prod")
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(fake.calls(Operation::ListServices), 1);
        assert_eq!(fake.describe_batches(), vec![1]);
    }

    #[tokio::test]
    async fn empty_pages_skip_describe() {
        let fake = FakeEcs::new();
        fake.add_page("prod", &[], None);

        let found = ServiceLocator::new(&fake)
            .find_services_for_family(TD_V2, "prod")
            .await
            .unwrap();

        assert!(found.is_empty());
        assert_eq!(fake.calls(Operation::DescribeServices), 0);
    }

    #[tokio::test]
    async fn unparseable_arn_matches_nothing() {
        let fake = FakeEcs::new();
        let found = ServiceLocator::new(&fake)
            .find_services_for_family("N/A", "prod")
            .await
            .unwrap();
        assert!(found.is_empty());
        assert_eq!(fake.calls(Operation::ListServices), 0);
    }

    #[tokio::test]
    async fn api_errors_propagate() {
        let fake = FakeEcs::new();
        fake.add_page("prod", &[arn("web")], None);
        fake.fail_on(Operation::DescribeServices);

        let err = ServiceLocator::new(&fake)
            .find_services_for_family(TD_V2, "prod")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EcsError::Api { operation: Operation::DescribeServices, .. }
        ));
    }

    #[tokio::test]
    async fn updates_every_matching_service() {
        let fake = FakeEcs::new();
        fake.add_page("prod", &[arn("web"), arn("worker")], None);
        fake.set_service(with_definition("web", TD_V1));
        fake.set_service(with_definition("worker", "arn:aws:ecs:eu-west-1:1:task-definition/worker:9"));

        let updated = ServiceLocator::new(&fake)
            .update_services(TD_V2, "prod")
            .await
            .unwrap();

        assert_eq!(updated.len(), 1);
        let updates = fake.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].service, arn("web"));
        assert_eq!(updates[0].cluster.as_deref(), Some("prod"));
        assert_eq!(updates[0].task_definition.as_deref(), Some(TD_V2));
    }
}
