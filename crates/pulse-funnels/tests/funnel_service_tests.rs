use std::sync::Arc;

use mockall::mock;
use pulse_core::{
    ApiError, DateRange, FunnelMode, FunnelQuery, FunnelReport, FunnelReportStep, Project,
    ProjectKey, ReportingApi,
};
use pulse_funnels::{
    overall_conversion_percent, FunnelDefinition, FunnelError, FunnelService, ValidationError,
};

mock! {
    Api {}
    #[async_trait::async_trait]
    impl ReportingApi for Api {
        async fn list_projects(&self) -> Result<Vec<Project>, ApiError>;
        async fn get_funnel(&self, query: &FunnelQuery) -> Result<FunnelReport, ApiError>;
        async fn get_event_names(&self, project_key: &ProjectKey, range: &DateRange) -> Result<Vec<String>, ApiError>;
    }
}

fn counts(steps: &[(&str, u64)]) -> FunnelReport {
    FunnelReport {
        steps: steps
            .iter()
            .map(|(name, users)| FunnelReportStep {
                event_name: name.to_string(),
                users: *users,
            })
            .collect(),
    }
}

fn service(api: MockApi) -> FunnelService {
    FunnelService::new(Arc::new(api))
}

#[tokio::test]
async fn test_execute_derives_metrics_from_counts() {
    let mut api = MockApi::new();
    api.expect_get_funnel()
        .withf(|query| {
            query.project_key.as_str() == "shop"
                && query.steps == ["app_open", "signup", "purchase"]
                && query.mode == FunnelMode::User
                && query.process_name.is_none()
                && query.range.from_param() == Some("2024-01-01")
                && query.range.to_param().is_none()
        })
        .times(1)
        .returning(|_| {
            Ok(counts(&[
                ("app_open", 1000),
                ("signup", 400),
                ("purchase", 100),
            ]))
        });

    let definition = FunnelDefinition::with_steps(["app_open", "signup", "purchase"]).unwrap();
    let project = ProjectKey::new("shop");
    let results = service(api)
        .execute(
            Some(&project),
            &definition,
            &DateRange::new("2024-01-01", ""),
        )
        .await
        .unwrap();

    let drop_off: Vec<_> = results.iter().map(|r| r.drop_off_percent).collect();
    assert_eq!(drop_off, vec![None, Some(60.0), Some(75.0)]);
    let bar_width: Vec<_> = results.iter().map(|r| r.bar_width_percent).collect();
    assert_eq!(bar_width, vec![100.0, 40.0, 10.0]);
    assert_eq!(overall_conversion_percent(&results), 10.0);
}

#[tokio::test]
async fn test_execute_with_zero_first_count() {
    let mut api = MockApi::new();
    api.expect_get_funnel()
        .returning(|_| Ok(counts(&[("a", 0), ("b", 3)])));

    let definition = FunnelDefinition::with_steps(["a", "b"]).unwrap();
    let project = ProjectKey::new("shop");
    let results = service(api)
        .execute(Some(&project), &definition, &DateRange::default())
        .await
        .unwrap();

    assert_eq!(results[0].bar_width_percent, 0.0);
    assert_eq!(results[1].bar_width_percent, 0.0);
    assert_eq!(results[1].conversion_rate_percent, Some(0.0));
}

#[tokio::test]
async fn test_invalid_definitions_never_reach_the_api() {
    let mut api = MockApi::new();
    api.expect_get_funnel().never();
    let service = service(api);
    let project = ProjectKey::new("shop");

    let mut process = FunnelDefinition::with_steps(["start", "finish"]).unwrap();
    process.set_mode(FunnelMode::Process);
    process.set_process_name("  ");
    let err = service
        .execute(Some(&project), &process, &DateRange::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FunnelError::Validation(ValidationError::MissingProcessName)
    ));

    let mut short = FunnelDefinition::with_steps(["a", "b"]).unwrap();
    short.remove_step(1).unwrap();
    let err = service
        .execute(Some(&project), &short, &DateRange::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FunnelError::Validation(ValidationError::TooFewSteps)
    ));

    let err = service
        .execute(None, &FunnelDefinition::default(), &DateRange::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FunnelError::NoProjectSelected));
}

#[tokio::test]
async fn test_api_error_message_for_banner() {
    let mut api = MockApi::new();
    api.expect_get_funnel().returning(|_| {
        Err(ApiError::Http {
            status: 502,
            body: "<html><body>Bad Gateway</body></html>".to_string(),
        })
    });

    let project = ProjectKey::new("shop");
    let err = service(api)
        .execute(
            Some(&project),
            &FunnelDefinition::default(),
            &DateRange::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Request failed with status 502");
}

#[tokio::test]
async fn test_suggestions_degrade_to_empty() {
    let mut api = MockApi::new();
    api.expect_get_event_names()
        .times(1)
        .returning(|_, _| Err(ApiError::Transport("timed out".to_string())));
    let service = service(api);

    let project = ProjectKey::new("shop");
    assert!(service
        .suggestions(Some(&project), &DateRange::default())
        .await
        .is_empty());
    // No project, no request
    assert!(service.suggestions(None, &DateRange::default()).await.is_empty());

    let mut definition = FunnelDefinition::default();
    definition.add_step("share").unwrap();
    assert_eq!(definition.steps().len(), 5);
}

#[tokio::test]
async fn test_list_projects_passes_through() {
    let mut api = MockApi::new();
    api.expect_list_projects().returning(|| {
        Ok(vec![Project {
            name: "Shop".to_string(),
            project_key: ProjectKey::new("shop"),
            is_active: true,
            created_at: None,
        }])
    });

    let projects = service(api).list_projects().await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].project_key.as_str(), "shop");
}
