use std::sync::Arc;

use pulse_core::{ApiError, DateRange, FunnelQuery, Project, ProjectKey, ReportingApi};
use tracing::{debug, error, warn};

use super::definition::FunnelDefinition;
use super::metrics::compute_step_metrics;
use crate::error::FunnelError;
use crate::types::FunnelStepResult;

/// Runs funnels against the reporting API
#[derive(Clone)]
pub struct FunnelService {
    api: Arc<dyn ReportingApi>,
}

impl FunnelService {
    pub fn new(api: Arc<dyn ReportingApi>) -> Self {
        Self { api }
    }

    /// Validate the definition, fetch step counts and derive the metrics
    ///
    /// Nothing is sent to the API when validation fails.
    pub async fn execute(
        &self,
        project: Option<&ProjectKey>,
        definition: &FunnelDefinition,
        range: &DateRange,
    ) -> Result<Vec<FunnelStepResult>, FunnelError> {
        definition.validate()?;
        let project_key = project.ok_or(FunnelError::NoProjectSelected)?;

        let query = FunnelQuery {
            project_key: project_key.clone(),
            steps: definition.steps().to_vec(),
            range: range.clone(),
            mode: definition.mode(),
            process_name: definition.process_name_param(),
        };

        debug!(
            "Running {} funnel for project {} with {} steps",
            query.mode,
            project_key,
            query.steps.len()
        );

        let report = self.api.get_funnel(&query).await.map_err(|e| {
            error!("Funnel query failed for project {}: {}", project_key, e);
            e
        })?;

        if report.steps.len() != query.steps.len() {
            warn!(
                "Funnel report has {} steps, {} were requested",
                report.steps.len(),
                query.steps.len()
            );
        }

        Ok(compute_step_metrics(&report.steps))
    }

    /// Event names for add-step suggestions
    pub async fn event_names(
        &self,
        project: &ProjectKey,
        range: &DateRange,
    ) -> Result<Vec<String>, ApiError> {
        self.api.get_event_names(project, range).await
    }

    /// Like [`FunnelService::event_names`] but a failure only costs the
    /// suggestions
    pub async fn suggestions(&self, project: Option<&ProjectKey>, range: &DateRange) -> Vec<String> {
        let Some(project) = project else {
            return Vec::new();
        };
        match self.event_names(project, range).await {
            Ok(names) => names,
            Err(e) => {
                warn!("Event names unavailable for project {}: {}", project, e);
                Vec::new()
            }
        }
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.api.list_projects().await
    }
}

/// Suggestions for the add-step input
///
/// Drops names already in the funnel and keeps those containing `query`,
/// case-insensitively, in the order the API returned them.
pub fn available_suggestions<'a>(
    all: &'a [String],
    definition: &FunnelDefinition,
    query: &str,
) -> Vec<&'a str> {
    let needle = query.trim().to_lowercase();
    let mut picked: Vec<&str> = Vec::new();
    for name in all {
        if definition.steps().iter().any(|s| s == name) || picked.contains(&name.as_str()) {
            continue;
        }
        if needle.is_empty() || name.to_lowercase().contains(&needle) {
            picked.push(name);
        }
    }
    picked
}
