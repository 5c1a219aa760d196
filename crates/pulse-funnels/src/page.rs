//! Funnel page controller
//!
//! Ties the editable definition, the project's presets and the shared
//! filters together. A run fetches the funnel (primary) and the event name
//! suggestions (secondary) concurrently; only the funnel can fail the page.

use std::sync::Arc;

use pulse_core::{load_page, FunnelMode, ProjectKey, ReportSlot};
use pulse_filters::FilterState;
use tracing::{debug, error, info};

use crate::error::{FunnelError, PresetError, ValidationError};
use crate::services::{available_suggestions, FunnelDefinition, FunnelService, PresetStore};
use crate::types::{FunnelPreset, FunnelStepResult, DEFAULT_PRESET_NAME};

pub struct FunnelPage {
    service: FunnelService,
    presets: PresetStore,
    filters: Arc<FilterState>,
    definition: FunnelDefinition,
    suggestions: Vec<String>,
    report: ReportSlot<Vec<FunnelStepResult>>,
    inline_error: Option<String>,
}

impl FunnelPage {
    /// Mount the page; the "Default" preset of the current project, if any,
    /// replaces the built-in steps
    pub fn new(service: FunnelService, presets: PresetStore, filters: Arc<FilterState>) -> Self {
        let mut page = Self {
            service,
            presets,
            filters,
            definition: FunnelDefinition::default(),
            suggestions: Vec::new(),
            report: ReportSlot::new(),
            inline_error: None,
        };
        page.load_default_preset();
        page
    }

    pub fn project(&self) -> Option<ProjectKey> {
        self.filters.snapshot().project_key
    }

    pub fn definition(&self) -> &FunnelDefinition {
        &self.definition
    }

    pub fn report(&self) -> &ReportSlot<Vec<FunnelStepResult>> {
        &self.report
    }

    /// Message shown next to the step editor
    pub fn inline_error(&self) -> Option<&str> {
        self.inline_error.as_deref()
    }

    /// Change the active project and pick up its "Default" preset
    pub fn select_project(&mut self, project: Option<ProjectKey>) {
        self.filters.set_project_key(project);
        self.report.clear();
        self.suggestions.clear();
        self.load_default_preset();
    }

    fn load_default_preset(&mut self) {
        let project = self.project();
        let Some(preset) = self.presets.get(project.as_ref(), DEFAULT_PRESET_NAME) else {
            return;
        };
        if preset.steps.len() < 2 {
            debug!("Ignoring default preset with {} steps", preset.steps.len());
            return;
        }
        match self.definition.replace_steps(preset.steps) {
            Ok(()) => info!("Loaded default funnel preset"),
            Err(e) => debug!("Default preset not loaded: {}", e),
        }
    }

    pub fn add_step(&mut self, name: &str) -> Result<(), ValidationError> {
        let result = self.definition.add_step(name);
        self.record(result)
    }

    pub fn remove_step(&mut self, index: usize) -> Result<(), ValidationError> {
        let result = self.definition.remove_step(index);
        self.record(result)
    }

    pub fn move_up(&mut self, index: usize) -> Result<(), ValidationError> {
        let result = self.definition.move_up(index);
        self.record(result)
    }

    pub fn move_down(&mut self, index: usize) -> Result<(), ValidationError> {
        let result = self.definition.move_down(index);
        self.record(result)
    }

    /// Replace the whole step list; the new list must be runnable
    pub fn replace_steps(&mut self, steps: Vec<String>) -> Result<(), ValidationError> {
        let result = self.definition.replace_steps(steps);
        self.record(result)
    }

    pub fn set_mode(&mut self, mode: FunnelMode) {
        self.definition.set_mode(mode);
    }

    pub fn set_process_name(&mut self, process_name: impl Into<String>) {
        self.definition.set_process_name(process_name);
    }

    fn record(&mut self, result: Result<(), ValidationError>) -> Result<(), ValidationError> {
        self.inline_error = result.as_ref().err().map(|e| e.to_string());
        result
    }

    /// Presets of the current project
    pub fn presets(&self) -> Vec<FunnelPreset> {
        self.presets.list(self.project().as_ref())
    }

    /// Replace the steps with a saved preset's, returns false when the preset
    /// does not exist or is not runnable
    pub fn load_preset(&mut self, name: &str) -> bool {
        let Some(preset) = self.presets.get(self.project().as_ref(), name) else {
            return false;
        };
        let result = self.definition.replace_steps(preset.steps);
        self.record(result).is_ok()
    }

    /// Save the current steps under `name`, overwriting a preset of the same
    /// name
    pub fn save_preset(&mut self, name: &str) -> Result<(), PresetError> {
        let preset = FunnelPreset::new(name, self.definition.steps().to_vec())?;
        self.presets.save(self.project().as_ref(), preset);
        Ok(())
    }

    pub fn delete_preset(&mut self, name: &str) -> bool {
        self.presets.delete(self.project().as_ref(), name)
    }

    /// Suggestions for the add-step input matching `query`
    pub fn suggestions(&self, query: &str) -> Vec<&str> {
        available_suggestions(&self.suggestions, &self.definition, query)
    }

    /// Fetch only the suggestions, e.g. when the page is mounted
    pub async fn refresh_suggestions(&mut self) {
        let filters = self.filters.snapshot();
        self.suggestions = self
            .service
            .suggestions(filters.project_key.as_ref(), &filters.range())
            .await;
    }

    /// Run the funnel with the current filters
    ///
    /// Validation failures only set the inline error and leave the displayed
    /// report alone. An API failure clears the report and sets the banner.
    pub async fn run(&mut self) -> Result<(), FunnelError> {
        let filters = self.filters.snapshot();
        let range = filters.range();

        if let Err(e) = self.definition.validate() {
            self.inline_error = Some(e.to_string());
            return Err(e.into());
        }
        let Some(project) = filters.project_key else {
            self.inline_error = Some(FunnelError::NoProjectSelected.to_string());
            return Err(FunnelError::NoProjectSelected);
        };
        self.inline_error = None;

        let primary = self
            .service
            .execute(Some(&project), &self.definition, &range);
        let secondary = vec![self.service.event_names(&project, &range)];

        match load_page(primary, secondary).await {
            Ok(load) => {
                if load.secondary_failures() > 0 {
                    debug!("Event names unavailable, suggestions cleared");
                }
                self.suggestions = load.secondary.into_iter().flatten().flatten().collect();
                self.report.apply(Ok(load.primary));
                Ok(())
            }
            Err(e) => {
                error!("Funnel page load failed: {}", e);
                self.report.apply(Err(e.user_message()));
                Err(e)
            }
        }
    }
}
