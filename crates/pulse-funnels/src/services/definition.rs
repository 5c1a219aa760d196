use pulse_core::FunnelMode;
use tracing::debug;

use crate::error::ValidationError;
use crate::types::DEFAULT_STEPS;

/// Check a step list before it is executed
///
/// Rules are applied in order: at least two steps, no blank step, no step
/// repeated (after trimming).
pub fn validate_steps<S: AsRef<str>>(steps: &[S]) -> Result<(), ValidationError> {
    if steps.len() < 2 {
        return Err(ValidationError::TooFewSteps);
    }
    check_entries(steps)
}

/// Blank and duplicate checks shared by execution and editing
///
/// Editing may go below two steps, so the length rule is left out here.
fn check_entries<S: AsRef<str>>(steps: &[S]) -> Result<(), ValidationError> {
    if steps.iter().any(|s| s.as_ref().trim().is_empty()) {
        return Err(ValidationError::BlankStep);
    }

    let mut seen: Vec<&str> = Vec::with_capacity(steps.len());
    let mut duplicates: Vec<String> = Vec::new();
    for step in steps {
        let name = step.as_ref().trim();
        if seen.contains(&name) {
            if !duplicates.iter().any(|d| d == name) {
                duplicates.push(name.to_string());
            }
        } else {
            seen.push(name);
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::DuplicateStep(duplicates))
    }
}

/// Funnel being edited on the funnel page
///
/// Every structural mutation validates the resulting list first and leaves
/// the definition untouched when it is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunnelDefinition {
    mode: FunnelMode,
    process_name: String,
    steps: Vec<String>,
}

impl Default for FunnelDefinition {
    fn default() -> Self {
        Self {
            mode: FunnelMode::User,
            process_name: String::new(),
            steps: DEFAULT_STEPS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FunnelDefinition {
    /// Definition in user mode with the given steps
    pub fn with_steps<I, S>(steps: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut definition = Self::default();
        definition.replace_steps(steps)?;
        Ok(definition)
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn mode(&self) -> FunnelMode {
        self.mode
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    pub fn set_mode(&mut self, mode: FunnelMode) {
        self.mode = mode;
    }

    pub fn set_process_name(&mut self, process_name: impl Into<String>) {
        self.process_name = process_name.into();
    }

    /// Append a step
    ///
    /// Rejects blank names and names already in the list.
    pub fn add_step(&mut self, name: &str) -> Result<(), ValidationError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::BlankStep);
        }
        if self.steps.iter().any(|s| s == name) {
            return Err(ValidationError::DuplicateStep(vec![name.to_string()]));
        }

        let mut candidate = self.steps.clone();
        candidate.push(trimmed.to_string());
        self.commit(candidate)
    }

    /// Remove the step at `index`; out of range is a no-op
    ///
    /// The list may drop below two steps, running is what gets blocked then.
    pub fn remove_step(&mut self, index: usize) -> Result<(), ValidationError> {
        if index >= self.steps.len() {
            return Ok(());
        }
        let mut candidate = self.steps.clone();
        candidate.remove(index);
        self.commit(candidate)
    }

    /// Swap the step with its predecessor; no-op for the first step
    pub fn move_up(&mut self, index: usize) -> Result<(), ValidationError> {
        if index == 0 || index >= self.steps.len() {
            return Ok(());
        }
        let mut candidate = self.steps.clone();
        candidate.swap(index - 1, index);
        self.commit(candidate)
    }

    /// Swap the step with its successor; no-op for the last step
    pub fn move_down(&mut self, index: usize) -> Result<(), ValidationError> {
        if index + 1 >= self.steps.len() {
            return Ok(());
        }
        let mut candidate = self.steps.clone();
        candidate.swap(index, index + 1);
        self.commit(candidate)
    }

    /// Replace the whole list, e.g. from a preset; the new list must be
    /// runnable
    pub fn replace_steps<I, S>(&mut self, steps: I) -> Result<(), ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidate: Vec<String> = steps
            .into_iter()
            .map(|s| s.into().trim().to_string())
            .collect();
        validate_steps(&candidate)?;
        self.steps = candidate;
        Ok(())
    }

    /// Full check before running the funnel
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_steps(&self.steps)?;
        if self.mode == FunnelMode::Process && self.process_name.trim().is_empty() {
            return Err(ValidationError::MissingProcessName);
        }
        Ok(())
    }

    /// Process name to send with the query, only in process mode
    pub fn process_name_param(&self) -> Option<String> {
        match self.mode {
            FunnelMode::Process => Some(self.process_name.trim().to_string()),
            FunnelMode::User => None,
        }
    }

    fn commit(&mut self, candidate: Vec<String>) -> Result<(), ValidationError> {
        check_entries(&candidate)?;
        debug!("Funnel steps updated: {:?}", candidate);
        self.steps = candidate;
        Ok(())
    }
}
