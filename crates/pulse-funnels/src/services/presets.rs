use std::sync::Arc;

use chrono::Utc;
use pulse_core::ProjectKey;
use pulse_kv::{namespaced_key, JsonStoreExt, PersistentStore};
use tracing::{debug, warn};

use crate::error::PresetError;
use crate::types::FunnelPreset;

/// Prefix of the per-project presets record
pub const PRESETS_KEY_PREFIX: &str = "funnel_presets_";

impl FunnelPreset {
    /// Build a preset from the current step list
    ///
    /// The name is trimmed; blank names and lists shorter than two steps are
    /// refused before anything reaches the store.
    pub fn new(name: &str, steps: Vec<String>) -> Result<Self, PresetError> {
        let preset_name = name.trim();
        if preset_name.is_empty() {
            return Err(PresetError::BlankName);
        }
        if steps.len() < 2 {
            return Err(PresetError::TooFewSteps);
        }
        Ok(Self {
            preset_name: preset_name.to_string(),
            steps,
            created_at: Utc::now(),
        })
    }
}

/// Named step lists saved per project
///
/// Every operation is a no-op without a project and never fails: unreadable
/// records read as an empty list and write failures are logged.
#[derive(Clone)]
pub struct PresetStore {
    store: Arc<dyn PersistentStore>,
}

impl PresetStore {
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self { store }
    }

    fn key(project: &ProjectKey) -> String {
        namespaced_key(PRESETS_KEY_PREFIX, project)
    }

    /// Saved presets in save order
    pub fn list(&self, project: Option<&ProjectKey>) -> Vec<FunnelPreset> {
        match project {
            Some(project) => self.store.load_json(&Self::key(project)).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Find a preset by name
    pub fn get(&self, project: Option<&ProjectKey>, name: &str) -> Option<FunnelPreset> {
        self.list(project)
            .into_iter()
            .find(|p| p.preset_name == name)
    }

    /// Upsert by name: an existing preset keeps its position and takes the
    /// new steps
    pub fn save(&self, project: Option<&ProjectKey>, preset: FunnelPreset) {
        let Some(project) = project else {
            debug!("No project selected, preset '{}' not saved", preset.preset_name);
            return;
        };

        let result = self
            .store
            .update_json(&Self::key(project), |presets: &mut Vec<FunnelPreset>| {
                match presets
                    .iter_mut()
                    .find(|p| p.preset_name == preset.preset_name)
                {
                    Some(existing) => *existing = preset,
                    None => presets.push(preset),
                }
            });
        match result {
            Ok(presets) => debug!("Stored {} presets for project {}", presets.len(), project),
            Err(e) => warn!("Failed to store presets for project {}: {}", project, e),
        }
    }

    /// Delete by name, returns whether a preset was removed
    ///
    /// Removing the last preset drops the record altogether.
    pub fn delete(&self, project: Option<&ProjectKey>, name: &str) -> bool {
        let Some(project) = project else {
            return false;
        };
        if self.get(Some(project), name).is_none() {
            return false;
        }

        let key = Self::key(project);
        let result = self
            .store
            .update_json(&key, |presets: &mut Vec<FunnelPreset>| {
                presets.retain(|p| p.preset_name != name)
            })
            .and_then(|remaining| {
                if remaining.is_empty() {
                    self.store.remove(&key)?;
                }
                Ok(remaining.len())
            });
        match result {
            Ok(remaining) => debug!(
                "Deleted preset '{}' for project {}, {} left",
                name, project, remaining
            ),
            Err(e) => warn!("Failed to delete preset '{}' for project {}: {}", name, project, e),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_kv::MemoryStore;

    fn steps(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn store() -> (Arc<MemoryStore>, PresetStore) {
        let memory = Arc::new(MemoryStore::new());
        let presets = PresetStore::new(memory.clone());
        (memory, presets)
    }

    #[test]
    fn test_new_preset_rules() {
        assert_eq!(
            FunnelPreset::new("  ", steps(&["a", "b"])),
            Err(PresetError::BlankName)
        );
        assert_eq!(
            FunnelPreset::new("A", steps(&["a"])),
            Err(PresetError::TooFewSteps)
        );
        let preset = FunnelPreset::new(" Checkout ", steps(&["a", "b"])).unwrap();
        assert_eq!(preset.preset_name, "Checkout");
    }

    #[test]
    fn test_save_twice_keeps_one_with_later_steps() {
        let (_, presets) = store();
        let project = ProjectKey::new("shop");

        presets.save(Some(&project), FunnelPreset::new("A", steps(&["x", "y"])).unwrap());
        presets.save(Some(&project), FunnelPreset::new("B", steps(&["p", "q"])).unwrap());
        presets.save(Some(&project), FunnelPreset::new("A", steps(&["y", "z"])).unwrap());

        let listed = presets.list(Some(&project));
        let names: Vec<_> = listed.iter().map(|p| p.preset_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(listed[0].steps, steps(&["y", "z"]));
    }

    #[test]
    fn test_presets_are_scoped_per_project() {
        let (memory, presets) = store();
        let shop = ProjectKey::new("shop");
        let blog = ProjectKey::new("blog");

        presets.save(Some(&shop), FunnelPreset::new("A", steps(&["x", "y"])).unwrap());

        assert_eq!(presets.list(Some(&shop)).len(), 1);
        assert!(presets.list(Some(&blog)).is_empty());
        assert!(memory.get("funnel_presets_shop").unwrap().is_some());
    }

    #[test]
    fn test_absent_project_is_a_no_op() {
        let (memory, presets) = store();

        presets.save(None, FunnelPreset::new("A", steps(&["x", "y"])).unwrap());
        assert!(presets.list(None).is_empty());
        assert!(!presets.delete(None, "A"));
        assert!(presets.get(None, "A").is_none());
        assert!(memory.is_empty());
    }

    #[test]
    fn test_corrupted_record_reads_as_empty() {
        let memory = Arc::new(MemoryStore::new().with_entry("funnel_presets_shop", "[{oops"));
        let presets = PresetStore::new(memory);
        let project = ProjectKey::new("shop");

        assert!(presets.list(Some(&project)).is_empty());

        presets.save(Some(&project), FunnelPreset::new("A", steps(&["x", "y"])).unwrap());
        assert_eq!(presets.list(Some(&project)).len(), 1);
    }

    #[test]
    fn test_delete() {
        let (_, presets) = store();
        let project = ProjectKey::new("shop");
        presets.save(Some(&project), FunnelPreset::new("A", steps(&["x", "y"])).unwrap());

        presets.save(Some(&project), FunnelPreset::new("B", steps(&["p", "q"])).unwrap());

        assert!(!presets.delete(Some(&project), "missing"));
        assert!(presets.delete(Some(&project), "A"));
        assert_eq!(presets.list(Some(&project))[0].preset_name, "B");
    }

    #[test]
    fn test_deleting_last_preset_drops_the_record() {
        let (memory, presets) = store();
        let project = ProjectKey::new("shop");
        presets.save(Some(&project), FunnelPreset::new("A", steps(&["x", "y"])).unwrap());

        assert!(presets.delete(Some(&project), "A"));
        assert!(presets.list(Some(&project)).is_empty());
        assert_eq!(memory.get("funnel_presets_shop").unwrap(), None);
    }

    #[test]
    fn test_record_shape() {
        let (memory, presets) = store();
        let project = ProjectKey::new("shop");
        presets.save(Some(&project), FunnelPreset::new("A", steps(&["x", "y"])).unwrap());

        let raw = memory.get("funnel_presets_shop").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["presetName"], "A");
        assert_eq!(value[0]["steps"], serde_json::json!(["x", "y"]));
        assert!(value[0]["createdAt"].is_string());
    }
}
