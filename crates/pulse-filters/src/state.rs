use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::Utc;
use pulse_core::ProjectKey;
use pulse_kv::{JsonStoreExt, PersistentStore};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::filters::{Filters, RefreshInterval, FILTERS_KEY};
use crate::scheduler::{RefreshScheduler, SchedulerState};
use crate::subscription::FilterSubscription;

struct Shared {
    tx: watch::Sender<Filters>,
    store: Arc<dyn PersistentStore>,
    storage_key: String,
}

impl Shared {
    /// Apply one mutation, persist the result and notify subscribers.
    ///
    /// Runs under the channel's write lock, so subscribers never see a
    /// partially applied change and records are written in mutation order.
    fn mutate<F>(&self, apply: F) -> Filters
    where
        F: FnOnce(&mut Filters),
    {
        let mut snapshot = Filters::default();
        self.tx.send_modify(|filters| {
            apply(filters);
            if let Err(e) = self.store.put_json(&self.storage_key, filters) {
                warn!("Failed to persist filters: {}", e);
            }
            snapshot = filters.clone();
        });
        snapshot
    }

    fn trigger_refresh(&self) -> u64 {
        let mut token = 0;
        self.tx.send_modify(|filters| {
            filters.refresh_token = next_refresh_token(filters.refresh_token);
            token = filters.refresh_token;
        });
        debug!("Refresh requested, token {}", token);
        token
    }
}

/// Current time in milliseconds, bumped past `previous` when the clock
/// has not moved (or moved backwards)
fn next_refresh_token(previous: u64) -> u64 {
    let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    now.max(previous.saturating_add(1))
}

/// Process-wide filter state shared by every report page
///
/// Built once and passed to each page. Every setter replaces one field,
/// writes the record back to the store and broadcasts the new snapshot
/// before returning.
pub struct FilterState {
    shared: Arc<Shared>,
    scheduler: Mutex<RefreshScheduler>,
}

impl FilterState {
    /// Seed the state from the store under the default key
    ///
    /// Missing or unreadable records yield defaults. The refresh timer runs
    /// on `runtime`.
    pub fn load(store: Arc<dyn PersistentStore>, runtime: Handle) -> Self {
        Self::load_with_key(store, FILTERS_KEY, runtime)
    }

    pub fn load_with_key(
        store: Arc<dyn PersistentStore>,
        storage_key: &str,
        runtime: Handle,
    ) -> Self {
        let initial: Filters = store.load_json(storage_key).unwrap_or_default();
        debug!(
            "Loaded filters (project: {:?}, auto refresh: {})",
            initial.project_key, initial.auto_refresh_enabled
        );
        let desired = initial.desired_schedule();

        let (tx, _rx) = watch::channel(initial);
        let shared = Arc::new(Shared {
            tx,
            store,
            storage_key: storage_key.to_string(),
        });

        let weak: Weak<Shared> = Arc::downgrade(&shared);
        let mut scheduler = RefreshScheduler::new(runtime, move || match weak.upgrade() {
            Some(shared) => {
                shared.trigger_refresh();
                true
            }
            None => false,
        });
        scheduler.reschedule(desired);

        Self {
            shared,
            scheduler: Mutex::new(scheduler),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Filters {
        self.shared.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> FilterSubscription {
        FilterSubscription::new(self.shared.tx.subscribe())
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.lock_scheduler().state()
    }

    pub fn set_project_key(&self, project_key: Option<ProjectKey>) {
        self.update_schedule_field(|f| f.project_key = project_key);
    }

    pub fn set_from(&self, from: impl Into<String>) {
        let from = from.into();
        self.shared.mutate(|f| f.from = from);
    }

    pub fn set_to(&self, to: impl Into<String>) {
        let to = to.into();
        self.shared.mutate(|f| f.to = to);
    }

    pub fn set_event_name(&self, event_name: impl Into<String>) {
        let event_name = event_name.into();
        self.shared.mutate(|f| f.event_name = event_name);
    }

    pub fn set_user_id(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        self.shared.mutate(|f| f.user_id = user_id);
    }

    pub fn set_anonymous_id(&self, anonymous_id: impl Into<String>) {
        let anonymous_id = anonymous_id.into();
        self.shared.mutate(|f| f.anonymous_id = anonymous_id);
    }

    pub fn set_auto_refresh_enabled(&self, enabled: bool) {
        self.update_schedule_field(|f| f.auto_refresh_enabled = enabled);
    }

    pub fn set_auto_refresh_interval(&self, interval: RefreshInterval) {
        self.update_schedule_field(|f| f.auto_refresh_interval = interval);
    }

    /// Advance the refresh token, with or without a selected project
    pub fn trigger_refresh(&self) -> u64 {
        self.shared.trigger_refresh()
    }

    /// Restore every field to its default and advance the refresh token
    pub fn reset_filters(&self) {
        let mut scheduler = self.lock_scheduler();
        let after = self.shared.mutate(|f| {
            let token = next_refresh_token(f.refresh_token);
            *f = Filters {
                refresh_token: token,
                ..Filters::default()
            };
        });
        debug!("Filters reset, token {}", after.refresh_token);
        scheduler.reschedule(after.desired_schedule());
    }

    /// Stop the refresh timer for good, e.g. when the dashboard closes
    pub fn shutdown(&self) {
        self.lock_scheduler().shutdown();
    }

    /// Mutation of a field the timer depends on; the timer is re-evaluated
    /// while the scheduler lock is held so a racing setter cannot leave a
    /// stale timer behind
    fn update_schedule_field<F>(&self, apply: F)
    where
        F: FnOnce(&mut Filters),
    {
        let mut scheduler = self.lock_scheduler();
        let before = self.snapshot();
        let after = self.shared.mutate(apply);

        let changed = before.project_key != after.project_key
            || before.auto_refresh_enabled != after.auto_refresh_enabled
            || before.auto_refresh_interval != after.auto_refresh_interval;
        if changed {
            scheduler.reschedule(after.desired_schedule());
        }
    }

    fn lock_scheduler(&self) -> MutexGuard<'_, RefreshScheduler> {
        self.scheduler
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_refresh_token_strictly_increases() {
        let first = next_refresh_token(0);
        assert!(first > 0);
        assert!(next_refresh_token(first) > first);

        // A token from the future still advances
        let future = first + 1_000_000;
        assert_eq!(next_refresh_token(future), future + 1);
    }
}
