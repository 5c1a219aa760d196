use tokio::sync::watch;

use crate::filters::Filters;

/// A page's view of the shared filters
pub struct FilterSubscription {
    rx: watch::Receiver<Filters>,
    seen_token: u64,
}

impl FilterSubscription {
    pub(crate) fn new(rx: watch::Receiver<Filters>) -> Self {
        let seen_token = rx.borrow().refresh_token;
        Self { rx, seen_token }
    }

    /// Latest snapshot, without marking it as seen
    pub fn current(&self) -> Filters {
        self.rx.borrow().clone()
    }

    /// Wait for the next mutation of any kind
    ///
    /// Returns `None` once the filter state is gone.
    pub async fn changed(&mut self) -> Option<Filters> {
        self.rx.changed().await.ok()?;
        let filters = self.rx.borrow_and_update().clone();
        self.seen_token = filters.refresh_token;
        Some(filters)
    }

    /// Wait until the refresh token moves past the last one this
    /// subscription observed; other mutations are skipped
    pub async fn refresh_requested(&mut self) -> Option<Filters> {
        loop {
            self.rx.changed().await.ok()?;
            let filters = self.rx.borrow_and_update().clone();
            if filters.refresh_token != self.seen_token {
                self.seen_token = filters.refresh_token;
                return Some(filters);
            }
        }
    }
}
