//! Page-level data loading
//!
//! A report page fetches one primary payload and any number of secondary
//! breakdowns concurrently. The primary result propagates its failure; a
//! failing breakdown is logged and left empty without touching the primary
//! data.

use std::fmt::Display;
use std::future::Future;

use futures::future::join_all;
use tracing::{debug, warn};

/// Result of one page load
#[derive(Debug, Clone, PartialEq)]
pub struct PageLoad<P, S> {
    pub primary: P,
    /// One entry per secondary fetch, in request order, `None` for failures
    pub secondary: Vec<Option<S>>,
}

impl<P, S> PageLoad<P, S> {
    pub fn secondary_failures(&self) -> usize {
        self.secondary.iter().filter(|s| s.is_none()).count()
    }
}

/// Run the primary fetch and every secondary fetch concurrently
///
/// Waits for all of them, then returns the primary error if there was one.
pub async fn load_page<P, S, E, SE, PF, SF>(
    primary: PF,
    secondary: Vec<SF>,
) -> Result<PageLoad<P, S>, E>
where
    PF: Future<Output = Result<P, E>>,
    SF: Future<Output = Result<S, SE>>,
    SE: Display,
{
    let (primary, secondary) = futures::join!(primary, join_all(secondary));

    let secondary = secondary
        .into_iter()
        .enumerate()
        .map(|(index, result)| match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Secondary fetch {} failed: {}", index, e);
                None
            }
        })
        .collect();

    let primary = primary?;
    debug!("Page load complete");
    Ok(PageLoad { primary, secondary })
}

/// Identifies one issued request of a [`ReportSlot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

/// Data currently displayed by a page, plus its banner message
///
/// [`ReportSlot::apply`] keeps whatever response arrives last, even if a newer
/// request was issued in between. Callers that want stale responses dropped
/// take a ticket with [`ReportSlot::begin`] and use
/// [`ReportSlot::apply_fenced`].
#[derive(Debug, Clone)]
pub struct ReportSlot<T> {
    data: Option<T>,
    error: Option<String>,
    issued: u64,
}

impl<T> Default for ReportSlot<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            issued: 0,
        }
    }
}

impl<T> ReportSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Banner message of the last failed load
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Register a new request; its ticket is now the latest
    pub fn begin(&mut self) -> RequestTicket {
        self.issued += 1;
        RequestTicket(self.issued)
    }

    pub fn is_latest(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.issued
    }

    /// Apply a response. Failures clear the data instead of leaving it stale.
    pub fn apply(&mut self, result: Result<T, String>) {
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            }
            Err(message) => {
                self.data = None;
                self.error = Some(message);
            }
        }
    }

    /// Apply a response only when its request is still the latest one
    pub fn apply_fenced(&mut self, ticket: RequestTicket, result: Result<T, String>) -> bool {
        if !self.is_latest(ticket) {
            debug!("Dropping stale response for request {}", ticket.0);
            return false;
        }
        self.apply(result);
        true
    }

    pub fn clear(&mut self) {
        self.data = None;
        self.error = None;
    }
}
