//! Shared query state for every report page
//!
//! One [`FilterState`] is built at startup and handed to each page. Pages
//! read snapshots, call the named setters and re-fetch whenever the refresh
//! token moves.

pub mod filters;
pub mod scheduler;
pub mod state;
pub mod subscription;

pub use filters::{Filters, RefreshInterval, FILTERS_KEY};
pub use scheduler::{RefreshScheduler, SchedulerState};
pub use state::FilterState;
pub use subscription::FilterSubscription;
