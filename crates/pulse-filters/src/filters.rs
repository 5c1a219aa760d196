use pulse_core::{DateRange, ProjectKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Storage key of the persisted filters record
pub const FILTERS_KEY: &str = "dashboard_filters";

/// Period of the auto-refresh timer
///
/// Persisted as the number of seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum RefreshInterval {
    #[default]
    ThirtySeconds,
    SixtySeconds,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported refresh interval '{0}', expected 30 or 60 seconds")]
pub struct InvalidInterval(pub String);

impl RefreshInterval {
    pub fn as_secs(&self) -> u64 {
        match self {
            RefreshInterval::ThirtySeconds => 30,
            RefreshInterval::SixtySeconds => 60,
        }
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.as_secs())
    }
}

impl TryFrom<u64> for RefreshInterval {
    type Error = InvalidInterval;

    fn try_from(secs: u64) -> Result<Self, Self::Error> {
        match secs {
            30 => Ok(RefreshInterval::ThirtySeconds),
            60 => Ok(RefreshInterval::SixtySeconds),
            other => Err(InvalidInterval(other.to_string())),
        }
    }
}

impl From<RefreshInterval> for u64 {
    fn from(interval: RefreshInterval) -> Self {
        interval.as_secs()
    }
}

impl FromStr for RefreshInterval {
    type Err = InvalidInterval;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_suffix('s').unwrap_or(trimmed);
        digits
            .parse::<u64>()
            .map_err(|_| InvalidInterval(s.to_string()))
            .and_then(RefreshInterval::try_from)
    }
}

impl fmt::Display for RefreshInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.as_secs())
    }
}

/// Snapshot of the shared query parameters
///
/// Serializes to the flat persisted record. The refresh token is skipped in
/// both directions, so a freshly loaded state always starts at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Filters {
    pub project_key: Option<ProjectKey>,
    pub from: String,
    pub to: String,
    pub event_name: String,
    pub user_id: String,
    pub anonymous_id: String,
    pub auto_refresh_enabled: bool,
    pub auto_refresh_interval: RefreshInterval,
    #[serde(skip)]
    pub refresh_token: u64,
}

impl Filters {
    pub fn range(&self) -> DateRange {
        DateRange::new(self.from.clone(), self.to.clone())
    }

    pub fn has_project(&self) -> bool {
        self.project_key.is_some()
    }

    /// Interval the refresh timer should run with, `None` when it must be
    /// disarmed
    pub fn desired_schedule(&self) -> Option<RefreshInterval> {
        if self.auto_refresh_enabled && self.has_project() {
            Some(self.auto_refresh_interval)
        } else {
            None
        }
    }

    /// Same filters, ignoring the refresh token
    pub fn same_query(&self, other: &Filters) -> bool {
        Filters {
            refresh_token: 0,
            ..self.clone()
        } == Filters {
            refresh_token: 0,
            ..other.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_parsing() {
        assert_eq!("30".parse(), Ok(RefreshInterval::ThirtySeconds));
        assert_eq!("60s".parse(), Ok(RefreshInterval::SixtySeconds));
        assert!("45".parse::<RefreshInterval>().is_err());
        assert!("soon".parse::<RefreshInterval>().is_err());
        assert_eq!(RefreshInterval::SixtySeconds.period(), Duration::from_secs(60));
        assert_eq!(RefreshInterval::ThirtySeconds.to_string(), "30s");
    }

    #[test]
    fn test_record_shape_excludes_refresh_token() {
        let filters = Filters {
            project_key: Some(ProjectKey::new("shop")),
            from: "2024-01-01".to_string(),
            auto_refresh_enabled: true,
            auto_refresh_interval: RefreshInterval::SixtySeconds,
            refresh_token: 1_700_000_000_000,
            ..Default::default()
        };

        let value = serde_json::to_value(&filters).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "projectKey": "shop",
                "from": "2024-01-01",
                "to": "",
                "eventName": "",
                "userId": "",
                "anonymousId": "",
                "autoRefreshEnabled": true,
                "autoRefreshInterval": 60
            })
        );
    }

    #[test]
    fn test_refresh_token_never_restored() {
        let json = r#"{"projectKey":"shop","refreshToken":99,"autoRefreshInterval":30}"#;
        let filters: Filters = serde_json::from_str(json).unwrap();
        assert_eq!(filters.refresh_token, 0);
        assert_eq!(filters.project_key, Some(ProjectKey::new("shop")));
    }

    #[test]
    fn test_unknown_interval_is_rejected() {
        let json = r#"{"autoRefreshInterval":45}"#;
        assert!(serde_json::from_str::<Filters>(json).is_err());
    }

    #[test]
    fn test_desired_schedule() {
        let mut filters = Filters {
            auto_refresh_enabled: true,
            ..Default::default()
        };
        assert_eq!(filters.desired_schedule(), None);

        filters.project_key = Some(ProjectKey::new("shop"));
        assert_eq!(
            filters.desired_schedule(),
            Some(RefreshInterval::ThirtySeconds)
        );

        filters.auto_refresh_enabled = false;
        assert_eq!(filters.desired_schedule(), None);
    }

    #[test]
    fn test_same_query_ignores_token() {
        let a = Filters {
            refresh_token: 1,
            ..Default::default()
        };
        let b = Filters {
            refresh_token: 2,
            ..Default::default()
        };
        assert!(a.same_query(&b));
        let c = Filters {
            event_name: "signup".to_string(),
            ..Default::default()
        };
        assert!(!a.same_query(&c));
    }
}
