use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived availability of a watched listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ListingStatus {
    #[default]
    Unknown,
    Available,
    Unavailable,
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ListingStatus::Unknown => "unknown",
            ListingStatus::Available => "available",
            ListingStatus::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

/// Outcome of a single availability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Verdict {
    Available,
    Unavailable,
}

impl From<Verdict> for ListingStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Available => ListingStatus::Available,
            Verdict::Unavailable => ListingStatus::Unavailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedTarget {
    pub identity: String,
    pub locator: String,
    #[serde(default)]
    pub current_status: ListingStatus,
    #[serde(default)]
    pub last_observed_status: ListingStatus,
    #[serde(default)]
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl WatchedTarget {
    pub fn new(identity: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            locator: locator.into(),
            current_status: ListingStatus::Unknown,
            last_observed_status: ListingStatus::Unknown,
            last_checked_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub added_count: usize,
    pub rejected_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSummary {
    pub total: usize,
    pub available: usize,
    pub unavailable: usize,
    pub unknown: usize,
}
