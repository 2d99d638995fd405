use serde::{Deserialize, Serialize};

use crate::monitor::models::WatchedTarget;
use crate::monitor::scheduler::TargetCheck;

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateTarget {
    pub identity: String,
    pub locator: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RemoveTargets {
    pub identities: Vec<String>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RemovedCount {
    pub removed: usize,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub target: WatchedTarget,
    pub notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_error: Option<String>,
}

impl From<TargetCheck> for CheckResponse {
    fn from(check: TargetCheck) -> Self {
        let (notified, notification_error) = match check.notification {
            Some(Ok(())) => (true, None),
            Some(Err(e)) => (false, Some(e.to_string())),
            None => (false, None),
        };
        Self {
            target: check.target,
            notified,
            notification_error,
        }
    }
}
