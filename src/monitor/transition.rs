//! Edge-triggered availability state machine.
//!
//! | previous status | Available         | Unavailable        |
//! |-----------------|-------------------|--------------------|
//! | Unknown         | Available, quiet  | Unavailable, notify|
//! | Available       | Available, quiet  | Unavailable, notify|
//! | Unavailable     | Available, quiet  | Unavailable, quiet |

use chrono::{DateTime, Utc};

use super::models::{ListingStatus, Verdict, WatchedTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub previous: ListingStatus,
    pub current: ListingStatus,
    pub notify: bool,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Derives the next status for `previous` given `verdict`, without touching any target.
pub fn derive(previous: ListingStatus, verdict: Verdict) -> (ListingStatus, bool) {
    let next = ListingStatus::from(verdict);
    let notify = next == ListingStatus::Unavailable && previous != ListingStatus::Unavailable;
    (next, notify)
}

/// Records `verdict` on `target`. The caller decides what to do with `notify`.
pub fn apply(target: &mut WatchedTarget, verdict: Verdict, now: DateTime<Utc>) -> Transition {
    let previous = target.current_status;
    let (current, notify) = derive(previous, verdict);
    target.last_observed_status = previous;
    target.current_status = current;
    target.last_checked_at = Some(now);
    Transition {
        previous,
        current,
        notify,
    }
}
