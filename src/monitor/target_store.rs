//! Durable, insertion-ordered collection of watched targets.

use reqwest::Url;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info};

use super::models::{BatchResult, ListingStatus, TargetSummary, WatchedTarget};
use crate::storage::{self, KvStore, StorageError};

pub const TARGETS_KEY: &str = "targets";

/// Separates identity from locator in batch input.
pub const BATCH_SEPARATOR: char = '|';

#[derive(Error, Debug)]
pub enum TargetError {
    #[error("Target identity must not be empty")]
    EmptyIdentity,
    #[error("Target locator must not be empty")]
    EmptyLocator,
    #[error("Invalid locator '{0}': an https:// URL is required")]
    InvalidLocator(String),
    #[error("A target with identity '{0}' already exists")]
    DuplicateId(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl TargetError {
    /// True for caller mistakes, false for persistence failures.
    pub fn is_validation(&self) -> bool {
        !matches!(self, TargetError::Storage(_))
    }
}

pub struct TargetStore {
    kv: Arc<dyn KvStore>,
    targets: RwLock<Vec<WatchedTarget>>,
}

impl TargetStore {
    /// Loads the persisted target list, starting empty if none was saved yet.
    pub fn open(kv: Arc<dyn KvStore>) -> Result<Self, StorageError> {
        let targets: Vec<WatchedTarget> =
            storage::load_record(kv.as_ref(), TARGETS_KEY)?.unwrap_or_default();
        info!(count = targets.len(), "Loaded watched targets.");
        Ok(Self {
            kv,
            targets: RwLock::new(targets),
        })
    }

    pub fn add(&self, identity: &str, locator: &str) -> Result<(), TargetError> {
        let (identity, locator) = validate_fields(identity, locator)?;
        self.mutate(|targets| {
            if targets.iter().any(|t| t.identity == identity) {
                return Err(TargetError::DuplicateId(identity.to_string()));
            }
            targets.push(WatchedTarget::new(identity, locator));
            Ok(())
        })?;
        info!(identity = %identity, "Target added.");
        Ok(())
    }

    /// Adds every well-formed `identity|locator` line. Bad lines are counted and
    /// skipped. Surrounding whitespace of the whole input is dropped, but a blank
    /// line between records counts as a bad line. Persists once for the whole batch.
    pub fn add_batch(&self, input: &str) -> Result<BatchResult, TargetError> {
        let result = self.mutate(|targets| {
            let mut result = BatchResult::default();
            for line in input.trim().lines() {
                match parse_batch_line(line) {
                    Ok((identity, locator)) if !targets.iter().any(|t| t.identity == identity) => {
                        targets.push(WatchedTarget::new(identity, locator));
                        result.added_count += 1;
                    }
                    Ok((identity, _)) => {
                        debug!(identity = %identity, "Batch line rejected: duplicate identity.");
                        result.rejected_count += 1;
                    }
                    Err(e) => {
                        debug!(line = %line, error = %e, "Batch line rejected.");
                        result.rejected_count += 1;
                    }
                }
            }
            Ok(result)
        })?;
        info!(
            added = result.added_count,
            rejected = result.rejected_count,
            "Batch import finished."
        );
        Ok(result)
    }

    pub fn remove(&self, identity: &str) -> Result<bool, TargetError> {
        let removed = self.mutate(|targets| {
            let before = targets.len();
            targets.retain(|t| t.identity != identity);
            Ok(targets.len() != before)
        })?;
        if removed {
            info!(identity = %identity, "Target removed.");
        }
        Ok(removed)
    }

    /// Removes every present member of `identities` in one persisted write.
    pub fn remove_many<I, S>(&self, identities: I) -> Result<usize, TargetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted: HashSet<String> = identities
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        let removed = self.mutate(|targets| {
            let before = targets.len();
            targets.retain(|t| !wanted.contains(&t.identity));
            Ok(before - targets.len())
        })?;
        info!(removed = removed, requested = wanted.len(), "Targets removed.");
        Ok(removed)
    }

    pub fn list(&self) -> Vec<WatchedTarget> {
        self.read().clone()
    }

    pub fn get(&self, identity: &str) -> Option<WatchedTarget> {
        self.read().iter().find(|t| t.identity == identity).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Applies `mutator` to one target and persists. Returns `Ok(None)` without
    /// writing when the identity is no longer present.
    pub fn update<F, R>(&self, identity: &str, mutator: F) -> Result<Option<R>, TargetError>
    where
        F: FnOnce(&mut WatchedTarget) -> R,
    {
        self.mutate(|targets| {
            Ok(targets
                .iter_mut()
                .find(|t| t.identity == identity)
                .map(mutator))
        })
    }

    pub fn summary(&self) -> TargetSummary {
        let targets = self.read();
        let mut summary = TargetSummary {
            total: targets.len(),
            ..Default::default()
        };
        for target in targets.iter() {
            match target.current_status {
                ListingStatus::Available => summary.available += 1,
                ListingStatus::Unavailable => summary.unavailable += 1,
                ListingStatus::Unknown => summary.unknown += 1,
            }
        }
        summary
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<WatchedTarget>> {
        self.targets.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `f` on a working copy and commits it only if it succeeds and the
    /// copy was persisted. Unchanged copies are not written.
    fn mutate<F, R>(&self, f: F) -> Result<R, TargetError>
    where
        F: FnOnce(&mut Vec<WatchedTarget>) -> Result<R, TargetError>,
    {
        let mut guard = self.targets.write().unwrap_or_else(|e| e.into_inner());
        let mut working = guard.clone();
        let out = f(&mut working)?;
        if working != *guard {
            storage::save_record(self.kv.as_ref(), TARGETS_KEY, &working)?;
            *guard = working;
        }
        Ok(out)
    }
}

fn validate_fields<'a>(identity: &'a str, locator: &'a str) -> Result<(&'a str, &'a str), TargetError> {
    let identity = identity.trim();
    let locator = locator.trim();
    if identity.is_empty() {
        return Err(TargetError::EmptyIdentity);
    }
    if locator.is_empty() {
        return Err(TargetError::EmptyLocator);
    }
    if !is_secure_locator(locator) {
        return Err(TargetError::InvalidLocator(locator.to_string()));
    }
    Ok((identity, locator))
}

fn parse_batch_line(line: &str) -> Result<(&str, &str), TargetError> {
    let mut parts = line.split(BATCH_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(identity), Some(locator), None) => validate_fields(identity, locator),
        _ => Err(TargetError::InvalidLocator(line.trim().to_string())),
    }
}

pub fn is_secure_locator(locator: &str) -> bool {
    match Url::parse(locator) {
        Ok(url) => url.scheme() == "https" && url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileKvStore, MemoryKvStore};
    use tempfile::tempdir;

    fn memory_store() -> TargetStore {
        TargetStore::open(Arc::new(MemoryKvStore::new())).unwrap()
    }

    #[test]
    fn test_add_and_list_in_insertion_order() {
        let store = memory_store();
        store.add("b.app", "https://example.com/b").unwrap();
        store.add("a.app", "https://example.com/a").unwrap();
        let ids: Vec<_> = store.list().into_iter().map(|t| t.identity).collect();
        assert_eq!(ids, vec!["b.app", "a.app"]);
        assert_eq!(store.list()[0].current_status, ListingStatus::Unknown);
        assert!(store.list()[0].last_checked_at.is_none());
    }

    #[test]
    fn test_duplicate_identity_keeps_first_locator() {
        let store = memory_store();
        store.add("pkg.demo.app", "https://example.com/a").unwrap();
        let err = store.add("pkg.demo.app", "https://example.com/b").unwrap_err();
        assert!(matches!(err, TargetError::DuplicateId(ref id) if id == "pkg.demo.app"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].locator, "https://example.com/a");
    }

    #[test]
    fn test_insecure_or_malformed_locators_are_rejected() {
        let store = memory_store();
        for locator in ["http://example.com/a", "ftp://example.com", "example.com", "https://"] {
            let err = store.add("x", locator).unwrap_err();
            assert!(matches!(err, TargetError::InvalidLocator(_)), "{locator}");
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_fields_are_rejected() {
        let store = memory_store();
        assert!(matches!(
            store.add("  ", "https://example.com"),
            Err(TargetError::EmptyIdentity)
        ));
        assert!(matches!(store.add("id", ""), Err(TargetError::EmptyLocator)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_batch_all_well_formed() {
        let store = memory_store();
        let input = "a|https://example.com/a\nb|https://example.com/b\nc | https://example.com/c\n";
        let result = store.add_batch(input).unwrap();
        assert_eq!(result, BatchResult { added_count: 3, rejected_count: 0 });
        assert_eq!(store.get("c").unwrap().locator, "https://example.com/c");
    }

    #[test]
    fn test_batch_with_bad_lines() {
        let store = memory_store();
        store.add("existing", "https://example.com/e").unwrap();
        let input = [
            "a|https://example.com/a",
            "no-separator https://example.com",
            "b|https://example.com/b|extra",
            "c|http://example.com/c",
            "|https://example.com/empty",
            "existing|https://example.com/dup",
            "a|https://example.com/a-again",
            "d|https://example.com/d",
        ]
        .join("\n");
        let result = store.add_batch(&input).unwrap();
        assert_eq!(result, BatchResult { added_count: 2, rejected_count: 6 });
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_batch_blank_interior_lines_are_rejected() {
        let store = memory_store();
        let input = "\n  a|https://example.com/a\n\n   \nb|https://example.com/b\n\n";
        let result = store.add_batch(input).unwrap();
        assert_eq!(result, BatchResult { added_count: 2, rejected_count: 2 });
        assert_eq!(store.len(), 2);

        let result = store.add_batch("  \n\n").unwrap();
        assert_eq!(result, BatchResult::default());
    }

    #[test]
    fn test_remove_many_ignores_absent_and_order() {
        let store = memory_store();
        for id in ["a", "b", "c", "d"] {
            store.add(id, &format!("https://example.com/{id}")).unwrap();
        }
        let removed = store.remove_many(["d", "missing", "b"]).unwrap();
        assert_eq!(removed, 2);
        let ids: Vec<_> = store.list().into_iter().map(|t| t.identity).collect();
        assert_eq!(ids, vec!["a", "c"]);

        assert_eq!(store.remove_many(["b", "zzz"]).unwrap(), 0);
        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
    }

    #[test]
    fn test_update_on_missing_identity_is_noop() {
        let store = memory_store();
        let out = store
            .update("ghost", |t| t.current_status = ListingStatus::Unavailable)
            .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_round_trip_through_file_store() {
        let dir = tempdir().unwrap();
        let kv: Arc<dyn KvStore> = Arc::new(FileKvStore::new(dir.path()).unwrap());
        let store = TargetStore::open(kv.clone()).unwrap();
        store.add("one", "https://example.com/1").unwrap();
        store.add("two", "https://example.com/2").unwrap();
        store
            .update("two", |t| {
                t.last_observed_status = t.current_status;
                t.current_status = ListingStatus::Available;
                t.last_checked_at = Some(chrono::Utc::now());
            })
            .unwrap();

        let reloaded = TargetStore::open(kv).unwrap();
        assert_eq!(reloaded.list(), store.list());
    }

    #[test]
    fn test_summary_counts_statuses() {
        let store = memory_store();
        store.add("a", "https://example.com/a").unwrap();
        store.add("b", "https://example.com/b").unwrap();
        store.add("c", "https://example.com/c").unwrap();
        store.update("a", |t| t.current_status = ListingStatus::Available).unwrap();
        store.update("b", |t| t.current_status = ListingStatus::Unavailable).unwrap();
        let summary = store.summary();
        assert_eq!(
            summary,
            TargetSummary { total: 3, available: 1, unavailable: 1, unknown: 1 }
        );
    }
}
