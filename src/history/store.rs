//! Capacity-bounded exploration history
//!
//! The store keeps records newest first and loads itself lazily from the
//! [`HISTORY_KEY`] slot on first access. Every mutating operation writes the
//! whole collection back before returning.
//!
//! Ordering: timestamp descending, ties broken by insertion recency (the most
//! recently inserted record comes first). Merged records rank after records
//! already stored when timestamps are equal, so a record evicted by one merge
//! loses the same tie when the merge is repeated. Capacity is enforced once,
//! after sorting, by dropping the tail.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::history::codec;
use crate::history::record::HistoryRecord;
use crate::storage::{KeyValueStore, HISTORY_KEY};

/// Maximum number of records kept
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// Counts reported by merge and bulk import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Records decoded, inserted and still present after capacity is applied
    pub accepted: usize,
    /// Records whose id was already present
    pub duplicates: usize,
    /// Records that failed to decode
    pub malformed: usize,
    /// Records dropped by the capacity bound after combining, whether
    /// previously stored or newly offered
    pub evicted: usize,
}

impl ImportReport {
    pub fn skipped(&self) -> usize {
        self.duplicates + self.malformed
    }
}

/// The single history collection of a client instance
pub struct HistoryStore {
    kv: Box<dyn KeyValueStore>,
    /// `None` until first access
    records: Option<Vec<HistoryRecord>>,
    load_skipped: usize,
    degraded: Option<String>,
}

impl HistoryStore {
    pub fn new(kv: impl KeyValueStore + 'static) -> Self {
        Self {
            kv: Box::new(kv),
            records: None,
            load_skipped: 0,
            degraded: None,
        }
    }

    fn entries(&mut self) -> &mut Vec<HistoryRecord> {
        if self.records.is_none() {
            let loaded = self.read_persisted();
            self.records = Some(loaded);
        }
        self.records.get_or_insert_with(Vec::new)
    }

    fn read_persisted(&mut self) -> Vec<HistoryRecord> {
        let blob = match self.kv.get(HISTORY_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "History store unreadable, continuing without persistence"
                );
                self.degraded = Some(e.to_string());
                return Vec::new();
            }
        };

        let values = match serde_json::from_str::<Value>(&blob) {
            Ok(Value::Array(values)) => values,
            Ok(_) => {
                tracing::warn!("Stored history is not an array, starting empty");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored history is corrupt, starting empty");
                return Vec::new();
            }
        };

        let batch = codec::decode_batch(&values);
        let mut seen = HashSet::new();
        let mut records: Vec<HistoryRecord> = batch
            .records
            .into_iter()
            .filter(|r| seen.insert(r.id().to_string()))
            .collect();
        self.load_skipped = values.len() - records.len();
        sort_records(&mut records);
        records.truncate(MAX_HISTORY_ENTRIES);

        if self.load_skipped > 0 {
            tracing::warn!(
                skipped = self.load_skipped,
                loaded = records.len(),
                "Dropped unreadable history records on load"
            );
        }
        records
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(reason) = &self.degraded {
            tracing::debug!(reason = %reason, "Skipping history flush in degraded mode");
            return Ok(());
        }

        let records = self.records.as_deref().unwrap_or(&[]);
        let blob = codec::encode_all(records)?.to_string();
        if let Err(e) = self.kv.set(HISTORY_KEY, &blob) {
            tracing::warn!(
                error = %e,
                "Failed to persist history, continuing in memory only"
            );
            let reason = e.to_string();
            self.degraded = Some(reason.clone());
            return Err(Error::PersistenceUnavailable(reason));
        }
        Ok(())
    }

    /// Insert a record, returning the store size afterwards.
    ///
    /// A record with an id already present replaces the stored one. When the
    /// store is full the oldest records are evicted.
    pub fn add(&mut self, record: HistoryRecord) -> Result<usize> {
        let entries = self.entries();
        entries.retain(|r| r.id() != record.id());
        entries.insert(0, record);
        sort_records(entries);
        let evicted = truncate(entries);
        let len = entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted oldest history records");
        }

        self.flush()?;
        Ok(len)
    }

    /// Delete a record. Returns `false` if the id was not stored.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let entries = self.entries();
        let Some(idx) = entries.iter().position(|r| r.id() == id) else {
            return Ok(false);
        };
        entries.remove(idx);
        self.flush()?;
        Ok(true)
    }

    /// Remove every record. Confirmation is the caller's job.
    pub fn clear(&mut self) -> Result<()> {
        let entries = self.entries();
        let count = entries.len();
        entries.clear();
        tracing::info!(count, "Cleared history");
        self.flush()
    }

    /// Records in store order. Each call reads the current state.
    pub fn list(&mut self) -> impl Iterator<Item = &HistoryRecord> + '_ {
        self.entries().iter()
    }

    /// The `count` newest records
    pub fn recent(&mut self, count: usize) -> &[HistoryRecord] {
        let entries = self.entries();
        let end = count.min(entries.len());
        &entries[..end]
    }

    pub fn get(&mut self, id: &str) -> Option<&HistoryRecord> {
        self.entries().iter().find(|r| r.id() == id)
    }

    pub fn len(&mut self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.entries().is_empty()
    }

    /// Records dropped while loading the persisted blob
    pub fn load_skipped(&mut self) -> usize {
        self.entries();
        self.load_skipped
    }

    /// Why the store stopped persisting, if it did
    pub fn degraded_reason(&self) -> Option<&str> {
        self.degraded.as_deref()
    }

    /// Reconcile an externally supplied record set with the local one.
    ///
    /// Values whose id is already stored are skipped without decoding.
    /// Capacity is applied once, after the accepted records have been combined
    /// with the local ones and sorted. Repeating a merge changes nothing, and
    /// nothing is written when the stored ids come out unchanged.
    pub fn merge_import(&mut self, remote: &[Value]) -> Result<ImportReport> {
        let entries = self.entries();
        let mut seen: HashSet<String> = entries.iter().map(|r| r.id().to_string()).collect();
        let mut report = ImportReport::default();
        let mut candidates = Vec::new();

        for value in remote {
            if let Some(id) = value.get("id").and_then(Value::as_str) {
                if seen.contains(id) {
                    report.duplicates += 1;
                    continue;
                }
            }
            match codec::decode(value) {
                Ok(record) => {
                    seen.insert(record.id().to_string());
                    candidates.push(record);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping malformed imported record");
                    report.malformed += 1;
                }
            }
        }

        if candidates.is_empty() {
            return Ok(report);
        }

        let before: Vec<String> = entries.iter().map(|r| r.id().to_string()).collect();
        let offered: HashSet<String> = candidates.iter().map(|r| r.id().to_string()).collect();

        // Later candidates count as more recently inserted among themselves;
        // all of them stay behind stored records on equal timestamps.
        candidates.reverse();
        let mut combined = std::mem::take(entries);
        combined.append(&mut candidates);
        sort_records(&mut combined);
        report.evicted = truncate(&mut combined);
        report.accepted = combined
            .iter()
            .filter(|r| offered.contains(r.id()))
            .count();

        let unchanged = combined.len() == before.len()
            && combined.iter().zip(&before).all(|(r, id)| r.id() == id);
        *entries = combined;

        tracing::info!(
            accepted = report.accepted,
            duplicates = report.duplicates,
            malformed = report.malformed,
            evicted = report.evicted,
            "Merged history records"
        );
        if unchanged {
            return Ok(report);
        }
        self.flush()?;
        Ok(report)
    }

    /// Import a user-supplied file.
    ///
    /// Accepts a JSON array of records or an object with an `entries` array
    /// (the server's history listing).
    pub fn import_bulk(&mut self, payload: &str) -> Result<ImportReport> {
        let parsed: Value = serde_json::from_str(payload)
            .map_err(|e| Error::ImportFormat(format!("not valid JSON: {}", e)))?;

        let items = match parsed {
            Value::Array(items) => items,
            Value::Object(mut obj) => match obj.remove("entries") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(Error::ImportFormat(
                        "expected an array of records or an object with an `entries` array".into(),
                    ))
                }
            },
            _ => {
                return Err(Error::ImportFormat(
                    "expected an array of records".into(),
                ))
            }
        };

        self.merge_import(&items)
    }
}

fn sort_records(records: &mut [HistoryRecord]) {
    // Stable sort keeps earlier (more recently inserted) records first on ties.
    records.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
}

fn truncate(records: &mut Vec<HistoryRecord>) -> usize {
    let evicted = records.len().saturating_sub(MAX_HISTORY_ENTRIES);
    records.truncate(MAX_HISTORY_ENTRIES);
    evicted
}
