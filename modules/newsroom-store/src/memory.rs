//! In-memory store for tests and dry runs. Same contract as SQLite, no
//! durability.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::SeenStore;

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    // (key, normalized_text, created_at); insertion order preserved
    records: Vec<(String, String, DateTime<Utc>)>,
    keys: HashSet<String>,
    fingerprints: HashMap<String, DateTime<Utc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of seen records, for test assertions.
    pub fn record_count(&self) -> usize {
        self.inner.lock().unwrap().records.len()
    }

    /// Number of live fingerprints, for test assertions.
    pub fn fingerprint_count(&self) -> usize {
        self.inner.lock().unwrap().fingerprints.len()
    }
}

#[async_trait]
impl SeenStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.inner.lock().unwrap().keys.contains(key))
    }

    async fn recent(&self, cutoff: DateTime<Utc>, limit: u32) -> Result<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<_> = inner
            .records
            .iter()
            .filter(|(_, _, created)| *created >= cutoff)
            .collect();
        rows.sort_by(|a, b| b.2.cmp(&a.2));
        Ok(rows
            .into_iter()
            .take(limit as usize)
            .map(|(_, text, _)| text.clone())
            .collect())
    }

    async fn insert(
        &self,
        key: &str,
        normalized_text: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.keys.insert(key.to_string()) {
            return Ok(());
        }
        inner
            .records
            .push((key.to_string(), normalized_text.to_string(), timestamp));
        Ok(())
    }

    async fn event_seen(&self, fingerprint: &str, cutoff: DateTime<Utc>) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .fingerprints
            .get(fingerprint)
            .map(|last_seen| *last_seen >= cutoff)
            .unwrap_or(false))
    }

    async fn event_touch(&self, fingerprint: &str, timestamp: DateTime<Utc>) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .fingerprints
            .insert(fingerprint.to_string(), timestamp);
        Ok(())
    }

    async fn cleanup_events(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.fingerprints.len();
        inner.fingerprints.retain(|_, last_seen| *last_seen >= cutoff);
        Ok((before - inner.fingerprints.len()) as u64)
    }
}
