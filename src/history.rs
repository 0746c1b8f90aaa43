// Capped, newest-first history of generations

use crate::error::Result;
use crate::payload::PayloadKind;
use crate::store::KeyValueStore;
use crate::style::StyleConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key holding the serialized history list
pub const STORAGE_KEY: &str = "qrsmith_history";
/// Entries kept; older ones are dropped silently
pub const MAX_HISTORY: usize = 50;
/// Characters of payload shown in listings
pub const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: PayloadKind,
    pub data: String,
    /// Snapshot of the style at save time
    #[serde(rename = "config")]
    pub style: StyleConfig,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Payload shortened for listings, with `...` when cut
    pub fn preview(&self) -> String {
        if self.data.chars().count() > PREVIEW_CHARS {
            let head: String = self.data.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            self.data.clone()
        }
    }
}

/// History list persisted as one JSON array under [`STORAGE_KEY`]
pub struct History<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> History<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All entries, newest first. Missing or unreadable data reads as empty.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        let raw = match self.store.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("History unavailable, starting empty: {}", e);
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("History is corrupt, starting empty: {}", e);
                Vec::new()
            }
        }
    }

    pub fn find(&self, id: i64) -> Option<HistoryEntry> {
        self.entries().into_iter().find(|e| e.id == id)
    }

    /// Record a generation at the current time
    pub fn record(
        &mut self,
        kind: PayloadKind,
        data: &str,
        style: &StyleConfig,
    ) -> Result<HistoryEntry> {
        self.record_at(kind, data, style, Utc::now())
    }

    /// Record a generation at `now`.
    ///
    /// Ids are millisecond timestamps, bumped past the newest stored id so
    /// they stay strictly increasing. On a storage error the stored list
    /// is left as it was.
    pub fn record_at(
        &mut self,
        kind: PayloadKind,
        data: &str,
        style: &StyleConfig,
        now: DateTime<Utc>,
    ) -> Result<HistoryEntry> {
        let mut entries = self.entries();
        let newest = entries.iter().map(|e| e.id).max();
        let id = match newest {
            Some(newest) => now.timestamp_millis().max(newest + 1),
            None => now.timestamp_millis(),
        };

        let entry = HistoryEntry {
            id,
            kind,
            data: data.to_string(),
            style: style.clone(),
            created_at: now,
        };
        entries.insert(0, entry.clone());
        entries.truncate(MAX_HISTORY);

        self.persist(&entries)?;
        log::info!("Saved {} entry {} to history", kind, id);
        Ok(entry)
    }

    /// Remove one entry; returns whether it existed
    pub fn delete(&mut self, id: i64) -> Result<bool> {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.persist(&entries)?;
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(STORAGE_KEY)
    }

    fn persist(&mut self, entries: &[HistoryEntry]) -> Result<()> {
        let json = serde_json::to_string(entries)?;
        self.store.set(STORAGE_KEY, &json)
    }
}

/// Human-readable age of an entry relative to `now`
pub fn describe_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created_at).num_seconds();
    if seconds < 60 {
        "Just now".to_string()
    } else if seconds < 3600 {
        format!("{} minutes ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{} hours ago", seconds / 3600)
    } else if seconds < 604800 {
        format!("{} days ago", seconds / 86400)
    } else {
        created_at.format("%Y-%m-%d").to_string()
    }
}
