//! Score persistence for finished matches.

use crate::match_state::ResultRecord;
use crate::player::Identity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// History entries kept per user, newest first
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Receives one record per seated identity when a match ends.
pub trait ScoreStore: Send {
    fn record_result(&mut self, identity: &Identity, record: &ResultRecord)
        -> Result<(), StoreError>;
}

/// Keeps every record in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub records: Vec<(Identity, ResultRecord)>,
}

impl ScoreStore for MemoryStore {
    fn record_result(
        &mut self,
        identity: &Identity,
        record: &ResultRecord,
    ) -> Result<(), StoreError> {
        self.records.push((identity.clone(), record.clone()));
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub played: u32,
    pub wins: u32,
    pub streak: u32,
    pub max_streak: u32,
}

impl GameStats {
    fn record(&mut self, is_win: bool) {
        self.played += 1;
        if is_win {
            self.wins += 1;
            self.streak += 1;
            self.max_streak = self.max_streak.max(self.streak);
        } else {
            self.streak = 0;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub mode: String,
    pub points: i64,
    /// "WIN" or "LOSS"
    pub result: String,
    /// Unix milliseconds
    pub timestamp: u64,
    pub details: ResultRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    pub score: i64,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub stats: BTreeMap<String, GameStats>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl StoredUser {
    fn apply(&mut self, record: &ResultRecord, timestamp: u64) {
        self.score = (self.score + record.points_delta).max(0);

        let mode = record.mode_tag().to_string();
        self.stats.entry(mode.clone()).or_default().record(record.is_win);

        self.history.insert(
            0,
            HistoryEntry {
                mode,
                points: record.points_delta,
                result: if record.is_win { "WIN" } else { "LOSS" }.to_string(),
                timestamp,
                details: record.clone(),
            },
        );
        self.history.truncate(HISTORY_LIMIT);
    }
}

/// The whole score document, users keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBook {
    pub users: BTreeMap<String, StoredUser>,
}

/// Keeps the score document in a single JSON file, rewritten on every
/// result.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    book: ScoreBook,
}

impl JsonFileStore {
    /// Open (or start) the document at `path`. A missing file is an empty
    /// book.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let book = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ScoreBook::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, book })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn book(&self) -> &ScoreBook {
        &self.book
    }

    pub fn user(&self, name: &str) -> Option<&StoredUser> {
        self.book.users.get(name)
    }

    fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.book)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ScoreStore for JsonFileStore {
    fn record_result(
        &mut self,
        identity: &Identity,
        record: &ResultRecord,
    ) -> Result<(), StoreError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let user = self.book.users.entry(identity.name.clone()).or_default();
        if identity.avatar.is_some() {
            user.avatar = identity.avatar.clone();
        }
        user.apply(record, timestamp);
        self.save()
    }
}
