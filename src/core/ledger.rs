use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local};
use hashbrown::HashSet;
use rand::Rng;
use serde::Deserialize;

use crate::{
    persist::{PersistResult, PersistenceStore},
    types::{AwardTier, WinnerId},
    winner::{ExportRow, Winner},
};

/// Display format for winner timestamps, e.g. `2024/1/5 14:03:22`.
pub const TIME_FORMAT: &str = "%Y/%-m/%-d %H:%M:%S";

/// Persisted entry shape, tolerant of records written by older versions.
#[derive(Debug, Deserialize)]
struct StoredWinner {
    name: String,
    #[serde(default)]
    award: Option<String>,
    #[serde(default)]
    time: String,
    #[serde(default)]
    id: Option<serde_json::Value>,
}

/// Ordered winner history, newest first, persisted wholesale on every change.
pub struct WinnerLedger {
    winners: Vec<Winner>,
    ids: HashSet<WinnerId>,
    store: Box<dyn PersistenceStore>,
    key: String,
}

impl WinnerLedger {
    /// Creates an empty ledger bound to `key` in `store` without reading it.
    pub fn empty(store: Box<dyn PersistenceStore>, key: impl Into<String>) -> Self {
        Self {
            winners: Vec::new(),
            ids: HashSet::new(),
            store,
            key: key.into(),
        }
    }

    /// Loads the ledger stored under `key`.
    ///
    /// Unreadable data resets the ledger to empty and is only logged. Entries
    /// without a usable id get a fresh one and the normalized ledger is
    /// written back immediately.
    pub fn load(store: Box<dyn PersistenceStore>, key: impl Into<String>) -> Self {
        let mut ledger = Self::empty(store, key);

        let raw = match ledger.store.get(&ledger.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return ledger,
            Err(err) => {
                tracing::warn!(key = %ledger.key, error = %err, "failed to read winner ledger");
                return ledger;
            }
        };

        let stored: Vec<StoredWinner> = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(key = %ledger.key, error = %err, "corrupt winner ledger, starting empty");
                return ledger;
            }
        };

        let mut reassigned = 0usize;
        let mut rng = rand::thread_rng();
        for entry in stored {
            let id = match entry.id.as_ref().and_then(serde_json::Value::as_u64) {
                Some(id) if id != 0 && !ledger.ids.contains(&id) => id,
                _ => {
                    reassigned += 1;
                    let seed = now_ms()
                        .saturating_mul(1000)
                        .saturating_add(rng.gen_range(0..1000));
                    ledger.unique_id_from(seed)
                }
            };
            let award = entry.award.as_deref().and_then(|label| match label.parse::<AwardTier>() {
                Ok(tier) => Some(tier),
                Err(err) => {
                    tracing::warn!(error = %err, "dropping unknown award on stored winner");
                    None
                }
            });
            ledger.ids.insert(id);
            ledger.winners.push(Winner {
                name: entry.name,
                award,
                time: entry.time,
                id,
            });
        }

        if reassigned > 0 {
            tracing::info!(reassigned, "assigned ids to stored winners");
        }
        if let Err(err) = ledger.save() {
            tracing::error!(error = %err, "failed to persist normalized winner ledger");
        }
        ledger
    }

    /// Builds a winner drawn at `now` and prepends it.
    ///
    /// The in-memory ledger keeps the winner even if the save fails.
    pub fn record(
        &mut self,
        name: impl Into<String>,
        award: Option<AwardTier>,
        now: DateTime<Local>,
    ) -> (Winner, PersistResult<()>) {
        let id = self.unique_id_from(now.timestamp_millis().max(1) as u64);
        let winner = Winner {
            name: name.into(),
            award,
            time: now.format(TIME_FORMAT).to_string(),
            id,
        };
        let saved = self.append(winner.clone());
        (winner, saved)
    }

    /// Prepends `winner` and rewrites the stored ledger.
    pub fn append(&mut self, winner: Winner) -> PersistResult<()> {
        self.ids.insert(winner.id);
        self.winners.insert(0, winner);
        self.save()
    }

    /// Removes the winner with `id` if present and rewrites the stored ledger.
    ///
    /// Returns whether anything was removed alongside the save outcome.
    pub fn delete_by_id(&mut self, id: WinnerId) -> (bool, PersistResult<()>) {
        let removed = self.ids.remove(&id);
        if removed {
            self.winners.retain(|w| w.id != id);
        }
        (removed, self.save())
    }

    /// Serializes the full ledger and writes it under the ledger key.
    pub fn save(&mut self) -> PersistResult<()> {
        let payload = serde_json::to_string(&self.winners)?;
        self.store.set(&self.key, &payload)
    }

    /// Asks the backing store to make prior writes durable.
    pub fn flush(&mut self) -> PersistResult<()> {
        self.store.flush()
    }

    /// Winners, newest first.
    pub fn all(&self) -> &[Winner] {
        &self.winners
    }

    /// Winner with `id`, if recorded.
    pub fn get(&self, id: WinnerId) -> Option<&Winner> {
        self.winners.iter().find(|w| w.id == id)
    }

    /// Number of recorded winners.
    pub fn len(&self) -> usize {
        self.winners.len()
    }

    /// Returns true when no winners are recorded.
    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }

    /// Rows for a spreadsheet export, newest first.
    pub fn export_rows(&self) -> Vec<ExportRow> {
        self.winners
            .iter()
            .enumerate()
            .map(|(pos, w)| ExportRow::from_winner(pos, w))
            .collect()
    }

    /// Backing store, for inspection.
    pub fn store(&self) -> &dyn PersistenceStore {
        self.store.as_ref()
    }

    /// Storage key the ledger is written under.
    pub fn key(&self) -> &str {
        &self.key
    }

    fn unique_id_from(&self, mut id: WinnerId) -> WinnerId {
        while self.ids.contains(&id) {
            id = id.saturating_add(1);
        }
        id
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
