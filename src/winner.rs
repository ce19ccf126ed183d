//! Winner records and export rows.

use serde::{Deserialize, Serialize};

use crate::types::{AwardTier, WinnerId};

/// One recorded draw result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    /// Name that was drawn.
    pub name: String,
    /// Award the draw was run under, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub award: Option<AwardTier>,
    /// Display-formatted local creation time.
    pub time: String,
    /// Unique id within the ledger.
    pub id: WinnerId,
}

/// One row of a winner-history export, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    /// 1-based display position (newest first).
    pub index: usize,
    /// Winner name.
    pub name: String,
    /// Award label, if the draw had one.
    pub award: Option<&'static str>,
    /// Display-formatted creation time.
    pub time: String,
}

impl ExportRow {
    /// Builds the export row for `winner` at 0-based display position `pos`.
    pub fn from_winner(pos: usize, winner: &Winner) -> Self {
        Self {
            index: pos + 1,
            name: winner.name.clone(),
            award: winner.award.map(AwardTier::label),
            time: winner.time.clone(),
        }
    }
}
