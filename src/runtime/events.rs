//! Runtime event stream payloads.

use crate::{
    session::machine::StatusLine,
    types::WinnerId,
    winner::Winner,
};

/// Severity of a transient notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Progress information.
    Info,
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Error,
}

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawEvent {
    /// A transient message; cleared by a later [`DrawEvent::NoticeCleared`].
    Notice {
        /// Severity.
        level: NoticeLevel,
        /// Operator-facing text.
        message: String,
    },
    /// The transient message expired.
    NoticeCleared,
    /// The persistent status line changed.
    Status(StatusLine),
    /// The roster was replaced.
    Imported {
        /// Names loaded.
        count: usize,
    },
    /// Spinning began.
    Started,
    /// One spin tick.
    Display {
        /// Name to render.
        name: String,
    },
    /// A draw finished.
    WinnerRecorded {
        /// The new ledger entry.
        winner: Winner,
    },
    /// A ledger entry was removed.
    WinnerDeleted {
        /// Removed id.
        id: WinnerId,
    },
    /// The last name has been drawn.
    RosterExhausted,
}
