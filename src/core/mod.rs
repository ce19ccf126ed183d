//! In-memory roster, winner ledger and name extraction.

/// Spreadsheet row model and name extraction.
pub mod extract;
/// Winner history with wholesale persistence.
pub mod ledger;
/// Pool of drawable names.
pub mod roster;
