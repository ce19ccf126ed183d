//! Name-drawing sessions with a persisted, wholesale-rewritten winner ledger.
//!
//! # Examples
//!
//! Synchronous usage with [`session::machine::DrawSession`]:
//! ```
//! use drawlog::{
//!     config::SessionConfig,
//!     core::{extract::SheetRow, ledger::WinnerLedger},
//!     persist::memory::MemoryStore,
//!     session::machine::DrawSession,
//! };
//!
//! let cfg = SessionConfig::default();
//! let ledger = WinnerLedger::load(Box::new(MemoryStore::new()), cfg.storage_key.clone());
//! let mut session = DrawSession::new(ledger, &cfg);
//!
//! let rows: Vec<SheetRow> = ["甲", "乙", "丙"]
//!     .into_iter()
//!     .map(|n| SheetRow::new().with_field("姓名", n))
//!     .collect();
//! assert_eq!(session.import_rows(&rows).expect("import"), 3);
//!
//! assert!(session.start());
//! session.tick();
//! let winner = session.stop().expect("winner");
//! assert_eq!(session.roster().len(), 2);
//! assert_eq!(session.ledger().all()[0].id, winner.id);
//! ```
//!
//! Runtime usage with a SQLite-backed ledger:
//! ```no_run
//! use drawlog::{
//!     config::SessionConfig,
//!     core::ledger::WinnerLedger,
//!     import::{ImportError, SheetRow, SpreadsheetAdapter},
//!     persist::sqlite::SqliteStore,
//!     runtime::handle::spawn_draw_session,
//!     session::machine::DrawSession,
//!     winner::ExportRow,
//! };
//!
//! struct Workbooks;
//!
//! impl SpreadsheetAdapter for Workbooks {
//!     fn parse_rows(&self, _bytes: &[u8]) -> Result<Vec<SheetRow>, ImportError> {
//!         Ok(vec![SheetRow::new().with_field("name", "K1ABC")])
//!     }
//!     fn write_workbook(&self, _rows: &[ExportRow]) -> Result<Vec<u8>, ImportError> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let cfg = SessionConfig::default();
//! let store = SqliteStore::open("drawlog.db").expect("open sqlite");
//! let ledger = WinnerLedger::load(Box::new(store), cfg.storage_key.clone());
//! let handle = spawn_draw_session(DrawSession::new(ledger, &cfg), Box::new(Workbooks), &cfg);
//!
//! handle.import_file(Some("names.xlsx".into()), Vec::new()).await.expect("import");
//! handle.start().await.expect("start");
//! let winner = handle.stop().await.expect("stop");
//! println!("{winner:?}");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![warn(missing_docs)]

/// Session and runtime configuration.
pub mod config;
/// Roster, ledger and name extraction.
pub mod core;
/// Spreadsheet collaborator interface and upload policy.
pub mod import;
/// Key-value persistence abstraction and implementations.
pub mod persist;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Draw session state machine.
pub mod session;
/// Shared primitive types and enums.
pub mod types;
/// Winner records and export rows.
pub mod winner;
