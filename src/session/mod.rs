//! Draw session state machine.

/// Roster/ledger coordination through one draw cycle.
pub mod machine;
