//! Single-writer runtime driving a draw session.

/// Runtime event payloads.
pub mod events;
/// Runtime spawn, handle and config.
pub mod handle;
