//! Data models
//!
//! Shared between platter-server and the staff clients (via API).
//! JSON field names are camelCase on the wire.

pub mod order;

// Re-exports
pub use order::*;
