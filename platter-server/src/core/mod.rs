//! Server configuration, state and lifecycle
//!
//! - [`Config`] - environment-driven configuration
//! - [`ServerState`] - shared state handed to handlers
//! - [`Server`] - HTTP server
//! - [`ServerError`] - startup errors

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::{Config, StoreBackend};
pub use error::{Result, ServerError};
pub use server::{Server, serve};
pub use state::ServerState;
