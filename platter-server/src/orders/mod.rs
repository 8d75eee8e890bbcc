//! Order domain
//!
//! - **money**: totals derived with `rust_decimal`
//! - **validator**: structural checks, all violations reported at once
//! - **repository**: `Order` <-> document mapping over the resilient store
//! - **service**: creation, status/payment updates, cancellation, statistics
//!
//! ```text
//! HTTP handler → OrderService → OrderRepository → ResilientAccess → DocumentStore
//! ```

pub mod error;
pub mod money;
pub mod repository;
pub mod service;
mod stats;
pub mod validator;

#[cfg(test)]
mod tests;

pub use error::{OrderError, OrderResult};
pub use money::PricingPolicy;
pub use repository::{OrderQuery, OrderRepository, ORDERS_COLLECTION};
pub use service::{Clock, OrderService};
