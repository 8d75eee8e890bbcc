//! Platter Client - staff-side access to the Platter order API
//!
//! - [`HttpClient`] - typed calls for every order endpoint
//! - [`sync`] - polling order view with new-order notices

pub mod config;
pub mod error;
pub mod http;
pub mod sync;

pub use config::{ClientConfig, PollConfig};
pub use error::{ClientError, ClientResult};
pub use http::{HealthStatus, HttpClient, ListOptions};
pub use sync::{NewOrderNotice, OrderFeed, OrderPoller, OrderView, StaffRole};

// Re-export shared types for convenience
pub use shared::ApiResponse;
pub use shared::models::{Order, OrderStats, OrderStatus, PaymentStatus};
