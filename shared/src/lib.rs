//! Shared types for the Platter ordering platform
//!
//! Order model, request DTOs and the response envelope used by both the
//! server and the staff-facing clients.

pub mod models;
pub mod response;

// Re-exports
pub use models::{
    CancelOrderRequest, Customer, CreateOrderRequest, BulkStatusRequest, Order, OrderItem,
    OrderItemInput, OrderStats, OrderStatus, ParseEnumError, PaymentMethod, PaymentStatus,
    UpdatePaymentRequest, UpdateStatusRequest,
};
pub use response::ApiResponse;
pub use serde::{Deserialize, Serialize};
