//! Utilities: HTTP error type, logging, date parsing

pub mod error;
pub mod logger;
pub mod result;
pub mod time;

pub use error::AppError;
pub use result::AppResult;
pub use time::DateRange;
