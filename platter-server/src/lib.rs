//! Platter Server - online ordering backend
//!
//! # Modules
//!
//! ```text
//! platter-server/src/
//! ├── api/          # HTTP routes and handlers
//! ├── core/         # config, state, server lifecycle
//! ├── db/           # document store abstraction (redb, memory)
//! ├── orders/       # order domain: validation, money, service
//! ├── resilience/   # retry, throttle, batch processing
//! └── utils/        # errors, logging, date parsing
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod orders;
pub mod resilience;
pub mod utils;

pub use crate::core::{Config, Server, ServerState};
pub use orders::{OrderError, OrderService};
pub use utils::{AppError, AppResult};

pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env`, then initialize logging from `LOG_LEVEL` / `LOG_DIR`
pub fn setup_environment() {
    let _ = dotenv::dotenv();
    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty());
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
}

pub fn print_banner() {
    println!(
        r#"
    ____  __      __  __
   / __ \/ /___ _/ /_/ /____  _____
  / /_/ / / __ `/ __/ __/ _ \/ ___/
 / ____/ / /_/ / /_/ /_/  __/ /
/_/   /_/\__,_/\__/\__/\___/_/
    "#
    );
}
