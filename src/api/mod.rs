//! ABC Ledger HTTP API Module
//! REST surface over one token instance: balances, transfers, vesting

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::{ApiToken, AppState};
pub use middleware::start_cleanup_task;
pub use routes::create_router;
pub use types::*;
