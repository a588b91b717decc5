//! API layer - HTTP endpoints and middleware

pub mod cache;
pub mod equipment;
pub mod health;
pub mod middleware;
pub mod resources;
pub mod router;
pub mod state;
pub mod types;
pub mod users;

pub use router::{create_router, create_router_with_metrics};
pub use state::AppState;
