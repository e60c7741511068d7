//! HTTP adapter over the prediction service

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::create_router_with_state;
pub use state::AppState;
