//! HTTP API for the OTP service.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::logging_middleware;
pub use types::*;

use crate::provider::AuthKeyClient;
use crate::store::RegistrationStore;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Pending OTP and transaction records
    pub store: Arc<RwLock<RegistrationStore>>,
    /// AuthKey provider client
    pub provider: Arc<AuthKeyClient>,
}

impl AppState {
    /// Create new application state.
    pub fn new(store: RegistrationStore, provider: AuthKeyClient) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            provider: Arc::new(provider),
        }
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/register", post(handlers::register_user))
        .route("/verify-otp", post(handlers::verify_otp))
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
