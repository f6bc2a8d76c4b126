//! AuthKey OTP service - Entry point.

use authkey_otp::{
    api::{create_router, AppState},
    AuthKeyClient, Config, RegistrationStore,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AuthKey OTP service");

    if config.sid.is_none() {
        warn!("SID not set, registrations will fail until it is configured");
    }
    if config.authkey.is_none() {
        warn!("AUTHKEY not set, provider calls will fail until it is configured");
    }

    let ttl = config.otp.ttl();
    match ttl {
        Some(ttl) => info!(?ttl, "Pending OTPs expire"),
        None => info!("Pending OTPs never expire"),
    }
    let store = RegistrationStore::with_ttl(ttl);

    let provider = match AuthKeyClient::from_config(&config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create AuthKey client: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState::new(store, provider);
    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::new(
        config.server.listen_addr.parse().unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
