//! CEMS API Server
//!
//! Main entry point for the expense management backend.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cems_api::{AppState, create_router};
use cems_db::connect;
use cems_gateway::{NoopGateway, PayMongoClient, PaymentGateway};
use cems_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cems=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Select the payment gateway: the real client when a secret key is
    // configured, otherwise a no-op that surfaces a clear error on use.
    let gateway: Arc<dyn PaymentGateway> = if config.paymongo.is_configured() {
        info!(base_url = %config.paymongo.base_url, "Payment gateway configured");
        Arc::new(PayMongoClient::new(
            config.paymongo.secret_key.clone(),
            config.paymongo.base_url.clone(),
        ))
    } else {
        warn!(
            "paymongo.secret_key is not configured; payments are disabled. \
             Set CEMS__PAYMONGO__SECRET_KEY to enable reimbursement checkout."
        );
        Arc::new(NoopGateway)
    };

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        gateway,
        config: Arc::new(config.clone()),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
