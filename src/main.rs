use std::sync::Arc;

use dealreg_api::config;
use dealreg_api::handlers::{self, AppState};
use dealreg_api::identity::google::GoogleOAuthClient;
use dealreg_api::store::sheets::SheetsClient;
use dealreg_api::store::TabularStore;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up spreadsheet and JWT settings
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting deal registration API in {:?} mode", config.environment);

    // Explicit connect step: a ready store handle or a startup failure,
    // never a lazily-materialized ambient client
    let sheets = SheetsClient::connect(&config.store)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to backing store: {}", e));
    let store = TabularStore::new(Arc::new(sheets));

    let state = AppState::new(store, GoogleOAuthClient::new(config.oauth.clone()));
    let app = handlers::router(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
