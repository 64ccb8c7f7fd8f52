pub mod auth;
pub mod deals;

use std::sync::Arc;

use axum::{middleware as axum_middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::AuthorizationGate;
use crate::identity::google::GoogleOAuthClient;
use crate::identity::IdentityResolver;
use crate::middleware::{optional_auth, require_auth};
use crate::store::columns::users;
use crate::store::TabularStore;

/// Shared application state. Everything hangs off the one injected store
/// handle; there are no ambient singletons besides immutable config.
#[derive(Clone)]
pub struct AppState {
    pub store: TabularStore,
    pub identity: Arc<IdentityResolver>,
    pub gate: AuthorizationGate,
    pub oauth: Arc<GoogleOAuthClient>,
}

impl AppState {
    pub fn new(store: TabularStore, oauth: GoogleOAuthClient) -> Self {
        Self {
            identity: Arc::new(IdentityResolver::new(store.clone())),
            gate: AuthorizationGate::new(store.clone()),
            oauth: Arc::new(oauth),
            store,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes
        .merge(auth_public_routes())
        // Protected API
        .merge(api_routes(state.clone()))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use axum::routing::post;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        // OAuth redirect glue
        .route("/auth/google", get(auth::google_redirect))
        .route("/auth/google/callback", get(auth::google_callback))
}

fn api_routes(state: AppState) -> Router<AppState> {
    use axum::routing::{post, put};

    let protected = Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/deals", post(deals::submit))
        .route("/api/deals/:id", get(deals::get_one))
        .route("/api/deals/:id/status", put(deals::update_status))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    // Listing tolerates anonymous callers; the ownership filter gives them an
    // empty subset rather than a 401
    let mixed = Router::new()
        .route("/api/deals", get(deals::list))
        .route_layer(axum_middleware::from_fn_with_state(state, optional_auth));

    protected.merge(mixed)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Deal Registration API",
            "version": version,
            "description": "Partner deal-registration API with spreadsheet-backed persistence",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/register, /auth/login, /auth/google[/callback] (public - token acquisition)",
                "whoami": "/api/auth/whoami (protected)",
                "deals": "/api/deals[/:id] (protected)",
                "review": "/api/deals/:id/status (protected, admin)",
            }
        }
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match state.store.metadata(users::TABLE).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "datastore unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "store_error": e.to_string()
                }
            })),
        ),
    }
}
