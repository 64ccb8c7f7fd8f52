//! Token acquisition: email/password register and login, OAuth redirect glue,
//! and the authenticated whoami probe.

use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::{Json, Redirect},
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::EffectiveIdentity;
use crate::error::ApiError;
use crate::handlers::AppState;
use crate::identity::{verify_password, ExternalIdentity};
use crate::store::columns::{users, UserRow};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// POST /auth/register - create an account with email/password and receive a token
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if payload.password.is_empty() {
        return Err(ApiError::validation_error("password must not be empty"));
    }

    let identity = ExternalIdentity {
        email: Some(payload.email.clone()),
        given_name: payload.first_name.clone(),
        family_name: payload.last_name.clone(),
        external_id: None,
    };
    let user = state
        .identity
        .register_with_password(&identity, &payload.password)
        .await?;

    // register_with_password returns the existing row when the email is
    // already taken; only a matching password makes the call idempotent
    if !verify_password(&user, &payload.password) {
        return Err(ApiError::conflict("An account with this email already exists"));
    }

    token_response(&state, &user).map(|body| (StatusCode::CREATED, body))
}

/// POST /auth/login - authenticate with email/password and receive a token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let row = state
        .store
        .find_by_column(users::TABLE, users::EMAIL, &payload.email)
        .await?;

    let user = row.as_ref().map(UserRow::from_row);
    match user {
        Some(user) if verify_password(&user, &payload.password) => {
            token_response(&state, &user)
        }
        // Same message for unknown email and wrong password
        _ => Err(ApiError::unauthorized("Invalid email or password")),
    }
}

/// GET /auth/google - send the browser to the provider's consent screen
pub async fn google_redirect(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&state.oauth.authorize_url())
}

/// GET /auth/google/callback - exchange the code, resolve the user, issue a token
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<Value>, ApiError> {
    if let Some(error) = query.error {
        return Err(ApiError::bad_request(format!("provider declined: {error}")));
    }
    let code = query
        .code
        .ok_or_else(|| ApiError::bad_request("missing authorization code"))?;

    let identity = state.oauth.exchange_code(&code).await?;
    let user = state.identity.resolve_or_create(&identity).await?;
    token_response(&state, &user)
}

/// GET /api/auth/whoami - the caller's resolved identity
pub async fn whoami(Extension(identity): Extension<EffectiveIdentity>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": identity
    }))
}

fn token_response(state: &AppState, user: &UserRow) -> Result<Json<Value>, ApiError> {
    if !user.is_active() {
        return Err(ApiError::unauthorized("Not authorized"));
    }
    let token = state.gate.issue_token(user)?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "token": token,
            "user": user
        }
    })))
}
