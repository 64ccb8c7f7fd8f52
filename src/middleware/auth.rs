use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::handlers::AppState;

/// Authentication middleware: validates the bearer token, resolves the live
/// identity (user row re-fetched, effective role recomputed), and injects
/// [`EffectiveIdentity`](crate::auth::EffectiveIdentity) into request
/// extensions. Rejects the request on any failure.
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing or malformed Authorization header"))?;

    let identity = state.gate.verify_and_resolve(&token).await?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Tolerant variant: a missing or bad token simply means no identity is
/// injected; the request always proceeds.
pub async fn optional_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_bearer_token(&headers);
    if let Some(identity) = state.gate.optional_verify(token.as_deref()).await {
        request.extensions_mut().insert(identity);
    }
    next.run(request).await
}

/// Extract the token from a `Bearer` Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
