//! Deal submission and review. The deal payload is opaque to the store; the
//! only field this service interprets is the status column, and only on the
//! explicit status-update call.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{visible_rows, EffectiveIdentity};
use crate::error::ApiError;
use crate::handlers::AppState;
use crate::store::columns::deals;
use crate::store::Row;

#[derive(Debug, Deserialize)]
pub struct DealSubmission {
    pub company_name: String,
    #[serde(default)]
    pub company_domain: Option<String>,
    #[serde(default)]
    pub deal_value: Option<String>,
    #[serde(default)]
    pub close_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// GET /api/deals - deals visible to the caller; anonymous callers get an
/// empty list
pub async fn list(
    State(state): State<AppState>,
    identity: Option<Extension<EffectiveIdentity>>,
) -> Result<Json<Value>, ApiError> {
    let rows = state.store.get_all(deals::TABLE).await?;
    let caller = identity.as_ref().map(|Extension(i)| i);
    let visible = visible_rows(rows, caller, deals::OWNER_EMAIL);

    Ok(Json(json!({
        "success": true,
        "data": visible
    })))
}

/// POST /api/deals - submit a deal owned by the caller
pub async fn submit(
    State(state): State<AppState>,
    Extension(identity): Extension<EffectiveIdentity>,
    Json(payload): Json<DealSubmission>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if payload.company_name.trim().is_empty() {
        return Err(ApiError::validation_error("company_name must not be empty"));
    }

    state.store.ensure_header(deals::TABLE, deals::HEADER).await?;

    let id = Uuid::new_v4().to_string();
    let mut row = Row::new();
    row.set(deals::ID, id.as_str())
        .set(deals::STATUS, deals::STATUS_SUBMITTED)
        // Owner email is written verbatim; the ownership filter compares it verbatim
        .set(deals::OWNER_EMAIL, identity.email.as_str())
        .set(deals::COMPANY_NAME, payload.company_name)
        .set(deals::COMPANY_DOMAIN, payload.company_domain.unwrap_or_default())
        .set(deals::DEAL_VALUE, payload.deal_value.unwrap_or_default())
        .set(deals::CLOSE_DATE, payload.close_date.unwrap_or_default())
        .set(deals::NOTES, payload.notes.unwrap_or_default())
        .set(deals::CREATED_AT, chrono::Utc::now().to_rfc3339());

    // Cell order follows the table's live header, not this build's constants
    let header = state.store.header(deals::TABLE).await?;
    state
        .store
        .append(deals::TABLE, row.to_ordered_values(&header))
        .await?;

    let row = state
        .store
        .find_by_column(deals::TABLE, deals::ID, &id)
        .await?
        .ok_or_else(|| ApiError::internal_server_error("deal row not visible after append"))?;

    tracing::info!(deal = %id, owner = %identity.email, "deal submitted");
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": row }))))
}

/// GET /api/deals/:id - one deal, if the caller may see it
pub async fn get_one(
    State(state): State<AppState>,
    Extension(identity): Extension<EffectiveIdentity>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let row = state
        .store
        .find_by_column(deals::TABLE, deals::ID, &id)
        .await?
        .ok_or_else(deal_not_found)?;

    if !caller_may_see(&identity, &row) {
        // Same response as a missing deal; existence is not leaked
        return Err(deal_not_found());
    }

    Ok(Json(json!({ "success": true, "data": row })))
}

/// PUT /api/deals/:id/status - admin review decision
pub async fn update_status(
    State(state): State<AppState>,
    Extension(identity): Extension<EffectiveIdentity>,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdate>,
) -> Result<Json<Value>, ApiError> {
    if !identity.is_admin() {
        return Err(ApiError::forbidden("Admin role required"));
    }
    if !deals::STATUSES.contains(&payload.status.as_str()) {
        return Err(ApiError::validation_error(format!(
            "status must be one of: {}",
            deals::STATUSES.join(", ")
        )));
    }

    // Index-addressed write: resolve the row's position immediately before the
    // update to narrow the window against concurrent appends/deletes
    let (row_index, row) = state
        .store
        .find_position(deals::TABLE, deals::ID, &id)
        .await?
        .ok_or_else(deal_not_found)?;

    let header = state.store.header(deals::TABLE).await?;
    let mut updated = row;
    updated.set(deals::STATUS, payload.status.as_str());
    state
        .store
        .update_row(deals::TABLE, row_index, updated.to_ordered_values(&header))
        .await?;

    tracing::info!(deal = %id, status = %payload.status, reviewer = %identity.email, "deal status updated");
    Ok(Json(json!({ "success": true, "data": updated })))
}

fn caller_may_see(identity: &EffectiveIdentity, row: &Row) -> bool {
    identity.is_admin() || row.get(deals::OWNER_EMAIL) == identity.email
}

fn deal_not_found() -> ApiError {
    ApiError::not_found("Deal not found")
}
