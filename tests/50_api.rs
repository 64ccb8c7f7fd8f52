mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use dealreg_api::handlers;
use dealreg_api::store::columns::deals;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> (Router, std::sync::Arc<dealreg_api::store::memory::MemoryGrid>) {
    let (state, grid) = common::memory_state();
    (handlers::router(state), grid)
}

async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Result<Request<Body>> {
    request_json("POST", uri, Some(body), token)
}

fn request_json(
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };
    Ok(request)
}

async fn register(app: &Router, email: &str, password: &str) -> Result<String> {
    let (status, body) = send(
        app,
        post_json("/auth/register", json!({ "email": email, "password": password }), None)?,
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "register failed: {status} {body}");
    Ok(body["data"]["token"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn health_reflects_store_reachability() -> Result<()> {
    let (app, grid) = app();

    // No users table yet: degraded
    let (status, body) = send(&app, request_json("GET", "/health", None, None)?).await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["data"]["status"], "degraded");

    common::seed_users(&grid, vec![]).await;
    let (status, body) = send(&app, request_json("GET", "/health", None, None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn register_login_and_whoami_flow() -> Result<()> {
    let (app, _grid) = app();

    let token = register(&app, "pat@cascadepartners.io", "hunter2").await?;

    let (status, body) =
        send(&app, request_json("GET", "/api/auth/whoami", None, Some(&token))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "pat@cascadepartners.io");
    assert_eq!(body["data"]["effective_role"], "user");
    assert_eq!(body["data"]["affiliation"], "Cascade Partners");

    // Fresh login with the same credentials
    let (status, body) = send(
        &app,
        post_json(
            "/auth/login",
            json!({ "email": "pat@cascadepartners.io", "password": "hunter2" }),
            None,
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].as_str().is_some());

    // Wrong password and unknown email produce the same response
    let (status, wrong) = send(
        &app,
        post_json(
            "/auth/login",
            json!({ "email": "pat@cascadepartners.io", "password": "nope" }),
            None,
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, unknown) = send(
        &app,
        post_json("/auth/login", json!({ "email": "ghost@x.com", "password": "nope" }), None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong["message"], unknown["message"]);
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts() -> Result<()> {
    let (app, _grid) = app();
    register(&app, "a@x.com", "first-password").await?;

    let (status, _) = send(
        &app,
        post_json("/auth/register", json!({ "email": "a@x.com", "password": "other" }), None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let (app, grid) = app();
    common::seed_deals(&grid, vec![common::deal_cells("d-1", "submitted", "owner@x.com", "Acme")]).await;

    let (status, _) = send(
        &app,
        post_json("/api/deals", json!({ "company_name": "Acme" }), None)?,
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        send(&app, request_json("GET", "/api/auth/whoami", None, Some("garbage"))?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Listing is tolerant: anonymous and bad-token callers get an empty
    // subset, never the rows and never an error
    for token in [None, Some("garbage")] {
        let (status, body) = send(&app, request_json("GET", "/api/deals", None, token)?).await?;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].as_array().unwrap().is_empty());
    }
    Ok(())
}

#[tokio::test]
async fn deal_submission_and_owner_scoped_listing() -> Result<()> {
    let (app, _grid) = app();
    let owner = register(&app, "owner@x.com", "pw").await?;
    let other = register(&app, "other@x.com", "pw").await?;

    let (status, body) = send(
        &app,
        post_json(
            "/api/deals",
            json!({ "company_name": "Acme", "deal_value": "25000" }),
            Some(&owner),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "submitted");
    assert_eq!(body["data"]["owner_email"], "owner@x.com");
    let deal_id = body["data"]["id"].as_str().unwrap().to_string();

    // Owner sees the deal
    let (status, body) = send(&app, request_json("GET", "/api/deals", None, Some(&owner))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Another user sees an empty list and a 404 on direct fetch
    let (status, body) = send(&app, request_json("GET", "/api/deals", None, Some(&other))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        request_json("GET", &format!("/api/deals/{deal_id}"), None, Some(&other))?,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Empty company name is rejected
    let (status, _) = send(
        &app,
        post_json("/api/deals", json!({ "company_name": "  " }), Some(&owner))?,
    )
    .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn deal_submission_follows_the_live_column_order() -> Result<()> {
    let (app, grid) = app();

    // Deals table from an older deployment with a different column order
    let mut header = deals::HEADER.to_vec();
    header.rotate_left(3);
    grid.seed(deals::TABLE, vec![header.clone()]).await;

    let owner = register(&app, "owner@x.com", "pw").await?;
    let (status, body) = send(
        &app,
        post_json(
            "/api/deals",
            json!({ "company_name": "Acme", "deal_value": "9000" }),
            Some(&owner),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["company_name"], "Acme");
    assert_eq!(body["data"]["owner_email"], "owner@x.com");

    // Cells landed under their named columns in the table's own order
    let snapshot = grid.snapshot(deals::TABLE).await.unwrap();
    let col = |name: &str| header.iter().position(|c| *c == name).unwrap();
    assert_eq!(snapshot[1][col(deals::STATUS)], "submitted");
    assert_eq!(snapshot[1][col(deals::OWNER_EMAIL)], "owner@x.com");
    assert_eq!(snapshot[1][col(deals::COMPANY_NAME)], "Acme");
    assert_eq!(snapshot[1][col(deals::DEAL_VALUE)], "9000");
    Ok(())
}

#[tokio::test]
async fn admin_review_updates_status() -> Result<()> {
    let (app, grid) = app();
    let owner = register(&app, "owner@x.com", "pw").await?;
    let reviewer = register(&app, "reviewer@x.com", "pw").await?;

    let (_, body) = send(
        &app,
        post_json("/api/deals", json!({ "company_name": "Acme" }), Some(&owner))?,
    )
    .await?;
    let deal_id = body["data"]["id"].as_str().unwrap().to_string();

    // Not yet an admin
    let (status, _) = send(
        &app,
        request_json(
            "PUT",
            &format!("/api/deals/{deal_id}/status"),
            Some(json!({ "status": "approved" })),
            Some(&reviewer),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Allowlist the reviewer; the already-issued token picks up admin
    common::seed_admins(&grid, vec![vec!["Reviewer@X.com", "active"]]).await;

    let (status, _) = send(
        &app,
        request_json(
            "PUT",
            &format!("/api/deals/{deal_id}/status"),
            Some(json!({ "status": "not-a-status" })),
            Some(&reviewer),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &app,
        request_json(
            "PUT",
            &format!("/api/deals/{deal_id}/status"),
            Some(json!({ "status": "approved" })),
            Some(&reviewer),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "approved");

    // Admin also sees everyone's deals
    let (status, body) =
        send(&app, request_json("GET", "/api/deals", None, Some(&reviewer))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["status"], "approved");
    Ok(())
}
