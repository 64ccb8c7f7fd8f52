#![allow(dead_code)]

use std::sync::Arc;

use dealreg_api::config;
use dealreg_api::handlers::AppState;
use dealreg_api::identity::google::GoogleOAuthClient;
use dealreg_api::store::columns::{admins, deals, users};
use dealreg_api::store::memory::MemoryGrid;
use dealreg_api::store::TabularStore;

/// App state wired to a fresh in-memory grid. The grid handle is returned so
/// tests can seed tables and simulate outages.
pub fn memory_state() -> (AppState, Arc<MemoryGrid>) {
    let grid = MemoryGrid::new();
    let store = TabularStore::new(grid.clone());
    let oauth = GoogleOAuthClient::new(config::config().oauth.clone());
    (AppState::new(store, oauth), grid)
}

pub fn memory_store() -> (TabularStore, Arc<MemoryGrid>) {
    let grid = MemoryGrid::new();
    (TabularStore::new(grid.clone()), grid)
}

pub async fn seed_users(grid: &MemoryGrid, rows: Vec<Vec<&str>>) {
    let mut all = vec![users::HEADER.to_vec()];
    all.extend(rows);
    grid.seed(users::TABLE, all).await;
}

pub async fn seed_admins(grid: &MemoryGrid, rows: Vec<Vec<&str>>) {
    let mut all = vec![admins::HEADER.to_vec()];
    all.extend(rows);
    grid.seed(admins::TABLE, all).await;
}

pub async fn seed_deals(grid: &MemoryGrid, rows: Vec<Vec<&str>>) {
    let mut all = vec![deals::HEADER.to_vec()];
    all.extend(rows);
    grid.seed(deals::TABLE, all).await;
}

/// A complete users-table row in header order.
pub fn user_cells<'a>(
    id: &'a str,
    email: &'a str,
    role: &'a str,
    status: &'a str,
    password_hash: &'a str,
) -> Vec<&'a str> {
    vec![
        id,
        email,
        "Pat",
        "Example",
        "external",
        role,
        status,
        password_hash,
        "2026-01-01T00:00:00Z",
    ]
}

/// A complete deals-table row in header order.
pub fn deal_cells<'a>(id: &'a str, status: &'a str, owner: &'a str, company: &'a str) -> Vec<&'a str> {
    vec![id, status, owner, company, "", "", "", "", "2026-01-01T00:00:00Z"]
}
