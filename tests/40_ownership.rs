mod common;

use anyhow::Result;
use dealreg_api::auth::{visible_rows, AuthorizationGate};
use dealreg_api::store::columns::{deals, UserRow};

fn user(id: &str, email: &str) -> UserRow {
    UserRow {
        id: id.to_string(),
        email: email.to_string(),
        first_name: String::new(),
        last_name: String::new(),
        affiliation: "external".to_string(),
        role: "user".to_string(),
        status: "active".to_string(),
        password_hash: String::new(),
        created_at: String::new(),
    }
}

/// End-to-end visibility: rows read through the store, identities resolved
/// through the gate.
#[tokio::test]
async fn owners_see_their_deals_admins_see_everything() -> Result<()> {
    let (store, grid) = common::memory_store();
    common::seed_users(
        &grid,
        vec![
            common::user_cells("u-1", "owner@x.com", "user", "active", ""),
            common::user_cells("u-2", "reviewer@x.com", "user", "active", ""),
        ],
    )
    .await;
    common::seed_admins(&grid, vec![vec!["reviewer@x.com", "active"]]).await;
    common::seed_deals(
        &grid,
        vec![
            common::deal_cells("d-1", "submitted", "owner@x.com", "Acme"),
            common::deal_cells("d-2", "approved", "someone@else.com", "Globex"),
            common::deal_cells("d-3", "submitted", "owner@x.com", "Initech"),
        ],
    )
    .await;
    let gate = AuthorizationGate::new(store.clone());

    let owner_token = gate.issue_token(&user("u-1", "owner@x.com"))?;
    let owner = gate.verify_and_resolve(&owner_token).await?;
    let admin_token = gate.issue_token(&user("u-2", "reviewer@x.com"))?;
    let admin = gate.verify_and_resolve(&admin_token).await?;

    let rows = store.get_all(deals::TABLE).await?;

    // Admin: identity subset, order preserved
    let all = visible_rows(rows.clone(), Some(&admin), deals::OWNER_EMAIL);
    assert_eq!(all, rows);

    // Owner: exactly the rows whose owner column matches, in table order
    let own = visible_rows(rows.clone(), Some(&owner), deals::OWNER_EMAIL);
    assert_eq!(own.len(), 2);
    assert_eq!(own[0].get(deals::ID), "d-1");
    assert_eq!(own[1].get(deals::ID), "d-3");

    // Anonymous: nothing
    assert!(visible_rows(rows, None, deals::OWNER_EMAIL).is_empty());
    Ok(())
}

#[tokio::test]
async fn ownership_comparison_is_verbatim() -> Result<()> {
    let (store, grid) = common::memory_store();
    common::seed_users(&grid, vec![common::user_cells("u-1", "owner@x.com", "user", "active", "")]).await;
    common::seed_deals(
        &grid,
        // Owner column stored with different casing than the account email
        vec![common::deal_cells("d-1", "submitted", "Owner@X.com", "Acme")],
    )
    .await;
    let gate = AuthorizationGate::new(store.clone());

    let token = gate.issue_token(&user("u-1", "owner@x.com"))?;
    let caller = gate.verify_and_resolve(&token).await?;

    let rows = store.get_all(deals::TABLE).await?;
    // Case-sensitive match: the differently-cased owner cell is not visible
    assert!(visible_rows(rows, Some(&caller), deals::OWNER_EMAIL).is_empty());
    Ok(())
}
