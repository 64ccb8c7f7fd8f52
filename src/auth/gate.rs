use serde::Serialize;
use thiserror::Error;

use crate::auth::claims::{self, Claims};
use crate::store::columns::{admins, users, STATUS_ACTIVE, UserRow};
use crate::store::{StoreError, TabularStore};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token")]
    TokenInvalid,

    #[error("token expired")]
    TokenExpired,

    /// The token's user id no longer resolves to a row.
    #[error("user not found")]
    UserNotFound,

    /// The user row exists but is not active.
    #[error("user is not active")]
    UserInactive,

    #[error("JWT secret not configured")]
    SecretMissing,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Caller identity after verification.
///
/// `claimed_role` is the role snapshot embedded in the token, kept for
/// observability only. `effective_role` is recomputed against the admin
/// allowlist on every verification and is the only field authorization
/// decisions may branch on.
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveIdentity {
    pub user_id: String,
    pub email: String,
    pub affiliation: String,
    pub claimed_role: String,
    pub effective_role: String,
}

impl EffectiveIdentity {
    pub fn is_admin(&self) -> bool {
        self.effective_role == ROLE_ADMIN
    }
}

/// Issues session tokens and resolves them back to live identities.
#[derive(Clone)]
pub struct AuthorizationGate {
    store: TabularStore,
}

impl AuthorizationGate {
    pub fn new(store: TabularStore) -> Self {
        Self { store }
    }

    pub fn issue_token(&self, user: &UserRow) -> Result<String, AuthError> {
        claims::issue_token(&Claims::new(user))
    }

    /// Verify a token and resolve the caller's live identity.
    ///
    /// The user row is re-fetched by id and the effective role recomputed from
    /// the allowlist on every call; nothing about authorization is trusted
    /// from the token beyond the user id. If the allowlist table itself cannot
    /// be read, the effective role falls back to the stored role rather than
    /// failing the request (availability over strictness; see DESIGN.md).
    pub async fn verify_and_resolve(&self, token: &str) -> Result<EffectiveIdentity, AuthError> {
        let claims = claims::decode_token(token)?;

        let row = self
            .store
            .find_by_column(users::TABLE, users::ID, &claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        let user = UserRow::from_row(&row);
        if !user.is_active() {
            return Err(AuthError::UserInactive);
        }

        let effective_role = match self.allowlisted(&user.email).await {
            Ok(true) => ROLE_ADMIN.to_string(),
            Ok(false) => user.role.clone(),
            Err(e) => {
                tracing::warn!(
                    email = %user.email,
                    error = %e,
                    "admin allowlist unreadable; falling back to stored role"
                );
                user.role.clone()
            }
        };

        Ok(EffectiveIdentity {
            user_id: user.id,
            email: user.email,
            affiliation: user.affiliation,
            claimed_role: claims.role,
            effective_role,
        })
    }

    /// Tolerant variant for routes that serve both anonymous and identified
    /// callers: any failure, including a missing token, yields no identity.
    pub async fn optional_verify(&self, token: Option<&str>) -> Option<EffectiveIdentity> {
        let token = token?;
        match self.verify_and_resolve(token).await {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::debug!(error = %e, "optional verification yielded no identity");
                None
            }
        }
    }

    /// Pure allowlist check: an active row matching `email` case-insensitively.
    /// Never errors; an absent or unreadable allowlist reads as non-admin.
    pub async fn is_admin(&self, email: &str) -> bool {
        self.allowlisted(email).await.unwrap_or(false)
    }

    async fn allowlisted(&self, email: &str) -> Result<bool, StoreError> {
        let rows = self.store.get_all(admins::TABLE).await?;
        // Admin emails are matched case-insensitively; they are entered by
        // hand in the allowlist sheet. Ownership checks elsewhere stay
        // case-sensitive.
        Ok(rows.iter().any(|row| {
            row.get(admins::EMAIL).eq_ignore_ascii_case(email)
                && row.get(admins::STATUS) == STATUS_ACTIVE
        }))
    }
}
