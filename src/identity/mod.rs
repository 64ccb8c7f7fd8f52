pub mod google;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::auth::gate::ROLE_USER;
use crate::store::columns::{users, STATUS_ACTIVE, UserRow};
use crate::store::{Row, StoreError, TabularStore};

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The upstream provider asserted an identity without an email address.
    /// Fatal to the login attempt.
    #[error("identity assertion is missing an email address")]
    MissingEmail,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What an external login yields, whether from the OAuth provider or the
/// password form. Email is the only field the resolver requires.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalIdentity {
    pub email: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub external_id: Option<String>,
}

/// Known partner organizations, keyed by email domain. Unmatched domains fall
/// through to [`AFFILIATION_EXTERNAL`].
const DOMAIN_AFFILIATIONS: &[(&str, &str)] = &[
    ("northwindchannel.com", "Northwind Channel"),
    ("cascadepartners.io", "Cascade Partners"),
    ("bluespruce.co", "Blue Spruce Consulting"),
    ("harborlight.dev", "Harborlight Systems"),
];

pub const AFFILIATION_EXTERNAL: &str = "external";

/// Default organizational affiliation for a new user, from the email's domain.
pub fn affiliation_from_email_domain(email: &str) -> &'static str {
    let domain = email.rsplit('@').next().unwrap_or("");
    DOMAIN_AFFILIATIONS
        .iter()
        .find(|(d, _)| domain.eq_ignore_ascii_case(d))
        .map(|(_, org)| *org)
        .unwrap_or(AFFILIATION_EXTERNAL)
}

/// Salted SHA-256 digest for the password column.
pub fn hash_password(email: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify_password(user: &UserRow, password: &str) -> bool {
    !user.password_hash.is_empty() && user.password_hash == hash_password(&user.email, password)
}

/// Resolves an external login to a user row, creating one on first sight.
pub struct IdentityResolver {
    store: TabularStore,
    /// Per-email locks serializing find-or-create within this process. The
    /// backing store has no conditional append, so concurrent first logins
    /// from *different* processes can still produce duplicate rows.
    ///
    /// Entries are never evicted: one `Arc<Mutex<()>>` per distinct email for
    /// the life of the process, bounded by the user population.
    creation_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IdentityResolver {
    pub fn new(store: TabularStore) -> Self {
        Self {
            store,
            creation_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Find the user for this identity, or create one with role "user",
    /// status "active", and a domain-derived affiliation. The returned row is
    /// re-read from the store after the append; the re-read, not the values we
    /// wrote, is the source of truth for whatever normalization the store
    /// applied.
    pub async fn resolve_or_create(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<UserRow, IdentityError> {
        self.resolve_or_create_inner(identity, None).await
    }

    /// Password-flow variant: a freshly created row carries the password hash.
    /// An already-existing row is returned untouched; the caller decides how
    /// to treat a registration against an existing account.
    pub async fn register_with_password(
        &self,
        identity: &ExternalIdentity,
        password: &str,
    ) -> Result<UserRow, IdentityError> {
        let email = Self::required_email(identity)?;
        let hash = hash_password(&email, password);
        self.resolve_or_create_inner(identity, Some(&hash)).await
    }

    async fn resolve_or_create_inner(
        &self,
        identity: &ExternalIdentity,
        password_hash: Option<&str>,
    ) -> Result<UserRow, IdentityError> {
        let email = Self::required_email(identity)?;

        let lock = self.creation_lock(&email).await;
        let _guard = lock.lock().await;

        // Provision the table before the lookup so a first-ever login does not
        // trip over a missing sheet
        self.store.ensure_header(users::TABLE, users::HEADER).await?;

        if let Some(row) = self
            .store
            .find_by_column(users::TABLE, users::EMAIL, &email)
            .await?
        {
            return Ok(UserRow::from_row(&row));
        }

        let id = Uuid::new_v4().to_string();
        let affiliation = affiliation_from_email_domain(&email);
        let mut row = Row::new();
        row.set(users::ID, id.as_str())
            .set(users::EMAIL, email.as_str())
            .set(users::FIRST_NAME, identity.given_name.clone().unwrap_or_default())
            .set(users::LAST_NAME, identity.family_name.clone().unwrap_or_default())
            .set(users::AFFILIATION, affiliation)
            .set(users::ROLE, ROLE_USER)
            .set(users::STATUS, STATUS_ACTIVE)
            .set(users::PASSWORD_HASH, password_hash.unwrap_or_default())
            .set(users::CREATED_AT, chrono::Utc::now().to_rfc3339());

        // Cells are ordered against the table's *live* header, which may
        // differ from this build's constant order between deployments
        let header = self.store.header(users::TABLE).await?;
        self.store
            .append(users::TABLE, row.to_ordered_values(&header))
            .await?;
        tracing::info!(email = %email, affiliation, "created user on first login");

        let row = self
            .store
            .find_by_column(users::TABLE, users::ID, &id)
            .await?
            .ok_or_else(|| {
                StoreError::Unavailable("user row not visible after append".to_string())
            })?;
        Ok(UserRow::from_row(&row))
    }

    fn required_email(identity: &ExternalIdentity) -> Result<String, IdentityError> {
        identity
            .email
            .as_deref()
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .ok_or(IdentityError::MissingEmail)
    }

    async fn creation_lock(&self, email: &str) -> Arc<Mutex<()>> {
        let mut locks = self.creation_locks.lock().await;
        locks
            .entry(email.to_ascii_lowercase())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
