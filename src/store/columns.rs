//! Declared column sets for the entities this service owns.
//!
//! Each entity gets one constant set plus a typed wrapper over the generic
//! [`Row`](crate::store::Row), so a column rename is a compile-time break here
//! instead of a runtime `ColumnNotFound` somewhere in a handler.

use serde::Serialize;

use crate::store::row::Row;

/// Shared "active" status literal used by both users and the admin allowlist.
pub const STATUS_ACTIVE: &str = "active";

pub mod users {
    pub const TABLE: &str = "users";

    pub const ID: &str = "id";
    pub const EMAIL: &str = "email";
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const AFFILIATION: &str = "affiliation";
    pub const ROLE: &str = "role";
    pub const STATUS: &str = "status";
    pub const PASSWORD_HASH: &str = "password_hash";
    pub const CREATED_AT: &str = "created_at";

    pub const HEADER: &[&str] = &[
        ID,
        EMAIL,
        FIRST_NAME,
        LAST_NAME,
        AFFILIATION,
        ROLE,
        STATUS,
        PASSWORD_HASH,
        CREATED_AT,
    ];
}

pub mod admins {
    pub const TABLE: &str = "admins";

    pub const EMAIL: &str = "email";
    pub const STATUS: &str = "status";

    pub const HEADER: &[&str] = &[EMAIL, STATUS];
}

pub mod deals {
    pub const TABLE: &str = "deals";

    pub const ID: &str = "id";
    pub const STATUS: &str = "status";
    pub const OWNER_EMAIL: &str = "owner_email";
    pub const COMPANY_NAME: &str = "company_name";
    pub const COMPANY_DOMAIN: &str = "company_domain";
    pub const DEAL_VALUE: &str = "deal_value";
    pub const CLOSE_DATE: &str = "close_date";
    pub const NOTES: &str = "notes";
    pub const CREATED_AT: &str = "created_at";

    pub const HEADER: &[&str] = &[
        ID,
        STATUS,
        OWNER_EMAIL,
        COMPANY_NAME,
        COMPANY_DOMAIN,
        DEAL_VALUE,
        CLOSE_DATE,
        NOTES,
        CREATED_AT,
    ];

    /// The only place deal status is validated is the explicit status-update
    /// call; rows written by other paths carry whatever string they carry.
    pub const STATUSES: &[&str] = &["submitted", "under_review", "approved", "rejected"];
    pub const STATUS_SUBMITTED: &str = "submitted";
}

/// Typed view over a user row. Field values are verbatim sheet cells.
#[derive(Debug, Clone, Serialize)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub affiliation: String,
    /// Role string as stored on the row. Advisory only; authorization always
    /// recomputes the effective role against the admin allowlist.
    pub role: String,
    pub status: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
}

impl UserRow {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get(users::ID).to_string(),
            email: row.get(users::EMAIL).to_string(),
            first_name: row.get(users::FIRST_NAME).to_string(),
            last_name: row.get(users::LAST_NAME).to_string(),
            affiliation: row.get(users::AFFILIATION).to_string(),
            role: row.get(users::ROLE).to_string(),
            status: row.get(users::STATUS).to_string(),
            password_hash: row.get(users::PASSWORD_HASH).to_string(),
            created_at: row.get(users::CREATED_AT).to_string(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }
}
