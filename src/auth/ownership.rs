use crate::auth::gate::EffectiveIdentity;
use crate::store::Row;

/// Restrict `rows` to what `caller` may see.
///
/// Admins see everything, order preserved. Non-admins see only rows whose
/// `owner_column` equals their email — case-sensitively, since owner emails
/// are written verbatim at submission time and compared verbatim here.
/// Anonymous callers see nothing. Pure function, no failure modes.
pub fn visible_rows(
    rows: Vec<Row>,
    caller: Option<&EffectiveIdentity>,
    owner_column: &str,
) -> Vec<Row> {
    match caller {
        None => Vec::new(),
        Some(identity) if identity.is_admin() => rows,
        Some(identity) => rows
            .into_iter()
            .filter(|row| row.get(owner_column) == identity.email)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::gate::{ROLE_ADMIN, ROLE_USER};

    fn identity(email: &str, effective_role: &str) -> EffectiveIdentity {
        EffectiveIdentity {
            user_id: "u1".to_string(),
            email: email.to_string(),
            affiliation: "external".to_string(),
            claimed_role: ROLE_USER.to_string(),
            effective_role: effective_role.to_string(),
        }
    }

    fn row(owner: &str) -> Row {
        let mut r = Row::new();
        r.set("owner_email", owner);
        r
    }

    #[test]
    fn admin_sees_all_rows_in_order() {
        let rows = vec![row("a@x.com"), row("b@y.com"), row("a@x.com")];
        let caller = identity("someone@else.com", ROLE_ADMIN);
        let visible = visible_rows(rows.clone(), Some(&caller), "owner_email");
        assert_eq!(visible, rows);
    }

    #[test]
    fn non_admin_sees_only_own_rows() {
        let rows = vec![row("a@x.com"), row("b@y.com"), row("a@x.com")];
        let caller = identity("a@x.com", ROLE_USER);
        let visible = visible_rows(rows, Some(&caller), "owner_email");
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|r| r.get("owner_email") == "a@x.com"));
    }

    #[test]
    fn ownership_match_is_case_sensitive() {
        let rows = vec![row("A@X.com")];
        let caller = identity("a@x.com", ROLE_USER);
        assert!(visible_rows(rows, Some(&caller), "owner_email").is_empty());
    }

    #[test]
    fn anonymous_sees_nothing() {
        let rows = vec![row("a@x.com")];
        assert!(visible_rows(rows, None, "owner_email").is_empty());
    }
}
