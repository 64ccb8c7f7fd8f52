pub mod claims;
pub mod gate;
pub mod ownership;

pub use claims::Claims;
pub use gate::{AuthError, AuthorizationGate, EffectiveIdentity, ROLE_ADMIN, ROLE_USER};
pub use ownership::visible_rows;
