//! `sitegate-auth` — pure authorization boundary.
//!
//! Roles, permissions, the permission model, the authorization gate, session
//! verification and post-auth redirect resolution. This crate is decoupled
//! from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod permissions;
pub mod policy;
pub mod redirect;
pub mod roles;
pub mod session;

pub use authorize::{AuthorizationExplanation, AuthorizationGate};
pub use claims::{ClaimsError, SessionClaims, validate_claims};
pub use permissions::Permission;
pub use policy::{PermissionModel, PermissionModelBuilder};
pub use redirect::{ProtectedArea, RedirectPolicy, resolve_redirect};
pub use roles::{Role, UnknownRole};
pub use session::{Hs256SessionVerifier, Session, SessionError, SessionVerifier};
