//! `tonerdesk-auth`: session state and access policy for the console.
//!
//! This crate knows nothing about routing, rendering or the
//! transport that fetches session data.

pub mod claims;
pub mod identity;
pub mod notify;
pub mod policy;
pub mod privilege;
pub mod roles;
pub mod session;

pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use identity::Identity;
pub use notify::{Broadcast, Subscription};
pub use policy::{Decision, DenialKind, PolicyExplanation, evaluate, evaluate_at, explain};
pub use privilege::Privilege;
pub use roles::{Role, UnknownRole};
pub use session::{Session, SessionEvent, SessionState};
