//! Access policy evaluation.
//!
//! One parameterized check covers every guarded route: the privilege a
//! session holds is compared against the privilege a route requires. Nothing
//! here is cached; callers evaluate on every navigation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Privilege, Session};

/// Outcome of evaluating a session against a required privilege.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    DenyRedirectToLogin,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Evaluate `session` against `required` at the current time.
///
/// - No IO
/// - No panics
/// - Deterministic for a given session and clock reading
pub fn evaluate(session: &Session, required: Privilege) -> Decision {
    evaluate_at(session, required, Utc::now())
}

/// Evaluate `session` against `required` as of `now`.
pub fn evaluate_at(session: &Session, required: Privilege, now: DateTime<Utc>) -> Decision {
    if session.privilege_at(now).satisfies(required) {
        Decision::Allow
    } else {
        Decision::DenyRedirectToLogin
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decision explanation (audit trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Why a decision was made, in a form fit for structured logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyExplanation {
    pub required: Privilege,
    pub held: Privilege,
    pub decision: Decision,
    pub reason: String,
    pub denial: Option<DenialKind>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// Nobody is logged in.
    NotAuthenticated,
    /// A session exists but its token has expired.
    SessionExpired,
    /// Logged in, but without the admin role.
    NotAdmin,
}

/// Explain the decision [`evaluate_at`] would make.
pub fn explain(session: &Session, required: Privilege, now: DateTime<Utc>) -> PolicyExplanation {
    let held = session.privilege_at(now);
    let decision = evaluate_at(session, required, now);

    let denial = match decision {
        Decision::Allow => None,
        Decision::DenyRedirectToLogin if session.is_expired_at(now) => Some(DenialKind::SessionExpired),
        Decision::DenyRedirectToLogin if held == Privilege::Public => Some(DenialKind::NotAuthenticated),
        Decision::DenyRedirectToLogin => Some(DenialKind::NotAdmin),
    };

    let reason = match denial {
        None if required == Privilege::Public => "route is public".to_string(),
        None => format!("session holds '{held}', route requires '{required}'"),
        Some(DenialKind::NotAuthenticated) => format!("route requires '{required}' but nobody is logged in"),
        Some(DenialKind::SessionExpired) => format!("route requires '{required}' but the session has expired"),
        Some(DenialKind::NotAdmin) if session.is_corrupt() => {
            "session has no role; treated as non-admin".to_string()
        }
        Some(DenialKind::NotAdmin) => format!("session holds '{held}', route requires '{required}'"),
    };

    PolicyExplanation {
        required,
        held,
        decision,
        reason,
        denial,
    }
}
