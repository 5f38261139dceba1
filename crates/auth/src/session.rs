//! Session state: the single owner of the current authentication payload.
//!
//! `SessionState` is a cheap-to-clone handle. Every clone reads and writes the
//! same session, so a mutation is visible to all holders (gateway, menu) as
//! soon as the mutating call returns. Only `login*`, `refresh`, `logout`,
//! `invalidate_if_expired` and `restore` write; everything else reads
//! snapshots.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tonerdesk_core::SessionId;

use crate::{
    Broadcast, Identity, Privilege, Role, SessionClaims, Subscription, TokenValidationError,
    validate_claims,
};

/// Snapshot of the authentication payload.
///
/// The default value is the anonymous session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    authenticated: bool,
    role: Option<Role>,
    identity: Option<Identity>,
    session_id: Option<SessionId>,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An authenticated session; `expires_at = None` never expires.
    pub fn authenticated(identity: Identity, role: Role, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            authenticated: true,
            role: Some(role),
            identity: Some(identity),
            session_id: Some(SessionId::new()),
            expires_at,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        self.authenticated && self.expires_at.is_none_or(|expires_at| now < expires_at)
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now())
    }

    /// Admin is a refinement of authenticated: false whenever the session is
    /// not (or no longer) authenticated, and false when the role is missing.
    pub fn is_admin_at(&self, now: DateTime<Utc>) -> bool {
        self.is_authenticated_at(now) && self.role.is_some_and(|role| role.is_admin())
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin_at(Utc::now())
    }

    /// Privilege held by this session at `now`.
    pub fn privilege_at(&self, now: DateTime<Utc>) -> Privilege {
        if self.is_authenticated_at(now) {
            Privilege::held_by(self.role)
        } else {
            Privilege::Public
        }
    }

    pub fn privilege(&self) -> Privilege {
        self.privilege_at(Utc::now())
    }

    /// Authenticated but carrying no role.
    pub fn is_corrupt(&self) -> bool {
        self.authenticated && self.role.is_none()
    }

    /// Authenticated flag still set although the token expiry has passed.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.authenticated && self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// Change notification published by [`SessionState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    LoggedIn { session_id: SessionId, role: Role },
    Refreshed { session_id: SessionId, expires_at: DateTime<Utc> },
    LoggedOut { session_id: SessionId },
    Expired { session_id: SessionId },
    Restored { authenticated: bool },
}

/// Shared, explicitly passed session holder.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    current: Arc<RwLock<Session>>,
    changes: Arc<Broadcast<SessionEvent>>,
}

impl SessionState {
    /// A fresh, anonymous session holder (one per test, one per app).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.read().is_admin()
    }

    /// Observe session changes; events are published before the mutating call
    /// returns.
    pub fn subscribe(&self) -> Subscription<SessionEvent> {
        self.changes.subscribe()
    }

    /// Establish a session that does not expire.
    ///
    /// Credentials are checked upstream, so there is no failure path.
    pub fn login(&self, identity: Identity, role: Role) {
        self.establish(identity, role, None);
    }

    /// Establish a session whose token expires at `expires_at`.
    pub fn login_until(&self, identity: Identity, role: Role, expires_at: DateTime<Utc>) {
        self.establish(identity, role, Some(expires_at));
    }

    /// Establish a session from verified token claims.
    ///
    /// The current session is left untouched when the claims are outside
    /// their validity window.
    pub fn login_with_claims(
        &self,
        claims: &SessionClaims,
        now: DateTime<Utc>,
    ) -> Result<(), TokenValidationError> {
        validate_claims(claims, now)?;
        self.login_until(claims.identity(), claims.role, claims.expires_at);
        Ok(())
    }

    fn establish(&self, identity: Identity, role: Role, expires_at: Option<DateTime<Utc>>) {
        let session_id = SessionId::new();
        *self.write() = Session {
            authenticated: true,
            role: Some(role),
            identity: Some(identity),
            session_id: Some(session_id),
            expires_at,
        };

        tracing::info!(%session_id, %role, "session established");
        self.changes.publish(SessionEvent::LoggedIn { session_id, role });
    }

    /// Extend the token expiry of the current session.
    ///
    /// Returns `false` (and changes nothing) when nobody is logged in.
    pub fn refresh(&self, expires_at: DateTime<Utc>) -> bool {
        let session_id = {
            let mut current = self.write();
            if !current.is_authenticated() {
                return false;
            }
            current.expires_at = Some(expires_at);
            current.session_id
        };

        if let Some(session_id) = session_id {
            tracing::debug!(%session_id, %expires_at, "session refreshed");
            self.changes.publish(SessionEvent::Refreshed { session_id, expires_at });
        }
        true
    }

    /// Reset to the anonymous session. Idempotent: logging out an anonymous
    /// session changes nothing and publishes nothing.
    pub fn logout(&self) {
        let previous = {
            let mut current = self.write();
            if *current == Session::anonymous() {
                return;
            }
            std::mem::take(&mut *current)
        };

        match previous.session_id {
            Some(session_id) => {
                tracing::info!(%session_id, "session ended");
                self.changes.publish(SessionEvent::LoggedOut { session_id });
            }
            None => tracing::info!("session ended"),
        }
    }

    /// Reset the session if its token expired at or before `now`.
    ///
    /// Returns `true` when the session was invalidated.
    pub fn invalidate_if_expired(&self, now: DateTime<Utc>) -> bool {
        let previous = {
            let mut current = self.write();
            if !current.is_expired_at(now) {
                return false;
            }
            std::mem::take(&mut *current)
        };

        if let Some(session_id) = previous.session_id {
            tracing::info!(%session_id, "session expired");
            self.changes.publish(SessionEvent::Expired { session_id });
        }
        true
    }

    /// Replace the session with one recovered from elsewhere (e.g. storage
    /// kept by the host shell).
    ///
    /// A recovered session that is authenticated but has no role is kept, but
    /// it only ever holds the least authenticated privilege.
    pub fn restore(&self, mut session: Session) {
        if session.authenticated && session.session_id.is_none() {
            session.session_id = Some(SessionId::new());
        }
        if session.is_corrupt() {
            tracing::warn!(
                session_id = ?session.session_id,
                "restored session has no role; admin access disabled"
            );
        }

        let authenticated = session.authenticated;
        *self.write() = session;
        self.changes.publish(SessionEvent::Restored { authenticated });
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }
}
