//! Navigation gateway: turns each navigation event into a render directive.
//!
//! Per navigation:
//!
//! ```text
//! Resolving ──root──────────────────────────────▶ Redirected (home | login)
//!     │
//!     └─route─▶ evaluate ──deny──▶ Denied (redirect to login)
//!                   │
//!                   └─allow─▶ Allowed ─▶ Loading ─(view resolves)─▶ Rendered
//! ```
//!
//! The catch-all route skips loading and renders the not-found fallback.
//! Redirected, Denied and Rendered are terminal; a new path starts over.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::Serialize;

use tonerdesk_auth::{Decision, Privilege, SessionState, evaluate_at, explain};

use crate::routes::is_root;
use crate::{ConsoleConfig, Deferred, LoadError, LoadState, RouteTable, RouteTableError, ViewLoader};

/// Most redirects [`Navigator::follow`] will chase before giving up.
pub const MAX_REDIRECTS: usize = 4;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    Loading,
    NotFound,
}

/// What the presentation layer should show for a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderDirective<V> {
    RenderView(V),
    Redirect(String),
    RenderFallback(FallbackKind),
}

impl<V> RenderDirective<V> {
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            RenderDirective::Redirect(target) => Some(target),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationPhase {
    Resolving,
    /// Root request sent to home or login without a policy check.
    Redirected,
    Allowed,
    Denied,
    Loading,
    Rendered,
}

impl NavigationPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            NavigationPhase::Redirected | NavigationPhase::Denied | NavigationPhase::Rendered
        )
    }
}

#[derive(Debug)]
enum Outcome<V> {
    Redirect(String),
    NotFound,
    View(Deferred<V>),
}

/// One navigation event and its progress through the gateway.
#[derive(Debug)]
pub struct Navigation<V> {
    id: u64,
    path: String,
    matched: Option<String>,
    phases: Vec<NavigationPhase>,
    outcome: Outcome<V>,
}

impl<V: Clone> Navigation<V> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Pattern of the route the path resolved to (`None` for root redirects).
    pub fn matched(&self) -> Option<&str> {
        self.matched.as_deref()
    }

    pub fn phase(&self) -> NavigationPhase {
        self.phases.last().copied().unwrap_or(NavigationPhase::Resolving)
    }

    /// Every phase entered so far, in order.
    pub fn phases(&self) -> &[NavigationPhase] {
        &self.phases
    }

    /// Current directive; never blocks.
    pub fn directive(&mut self) -> RenderDirective<V> {
        let state = match &mut self.outcome {
            Outcome::Redirect(target) => return RenderDirective::Redirect(target.clone()),
            Outcome::NotFound => return RenderDirective::RenderFallback(FallbackKind::NotFound),
            Outcome::View(deferred) => deferred.poll(),
        };

        match state {
            LoadState::Pending => RenderDirective::RenderFallback(FallbackKind::Loading),
            LoadState::Ready(view) => {
                self.enter(NavigationPhase::Rendered);
                RenderDirective::RenderView(view)
            }
        }
    }

    /// Wait for the view (if any) and return the terminal directive.
    pub async fn settle(&mut self) -> Result<RenderDirective<V>, LoadError> {
        if let Outcome::View(deferred) = &mut self.outcome {
            let view = deferred.resolved().await?;
            self.enter(NavigationPhase::Rendered);
            return Ok(RenderDirective::RenderView(view));
        }
        Ok(self.directive())
    }

    /// Blocking counterpart of [`Navigation::settle`] for hosts without an
    /// async runtime.
    pub fn wait(&mut self) -> Result<RenderDirective<V>, LoadError> {
        if let Outcome::View(deferred) = &mut self.outcome {
            let view = deferred.wait()?;
            self.enter(NavigationPhase::Rendered);
            return Ok(RenderDirective::RenderView(view));
        }
        Ok(self.directive())
    }

    fn enter(&mut self, phase: NavigationPhase) {
        if self.phase() != phase {
            tracing::debug!(nav = self.id, path = %self.path, ?phase, "navigation phase");
            self.phases.push(phase);
        }
    }
}

/// Resolves navigation events against a route table and a session.
#[derive(Debug)]
pub struct NavigationGateway<L> {
    table: Arc<RouteTable>,
    loader: L,
    session: SessionState,
    config: ConsoleConfig,
    next_id: AtomicU64,
}

impl<L: ViewLoader> NavigationGateway<L> {
    /// Wire a gateway, rejecting tables it could not serve: the login route
    /// must be declared and public, the home route declared, and every view
    /// known to the loader.
    pub fn new(
        table: impl Into<Arc<RouteTable>>,
        loader: L,
        session: SessionState,
        config: ConsoleConfig,
    ) -> Result<Self, RouteTableError> {
        let table = table.into();

        match table.get(&config.login_path) {
            None => {
                return Err(RouteTableError::UndeclaredRedirectTarget(config.login_path.clone()));
            }
            Some(entry) if entry.required() != Privilege::Public => {
                return Err(RouteTableError::GuardedLoginRoute(config.login_path.clone()));
            }
            Some(_) => {}
        }
        if table.get(&config.home_path).is_none() {
            return Err(RouteTableError::UndeclaredRedirectTarget(config.home_path.clone()));
        }
        if let Some(entry) = table.entries().find(|entry| !loader.knows(entry.view())) {
            return Err(RouteTableError::UnknownView {
                path: entry.path().to_string(),
                view: entry.view().clone(),
            });
        }

        Ok(Self {
            table,
            loader,
            session,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Handle one navigation event. The session is read fresh every time and
    /// never written; an expired token is simply denied.
    pub fn navigate(&self, path: &str) -> Navigation<L::View> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let now = Utc::now();
        let session = self.session.snapshot();

        let mut phases = vec![NavigationPhase::Resolving];

        if is_root(path) {
            let target = if session.is_authenticated_at(now) {
                &self.config.home_path
            } else {
                &self.config.login_path
            };
            tracing::debug!(nav = id, %target, "root redirect");
            phases.push(NavigationPhase::Redirected);
            return Navigation {
                id,
                path: path.to_string(),
                matched: None,
                phases,
                outcome: Outcome::Redirect(target.clone()),
            };
        }

        let entry = self.table.resolve(path);
        tracing::debug!(
            nav = id,
            path,
            matched = entry.path(),
            required = %entry.required(),
            "route resolved"
        );

        let outcome = match evaluate_at(&session, entry.required(), now) {
            Decision::DenyRedirectToLogin => {
                let why = explain(&session, entry.required(), now);
                tracing::debug!(nav = id, path, reason = %why.reason, "navigation denied");
                phases.push(NavigationPhase::Denied);
                Outcome::Redirect(self.config.login_path.clone())
            }
            Decision::Allow if entry.is_catch_all() => {
                phases.extend([NavigationPhase::Allowed, NavigationPhase::Rendered]);
                Outcome::NotFound
            }
            Decision::Allow => {
                phases.extend([NavigationPhase::Allowed, NavigationPhase::Loading]);
                Outcome::View(self.loader.load(entry.view()))
            }
        };

        Navigation {
            id,
            path: path.to_string(),
            matched: Some(entry.path().to_string()),
            phases,
            outcome,
        }
    }
}

/// Drives navigation on behalf of the host shell.
///
/// Keeps the active navigation; a new path supersedes a pending one, whose
/// result is then discarded. Before each navigation it resets a session whose
/// token has expired, so observers see the logout.
pub struct Navigator<L: ViewLoader> {
    gateway: NavigationGateway<L>,
    current: Option<Navigation<L::View>>,
}

impl<L: ViewLoader> Navigator<L> {
    pub fn new(gateway: NavigationGateway<L>) -> Self {
        Self {
            gateway,
            current: None,
        }
    }

    pub fn gateway(&self) -> &NavigationGateway<L> {
        &self.gateway
    }

    pub fn current(&self) -> Option<&Navigation<L::View>> {
        self.current.as_ref()
    }

    /// Start a navigation and return its first directive.
    pub fn navigate(&mut self, path: &str) -> RenderDirective<L::View> {
        self.gateway.session().invalidate_if_expired(Utc::now());
        if let Some(previous) = &self.current {
            if !previous.phase().is_terminal() {
                tracing::debug!(nav = previous.id(), path = previous.path(), "navigation superseded");
            }
        }
        self.current.insert(self.gateway.navigate(path)).directive()
    }

    /// Navigate, chasing redirects the way the shell would.
    pub fn follow(&mut self, path: &str) -> RenderDirective<L::View> {
        let mut directive = self.navigate(path);
        for _ in 0..MAX_REDIRECTS {
            let Some(target) = directive.redirect_target().map(str::to_string) else {
                break;
            };
            directive = self.navigate(&target);
        }
        directive
    }

    /// Re-poll the active navigation.
    pub fn directive(&mut self) -> Option<RenderDirective<L::View>> {
        self.current.as_mut().map(Navigation::directive)
    }

    /// Wait for the active navigation to reach its terminal directive.
    pub async fn settle(&mut self) -> Option<Result<RenderDirective<L::View>, LoadError>> {
        match self.current.as_mut() {
            Some(navigation) => Some(navigation.settle().await),
            None => None,
        }
    }

    /// Blocking counterpart of [`Navigator::settle`].
    pub fn wait(&mut self) -> Option<Result<RenderDirective<L::View>, LoadError>> {
        self.current.as_mut().map(Navigation::wait)
    }
}
