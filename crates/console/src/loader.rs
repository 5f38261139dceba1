//! Deferred view loading.
//!
//! A [`Deferred`] is the per-view pending/resolved state object: the gateway
//! polls it without blocking and renders a loading placeholder until it
//! resolves. The loader side fills it through a [`Resolver`]. Dropping a
//! `Deferred` (a superseded navigation) makes the late result go nowhere.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::oneshot;

use crate::ViewId;

/// Observable state of a deferred view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState<V> {
    Pending,
    Ready(V),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The loader dropped its resolver without producing the view.
    #[error("view '{0}' was abandoned by its loader before resolving")]
    Abandoned(ViewId),
}

#[derive(Debug)]
enum Slot<V> {
    Waiting(oneshot::Receiver<V>),
    Ready(V),
    Abandoned,
}

/// Pending-or-resolved handle to a view implementation.
#[derive(Debug)]
pub struct Deferred<V> {
    view: ViewId,
    slot: Slot<V>,
}

/// Write side of a pending [`Deferred`].
#[derive(Debug)]
pub struct Resolver<V> {
    view: ViewId,
    tx: oneshot::Sender<V>,
}

impl<V> Resolver<V> {
    /// Deliver the view. Returns `false` when nobody is waiting any more.
    pub fn resolve(self, value: V) -> bool {
        let delivered = self.tx.send(value).is_ok();
        if !delivered {
            tracing::debug!(view = %self.view, "deferred view resolved after navigation moved on");
        }
        delivered
    }

    pub fn is_discarded(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<V: Clone> Deferred<V> {
    /// An already-resolved view (eager or cached).
    pub fn ready(view: ViewId, value: V) -> Self {
        Self {
            view,
            slot: Slot::Ready(value),
        }
    }

    /// A pending view and the resolver that completes it.
    pub fn pending(view: ViewId) -> (Resolver<V>, Self) {
        let (tx, rx) = oneshot::channel();
        let resolver = Resolver {
            view: view.clone(),
            tx,
        };
        (
            resolver,
            Self {
                view,
                slot: Slot::Waiting(rx),
            },
        )
    }

    /// A view the loader cannot produce.
    pub fn abandoned(view: ViewId) -> Self {
        Self {
            view,
            slot: Slot::Abandoned,
        }
    }

    pub fn view(&self) -> &ViewId {
        &self.view
    }

    pub fn is_abandoned(&self) -> bool {
        matches!(self.slot, Slot::Abandoned)
    }

    /// Observe the current state without blocking.
    ///
    /// An abandoned view stays `Pending` here; [`Deferred::resolved`] reports
    /// it as an error.
    pub fn poll(&mut self) -> LoadState<V> {
        if let Slot::Waiting(rx) = &mut self.slot {
            match rx.try_recv() {
                Ok(value) => self.slot = Slot::Ready(value),
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    tracing::warn!(view = %self.view, "view loader dropped a pending view");
                    self.slot = Slot::Abandoned;
                }
            }
        }

        match &self.slot {
            Slot::Ready(value) => LoadState::Ready(value.clone()),
            Slot::Waiting(_) | Slot::Abandoned => LoadState::Pending,
        }
    }

    /// Wait until the view resolves.
    pub async fn resolved(&mut self) -> Result<V, LoadError> {
        if let Slot::Waiting(rx) = &mut self.slot {
            let received = rx.await.ok();
            self.settle(received);
        }
        self.outcome()
    }

    /// Block the calling thread until the view resolves.
    ///
    /// For hosts without an async runtime; must not be called from inside
    /// one.
    pub fn wait(&mut self) -> Result<V, LoadError> {
        match std::mem::replace(&mut self.slot, Slot::Abandoned) {
            Slot::Waiting(rx) => {
                let received = rx.blocking_recv().ok();
                self.settle(received);
            }
            other => self.slot = other,
        }
        self.outcome()
    }

    fn settle(&mut self, received: Option<V>) {
        self.slot = match received {
            Some(value) => Slot::Ready(value),
            None => {
                tracing::warn!(view = %self.view, "view loader dropped a pending view");
                Slot::Abandoned
            }
        };
    }

    fn outcome(&self) -> Result<V, LoadError> {
        match &self.slot {
            Slot::Ready(value) => Ok(value.clone()),
            Slot::Waiting(_) | Slot::Abandoned => Err(LoadError::Abandoned(self.view.clone())),
        }
    }
}

/// Source of view implementations, consulted by the gateway once a
/// navigation is allowed.
pub trait ViewLoader {
    type View: Clone;

    /// Start (or short-circuit) loading `view`.
    fn load(&self, view: &ViewId) -> Deferred<Self::View>;

    /// Whether `view` can be loaded at all; checked once at startup.
    fn knows(&self, view: &ViewId) -> bool {
        let _ = view;
        true
    }
}

impl<L: ViewLoader + ?Sized> ViewLoader for Arc<L> {
    type View = L::View;

    fn load(&self, view: &ViewId) -> Deferred<Self::View> {
        (**self).load(view)
    }

    fn knows(&self, view: &ViewId) -> bool {
        (**self).knows(view)
    }
}

type Factory<V> = Arc<dyn Fn() -> V + Send + Sync>;

/// Registry of eager views and on-demand view factories.
///
/// Eager views resolve immediately. A deferred view's factory never runs on
/// the requesting thread: the first request gets a pending [`Deferred`] and
/// the factory runs on a tokio task (or a worker thread when no runtime is
/// current). Afterwards the result is cached and resolves immediately, like
/// an already-imported module.
pub struct ViewRegistry<V> {
    eager: HashMap<ViewId, V>,
    factories: HashMap<ViewId, Factory<V>>,
    loaded: Arc<Mutex<HashMap<ViewId, V>>>,
}

impl<V> Default for ViewRegistry<V> {
    fn default() -> Self {
        Self {
            eager: HashMap::new(),
            factories: HashMap::new(),
            loaded: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<V> core::fmt::Debug for ViewRegistry<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ViewRegistry")
            .field("eager", &self.eager.keys().collect::<Vec<_>>())
            .field("deferred", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<V> ViewRegistry<V>
where
    V: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eager(mut self, view: ViewId, value: V) -> Self {
        self.eager.insert(view, value);
        self
    }

    pub fn deferred<F>(mut self, view: ViewId, factory: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
    {
        self.factories.insert(view, Arc::new(factory));
        self
    }

    /// Whether a deferred view has finished loading at least once.
    pub fn is_loaded(&self, view: &ViewId) -> bool {
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(view)
    }

    fn cached(&self, view: &ViewId) -> Option<V> {
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(view)
            .cloned()
    }
}

impl<V> ViewLoader for ViewRegistry<V>
where
    V: Clone + Send + 'static,
{
    type View = V;

    fn load(&self, view: &ViewId) -> Deferred<V> {
        if let Some(value) = self.eager.get(view) {
            return Deferred::ready(view.clone(), value.clone());
        }
        if let Some(value) = self.cached(view) {
            return Deferred::ready(view.clone(), value);
        }
        let Some(factory) = self.factories.get(view).cloned() else {
            tracing::error!(%view, "no loader registered for view");
            return Deferred::abandoned(view.clone());
        };

        let (resolver, deferred) = Deferred::pending(view.clone());
        let loaded = Arc::clone(&self.loaded);
        let id = view.clone();
        let task = move || {
            let value = factory();
            loaded
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(id, value.clone());
            resolver.resolve(value);
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                tracing::debug!(%view, "loading deferred view on the async runtime");
                runtime.spawn(async move { task() });
            }
            Err(_) => {
                tracing::debug!(%view, "loading deferred view on a worker thread");
                std::thread::spawn(task);
            }
        }

        deferred
    }

    fn knows(&self, view: &ViewId) -> bool {
        self.eager.contains_key(view) || self.factories.contains_key(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dashboard() -> ViewId {
        ViewId::new("dashboard")
    }

    #[test]
    fn manual_resolution_moves_pending_to_ready() {
        let (resolver, mut deferred) = Deferred::<&str>::pending(dashboard());
        assert_eq!(deferred.poll(), LoadState::Pending);
        assert!(resolver.resolve("dashboard-impl"));
        assert_eq!(deferred.poll(), LoadState::Ready("dashboard-impl"));
        assert_eq!(deferred.poll(), LoadState::Ready("dashboard-impl"));
    }

    #[test]
    fn dropping_the_deferred_discards_the_result() {
        let (resolver, deferred) = Deferred::<u8>::pending(dashboard());
        drop(deferred);
        assert!(resolver.is_discarded());
        assert!(!resolver.resolve(1));
    }

    #[test]
    fn dropped_resolver_abandons_the_view() {
        let (resolver, mut deferred) = Deferred::<u8>::pending(dashboard());
        drop(resolver);
        assert_eq!(deferred.poll(), LoadState::Pending);
        assert!(deferred.is_abandoned());
    }

    #[tokio::test]
    async fn resolved_reports_abandonment() {
        let (resolver, mut deferred) = Deferred::<u8>::pending(dashboard());
        drop(resolver);
        assert_eq!(deferred.resolved().await, Err(LoadError::Abandoned(dashboard())));
    }

    #[test]
    fn eager_views_are_ready_immediately() {
        let registry = ViewRegistry::new().eager(ViewId::new("login"), "login-impl");
        let mut deferred = registry.load(&ViewId::new("login"));
        assert_eq!(deferred.poll(), LoadState::Ready("login-impl"));
    }

    #[tokio::test]
    async fn deferred_views_load_once_then_come_from_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = ViewRegistry::new().deferred(dashboard(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            "dashboard-impl"
        });

        let mut first = registry.load(&dashboard());
        assert_eq!(first.poll(), LoadState::Pending);
        assert_eq!(first.resolved().await, Ok("dashboard-impl"));
        assert!(registry.is_loaded(&dashboard()));

        let mut second = registry.load(&dashboard());
        assert_eq!(second.poll(), LoadState::Ready("dashboard-impl"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn without_a_runtime_the_first_load_is_still_pending() {
        let registry = ViewRegistry::new().deferred(dashboard(), || {
            std::thread::sleep(std::time::Duration::from_millis(200));
            7u32
        });

        let started = std::time::Instant::now();
        let mut deferred = registry.load(&dashboard());
        assert!(started.elapsed() < std::time::Duration::from_millis(200));
        assert_eq!(deferred.poll(), LoadState::Pending);

        assert_eq!(deferred.wait(), Ok(7));
        assert!(registry.is_loaded(&dashboard()));
        assert_eq!(registry.load(&dashboard()).poll(), LoadState::Ready(7));
    }

    #[test]
    fn wait_reports_abandonment() {
        let (resolver, mut deferred) = Deferred::<u8>::pending(dashboard());
        drop(resolver);
        assert_eq!(deferred.wait(), Err(LoadError::Abandoned(dashboard())));
    }

    #[test]
    fn unknown_views_are_reported() {
        let registry: ViewRegistry<u8> = ViewRegistry::new().deferred(dashboard(), || 1);
        assert!(registry.knows(&dashboard()));
        assert!(!registry.knows(&ViewId::new("reports")));
        assert!(registry.load(&ViewId::new("reports")).is_abandoned());
    }
}
