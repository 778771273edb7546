//! Lifecycle-bound live query handles.
//!
//! A subscription delivers an ordered stream of full result-set snapshots,
//! never deltas; consumers replace their local copy wholesale on each
//! delivery. The handle pairs the receiving end with a release guard so
//! that dropping it tears the subscription down; screens subscribe on
//! enter and release on exit instead of leaking listeners.

use tokio::sync::watch;

/// Runs its release action exactly once, when dropped.
pub struct SubscriptionGuard(Option<Box<dyn FnOnce() + Send>>);

impl SubscriptionGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(release)))
    }

    /// Guard for subscriptions that need no explicit deregistration.
    pub fn noop() -> Self {
        Self(None)
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(release) = self.0.take() {
            release();
        }
    }
}

impl std::fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SubscriptionGuard")
            .field(&self.0.is_some())
            .finish()
    }
}

/// Live view over a query: the latest full snapshot plus change
/// notifications, released when the handle is dropped.
pub struct Snapshots<T> {
    receiver: watch::Receiver<T>,
    _guard: SubscriptionGuard,
}

impl<T> std::fmt::Debug for Snapshots<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshots").finish_non_exhaustive()
    }
}

impl<T: Clone> Snapshots<T> {
    pub fn new(receiver: watch::Receiver<T>, guard: SubscriptionGuard) -> Self {
        Self {
            receiver,
            _guard: guard,
        }
    }

    /// The most recently delivered snapshot.
    pub fn current(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Waits for the next delivery. Returns `None` once the publishing
    /// side has gone away.
    pub async fn next(&mut self) -> Option<T> {
        match self.receiver.changed().await {
            Ok(()) => Some(self.receiver.borrow_and_update().clone()),
            Err(_) => None,
        }
    }
}
