use super::{Waiter, WaiterId};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use tokio::sync::Mutex;
use tracing::trace;

/// Correlation table from requester identifiers to the [`Waiters`](Waiter) outstanding for them
///
/// Knows nothing about transports or requests, it is pure bookkeeping. A key which is present
/// always maps to at least one waiter and waiters of one key retain their insertion order.
///
/// All operations share one lock which is never held across an await point. Thus, each waiter
/// is handed out by exactly one of [`fetch_and_clear`](Self::fetch_and_clear) and
/// [`withdraw`](Self::withdraw), and a waiter added concurrently to a fetch is either part of
/// the fetched batch or remains registered for the next one.
///
/// Waiters whose reply never arrives stay in here until withdrawn. Waiters whose
/// [`Fulfillment`](super::Fulfillment) has been dropped are pruned whenever another waiter is
/// added for the same requester.
pub struct PendingRequestRegistry<K, T> {
    store: Mutex<HashMap<K, Vec<Waiter<T>>>>,
}

impl<K, T> Default for PendingRequestRegistry<K, T> {
    fn default() -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, T> PendingRequestRegistry<K, T>
where
    K: Eq + Hash,
{
    /// Creates a new, empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a waiter to the list of the given requester, dropping abandoned ones on the way
    pub async fn add(&self, key: K, waiter: Waiter<T>) {
        trace!(waiter = %waiter.id(), "Registering waiter");

        let mut store = self.store.lock().await;
        let waiters = store.entry(key).or_default();
        waiters.retain(|waiter| !waiter.is_abandoned());
        waiters.push(waiter);
    }

    /// Removes and returns all waiters of the given requester in the order they were added
    pub async fn fetch_and_clear<Q>(&self, key: &Q) -> Vec<Waiter<T>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.lock().await.remove(key).unwrap_or_default()
    }

    /// Removes one specific waiter, returning it if it was still registered
    pub async fn withdraw<Q>(&self, key: &Q, id: WaiterId) -> Option<Waiter<T>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut store = self.store.lock().await;
        let waiters = store.get_mut(key)?;
        let position = waiters.iter().position(|waiter| waiter.id() == id)?;
        let waiter = waiters.remove(position);

        if waiters.is_empty() {
            store.remove(key);
        }

        trace!(waiter = %id, "Withdrew waiter");
        Some(waiter)
    }

    /// Number of waiters outstanding for the given requester
    pub async fn pending<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.lock().await.get(key).map(Vec::len).unwrap_or(0)
    }

    /// Number of requesters with at least one outstanding waiter
    pub async fn requesters(&self) -> usize {
        self.store.lock().await.len()
    }

    /// Whether no waiter is outstanding at all
    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }
}
