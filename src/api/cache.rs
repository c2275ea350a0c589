//! Keyed query cache with time-based staleness and in-flight sharing.
//!
//! Each [`QueryKey`] maps to either a ready value stamped with its fetch time
//! or a shared future for a request that is still running. A second caller for
//! the same key attaches to the running future instead of issuing its own
//! request. Failures are never cached: the slot is cleared so the next caller
//! fetches again.

use crate::api::client::FetchError;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Identifies one cacheable request: the query kind plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    FullListing,
    ListingPage { offset: usize, limit: usize },
    Category(String),
    Detail(String),
    Species(String),
    Evolution(String),
    Artwork(String),
}

type SharedFetch<V> = Shared<BoxFuture<'static, Result<Arc<V>, FetchError>>>;

enum Slot<V> {
    Ready { value: Arc<V>, fetched_at: Instant },
    InFlight { id: u64, fetch: SharedFetch<V> },
}

struct Inner<V> {
    slots: HashMap<QueryKey, Slot<V>>,
    next_id: u64,
}

enum Lookup<V> {
    Hit(Arc<V>),
    Pending(SharedFetch<V>),
    Miss,
}

/// Cache for one value type.
///
/// Cloning is cheap and clones share the same slots. `stale_after` of `None`
/// means a ready value never goes stale.
pub struct QueryCache<V> {
    inner: Arc<Mutex<Inner<V>>>,
    stale_after: Option<Duration>,
}

impl<V> Clone for QueryCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            stale_after: self.stale_after,
        }
    }
}

fn lock<V>(inner: &Mutex<Inner<V>>) -> MutexGuard<'_, Inner<V>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<V: Send + Sync + 'static> QueryCache<V> {
    pub fn new(stale_after: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                slots: HashMap::new(),
                next_id: 0,
            })),
            stale_after,
        }
    }

    /// Return the cached value for `key`, joining or starting a fetch if needed.
    ///
    /// `fetch` is only invoked on a miss (no slot, or a stale ready value).
    /// The lock is never held across an await.
    pub async fn get_or_fetch<F, Fut>(&self, key: QueryKey, fetch: F) -> Result<Arc<V>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        let shared = {
            let mut inner = lock(&self.inner);
            match self.lookup(&inner, &key) {
                Lookup::Hit(value) => {
                    tracing::trace!(key = ?key, "Query cache hit");
                    return Ok(value);
                }
                Lookup::Pending(fetch) => {
                    tracing::debug!(key = ?key, "Joining in-flight request");
                    fetch
                }
                Lookup::Miss => {
                    let id = inner.next_id;
                    inner.next_id = inner.next_id.wrapping_add(1);
                    let shared = self.start(key.clone(), id, fetch());
                    inner.slots.insert(
                        key,
                        Slot::InFlight {
                            id,
                            fetch: shared.clone(),
                        },
                    );
                    shared
                }
            }
        };

        shared.await
    }

    fn lookup(&self, inner: &Inner<V>, key: &QueryKey) -> Lookup<V> {
        match inner.slots.get(key) {
            Some(Slot::Ready { value, fetched_at }) => {
                let fresh = self
                    .stale_after
                    .map_or(true, |window| fetched_at.elapsed() < window);
                if fresh {
                    Lookup::Hit(Arc::clone(value))
                } else {
                    Lookup::Miss
                }
            }
            Some(Slot::InFlight { fetch, .. }) => Lookup::Pending(fetch.clone()),
            None => Lookup::Miss,
        }
    }

    fn start<Fut>(&self, key: QueryKey, id: u64, fut: Fut) -> SharedFetch<V>
    where
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        let cache = Arc::clone(&self.inner);
        async move {
            let result = fut.await.map(Arc::new);

            let mut inner = lock(&cache);
            // An invalidate or a newer fetch may have replaced our slot.
            let current = matches!(
                inner.slots.get(&key),
                Some(Slot::InFlight { id: slot_id, .. }) if *slot_id == id
            );
            if current {
                match &result {
                    Ok(value) => {
                        inner.slots.insert(
                            key,
                            Slot::Ready {
                                value: Arc::clone(value),
                                fetched_at: Instant::now(),
                            },
                        );
                    }
                    Err(e) => {
                        tracing::debug!(key = ?key, error = %e, "Dropping failed query");
                        inner.slots.remove(&key);
                    }
                }
            }
            drop(inner);

            result
        }
        .boxed()
        .shared()
    }

    /// The last ready value for `key`, stale or not. Never triggers a fetch.
    pub fn peek(&self, key: &QueryKey) -> Option<Arc<V>> {
        match lock(&self.inner).slots.get(key) {
            Some(Slot::Ready { value, .. }) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    pub fn is_in_flight(&self, key: &QueryKey) -> bool {
        matches!(
            lock(&self.inner).slots.get(key),
            Some(Slot::InFlight { .. })
        )
    }

    /// Forget `key`. A running fetch still completes for its callers but its
    /// result is not stored.
    pub fn invalidate(&self, key: &QueryKey) {
        lock(&self.inner).slots.remove(key);
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
