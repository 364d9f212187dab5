//! Stampede-safe TTL cache for provider results
//!
//! At most one upstream fetch per key is in flight at any time. Callers that
//! arrive while a fetch is running wait for its outcome instead of starting
//! their own. Failures are handed to every waiter and never stored.

use crate::api::ProviderId;
use crate::engine::ToolKind;
use crate::error::{ResolveError, Result};
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Cache key for tool results
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: ToolKind,
    /// Lower-cased, whitespace-collapsed query text
    pub query: String,
    pub provider: ProviderId,
    /// Provider parameters that affect the output
    pub params: String,
    pub count: usize,
}

impl CacheKey {
    /// Create a new cache key, normalizing the query text
    pub fn new(
        kind: ToolKind,
        query: &str,
        provider: ProviderId,
        params: impl Into<String>,
        count: usize,
    ) -> Self {
        Self {
            kind,
            query: normalize_query(query),
            provider,
            params: params.into(),
            count,
        }
    }
}

/// Lower-case a query and collapse runs of whitespace
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) < self.ttl
    }
}

type Completion<V> = watch::Receiver<Option<Result<V>>>;

struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    in_flight: HashMap<K, Completion<V>>,
}

fn lock<K, V>(state: &Mutex<CacheState<K, V>>) -> MutexGuard<'_, CacheState<K, V>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn purge<K: Eq + Hash, V>(state: &Mutex<CacheState<K, V>>) -> usize {
    let now = Instant::now();
    let mut state = lock(state);
    let before = state.entries.len();
    state.entries.retain(|_, entry| entry.is_live(now));
    before - state.entries.len()
}

/// Removes the in-flight marker when the fetch task ends, even by panic
struct InFlightGuard<K: Eq + Hash, V> {
    state: Arc<Mutex<CacheState<K, V>>>,
    key: K,
}

impl<K: Eq + Hash, V> Drop for InFlightGuard<K, V> {
    fn drop(&mut self) {
        lock(&self.state).in_flight.remove(&self.key);
    }
}

enum Lookup<V> {
    Hit(V),
    Wait(Completion<V>),
    Lead(watch::Sender<Option<Result<V>>>, Completion<V>),
}

/// Thread-safe TTL cache with per-key fetch deduplication
pub struct StampedeCache<K, V> {
    state: Arc<Mutex<CacheState<K, V>>>,
}

impl<K, V> Clone for StampedeCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<K, V> Default for StampedeCache<K, V> {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
            })),
        }
    }
}

impl<K, V> StampedeCache<K, V>
where
    K: Debug + Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a live value, or fetch it exactly once across concurrent callers
    ///
    /// The fetch runs on its own task, so it completes (and populates the
    /// cache) even if every caller stops waiting.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, ttl: Duration, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let mut completion = match self.lookup(&key) {
            Lookup::Hit(value) => {
                tracing::debug!("Cache hit for key: {:?}", key);
                return Ok(value);
            },
            Lookup::Wait(completion) => {
                tracing::debug!("Joining in-flight fetch for key: {:?}", key);
                completion
            },
            Lookup::Lead(sender, completion) => {
                tracing::debug!("Cache miss for key: {:?}", key);
                self.spawn_fetch(key, ttl, sender, fetch());
                completion
            },
        };

        match completion.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).clone().unwrap_or_else(|| {
                Err(ResolveError::ProviderUnavailable(
                    "fetch finished without a result".to_string(),
                ))
            }),
            Err(_) => Err(ResolveError::ProviderUnavailable(
                "upstream fetch aborted".to_string(),
            )),
        }
    }

    fn lookup(&self, key: &K) -> Lookup<V> {
        let now = Instant::now();
        let mut guard = lock(&self.state);
        let state = &mut *guard;

        match state.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Lookup::Hit(entry.value.clone()),
            Some(_) => {
                state.entries.remove(key);
            },
            None => {},
        }

        if let Some(completion) = state.in_flight.get(key) {
            return Lookup::Wait(completion.clone());
        }

        let (sender, completion) = watch::channel(None);
        state.in_flight.insert(key.clone(), completion.clone());
        Lookup::Lead(sender, completion)
    }

    fn spawn_fetch<Fut>(
        &self,
        key: K,
        ttl: Duration,
        sender: watch::Sender<Option<Result<V>>>,
        fetch: Fut,
    ) where
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let marker = InFlightGuard {
                state: Arc::clone(&state),
                key: key.clone(),
            };

            let outcome = fetch.await;
            match &outcome {
                Ok(value) => {
                    lock(&state).entries.insert(
                        key,
                        CacheEntry {
                            value: value.clone(),
                            created_at: Instant::now(),
                            ttl,
                        },
                    );
                },
                Err(e) => tracing::debug!("Fetch for key {:?} failed: {}", key, e),
            }

            drop(marker);
            sender.send_replace(Some(outcome));
        });
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        purge(&self.state)
    }

    /// Periodically purge expired entries
    ///
    /// The sweeper stops on its own once every handle to the cache is dropped.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let state = Arc::downgrade(&self.state);
        let every = every.max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(state) = state.upgrade() else {
                    break;
                };
                let removed = purge(&state);
                if removed > 0 {
                    tracing::debug!(removed, "Purged expired cache entries");
                }
            }
        })
    }

    /// Invalidate a specific cache entry
    pub fn invalidate(&self, key: &K) -> bool {
        lock(&self.state).entries.remove(key).is_some()
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        lock(&self.state).entries.clear();
    }

    /// Get the number of stored entries, expired ones included until purged
    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of fetches currently in flight
    pub fn in_flight(&self) -> usize {
        lock(&self.state).in_flight.len()
    }
}
