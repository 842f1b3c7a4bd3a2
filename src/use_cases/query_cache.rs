// Request cache keyed by resource and parameters, with a freshness window,
// in-flight de-duplication and explicit invalidation.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::{ApiError, Clock, Resource};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryScope {
    // Canonical query string of a list request.
    List(String),
    Detail(i64),
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub resource: Resource,
    pub scope: QueryScope,
}

impl QueryKey {
    pub fn list(resource: Resource, params: impl Into<String>) -> Self {
        Self {
            resource,
            scope: QueryScope::List(params.into()),
        }
    }

    pub fn detail(resource: Resource, id: i64) -> Self {
        Self {
            resource,
            scope: QueryScope::Detail(id),
        }
    }

    pub fn custom(resource: Resource, name: impl Into<String>) -> Self {
        Self {
            resource,
            scope: QueryScope::Custom(name.into()),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            QueryScope::List(params) => write!(f, "{}/list?{params}", self.resource),
            QueryScope::Detail(id) => write!(f, "{}/detail/{id}", self.resource),
            QueryScope::Custom(name) => write!(f, "{}/{name}", self.resource),
        }
    }
}

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, ApiError>>>;

struct Entry<V> {
    value: V,
    stored_at: u64,
}

struct InFlight<V> {
    generation: u64,
    future: SharedFetch<V>,
}

struct CacheState<V> {
    entries: HashMap<QueryKey, Entry<V>>,
    in_flight: HashMap<QueryKey, InFlight<V>>,
    next_generation: u64,
}

pub struct QueryCache<V, C> {
    clock: C,
    fresh_for_millis: u64,
    state: Mutex<CacheState<V>>,
}

impl<V, C> QueryCache<V, C>
where
    V: Clone + Send + Sync + 'static,
    C: Clock,
{
    pub fn new(clock: C, fresh_for: Duration) -> Self {
        Self {
            clock,
            fresh_for_millis: u64::try_from(fresh_for.as_millis()).unwrap_or(u64::MAX),
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
                next_generation: 0,
            }),
        }
    }

    // Returns the cached value only while it is still fresh.
    pub async fn get(&self, key: &QueryKey) -> Option<V> {
        let state = self.state.lock().await;
        self.fresh_value(&state, key)
    }

    pub async fn set(&self, key: QueryKey, value: V) {
        let stored_at = self.clock.now_millis();
        let mut state = self.state.lock().await;
        self.prune(&mut state, stored_at);
        state.entries.insert(key, Entry { value, stored_at });
    }

    pub async fn invalidate_key(&self, key: &QueryKey) -> bool {
        let mut state = self.state.lock().await;
        // Dropping the in-flight handle makes its eventual result a no-op.
        let in_flight = state.in_flight.remove(key).is_some();
        state.entries.remove(key).is_some() || in_flight
    }

    // Drops every list query of `resource`, keeping detail entries.
    pub async fn invalidate_lists(&self, resource: Resource) -> usize {
        self.invalidate_where(|key| {
            key.resource == resource && matches!(key.scope, QueryScope::List(_))
        })
        .await
    }

    pub async fn invalidate_resource(&self, resource: Resource) -> usize {
        self.invalidate_where(|key| key.resource == resource).await
    }

    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.in_flight.clear();
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns the fresh cached value for `key`, joins a request already in
    /// flight for it, or starts `loader`.
    ///
    /// Failures are handed to every waiter and never cached.
    pub async fn fetch<F>(&self, key: QueryKey, loader: F) -> Result<V, ApiError>
    where
        F: FnOnce() -> BoxFuture<'static, Result<V, ApiError>>,
    {
        let (generation, future) = {
            let mut state = self.state.lock().await;
            if let Some(value) = self.fresh_value(&state, &key) {
                tracing::debug!(%key, "cache hit");
                return Ok(value);
            }

            let joined = state
                .in_flight
                .get(&key)
                .map(|flight| (flight.generation, flight.future.clone()));
            match joined {
                Some(joined) => {
                    tracing::debug!(%key, "joining in-flight request");
                    joined
                }
                None => Self::start(&mut state, key.clone(), loader),
            }
        };

        let result = future.await;
        self.settle(key, generation, result).await
    }

    /// Starts a new request for `key` regardless of cache state. Any request
    /// already in flight is superseded and its result will not be applied.
    pub async fn refresh<F>(&self, key: QueryKey, loader: F) -> Result<V, ApiError>
    where
        F: FnOnce() -> BoxFuture<'static, Result<V, ApiError>>,
    {
        let (generation, future) = {
            let mut state = self.state.lock().await;
            Self::start(&mut state, key.clone(), loader)
        };

        let result = future.await;
        self.settle(key, generation, result).await
    }

    fn start<F>(state: &mut CacheState<V>, key: QueryKey, loader: F) -> (u64, SharedFetch<V>)
    where
        F: FnOnce() -> BoxFuture<'static, Result<V, ApiError>>,
    {
        state.next_generation += 1;
        let generation = state.next_generation;
        let future = loader().shared();
        state.in_flight.insert(
            key,
            InFlight {
                generation,
                future: future.clone(),
            },
        );
        (generation, future)
    }

    async fn settle(
        &self,
        key: QueryKey,
        generation: u64,
        result: Result<V, ApiError>,
    ) -> Result<V, ApiError> {
        let mut state = self.state.lock().await;
        match state.in_flight.get(&key).map(|flight| flight.generation) {
            Some(current) if current == generation => {
                state.in_flight.remove(&key);
                if let Ok(value) = &result {
                    let stored_at = self.clock.now_millis();
                    self.prune(&mut state, stored_at);
                    state.entries.insert(
                        key,
                        Entry {
                            value: value.clone(),
                            stored_at,
                        },
                    );
                }
            }
            Some(_) => {
                tracing::debug!(%key, generation, "discarding superseded response");
            }
            // Settled by another waiter, or invalidated while in flight.
            None => {}
        }
        result
    }

    // Stale entries can never be served again; drop them on every write.
    fn prune(&self, state: &mut CacheState<V>, now: u64) {
        let before = state.entries.len();
        state
            .entries
            .retain(|_, entry| now.saturating_sub(entry.stored_at) < self.fresh_for_millis);
        let pruned = before - state.entries.len();
        if pruned > 0 {
            tracing::trace!(pruned, "dropped stale cache entries");
        }
    }

    fn fresh_value(&self, state: &CacheState<V>, key: &QueryKey) -> Option<V> {
        let entry = state.entries.get(key)?;
        let age = self.clock.now_millis().saturating_sub(entry.stored_at);
        (age < self.fresh_for_millis).then(|| entry.value.clone())
    }

    async fn invalidate_where(&self, matches: impl Fn(&QueryKey) -> bool) -> usize {
        let mut state = self.state.lock().await;
        let before = state.entries.len();
        state.entries.retain(|key, _| !matches(key));
        state.in_flight.retain(|key, _| !matches(key));
        before - state.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransportKind;
    use crate::use_cases::test_support::ManualClock;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    const FRESH: Duration = Duration::from_secs(30);

    fn cache(clock: &ManualClock) -> QueryCache<u32, ManualClock> {
        QueryCache::new(clock.clone(), FRESH)
    }

    fn counting_loader(
        calls: &Arc<AtomicUsize>,
        value: u32,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<u32, ApiError>> {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(value) }.boxed()
        }
    }

    fn gated_loader(
        gate: oneshot::Receiver<()>,
        value: u32,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<u32, ApiError>> {
        move || {
            async move {
                gate.await.map_err(|_| ApiError::Transport {
                    kind: TransportKind::Other,
                    message: "gate dropped".to_string(),
                })?;
                Ok(value)
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn when_entry_is_fresh_then_loader_is_not_called_again() {
        let clock = ManualClock::at(1_000);
        let cache = cache(&clock);
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::list(Resource::Crops, "");

        let first = cache.fetch(key.clone(), counting_loader(&calls, 1)).await;
        clock.advance(29_999);
        let second = cache.fetch(key, counting_loader(&calls, 2)).await;

        assert_eq!(first, Ok(1));
        assert_eq!(second, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn when_entry_is_stale_then_a_new_request_overwrites_it() {
        let clock = ManualClock::at(1_000);
        let cache = cache(&clock);
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::detail(Resource::Farms, 3);

        cache
            .fetch(key.clone(), counting_loader(&calls, 1))
            .await
            .expect("expected first fetch");
        clock.advance(30_000);
        let second = cache.fetch(key.clone(), counting_loader(&calls, 2)).await;

        assert_eq!(second, Ok(2));
        assert_eq!(cache.get(&key).await, Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn when_two_fetches_overlap_then_one_request_is_shared() {
        let clock = ManualClock::at(0);
        let cache = cache(&clock);
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::list(Resource::Seasons, "page=0&size=20");
        let (open, gate) = oneshot::channel();

        let counted = {
            let calls = Arc::clone(&calls);
            let gated = gated_loader(gate, 7);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                gated()
            }
        };

        let (first, second, _) = tokio::join!(
            cache.fetch(key.clone(), counted),
            cache.fetch(key.clone(), counting_loader(&calls, 9)),
            async {
                tokio::task::yield_now().await;
                let _ = open.send(());
            }
        );

        assert_eq!(first, Ok(7));
        assert_eq!(second, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(&key).await, Some(7));
    }

    #[tokio::test]
    async fn when_key_is_invalidated_mid_flight_then_late_result_is_not_cached() {
        let clock = ManualClock::at(0);
        let cache = cache(&clock);
        let key = QueryKey::list(Resource::Suppliers, "");
        let (open, gate) = oneshot::channel();

        let (result, _) = tokio::join!(cache.fetch(key.clone(), gated_loader(gate, 1)), async {
            tokio::task::yield_now().await;
            cache.invalidate_lists(Resource::Suppliers).await;
            let _ = open.send(());
        });

        assert_eq!(result, Ok(1));
        assert_eq!(cache.get(&key).await, None);
    }

    #[tokio::test]
    async fn when_refresh_supersedes_a_request_then_only_the_newer_result_is_kept() {
        let clock = ManualClock::at(0);
        let cache = cache(&clock);
        let key = QueryKey::list(Resource::Tasks, "");
        let (open_old, gate_old) = oneshot::channel();
        let calls = Arc::new(AtomicUsize::new(0));

        let (old, new) = tokio::join!(cache.fetch(key.clone(), gated_loader(gate_old, 1)), async {
            tokio::task::yield_now().await;
            let fresh = cache.refresh(key.clone(), counting_loader(&calls, 2)).await;
            let _ = open_old.send(());
            fresh
        });

        assert_eq!(old, Ok(1));
        assert_eq!(new, Ok(2));
        assert_eq!(cache.get(&key).await, Some(2));
    }

    #[tokio::test]
    async fn when_loader_fails_then_error_is_returned_and_not_cached() {
        let clock = ManualClock::at(0);
        let cache = cache(&clock);
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::detail(Resource::Documents, 1);

        let failed = cache
            .fetch(key.clone(), || {
                async {
                    Err(ApiError::Server {
                        status: 500,
                        message: None,
                    })
                }
                .boxed()
            })
            .await;
        let retried = cache.fetch(key, counting_loader(&calls, 4)).await;

        assert!(matches!(failed, Err(ApiError::Server { status: 500, .. })));
        assert_eq!(retried, Ok(4));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn when_lists_are_invalidated_then_details_survive() {
        let clock = ManualClock::at(0);
        let cache = cache(&clock);
        cache.set(QueryKey::list(Resource::Crops, "a"), 1).await;
        cache.set(QueryKey::list(Resource::Crops, "b"), 2).await;
        cache.set(QueryKey::detail(Resource::Crops, 1), 3).await;
        cache.set(QueryKey::list(Resource::Farms, ""), 4).await;

        let removed = cache.invalidate_lists(Resource::Crops).await;

        assert_eq!(removed, 2);
        assert_eq!(cache.get(&QueryKey::detail(Resource::Crops, 1)).await, Some(3));
        assert_eq!(cache.get(&QueryKey::list(Resource::Farms, "")).await, Some(4));
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn when_resource_is_invalidated_then_all_of_its_keys_go() {
        let clock = ManualClock::at(0);
        let cache = cache(&clock);
        cache.set(QueryKey::list(Resource::Roles, ""), 1).await;
        cache.set(QueryKey::custom(Resource::Roles, "summary"), 2).await;

        assert_eq!(cache.invalidate_resource(Resource::Roles).await, 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn when_entries_expire_then_the_next_write_drops_them() {
        let clock = ManualClock::at(0);
        let cache = cache(&clock);
        let calls = Arc::new(AtomicUsize::new(0));
        cache.set(QueryKey::list(Resource::Crops, "a"), 1).await;
        cache.set(QueryKey::detail(Resource::Farms, 1), 2).await;

        clock.advance(30_000);
        cache.set(QueryKey::list(Resource::Crops, "b"), 3).await;
        assert_eq!(cache.len().await, 1);

        clock.advance(30_000);
        cache
            .fetch(QueryKey::detail(Resource::Plots, 4), counting_loader(&calls, 5))
            .await
            .expect("expected plot");
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&QueryKey::detail(Resource::Plots, 4)).await, Some(5));
    }

    #[test]
    fn when_key_is_displayed_then_scope_is_readable() {
        assert_eq!(
            QueryKey::list(Resource::SupplyLots, "page=0").to_string(),
            "supply lots/list?page=0"
        );
        assert_eq!(QueryKey::detail(Resource::Farms, 2).to_string(), "farms/detail/2");
    }
}
