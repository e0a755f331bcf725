//! Keyed request cache sitting between the page and the fetch client.
//!
//! Data is cached per [`QueryKey`]. While a new key is loading, or after a
//! failed fetch, the last successfully displayed page stays visible.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::client::FetchParams;
use crate::error::{Result, UsersError};
use crate::state::PAGE_LIMIT;
use crate::types::{Gender, UsersResponse};

/// Entries untouched for this many stale periods are dropped on the next insert.
const GC_STALE_PERIODS: u32 = 10;

/// Anything that can produce a page of users.
#[async_trait]
pub trait UsersSource {
    async fn fetch_users(&self, params: &FetchParams) -> Result<UsersResponse>;
}

/// Identifies one request: page, debounced search text and gender filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub page: u32,
    pub search: String,
    pub gender: Option<Gender>,
}

impl QueryKey {
    pub fn to_fetch_params(&self) -> FetchParams {
        FetchParams {
            page: self.page,
            limit: PAGE_LIMIT,
            search: self.search.clone(),
            gender: self.gender,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    data: UsersResponse,
    fetched_at: DateTime<Utc>,
}

/// What the page should show right now.
#[derive(Debug, Clone, Copy)]
pub enum Snapshot<'a> {
    /// Nothing has ever loaded.
    Loading,
    Ready {
        data: &'a UsersResponse,
        fetched_at: DateTime<Utc>,
        /// Set when the data belongs to a different key than the one last requested.
        stale_key: bool,
    },
}

pub struct QueryCache<S> {
    source: S,
    stale_after: Duration,
    entries: HashMap<QueryKey, Entry>,
    displayed: Option<QueryKey>,
    requested: Option<QueryKey>,
    last_error: Option<UsersError>,
}

impl<S: UsersSource> QueryCache<S> {
    pub fn new(source: S, stale_after: Duration) -> Self {
        Self {
            source,
            stale_after,
            entries: HashMap::new(),
            displayed: None,
            requested: None,
            last_error: None,
        }
    }

    /// Return cached data for `key` if still fresh, otherwise fetch it.
    pub async fn get(&mut self, key: &QueryKey) -> Snapshot<'_> {
        self.requested = Some(key.clone());

        if self.is_fresh(key) {
            tracing::debug!(?key, "serving users from cache");
            self.displayed = Some(key.clone());
            self.last_error = None;
            return self.snapshot();
        }

        self.fetch(key).await;
        self.snapshot()
    }

    /// Fetch `key` regardless of how fresh the cached copy is.
    pub async fn refetch(&mut self, key: &QueryKey) -> Snapshot<'_> {
        self.invalidate(key);
        self.get(key).await
    }

    /// Forget the cached data for `key` so the next `get` goes to the source.
    /// Data already on screen stays there until something replaces it.
    pub fn invalidate(&mut self, key: &QueryKey) {
        if self.displayed.as_ref() != Some(key) {
            self.entries.remove(key);
        } else if let Some(entry) = self.entries.get_mut(key) {
            entry.fetched_at = DateTime::<Utc>::UNIX_EPOCH;
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let Some(entry) = self.displayed.as_ref().and_then(|k| self.entries.get(k)) else {
            return Snapshot::Loading;
        };

        Snapshot::Ready {
            data: &entry.data,
            fetched_at: entry.fetched_at,
            stale_key: self.displayed != self.requested,
        }
    }

    /// The error from the most recent fetch, cleared by the next success.
    pub fn last_error(&self) -> Option<&UsersError> {
        self.last_error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<UsersError> {
        self.last_error.take()
    }

    fn is_fresh(&self, key: &QueryKey) -> bool {
        self.entries.get(key).is_some_and(|entry| {
            let age = Utc::now().signed_duration_since(entry.fetched_at);
            age.to_std().is_ok_and(|age| age < self.stale_after)
        })
    }

    /// Drop entries older than the GC window, except the one on screen.
    fn collect_garbage(&mut self) {
        let window = self.stale_after.saturating_mul(GC_STALE_PERIODS);
        let now = Utc::now();
        let displayed = self.displayed.as_ref();
        let before = self.entries.len();

        self.entries.retain(|key, entry| {
            let age = now.signed_duration_since(entry.fetched_at);
            Some(key) == displayed || age.to_std().map_or(true, |age| age < window)
        });

        let dropped = before - self.entries.len();
        if dropped > 0 {
            tracing::debug!(dropped, "collected unused cache entries");
        }
    }

    async fn fetch(&mut self, key: &QueryKey) {
        match self.source.fetch_users(&key.to_fetch_params()).await {
            Ok(data) => {
                tracing::debug!(?key, total = data.total, "users fetched");
                self.collect_garbage();
                self.entries.insert(
                    key.clone(),
                    Entry {
                        data,
                        fetched_at: Utc::now(),
                    },
                );
                self.displayed = Some(key.clone());
                self.last_error = None;
            }
            Err(e) => {
                tracing::warn!(?key, error = %e, "failed to fetch users");
                self.last_error = Some(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::types::User;

    /// In-memory directory that counts requests and can be told to fail.
    #[derive(Default)]
    struct FakeDirectory {
        users: Vec<User>,
        calls: AtomicUsize,
        failing: Mutex<bool>,
    }

    impl FakeDirectory {
        fn with_users(count: u64) -> Self {
            let users = (1..=count)
                .map(|id| User {
                    id,
                    username: format!("user{id}"),
                    gender: if id % 2 == 0 { Gender::Female } else { Gender::Male },
                    email: format!("user{id}@example.com"),
                    eye_color: "Brown".to_string(),
                })
                .collect();
            Self {
                users,
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn set_failing(&self, failing: bool) {
            *self.failing.lock().unwrap() = failing;
        }
    }

    #[async_trait]
    impl<'a> UsersSource for &'a FakeDirectory {
        async fn fetch_users(&self, params: &FetchParams) -> Result<UsersResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if *self.failing.lock().unwrap() {
                return Err(UsersError::FetchFailed { status: 500 });
            }

            let matching: Vec<User> = self
                .users
                .iter()
                .filter(|u| params.gender.map_or(true, |g| u.gender == g))
                .filter(|u| u.username.contains(&params.search))
                .cloned()
                .collect();
            let skip = params.skip();
            Ok(UsersResponse {
                total: matching.len() as u64,
                users: matching
                    .into_iter()
                    .skip(skip as usize)
                    .take(params.limit as usize)
                    .collect(),
                skip,
                limit: u64::from(params.limit),
            })
        }
    }

    fn key(page: u32, search: &str) -> QueryKey {
        QueryKey {
            page,
            search: search.to_string(),
            gender: None,
        }
    }

    fn page_of(snapshot: Snapshot<'_>) -> Vec<u64> {
        match snapshot {
            Snapshot::Ready { data, .. } => data.users.iter().map(|u| u.id).collect(),
            Snapshot::Loading => panic!("expected data"),
        }
    }

    #[tokio::test]
    async fn test_starts_loading() {
        let directory = FakeDirectory::with_users(5);
        let cache = QueryCache::new(&directory, Duration::from_secs(30));
        assert!(matches!(cache.snapshot(), Snapshot::Loading));
    }

    #[tokio::test]
    async fn test_fresh_entry_is_not_refetched() {
        let directory = FakeDirectory::with_users(25);
        let mut cache = QueryCache::new(&directory, Duration::from_secs(30));

        assert_eq!(page_of(cache.get(&key(1, "")).await), (1..=10).collect::<Vec<_>>());
        cache.get(&key(1, "")).await;
        assert_eq!(directory.calls(), 1);

        assert_eq!(page_of(cache.get(&key(3, "")).await), (21..=25).collect::<Vec<_>>());
        assert_eq!(directory.calls(), 2);
    }

    #[tokio::test]
    async fn test_zero_stale_time_always_fetches() {
        let directory = FakeDirectory::with_users(3);
        let mut cache = QueryCache::new(&directory, Duration::ZERO);
        cache.get(&key(1, "")).await;
        cache.get(&key(1, "")).await;
        assert_eq!(directory.calls(), 2);
    }

    #[tokio::test]
    async fn test_refetch_ignores_freshness() {
        let directory = FakeDirectory::with_users(3);
        let mut cache = QueryCache::new(&directory, Duration::from_secs(3600));
        cache.get(&key(1, "")).await;
        cache.refetch(&key(1, "")).await;
        assert_eq!(directory.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_next_get() {
        let directory = FakeDirectory::with_users(25);
        let mut cache = QueryCache::new(&directory, Duration::from_secs(3600));
        cache.get(&key(1, "")).await;
        cache.get(&key(2, "")).await;

        cache.invalidate(&key(1, ""));
        cache.invalidate(&key(2, ""));
        assert!(matches!(cache.snapshot(), Snapshot::Ready { .. }));

        cache.get(&key(1, "")).await;
        cache.get(&key(2, "")).await;
        assert_eq!(directory.calls(), 4);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_data() {
        let directory = FakeDirectory::with_users(25);
        let mut cache = QueryCache::new(&directory, Duration::from_secs(30));
        cache.get(&key(1, "")).await;

        directory.set_failing(true);
        match cache.get(&key(2, "")).await {
            Snapshot::Ready {
                data, stale_key, ..
            } => {
                assert_eq!(data.users[0].id, 1);
                assert!(stale_key);
            }
            Snapshot::Loading => panic!("previous page should stay visible"),
        }
        assert!(matches!(
            cache.last_error(),
            Some(UsersError::FetchFailed { status: 500 })
        ));

        directory.set_failing(false);
        assert_eq!(page_of(cache.refetch(&key(2, "")).await)[0], 11);
        assert!(cache.last_error().is_none());
    }

    #[tokio::test]
    async fn test_failure_before_first_load_stays_loading() {
        let directory = FakeDirectory::with_users(3);
        directory.set_failing(true);
        let mut cache = QueryCache::new(&directory, Duration::from_secs(30));
        assert!(matches!(cache.get(&key(1, "")).await, Snapshot::Loading));
        assert!(cache.last_error().is_some());
    }

    #[tokio::test]
    async fn test_old_entries_are_collected() {
        let directory = FakeDirectory::with_users(40);
        let mut cache = QueryCache::new(&directory, Duration::ZERO);
        for page in 1..=4 {
            cache.get(&key(page, "")).await;
        }
        // only the page on screen survives a zero-length window
        assert_eq!(cache.entries.len(), 2);
        assert_eq!(page_of(cache.snapshot())[0], 31);

        let mut cache = QueryCache::new(&directory, Duration::from_secs(3600));
        for page in 1..=4 {
            cache.get(&key(page, "")).await;
        }
        assert_eq!(cache.entries.len(), 4);
    }

    #[tokio::test]
    async fn test_keys_are_distinct_per_search() {
        let directory = FakeDirectory::with_users(12);
        let mut cache = QueryCache::new(&directory, Duration::from_secs(30));
        let all = page_of(cache.get(&key(1, "")).await);
        let ones = page_of(cache.get(&key(1, "user1")).await);
        assert_eq!(all.len(), 10);
        assert_eq!(ones, vec![1, 10, 11, 12]);
        assert_eq!(directory.calls(), 2);
    }
}
