//! Single-slot TTL cache for the statistics snapshot.
//!
//! Holds at most one snapshot together with the instant it was fetched.
//! A snapshot younger than the freshness window is served as-is. Older
//! (or missing) snapshots trigger one refresh; callers that arrive while
//! that refresh is running wait on the same shared future instead of
//! issuing their own upstream request.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use super::normalize::normalize;
use super::types::StatsSnapshot;
use crate::upstream::{with_retry, FetchError, RetryPolicy, StatsSource};

type RefreshResult = Result<Arc<StatsSnapshot>, FetchError>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshResult>>;

/// What a [`StatsCache::get`] call produced.
#[derive(Debug, Clone)]
pub enum StatsOutcome {
    /// Served from the cache without contacting upstream.
    Cached(Arc<StatsSnapshot>),
    /// Fetched from upstream by this call or a concurrent one.
    Fresh(Arc<StatsSnapshot>),
    /// Refresh failed; the previous snapshot is returned instead.
    Stale {
        snapshot: Arc<StatsSnapshot>,
        error: FetchError,
    },
    /// Refresh failed and nothing was cached.
    Failed(FetchError),
}

impl StatsOutcome {
    pub fn snapshot(&self) -> Option<&Arc<StatsSnapshot>> {
        match self {
            StatsOutcome::Cached(s) | StatsOutcome::Fresh(s) => Some(s),
            StatsOutcome::Stale { snapshot, .. } => Some(snapshot),
            StatsOutcome::Failed(_) => None,
        }
    }

    /// Short label for logs and response headers.
    pub fn label(&self) -> &'static str {
        match self {
            StatsOutcome::Cached(_) => "hit",
            StatsOutcome::Fresh(_) => "miss",
            StatsOutcome::Stale { .. } => "stale",
            StatsOutcome::Failed(_) => "error",
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: Arc<StatsSnapshot>,
    fetched_at: Instant,
}

#[derive(Default)]
struct Slot {
    entry: Option<CacheEntry>,
    in_flight: Option<SharedRefresh>,
}

/// Cache state visible through the config endpoint and logs.
#[derive(Debug, Clone, Copy)]
pub struct CacheStatus {
    pub has_snapshot: bool,
    pub age: Option<Duration>,
    /// An upstream refresh is running. Refreshes run on their own task,
    /// so this clears when the fetch ends even if no caller is waiting.
    pub refreshing: bool,
}

/// Owns the cached snapshot and the upstream it refreshes from.
pub struct StatsCache {
    source: Arc<dyn StatsSource>,
    username: Arc<str>,
    freshness: Duration,
    retry: RetryPolicy,
    slot: Arc<Mutex<Slot>>,
}

impl StatsCache {
    pub fn new(
        source: Arc<dyn StatsSource>,
        username: impl Into<Arc<str>>,
        freshness: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            source,
            username: username.into(),
            freshness,
            retry,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Returns the cached snapshot if fresh, otherwise refreshes it.
    pub async fn get(&self) -> StatsOutcome {
        let refresh = {
            let mut slot = lock(&self.slot);
            if let Some(entry) = &slot.entry {
                if entry.fetched_at.elapsed() < self.freshness {
                    return StatsOutcome::Cached(Arc::clone(&entry.snapshot));
                }
            }
            match &slot.in_flight {
                Some(pending) => {
                    tracing::debug!("Joining in-flight stats refresh");
                    pending.clone()
                }
                None => {
                    let pending = self.start_refresh();
                    slot.in_flight = Some(pending.clone());
                    tokio::spawn(pending.clone());
                    pending
                }
            }
        };

        match refresh.await {
            Ok(snapshot) => StatsOutcome::Fresh(snapshot),
            Err(error) => {
                let previous = lock(&self.slot).entry.as_ref().map(|e| Arc::clone(&e.snapshot));
                match previous {
                    Some(snapshot) => {
                        tracing::warn!(%error, "Stats refresh failed, serving stale snapshot");
                        StatsOutcome::Stale { snapshot, error }
                    }
                    None => {
                        tracing::error!(%error, "Stats refresh failed with nothing cached");
                        StatsOutcome::Failed(error)
                    }
                }
            }
        }
    }

    /// Reports whether a snapshot is held, its age, and whether a refresh runs.
    pub fn status(&self) -> CacheStatus {
        let slot = lock(&self.slot);
        CacheStatus {
            has_snapshot: slot.entry.is_some(),
            age: slot.entry.as_ref().map(|e| e.fetched_at.elapsed()),
            refreshing: slot.in_flight.is_some(),
        }
    }

    /// Builds the shared refresh future. It stores its own result in the
    /// slot and is driven by a spawned task, so the cache update completes
    /// even if every waiting caller goes away.
    fn start_refresh(&self) -> SharedRefresh {
        let source = Arc::clone(&self.source);
        let username = Arc::clone(&self.username);
        let retry = self.retry;
        let slot = Arc::clone(&self.slot);

        async move {
            tracing::info!(username = %username, "Refreshing stats from upstream");
            let result = with_retry(&retry, || source.fetch_profile(&username))
                .await
                .and_then(|response| normalize(response, chrono::Utc::now()))
                .map(Arc::new);

            let mut slot = lock(&slot);
            slot.in_flight = None;
            if let Ok(snapshot) = &result {
                slot.entry = Some(CacheEntry {
                    snapshot: Arc::clone(snapshot),
                    fetched_at: Instant::now(),
                });
                tracing::info!(
                    solved = snapshot.user_info.total_solved,
                    "Stats snapshot cached"
                );
            }
            result
        }
        .boxed()
        .shared()
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::GraphQlResponse;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays scripted responses and counts calls.
    struct ScriptedSource {
        calls: AtomicUsize,
        delay: Duration,
        script: Mutex<VecDeque<Result<serde_json::Value, FetchError>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<serde_json::Value, FetchError>>) -> Arc<Self> {
            Self::with_delay(script, Duration::ZERO)
        }

        fn with_delay(
            script: Vec<Result<serde_json::Value, FetchError>>,
            delay: Duration,
        ) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
                script: Mutex::new(script.into()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl StatsSource for ScriptedSource {
        fn fetch_profile<'a>(
            &'a self,
            _username: &'a str,
        ) -> BoxFuture<'a, Result<GraphQlResponse, FetchError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(FetchError::Status(500)));
            let delay = self.delay;
            async move {
                tokio::time::sleep(delay).await;
                next.map(|v| serde_json::from_value(v).unwrap())
            }
            .boxed()
        }
    }

    fn profile(easy: u64) -> serde_json::Value {
        serde_json::json!({
            "data": {
                "userInfo": {
                    "problemsSolved": {"acSubmissionNum": [{"difficulty": "Easy", "count": easy}]}
                },
                "allQuestionsCount": [{"difficulty": "Easy", "count": 800}]
            }
        })
    }

    fn cache(source: Arc<ScriptedSource>) -> StatsCache {
        StatsCache::new(
            source,
            "tester",
            Duration::from_secs(6 * 60 * 60),
            RetryPolicy::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_hits_within_window_fetch_once() {
        let source = ScriptedSource::new(vec![Ok(profile(5))]);
        let cache = cache(Arc::clone(&source));

        let first = cache.get().await;
        let second = cache.get().await;

        assert!(matches!(first, StatsOutcome::Fresh(_)));
        assert!(matches!(second, StatsOutcome::Cached(_)));
        assert_eq!(source.calls(), 1);

        let a = serde_json::to_vec(first.snapshot().unwrap().as_ref()).unwrap();
        let b = serde_json::to_vec(second.snapshot().unwrap().as_ref()).unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetches_after_window() {
        let source = ScriptedSource::new(vec![Ok(profile(5)), Ok(profile(6))]);
        let cache = cache(Arc::clone(&source));

        cache.get().await;
        tokio::time::advance(Duration::from_secs(6 * 60 * 60 + 1)).await;
        let outcome = cache.get().await;

        assert_eq!(source.calls(), 2);
        assert!(matches!(outcome, StatsOutcome::Fresh(_)));
        assert_eq!(outcome.snapshot().unwrap().user_info.easy_solved, 6);
        assert!(cache.status().age.unwrap() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_share_one_fetch() {
        let source = ScriptedSource::with_delay(vec![Ok(profile(5))], Duration::from_secs(2));
        let cache = cache(Arc::clone(&source));

        let (a, b, c) = tokio::join!(cache.get(), cache.get(), cache.get());

        assert_eq!(source.calls(), 1);
        for outcome in [a, b, c] {
            assert_eq!(outcome.snapshot().unwrap().user_info.easy_solved, 5);
        }
        assert!(!cache.status().refreshing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_serves_stale_snapshot() {
        let source = ScriptedSource::new(vec![Ok(profile(5)), Err(FetchError::Status(503))]);
        let cache = cache(Arc::clone(&source));

        cache.get().await;
        tokio::time::advance(Duration::from_secs(7 * 60 * 60)).await;
        let outcome = cache.get().await;

        match outcome {
            StatsOutcome::Stale { snapshot, error } => {
                assert_eq!(snapshot.user_info.easy_solved, 5);
                assert_eq!(error, FetchError::Status(503));
            }
            other => panic!("expected stale outcome, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_without_cache_is_error() {
        let source = ScriptedSource::new(vec![Err(FetchError::Status(404))]);
        let cache = cache(Arc::clone(&source));

        let outcome = cache.get().await;

        assert!(matches!(outcome, StatsOutcome::Failed(FetchError::Status(404))));
        assert!(!cache.status().has_snapshot);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_payload_is_not_cached() {
        let source = ScriptedSource::new(vec![
            Ok(serde_json::json!({"data": {"userInfo": null}})),
            Ok(profile(3)),
        ]);
        let cache = cache(Arc::clone(&source));

        let first = cache.get().await;
        assert!(matches!(first, StatsOutcome::Failed(FetchError::Invalid(_))));
        assert!(!cache.status().has_snapshot);

        let second = cache.get().await;
        assert!(matches!(second, StatsOutcome::Fresh(_)));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_is_retried() {
        let source = ScriptedSource::new(vec![
            Err(FetchError::RateLimited),
            Err(FetchError::RateLimited),
            Err(FetchError::RateLimited),
            Ok(profile(8)),
        ]);
        let cache = cache(Arc::clone(&source));
        let start = Instant::now();

        let outcome = cache.get().await;

        assert_eq!(source.calls(), 4);
        assert!(start.elapsed() >= Duration::from_secs(7));
        assert_eq!(outcome.snapshot().unwrap().user_info.easy_solved, 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_completes_without_waiters() {
        let source = ScriptedSource::with_delay(vec![Ok(profile(4))], Duration::from_secs(2));
        let cache = cache(Arc::clone(&source));

        let abandoned = tokio::time::timeout(Duration::from_millis(500), cache.get()).await;
        assert!(abandoned.is_err());
        assert!(cache.status().refreshing);

        tokio::time::sleep(Duration::from_secs(3)).await;

        let status = cache.status();
        assert!(!status.refreshing);
        assert!(status.has_snapshot);

        let outcome = cache.get().await;
        assert!(matches!(outcome, StatsOutcome::Cached(_)));
        assert_eq!(source.calls(), 1);
    }
}
