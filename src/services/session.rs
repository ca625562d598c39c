//! Search session state and lane orchestration.
//!
//! Owns the raw query text and the selected user, drives the two query
//! lanes (user search, repositories), and publishes `(data, loading,
//! error)` snapshots per lane on watch channels. Results that resolve
//! after their key has moved on are discarded, never published.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{
    DEBOUNCE_DELAY, MIN_QUERY_LENGTH, REPOS_RETRY_BUDGET, SEARCH_RETRY_BUDGET, STALE_TTL,
};
use crate::domain::{GitHubUser, Repository};
use crate::errors::AppError;
use crate::services::debounce::Debouncer;
use crate::services::github_service::GitHubService;
use crate::services::query_cache::{LaneConfig, QueryCache};

/// Snapshot published to lane subscribers.
#[derive(Debug, Clone)]
pub struct LaneState<T: Clone> {
    /// Last successfully fetched value; retained while a refetch loads
    pub data: Option<T>,
    pub loading: bool,
    /// Most recent failure, cleared by a successful fetch
    pub error: Option<AppError>,
}

impl<T: Clone> LaneState<T> {
    pub fn idle() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }

    fn ready(data: T) -> Self {
        Self {
            data: Some(data),
            loading: false,
            error: None,
        }
    }

    fn failed(error: AppError) -> Self {
        Self {
            data: None,
            loading: false,
            error: Some(error),
        }
    }
}

struct SessionState {
    raw_input: String,
    debounced_term: String,
    selected: Option<GitHubUser>,
}

/// One user-facing search session: query text in, lane snapshots out.
pub struct SearchSession {
    users_lane: QueryCache<Vec<GitHubUser>>,
    repos_lane: QueryCache<Vec<Repository>>,
    state: Mutex<SessionState>,
    debouncer: Debouncer<String>,
    users_tx: watch::Sender<LaneState<Vec<GitHubUser>>>,
    repos_tx: watch::Sender<LaneState<Vec<Repository>>>,
    // Generation counters suppress results that resolve after the lane
    // key changed; in-flight fetches are never cancelled, only discarded.
    users_generation: AtomicU64,
    repos_generation: AtomicU64,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SearchSession {
    /// Create a session over the given service. Must run inside a tokio
    /// runtime; the session spawns a listener for debounced terms.
    pub fn new(service: Arc<dyn GitHubService>) -> Arc<Self> {
        let search_service = Arc::clone(&service);
        let users_lane = QueryCache::new(
            "users",
            LaneConfig {
                stale_ttl: STALE_TTL,
                retry_budget: SEARCH_RETRY_BUDGET,
            },
            move |term: String| {
                let service = Arc::clone(&search_service);
                async move { service.search_users(&term).await }
            },
        );

        let repos_service = Arc::clone(&service);
        let repos_lane = QueryCache::new(
            "repositories",
            LaneConfig {
                stale_ttl: STALE_TTL,
                retry_budget: REPOS_RETRY_BUDGET,
            },
            move |login: String| {
                let service = Arc::clone(&repos_service);
                async move { service.list_repositories(&login).await }
            },
        );

        let (debouncer, mut debounced_rx) = Debouncer::new(String::new(), DEBOUNCE_DELAY);
        let (users_tx, _) = watch::channel(LaneState::idle());
        let (repos_tx, _) = watch::channel(LaneState::idle());

        let session = Arc::new(Self {
            users_lane,
            repos_lane,
            state: Mutex::new(SessionState {
                raw_input: String::new(),
                debounced_term: String::new(),
                selected: None,
            }),
            debouncer,
            users_tx,
            repos_tx,
            users_generation: AtomicU64::new(0),
            repos_generation: AtomicU64::new(0),
            listener: Mutex::new(None),
        });

        // The listener holds only a weak handle so dropping the session
        // tears the loop down (the debouncer's sender goes with it).
        let weak = Arc::downgrade(&session);
        let listener = tokio::spawn(async move {
            while debounced_rx.changed().await.is_ok() {
                let term = debounced_rx.borrow_and_update().clone();
                let Some(session) = weak.upgrade() else { break };
                // Record the term and bump the generation here, in receive
                // order, so an older term can never win over a newer one.
                lock(&session.state).debounced_term = term.clone();
                let generation = session.users_generation.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::spawn(async move { session.run_search(term, generation).await });
            }
        });
        *lock(&session.listener) = Some(listener);

        session
    }

    // =========================================================================
    // Input and selection
    // =========================================================================

    /// Update the raw query text. The debouncer commits it after the
    /// quiet period; a term below the minimum length immediately clears
    /// the selected user and closes the repository view.
    pub fn set_input(&self, term: &str) {
        let below_minimum = term.chars().count() < MIN_QUERY_LENGTH;
        {
            let mut state = lock(&self.state);
            state.raw_input = term.to_string();
            if below_minimum && state.selected.take().is_some() {
                self.repos_generation.fetch_add(1, Ordering::SeqCst);
                self.repos_tx.send_replace(LaneState::idle());
            }
        }
        self.debouncer.update(term.to_string());
    }

    /// Select a user and load their repositories. Re-selecting a cached
    /// user publishes the cached list without a network call.
    pub async fn select_user(&self, user: GitHubUser) {
        let login = user.login.clone();
        lock(&self.state).selected = Some(user);

        let generation = self.repos_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.repos_tx.send_modify(|lane| {
            lane.loading = true;
            lane.error = None;
        });

        let result = self.repos_lane.get(&login).await;
        self.publish_repositories(generation, result);
    }

    /// Clear the selection and close the repository view.
    pub fn clear_selection(&self) {
        if lock(&self.state).selected.take().is_some() {
            self.repos_generation.fetch_add(1, Ordering::SeqCst);
            self.repos_tx.send_replace(LaneState::idle());
        }
    }

    /// Manual retry for the repositories lane after the automatic retry
    /// budget was exhausted. No-op without a selection.
    pub async fn refetch_repositories(&self) {
        let Some(login) = lock(&self.state)
            .selected
            .as_ref()
            .map(|user| user.login.clone())
        else {
            return;
        };

        let generation = self.repos_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.repos_tx.send_modify(|lane| {
            lane.loading = true;
            lane.error = None;
        });

        let result = self.repos_lane.refetch(&login).await;
        self.publish_repositories(generation, result);
    }

    // =========================================================================
    // Subscriptions and accessors
    // =========================================================================

    /// Subscribe to user-search lane snapshots.
    pub fn subscribe_users(&self) -> watch::Receiver<LaneState<Vec<GitHubUser>>> {
        self.users_tx.subscribe()
    }

    /// Subscribe to repository lane snapshots.
    pub fn subscribe_repositories(&self) -> watch::Receiver<LaneState<Vec<Repository>>> {
        self.repos_tx.subscribe()
    }

    pub fn raw_input(&self) -> String {
        lock(&self.state).raw_input.clone()
    }

    pub fn debounced_term(&self) -> String {
        lock(&self.state).debounced_term.clone()
    }

    pub fn selected_user(&self) -> Option<GitHubUser> {
        lock(&self.state).selected.clone()
    }

    /// Stop the debounce listener; pending timers are dropped with the
    /// session.
    pub fn shutdown(&self) {
        self.debouncer.cancel();
        if let Some(listener) = lock(&self.listener).take() {
            listener.abort();
        }
    }

    // =========================================================================
    // Lane execution
    // =========================================================================

    async fn run_search(self: Arc<Self>, term: String, generation: u64) {
        // A newer term may already have been committed by the time this
        // task first runs; it must not publish anything, not even loading.
        if self.users_generation.load(Ordering::SeqCst) != generation {
            return;
        }

        // Short terms publish an empty list without any fetch.
        if term.chars().count() < MIN_QUERY_LENGTH {
            self.users_tx.send_replace(LaneState::ready(Vec::new()));
            return;
        }

        self.users_tx.send_modify(|lane| {
            lane.loading = true;
            lane.error = None;
        });

        let result = self.users_lane.get(&term).await;

        if self.users_generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(term, "discarding stale search result");
            return;
        }

        match result {
            Ok(users) => self.users_tx.send_replace(LaneState::ready(users)),
            Err(e) => self.users_tx.send_replace(LaneState::failed(e)),
        };
    }

    fn publish_repositories(&self, generation: u64, result: Result<Vec<Repository>, AppError>) {
        if self.repos_generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("discarding stale repository result");
            return;
        }

        match result {
            Ok(repositories) => self.repos_tx.send_replace(LaneState::ready(repositories)),
            Err(e) => self.repos_tx.send_replace(LaneState::failed(e)),
        };
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        if let Some(listener) = lock(&self.listener).take() {
            listener.abort();
        }
    }
}

/// Lock with poison recovery; session state stays usable after a
/// panicked publisher.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
