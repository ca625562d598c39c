//! Search session tests: debounce wiring, lane publication, stale-result
//! suppression, and cache-backed de-duplication.
//!
//! The service double is scripted by hand (mockall cannot model per-call
//! latency) and the tokio clock is paused, so every timing assertion is
//! deterministic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::{advance, sleep};

use octoseek::domain::{GitHubUser, Repository};
use octoseek::errors::{AppError, AppResult};
use octoseek::services::{GitHubService, LaneState, SearchSession};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn user(login: &str) -> GitHubUser {
    GitHubUser {
        login: login.to_string(),
        id: 1,
        avatar_url: format!("https://avatars.githubusercontent.com/{login}"),
        html_url: format!("https://github.com/{login}"),
        name: Some(login.to_string()),
        public_repos: 1,
        bio: None,
    }
}

fn repo(id: u64, name: &str) -> Repository {
    Repository {
        id,
        name: name.to_string(),
        full_name: format!("x/{name}"),
        html_url: format!("https://github.com/x/{name}"),
        description: None,
        stargazers_count: 0,
        language: None,
        updated_at: chrono::Utc::now(),
        topics: Vec::new(),
        visibility: "public".to_string(),
    }
}

/// Scripted [`GitHubService`] double: canned results, optional per-term
/// and per-login latency and failure counts, and call recording.
#[derive(Default)]
struct ScriptedService {
    users: Vec<GitHubUser>,
    users_by_term: HashMap<String, Vec<GitHubUser>>,
    search_delays: HashMap<String, Duration>,
    repos: HashMap<String, Vec<Repository>>,
    repo_delays: HashMap<String, Duration>,
    repo_failures: Mutex<HashMap<String, u32>>,
    search_terms: Mutex<Vec<String>>,
    repo_calls: Mutex<Vec<String>>,
}

impl ScriptedService {
    fn searched_terms(&self) -> Vec<String> {
        self.search_terms.lock().unwrap().clone()
    }

    fn repo_call_count(&self) -> usize {
        self.repo_calls.lock().unwrap().len()
    }

    fn fail_repos(&self, login: &str, times: u32) {
        self.repo_failures
            .lock()
            .unwrap()
            .insert(login.to_string(), times);
    }
}

#[async_trait]
impl GitHubService for ScriptedService {
    async fn search_users(&self, query: &str) -> AppResult<Vec<GitHubUser>> {
        self.search_terms.lock().unwrap().push(query.to_string());

        if let Some(delay) = self.search_delays.get(query) {
            sleep(*delay).await;
        }

        Ok(self
            .users_by_term
            .get(query)
            .cloned()
            .unwrap_or_else(|| self.users.clone()))
    }

    async fn list_repositories(&self, login: &str) -> AppResult<Vec<Repository>> {
        self.repo_calls.lock().unwrap().push(login.to_string());

        if let Some(delay) = self.repo_delays.get(login) {
            sleep(*delay).await;
        }

        {
            let mut failures = self.repo_failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(login) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(AppError::connectivity("Failed to fetch repositories."));
                }
            }
        }

        Ok(self.repos.get(login).cloned().unwrap_or_default())
    }
}

/// Wait for the next non-loading snapshot on a lane.
async fn settled<T: Clone>(rx: &mut watch::Receiver<LaneState<T>>) -> LaneState<T> {
    loop {
        rx.changed().await.expect("lane channel closed");
        let snapshot = rx.borrow_and_update().clone();
        if !snapshot.loading {
            return snapshot;
        }
    }
}

// =============================================================================
// Lane A: debounced user search
// =============================================================================

#[tokio::test(start_paused = true)]
async fn short_input_publishes_empty_list_without_fetching() {
    init_tracing();
    let service = Arc::new(ScriptedService {
        users: vec![user("alpha")],
        ..Default::default()
    });
    let session = SearchSession::new(service.clone());
    let mut users = session.subscribe_users();

    session.set_input("ab");
    advance(Duration::from_millis(301)).await;

    let snapshot = settled(&mut users).await;
    assert_eq!(snapshot.data, Some(Vec::new()));
    assert!(snapshot.error.is_none());
    assert!(service.searched_terms().is_empty(), "no network call allowed");
}

#[tokio::test(start_paused = true)]
async fn rapid_typing_searches_only_the_final_term() {
    init_tracing();
    let service = Arc::new(ScriptedService {
        users: vec![user("alpha"), user("beta")],
        ..Default::default()
    });
    let session = SearchSession::new(service.clone());
    let mut users = session.subscribe_users();

    session.set_input("r");
    session.set_input("ru");
    session.set_input("rust");
    advance(Duration::from_millis(301)).await;

    let snapshot = settled(&mut users).await;
    assert_eq!(snapshot.data.as_ref().map(Vec::len), Some(2));
    assert_eq!(service.searched_terms(), vec!["rust".to_string()]);
    assert_eq!(session.debounced_term(), "rust");
}

#[tokio::test(start_paused = true)]
async fn repeated_term_within_ttl_hits_the_cache() {
    init_tracing();
    let service = Arc::new(ScriptedService {
        users: vec![user("alpha")],
        ..Default::default()
    });
    let session = SearchSession::new(service.clone());
    let mut users = session.subscribe_users();

    session.set_input("rust");
    advance(Duration::from_millis(301)).await;
    settled(&mut users).await;

    session.set_input("rustc");
    advance(Duration::from_millis(301)).await;
    settled(&mut users).await;

    // Back to a term fetched moments ago: served from cache.
    session.set_input("rust");
    advance(Duration::from_millis(301)).await;
    settled(&mut users).await;

    assert_eq!(
        service.searched_terms(),
        vec!["rust".to_string(), "rustc".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn slow_abandoned_search_never_disturbs_the_newer_term() {
    init_tracing();
    let mut users_by_term = HashMap::new();
    users_by_term.insert("rust".to_string(), vec![user("old")]);
    users_by_term.insert("tokio".to_string(), vec![user("alpha"), user("beta")]);
    let mut search_delays = HashMap::new();
    // The abandoned term's fetch outlives everything else in the test.
    search_delays.insert("rust".to_string(), Duration::from_secs(10));
    let service = Arc::new(ScriptedService {
        users_by_term,
        search_delays,
        ..Default::default()
    });
    let session = SearchSession::new(service.clone());
    let mut users = session.subscribe_users();

    session.set_input("rust");
    advance(Duration::from_millis(301)).await;
    session.set_input("tokio");
    advance(Duration::from_millis(301)).await;

    let snapshot = settled(&mut users).await;
    assert_eq!(snapshot.data.as_ref().map(Vec::len), Some(2));
    assert_eq!(session.debounced_term(), "tokio");

    // The slow fetch resolves much later; it must not publish anything,
    // not a result and not a loading flip.
    advance(Duration::from_secs(10)).await;
    assert!(!users.has_changed().unwrap(), "stale task must stay silent");
    let snapshot = users.borrow().clone();
    assert!(!snapshot.loading);
    assert_eq!(snapshot.data.as_ref().map(Vec::len), Some(2));
    assert_eq!(session.debounced_term(), "tokio");
    assert_eq!(
        service.searched_terms(),
        vec!["rust".to_string(), "tokio".to_string()]
    );
}

// =============================================================================
// Lane B: repositories for the selected user
// =============================================================================

#[tokio::test(start_paused = true)]
async fn selecting_a_user_publishes_their_repositories() {
    init_tracing();
    let mut repos = HashMap::new();
    repos.insert("alpha".to_string(), vec![repo(1, "one"), repo(2, "two")]);
    let service = Arc::new(ScriptedService {
        repos,
        ..Default::default()
    });
    let session = SearchSession::new(service.clone());

    session.select_user(user("alpha")).await;

    let snapshot = session.subscribe_repositories().borrow().clone();
    assert_eq!(snapshot.data.as_ref().map(Vec::len), Some(2));
    assert_eq!(session.selected_user().unwrap().login, "alpha");
}

#[tokio::test(start_paused = true)]
async fn reselecting_a_cached_user_issues_no_new_fetch() {
    init_tracing();
    let service = Arc::new(ScriptedService::default());
    let session = SearchSession::new(service.clone());

    session.select_user(user("alpha")).await;
    session.select_user(user("alpha")).await;

    assert_eq!(service.repo_call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn rapid_reselection_publishes_the_latest_user() {
    init_tracing();
    let mut repos = HashMap::new();
    repos.insert("first".to_string(), vec![repo(1, "stale")]);
    repos.insert("second".to_string(), vec![repo(2, "fresh")]);
    let mut repo_delays = HashMap::new();
    // The first selection resolves long after the second.
    repo_delays.insert("first".to_string(), Duration::from_millis(500));
    repo_delays.insert("second".to_string(), Duration::from_millis(10));
    let service = Arc::new(ScriptedService {
        repos,
        repo_delays,
        ..Default::default()
    });
    let session = SearchSession::new(service.clone());

    tokio::join!(
        session.select_user(user("first")),
        session.select_user(user("second")),
    );

    let snapshot = session.subscribe_repositories().borrow().clone();
    let names: Vec<_> = snapshot
        .data
        .unwrap()
        .iter()
        .map(|r| r.name.clone())
        .collect();
    assert_eq!(names, vec!["fresh".to_string()], "stale result must be discarded");
    assert_eq!(service.repo_call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_surface_and_manual_refetch_recovers() {
    init_tracing();
    let mut repos = HashMap::new();
    repos.insert("alpha".to_string(), vec![repo(1, "one")]);
    let service = Arc::new(ScriptedService {
        repos,
        ..Default::default()
    });
    // Outlast the lane's two automatic retries.
    service.fail_repos("alpha", 3);

    let session = SearchSession::new(service.clone());
    session.select_user(user("alpha")).await;

    let snapshot = session.subscribe_repositories().borrow().clone();
    assert!(snapshot.error.is_some());
    assert_eq!(service.repo_call_count(), 3, "initial attempt plus two retries");

    session.refetch_repositories().await;

    let snapshot = session.subscribe_repositories().borrow().clone();
    assert!(snapshot.error.is_none(), "successful retry clears the notice");
    assert_eq!(snapshot.data.as_ref().map(Vec::len), Some(1));
    assert_eq!(service.repo_call_count(), 4);
}

// =============================================================================
// Selection lifecycle
// =============================================================================

#[tokio::test(start_paused = true)]
async fn short_input_clears_the_selection() {
    init_tracing();
    let service = Arc::new(ScriptedService::default());
    let session = SearchSession::new(service.clone());

    session.select_user(user("alpha")).await;
    assert!(session.selected_user().is_some());

    session.set_input("ab");

    assert!(session.selected_user().is_none());
    let snapshot = session.subscribe_repositories().borrow().clone();
    assert!(snapshot.data.is_none(), "repository view is closed");
}

#[tokio::test(start_paused = true)]
async fn long_input_keeps_the_selection() {
    init_tracing();
    let service = Arc::new(ScriptedService::default());
    let session = SearchSession::new(service.clone());

    session.select_user(user("alpha")).await;
    session.set_input("rustacean");

    assert_eq!(session.selected_user().unwrap().login, "alpha");
}

#[tokio::test(start_paused = true)]
async fn clear_selection_resets_the_repository_lane() {
    init_tracing();
    let mut repos = HashMap::new();
    repos.insert("alpha".to_string(), vec![repo(1, "one")]);
    let service = Arc::new(ScriptedService {
        repos,
        ..Default::default()
    });
    let session = SearchSession::new(service.clone());

    session.select_user(user("alpha")).await;
    session.clear_selection();

    assert!(session.selected_user().is_none());
    let snapshot = session.subscribe_repositories().borrow().clone();
    assert!(snapshot.data.is_none());
}

#[tokio::test(start_paused = true)]
async fn lanes_run_independently() {
    init_tracing();
    let mut repos = HashMap::new();
    repos.insert("alpha".to_string(), vec![repo(1, "one")]);
    let mut repo_delays = HashMap::new();
    repo_delays.insert("alpha".to_string(), Duration::from_millis(200));
    let service = Arc::new(ScriptedService {
        users: vec![user("alpha")],
        repos,
        repo_delays,
        ..Default::default()
    });
    let session = SearchSession::new(service.clone());
    let mut users = session.subscribe_users();

    // Kick off a slow repository fetch and a search at the same time.
    session.set_input("rust");
    let select = session.select_user(user("alpha"));
    let search = async {
        advance(Duration::from_millis(301)).await;
        settled(&mut users).await
    };
    let (_, snapshot) = tokio::join!(select, search);

    assert_eq!(snapshot.data.as_ref().map(Vec::len), Some(1));
    assert_eq!(service.searched_terms(), vec!["rust".to_string()]);
    assert_eq!(service.repo_call_count(), 1);
}
