//! GitHub service - user search and repository listing.
//!
//! Composes the raw endpoint calls from [`GitHubApi`] into the two
//! operations the session consumes: an ordered, detail-enriched user
//! search and a page-ordered repository listing.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::config::{MIN_QUERY_LENGTH, REPOS_PER_PAGE, SEARCH_RESULT_LIMIT};
use crate::domain::{GitHubUser, Repository};
use crate::errors::{AppError, AppResult};
use crate::infra::GitHubApi;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// GitHub operations consumed by the query lanes.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait GitHubService: Send + Sync {
    /// Search users and enrich each result with its full profile.
    async fn search_users(&self, query: &str) -> AppResult<Vec<GitHubUser>>;

    /// List a user's public repositories, most recently updated first.
    async fn list_repositories(&self, login: &str) -> AppResult<Vec<Repository>>;
}

/// Concrete implementation of [`GitHubService`] over a [`GitHubApi`].
pub struct GitHubDirectory<A: GitHubApi> {
    api: Arc<A>,
}

impl<A: GitHubApi> GitHubDirectory<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<A: GitHubApi> GitHubService for GitHubDirectory<A> {
    async fn search_users(&self, query: &str) -> AppResult<Vec<GitHubUser>> {
        // Below the minimum length there is nothing to search for.
        if query.chars().count() < MIN_QUERY_LENGTH {
            return Ok(Vec::new());
        }

        let response = self.api.search_users(query, SEARCH_RESULT_LIMIT).await?;
        tracing::debug!(query, hits = response.items.len(), "user search completed");

        // Detail fetches run concurrently; join_all keeps the output in
        // the search endpoint's order regardless of completion order. A
        // failed detail fetch keeps the partial search record instead of
        // failing the whole search.
        let detailed = join_all(response.items.into_iter().map(|summary| async move {
            match self.api.get_user(&summary.login).await {
                Ok(full) => full,
                Err(e) => {
                    tracing::warn!(
                        login = %summary.login,
                        error = %e,
                        "detail fetch failed, keeping partial search record"
                    );
                    summary
                }
            }
        }))
        .await;

        Ok(detailed)
    }

    async fn list_repositories(&self, login: &str) -> AppResult<Vec<Repository>> {
        if login.is_empty() {
            return Err(AppError::validation("Username is required"));
        }

        // The profile tells us how many pages to request up front.
        let profile = self.api.get_user(login).await?;
        if profile.public_repos == 0 {
            return Ok(Vec::new());
        }

        let pages = profile.public_repos.div_ceil(REPOS_PER_PAGE);
        tracing::debug!(login, total = profile.public_repos, pages, "fetching repository pages");

        // Page requests run concurrently; join_all returns them in page
        // order, so the concatenation is page-ascending by construction.
        let results = join_all(
            (1..=pages).map(|page| self.api.get_repository_page(login, page, REPOS_PER_PAGE)),
        )
        .await;

        let mut repositories = Vec::with_capacity(profile.public_repos as usize);
        for page in results {
            repositories.extend(page?);
        }

        Ok(repositories)
    }
}
