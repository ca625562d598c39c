//! GitHub REST API transport.
//!
//! `RestGitHubApi` is the sole translation point from HTTP and transport
//! failures into the [`AppError`] taxonomy; callers never see a raw
//! `reqwest` error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT as UA};
use reqwest::StatusCode;

use crate::config::{self, Config};
use crate::domain::{GitHubUser, Repository, SearchUsersResponse};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Raw endpoint calls against the GitHub REST API.
///
/// One method per endpoint; composition (detail merging, pagination)
/// lives in the service layer so it can be tested against this trait.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// `GET /search/users?q={query}&per_page={per_page}`
    async fn search_users(&self, query: &str, per_page: u32) -> AppResult<SearchUsersResponse>;

    /// `GET /users/{login}`
    async fn get_user(&self, login: &str) -> AppResult<GitHubUser>;

    /// `GET /users/{login}/repos?sort=updated&direction=desc&page={page}&per_page={per_page}`
    async fn get_repository_page(
        &self,
        login: &str,
        page: u32,
        per_page: u32,
    ) -> AppResult<Vec<Repository>>;
}

/// `reqwest`-backed implementation of [`GitHubApi`].
pub struct RestGitHubApi {
    http: reqwest::Client,
    base_url: String,
}

impl RestGitHubApi {
    /// Build a client with the standard GitHub headers. The bearer token
    /// is attached to every request when configured; without one the
    /// requests run unauthenticated.
    pub fn new(config: &Config) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(UA, HeaderValue::from_static(config::USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(config::GITHUB_ACCEPT));

        if let Some(token) = config.github_token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| AppError::validation("GitHub token contains invalid characters"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
            tracing::info!("GitHub client configured with bearer token");
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build HTTP client");
                AppError::connectivity("Failed to initialize the GitHub client.")
            })?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Map a non-success status onto the error taxonomy, then decode the
    /// JSON body.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        resource: &str,
        context: &str,
    ) -> AppResult<T> {
        let status = response.status();
        if !status.is_success() {
            let reset_at = parse_reset_header(response.headers());
            return Err(classify_status(status, reset_at, resource, context));
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!(error = %e, resource, "failed to decode GitHub response");
            AppError::connectivity(context)
        })
    }

    fn transport_error(e: reqwest::Error, context: &str) -> AppError {
        tracing::error!(error = %e, "GitHub request failed");
        AppError::connectivity(context.to_string())
    }
}

#[async_trait]
impl GitHubApi for RestGitHubApi {
    async fn search_users(&self, query: &str, per_page: u32) -> AppResult<SearchUsersResponse> {
        const CONTEXT: &str = "Failed to search GitHub users.";

        let url = format!("{}/search/users", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("q", query), ("per_page", &per_page.to_string())])
            .send()
            .await
            .map_err(|e| Self::transport_error(e, CONTEXT))?;

        let resource = format!("Users matching \"{query}\"");
        Self::decode(response, &resource, CONTEXT).await
    }

    async fn get_user(&self, login: &str) -> AppResult<GitHubUser> {
        const CONTEXT: &str = "Failed to fetch the GitHub user profile.";

        let url = format!("{}/users/{login}", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::transport_error(e, CONTEXT))?;

        let resource = format!("User \"{login}\"");
        Self::decode(response, &resource, CONTEXT).await
    }

    async fn get_repository_page(
        &self,
        login: &str,
        page: u32,
        per_page: u32,
    ) -> AppResult<Vec<Repository>> {
        const CONTEXT: &str = "Failed to fetch repositories.";

        let url = format!("{}/users/{login}/repos", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("sort", "updated"),
                ("direction", "desc"),
                ("per_page", &per_page.to_string()),
                ("page", &page.to_string()),
            ])
            .send()
            .await
            .map_err(|e| Self::transport_error(e, CONTEXT))?;

        let resource = format!("User \"{login}\"");
        Self::decode(response, &resource, CONTEXT).await
    }
}

/// Status-code to error-taxonomy mapping shared by all endpoints.
fn classify_status(
    status: StatusCode,
    reset_at: Option<DateTime<Utc>>,
    resource: &str,
    context: &str,
) -> AppError {
    match status {
        StatusCode::FORBIDDEN => AppError::RateLimited { reset_at },
        StatusCode::NOT_FOUND => AppError::not_found(resource),
        StatusCode::UNAUTHORIZED => AppError::Unauthorized,
        _ => {
            tracing::error!(%status, resource, "unexpected GitHub API status");
            AppError::connectivity(context.to_string())
        }
    }
}

/// Read `x-ratelimit-reset` (unix seconds) when present and well-formed.
fn parse_reset_header(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    headers
        .get(config::RATE_LIMIT_RESET_HEADER)?
        .to_str()
        .ok()?
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}
