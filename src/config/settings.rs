//! Application settings loaded from environment variables.

use std::env;

use super::constants::{DEFAULT_API_BASE_URL, ENV_API_BASE_URL, ENV_GITHUB_TOKEN};

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Optional bearer token; unauthenticated requests work with lower
    /// rate limits, so absence is not an error.
    github_token: Option<String>,
    pub api_base_url: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "github_token",
                &self.github_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let github_token = env::var(ENV_GITHUB_TOKEN).ok().filter(|t| !t.is_empty());
        if github_token.is_none() {
            tracing::info!("no GitHub token configured, requests run unauthenticated");
        }

        Self {
            github_token,
            api_base_url: env::var(ENV_API_BASE_URL)
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
        }
    }

    /// Build a configuration without touching the environment (tests,
    /// embedding applications).
    pub fn new(github_token: Option<String>, api_base_url: impl Into<String>) -> Self {
        Self {
            github_token,
            api_base_url: api_base_url.into(),
        }
    }

    /// Bearer token for the Authorization header, if configured.
    pub fn github_token(&self) -> Option<&str> {
        self.github_token.as_deref()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None, DEFAULT_API_BASE_URL)
    }
}
