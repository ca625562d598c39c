//! GitHub user entity and search response types.

use serde::{Deserialize, Serialize};

/// A GitHub user profile.
///
/// Both the `/users/{login}` detail payload and the slimmer
/// `/search/users` items deserialize into this type; the detail-only
/// fields fall back to their defaults on a search item, which is exactly
/// the partial record kept when a detail fetch fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubUser {
    /// Unique login name, the key for all per-user lookups
    pub login: String,
    pub id: u64,
    pub avatar_url: String,
    pub html_url: String,
    /// Display name; only present on the detail payload
    #[serde(default)]
    pub name: Option<String>,
    /// Public repository count; zero until the detail fetch fills it in
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub bio: Option<String>,
}

impl GitHubUser {
    /// Whether this record carries the detail-only profile fields.
    pub fn has_profile_details(&self) -> bool {
        self.name.is_some() || self.bio.is_some() || self.public_repos > 0
    }
}

/// Response from the GitHub user search endpoint (`/search/users`).
#[derive(Debug, Clone, Deserialize)]
pub struct SearchUsersResponse {
    pub total_count: u64,
    pub items: Vec<GitHubUser>,
}
