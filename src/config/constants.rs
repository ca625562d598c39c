//! Application-wide constants
//!
//! Centralized location for magic values to improve maintainability.

use std::time::Duration;

// =============================================================================
// GitHub API
// =============================================================================

/// Default GitHub REST API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// User-Agent sent with every request (GitHub rejects requests without one)
pub const USER_AGENT: &str = "octoseek";

/// Accept header value for the v3 REST API
pub const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Response header carrying the rate-limit reset time (unix seconds)
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Environment variable holding the optional bearer token
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

/// Environment variable overriding the API base URL
pub const ENV_API_BASE_URL: &str = "GITHUB_API_BASE_URL";

// =============================================================================
// Search
// =============================================================================

/// Queries shorter than this never hit the network
pub const MIN_QUERY_LENGTH: usize = 3;

/// Maximum number of users requested from the search endpoint
pub const SEARCH_RESULT_LIMIT: u32 = 5;

// =============================================================================
// Repositories
// =============================================================================

/// Repositories fetched per page (GitHub's maximum)
pub const REPOS_PER_PAGE: u32 = 100;

// =============================================================================
// Debounce
// =============================================================================

/// Quiet period after the last keystroke before a search term is committed
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(300);

// =============================================================================
// Query cache lanes
// =============================================================================

/// Cache entries older than this are refetched on next access
pub const STALE_TTL: Duration = Duration::from_secs(5 * 60);

/// Automatic retries for the user-search lane before surfacing an error
pub const SEARCH_RETRY_BUDGET: u32 = 1;

/// Automatic retries for the repositories lane before surfacing an error
pub const REPOS_RETRY_BUDGET: u32 = 2;
