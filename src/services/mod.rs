//! Application services: the GitHub operations, the query cache lanes,
//! and the session orchestration on top of them.

pub mod debounce;
pub mod github_service;
pub mod query_cache;
pub mod session;

pub use debounce::Debouncer;
pub use github_service::{GitHubDirectory, GitHubService};
pub use query_cache::{LaneConfig, QueryCache};
pub use session::{LaneState, SearchSession};

#[cfg(any(test, feature = "test-utils"))]
pub use github_service::MockGitHubService;
