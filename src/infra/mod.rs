//! Infrastructure concerns (external APIs).

pub mod github;

pub use github::{GitHubApi, RestGitHubApi};

#[cfg(any(test, feature = "test-utils"))]
pub use github::MockGitHubApi;
