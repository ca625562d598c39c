//! Octoseek - debounced GitHub user search core
//!
//! The data-fetch orchestration behind a GitHub user search tool: a user
//! types a query, the session debounces it, searches GitHub, and lazily
//! loads the selected user's repositories. No server and no persistence,
//! just an in-memory query cache with TTL, in-flight de-duplication, and
//! per-lane retry budgets.
//!
//! # Architecture Layers
//!
//! - **config**: Application configuration and constants
//! - **domain**: Core entities (users, repositories)
//! - **infra**: GitHub REST API transport and error normalization
//! - **services**: Query cache lanes, debouncing, session orchestration
//! - **errors**: Centralized error handling
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use octoseek::{Config, GitHubDirectory, RestGitHubApi, SearchSession};
//!
//! # async fn run() -> octoseek::AppResult<()> {
//! let config = Config::from_env();
//! let api = Arc::new(RestGitHubApi::new(&config)?);
//! let session = SearchSession::new(Arc::new(GitHubDirectory::new(api)));
//!
//! let mut users = session.subscribe_users();
//! session.set_input("octo");
//! users.changed().await.ok();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;

// Re-export commonly used types at crate root
pub use config::Config;
pub use domain::{GitHubUser, Repository, SearchUsersResponse};
pub use errors::{AppError, AppResult};
pub use infra::{GitHubApi, RestGitHubApi};
pub use services::{GitHubDirectory, GitHubService, LaneState, QueryCache, SearchSession};
