//! Core domain entities.

pub mod repository;
pub mod user;

pub use repository::Repository;
pub use user::{GitHubUser, SearchUsersResponse};
