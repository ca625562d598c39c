//! Repository entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable repository snapshot from the GitHub API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    pub stargazers_count: u32,
    /// Primary language; absent for repositories without detected code
    #[serde(default)]
    pub language: Option<String>,
    pub updated_at: DateTime<Utc>,
    /// Topic tags in API order
    #[serde(default)]
    pub topics: Vec<String>,
    pub visibility: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_an_api_payload() {
        let json = r#"{
            "id": 1296269,
            "name": "Hello-World",
            "full_name": "octocat/Hello-World",
            "html_url": "https://github.com/octocat/Hello-World",
            "description": "My first repository",
            "stargazers_count": 80,
            "language": "Rust",
            "updated_at": "2024-03-22T10:31:00Z",
            "topics": ["demo", "starter"],
            "visibility": "public"
        }"#;

        let repo: Repository = serde_json::from_str(json).unwrap();
        assert_eq!(repo.full_name, "octocat/Hello-World");
        assert_eq!(repo.topics, vec!["demo", "starter"]);
        assert_eq!(repo.stargazers_count, 80);
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = r#"{
            "id": 2,
            "name": "scratch",
            "full_name": "octocat/scratch",
            "html_url": "https://github.com/octocat/scratch",
            "stargazers_count": 0,
            "updated_at": "2024-01-05T08:00:00Z",
            "visibility": "public"
        }"#;

        let repo: Repository = serde_json::from_str(json).unwrap();
        assert!(repo.description.is_none());
        assert!(repo.language.is_none());
        assert!(repo.topics.is_empty());
    }
}
