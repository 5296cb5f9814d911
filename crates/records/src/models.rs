use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One issue or pull request, flattened to the persisted column set. The
/// two collections share a shape; the identity key is
/// `(repository, number)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub repository: String,
    /// Absent for deleted accounts and some bot authors.
    pub user: Option<String>,
    pub number: i64,
    pub comments: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub closed_at: Option<NaiveDateTime>,
    pub state: String,
    pub title: String,
}

/// A user profile as the API exposes it. Identity key is `user`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub user: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub blog: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub twitter: Option<String>,
    pub user_created_at: Option<NaiveDateTime>,
    pub user_updated_at: Option<NaiveDateTime>,
    pub bio: Option<String>,
}

impl ProfileRecord {
    /// A placeholder profile for a user the API could not resolve.
    pub fn bare(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            name: None,
            email: None,
            blog: None,
            company: None,
            location: None,
            twitter: None,
            user_created_at: None,
            user_updated_at: None,
            bio: None,
        }
    }
}

/// One star event with the profile captured at star time. Identity key is
/// `(repository, user)`; the earliest observation wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StargazerRecord {
    pub repository: String,
    pub starred_at: NaiveDateTime,
    #[serde(flatten)]
    pub profile: ProfileRecord,
}

/// One repository under an owner, from owner expansion. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoListing {
    pub repository: String,
}
