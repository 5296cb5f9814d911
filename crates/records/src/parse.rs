use serde_json::Value;

use crate::models::{IssueRecord, ProfileRecord, RepoListing, StargazerRecord};
use crate::time::to_naive_utc;

/// Outcome of parsing one raw edge: either a flat record or a structural
/// skip. A skip means a required field was missing or null (a ghost
/// stargazer, a search edge that is not a user) and the item is dropped
/// without aborting the walk.
#[derive(Debug, Clone, PartialEq)]
pub enum Parse<T> {
    Row(T),
    Skip,
}

impl<T> Parse<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Parse::Row(row) => Some(row),
            Parse::Skip => None,
        }
    }
}

fn node_of(edge: &Value) -> Option<&Value> {
    match edge.get("node") {
        Some(node) if !node.is_null() => Some(node),
        _ => None,
    }
}

fn text(node: &Value, field: &str) -> Option<String> {
    node.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Issues and pull requests share one shape. A missing author is tolerated
/// (deleted account); a missing number or timestamp is structural.
pub fn issue(repository: &str, edge: &Value) -> Parse<IssueRecord> {
    let Some(node) = node_of(edge) else {
        return Parse::Skip;
    };
    let Some(number) = node.get("number").and_then(Value::as_i64) else {
        return Parse::Skip;
    };
    let Some(created_at) = node.get("createdAt").and_then(to_naive_utc) else {
        return Parse::Skip;
    };
    let Some(updated_at) = node.get("updatedAt").and_then(to_naive_utc) else {
        return Parse::Skip;
    };

    let user = node
        .get("author")
        .and_then(|author| author.get("login"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Parse::Row(IssueRecord {
        repository: repository.to_string(),
        user,
        number,
        comments: node
            .get("comments")
            .and_then(|comments| comments.get("totalCount"))
            .and_then(Value::as_i64)
            .unwrap_or(0),
        created_at,
        updated_at,
        closed_at: node.get("closedAt").and_then(to_naive_utc),
        state: text(node, "state").unwrap_or_default(),
        title: text(node, "title").unwrap_or_default(),
    })
}

/// A profile node from either the stargazer connection or the user search.
pub fn profile(node: &Value) -> Parse<ProfileRecord> {
    let user = match node.get("login").and_then(Value::as_str) {
        Some(login) if !login.is_empty() => login.to_string(),
        _ => return Parse::Skip,
    };

    Parse::Row(ProfileRecord {
        user,
        name: text(node, "name"),
        email: text(node, "email"),
        blog: text(node, "websiteUrl"),
        company: text(node, "company"),
        location: text(node, "location"),
        twitter: text(node, "twitterUsername"),
        user_created_at: node.get("createdAt").and_then(to_naive_utc),
        user_updated_at: node.get("updatedAt").and_then(to_naive_utc),
        bio: text(node, "bio"),
    })
}

/// Stargazer edges carry `starredAt` beside the node.
pub fn stargazer(repository: &str, edge: &Value) -> Parse<StargazerRecord> {
    let Some(node) = node_of(edge) else {
        return Parse::Skip;
    };
    let Some(starred_at) = edge.get("starredAt").and_then(to_naive_utc) else {
        return Parse::Skip;
    };
    match profile(node) {
        Parse::Row(profile) => Parse::Row(StargazerRecord {
            repository: repository.to_string(),
            starred_at,
            profile,
        }),
        Parse::Skip => Parse::Skip,
    }
}

/// Search edges for non-user results carry an empty node object.
pub fn search_user(edge: &Value) -> Parse<ProfileRecord> {
    match edge.get("node") {
        Some(node) if node.is_object() => profile(node),
        _ => Parse::Skip,
    }
}

/// Repository names under an owner, qualified to `owner/name`.
pub fn repository(owner: &str, edge: &Value) -> Parse<RepoListing> {
    let Some(node) = node_of(edge) else {
        return Parse::Skip;
    };
    match node.get("name").and_then(Value::as_str) {
        Some(name) => Parse::Row(RepoListing {
            repository: format!("{owner}/{name}"),
        }),
        None => Parse::Skip,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn issue_edge(author: Value) -> Value {
        json!({
            "node": {
                "author": author,
                "number": 7,
                "createdAt": "2023-01-02T00:00:00Z",
                "updatedAt": "2023-01-03T00:00:00Z",
                "closedAt": null,
                "state": "OPEN",
                "title": "Example",
                "comments": { "totalCount": 2 }
            }
        })
    }

    #[test]
    fn null_author_yields_record_without_user() {
        let parsed = issue("octo/example", &issue_edge(json!(null)));
        let record = parsed.into_option().unwrap();
        assert_eq!(record.user, None);
        assert_eq!(record.number, 7);
        assert_eq!(record.repository, "octo/example");
    }

    #[test]
    fn missing_number_is_a_structural_skip() {
        let edge = json!({
            "node": {
                "createdAt": "2023-01-02T00:00:00Z",
                "updatedAt": "2023-01-03T00:00:00Z"
            }
        });
        assert_eq!(issue("octo/example", &edge), Parse::Skip);
    }

    #[test]
    fn stargazer_with_null_node_is_skipped() {
        let edge = json!({ "node": null, "starredAt": "2023-01-01T00:00:00Z" });
        assert_eq!(stargazer("octo/example", &edge), Parse::Skip);
    }

    #[test]
    fn stargazer_timestamps_are_naive_utc() {
        let edge = json!({
            "node": {
                "login": "alice",
                "name": "Alice",
                "email": "",
                "websiteUrl": null,
                "company": null,
                "location": null,
                "twitterUsername": null,
                "createdAt": "2020-06-01T10:00:00+02:00",
                "updatedAt": "2023-06-01T10:00:00Z",
                "bio": null
            },
            "starredAt": "2023-06-02T00:00:00Z"
        });
        let record = stargazer("octo/example", &edge).into_option().unwrap();
        assert_eq!(
            record.profile.user_created_at.unwrap().to_string(),
            "2020-06-01 08:00:00"
        );
        assert_eq!(record.starred_at.to_string(), "2023-06-02 00:00:00");
    }

    #[test]
    fn search_edge_without_user_fields_is_skipped() {
        // Non-user search results surface as an empty node object.
        assert_eq!(search_user(&json!({ "node": {} })), Parse::Skip);
        assert_eq!(search_user(&json!({})), Parse::Skip);
    }

    #[test]
    fn repository_listing_is_owner_qualified() {
        let edge = json!({ "node": { "name": "widget" } });
        let listing = repository("octo", &edge).into_option().unwrap();
        assert_eq!(listing.repository, "octo/widget");
    }
}
