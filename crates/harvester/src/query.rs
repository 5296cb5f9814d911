//! Query construction for the collection walks.
//!
//! Each collection is a static template carrying `{end_cursor}` and
//! (where the API supports it) `{filter_by}` placeholders beside its
//! parameters. Rendering substitutes plain strings; a template missing a
//! required placeholder is a programmer error and panics immediately.

use chrono::NaiveDateTime;

/// A logical collection query: the template text plus the response paths
/// the pagination engine needs to navigate one page.
pub struct CollectionTemplate {
    pub name: &'static str,
    pub body: &'static str,
    pub connection: &'static str,
    pub total_field: &'static str,
}

static ISSUES: CollectionTemplate = CollectionTemplate {
    name: "issues",
    body: r#"{
    repository(owner: "{owner}", name: "{name}") {
        issues(first: {page_size}{end_cursor}{filter_by}) {
            pageInfo {
                endCursor
                hasNextPage
            }
            totalCount
            edges {
                node {
                    author {
                        login
                    }
                    number
                    createdAt
                    updatedAt
                    closedAt
                    state
                    title
                    comments {
                        totalCount
                    }
                }
            }
        }
    }
}"#,
    connection: "data.repository.issues",
    total_field: "totalCount",
};

static PULL_REQUESTS: CollectionTemplate = CollectionTemplate {
    name: "pull requests",
    body: r#"{
    repository(owner: "{owner}", name: "{name}") {
        pullRequests(first: {page_size}{end_cursor}{filter_by}) {
            pageInfo {
                endCursor
                hasNextPage
            }
            totalCount
            edges {
                node {
                    author {
                        login
                    }
                    number
                    createdAt
                    updatedAt
                    closedAt
                    state
                    title
                    comments {
                        totalCount
                    }
                }
            }
        }
    }
}"#,
    connection: "data.repository.pullRequests",
    total_field: "totalCount",
};

static STARGAZERS: CollectionTemplate = CollectionTemplate {
    name: "stargazers",
    body: r#"{
    repository(owner: "{owner}", name: "{name}") {
        stargazers(first: {page_size}{end_cursor}{filter_by}) {
            pageInfo {
                endCursor
                hasNextPage
            }
            totalCount
            edges {
                node {
                    login
                    name
                    email
                    websiteUrl
                    company
                    location
                    twitterUsername
                    createdAt
                    updatedAt
                    bio
                }
                starredAt
            }
        }
    }
}"#,
    connection: "data.repository.stargazers",
    total_field: "totalCount",
};

static REPOSITORIES: CollectionTemplate = CollectionTemplate {
    name: "repositories",
    body: r#"{
    repositoryOwner(login: "{login}") {
        repositories(isFork: false, first: {page_size}{end_cursor}) {
            pageInfo {
                endCursor
                hasNextPage
            }
            totalCount
            edges {
                node {
                    name
                }
            }
        }
    }
}"#,
    connection: "data.repositoryOwner.repositories",
    total_field: "totalCount",
};

static USER_SEARCH: CollectionTemplate = CollectionTemplate {
    name: "users",
    body: r#"{
    search(query: "{usernames}", type: USER, first: {page_size}{end_cursor}) {
        pageInfo {
            endCursor
            hasNextPage
        }
        userCount
        edges {
            node {
                ... on User {
                    login
                    name
                    email
                    websiteUrl
                    company
                    location
                    twitterUsername
                    createdAt
                    updatedAt
                    bio
                }
            }
        }
    }
}"#,
    connection: "data.search",
    total_field: "userCount",
};

/// A template bound to its parameters, ready to render one page's query.
pub struct CollectionQuery {
    template: &'static CollectionTemplate,
    params: Vec<(&'static str, String)>,
    since: Option<NaiveDateTime>,
}

impl CollectionQuery {
    fn new(
        template: &'static CollectionTemplate,
        params: Vec<(&'static str, String)>,
        since: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            template,
            params,
            since,
        }
    }

    pub fn label(&self) -> &'static str {
        self.template.name
    }

    pub fn connection(&self) -> &'static str {
        self.template.connection
    }

    pub fn total_field(&self) -> &'static str {
        self.template.total_field
    }

    /// Render the query for one page. The cursor renders as a continuation
    /// filter after the first page; the watermark renders as a `since`
    /// filter clause.
    pub fn render(&self, cursor: Option<&str>) -> String {
        let mut query = self.template.body.to_string();
        for (placeholder, value) in &self.params {
            query = replace_required(query, placeholder, value);
        }

        let continuation = match cursor {
            Some(cursor) => format!(", after: \"{cursor}\""),
            None => String::new(),
        };
        query = replace_required(query, "{end_cursor}", &continuation);

        match self.since {
            Some(since) => {
                let clause = format!(
                    ", filterBy: {{since: \"{}\"}}",
                    since.format("%Y-%m-%dT%H:%M:%S")
                );
                query = replace_required(query, "{filter_by}", &clause);
            }
            None => query = query.replace("{filter_by}", ""),
        }
        query
    }
}

fn replace_required(query: String, placeholder: &str, value: &str) -> String {
    assert!(
        query.contains(placeholder),
        "query template missing placeholder {placeholder}"
    );
    query.replace(placeholder, value)
}

fn repository_params(owner: &str, name: &str, page_size: u32) -> Vec<(&'static str, String)> {
    vec![
        ("{owner}", owner.to_string()),
        ("{name}", name.to_string()),
        ("{page_size}", page_size.min(100).to_string()),
    ]
}

pub fn issues(
    owner: &str,
    name: &str,
    page_size: u32,
    since: Option<NaiveDateTime>,
) -> CollectionQuery {
    CollectionQuery::new(&ISSUES, repository_params(owner, name, page_size), since)
}

pub fn pull_requests(owner: &str, name: &str, page_size: u32) -> CollectionQuery {
    CollectionQuery::new(
        &PULL_REQUESTS,
        repository_params(owner, name, page_size),
        None,
    )
}

pub fn stargazers(owner: &str, name: &str, page_size: u32) -> CollectionQuery {
    CollectionQuery::new(&STARGAZERS, repository_params(owner, name, page_size), None)
}

pub fn repositories(login: &str, page_size: u32) -> CollectionQuery {
    CollectionQuery::new(
        &REPOSITORIES,
        vec![
            ("{login}", login.to_string()),
            ("{page_size}", page_size.min(100).to_string()),
        ],
        None,
    )
}

/// The search endpoint takes space-separated `user:` qualifiers; the caller
/// chunks identifiers to the page-size ceiling.
pub fn user_search(usernames: &[String], page_size: u32) -> CollectionQuery {
    let terms = usernames
        .iter()
        .map(|user| format!("user:{user}"))
        .collect::<Vec<_>>()
        .join(" ");
    CollectionQuery::new(
        &USER_SEARCH,
        vec![
            ("{usernames}", terms),
            ("{page_size}", page_size.min(100).to_string()),
        ],
        None,
    )
}
