use anyhow::Result;
use async_trait::async_trait;
use http::{header, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

const GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("github api error: {status} for {endpoint}")]
    Http {
        status: StatusCode,
        endpoint: String,
    },
    #[error("graphql error: {message}")]
    Graphql { message: String },
}

impl ApiError {
    pub fn status(status: StatusCode, endpoint: impl Into<String>) -> Self {
        Self::Http {
            status,
            endpoint: endpoint.into(),
        }
    }

    pub fn graphql(message: impl Into<String>) -> Self {
        Self::Graphql {
            message: message.into(),
        }
    }
}

/// Request/response channel for the GraphQL endpoint. The core treats this
/// as a black box; tests substitute scripted transports.
#[async_trait]
pub trait GithubTransport: Send + Sync {
    async fn post_query(&self, query: &str) -> Result<Value>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    token: String,
    user_agent: String,
}

impl HttpTransport {
    pub fn new(token: String, user_agent: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            user_agent,
        }
    }
}

#[async_trait]
impl GithubTransport for HttpTransport {
    async fn post_query(&self, query: &str) -> Result<Value> {
        debug!(query, "dispatching graphql query");

        let response = self
            .client
            .post(GRAPHQL_ENDPOINT)
            .header(header::AUTHORIZATION, format!("token {}", self.token))
            .header(header::USER_AGENT, self.user_agent.clone())
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .json(&json!({ "query": query }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::status(status, "graphql").into());
        }

        let body: Value = response.json().await?;
        if let Some(error) = api_error(&body) {
            return Err(error.into());
        }
        Ok(body)
    }
}

/// An `errors` array in an otherwise-200 payload is fatal for the walk.
fn api_error(body: &Value) -> Option<ApiError> {
    let errors = body.get("errors")?.as_array()?;
    let message = errors
        .first()
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("unknown GraphQL error");
    Some(ApiError::graphql(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_payload_maps_to_graphql_error() {
        let body = json!({
            "data": null,
            "errors": [{ "message": "Could not resolve to a Repository" }]
        });
        let error = api_error(&body).unwrap();
        assert!(error
            .to_string()
            .contains("Could not resolve to a Repository"));
    }

    #[test]
    fn clean_payload_has_no_error() {
        let body = json!({ "data": { "repository": {} } });
        assert!(api_error(&body).is_none());
    }
}
