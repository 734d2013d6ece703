//! GitHub backend over the GraphQL search API.
//!
//! Every operation is one or two search queries; the search string travels as a
//! GraphQL variable and results are paged with `pageInfo.endCursor`.

use crate::domain::model::{Record, Service, TicketState};
use crate::domain::ports::Backend;
use crate::domain::window::DateWindow;
use crate::utils::error::{FinderError, Result};
use crate::utils::validation::parse_github_repository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

const SEARCH_QUERY: &str = r#"
query($search: String!, $after: String) {
  search(query: $search, type: ISSUE, first: 50, after: $after) {
    pageInfo {
      hasNextPage
      endCursor
    }
    nodes {
      ... on Issue {
        title
        url
        state
        closedAt
      }
      ... on PullRequest {
        title
        url
        state
        closedAt
      }
    }
  }
}
"#;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<SearchData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    search: SearchConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchConnection {
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<Option<SearchNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

/// Nodes of other types come back as `{}`, hence every field is optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNode {
    title: Option<String>,
    url: Option<String>,
    state: Option<String>,
    closed_at: Option<String>,
}

impl SearchNode {
    fn into_record(self) -> std::result::Result<Option<Record>, String> {
        let (Some(title), Some(url), Some(state)) = (self.title, self.url, self.state) else {
            return Ok(None);
        };
        let state =
            TicketState::parse(&state).ok_or_else(|| format!("unknown state '{}'", state))?;
        let closed_at = self
            .closed_at
            .map(|value| {
                DateTime::parse_from_rfc3339(&value)
                    .map(|at| at.with_timezone(&Utc))
                    .map_err(|e| format!("invalid closedAt '{}': {}", value, e))
            })
            .transpose()?;

        Ok(Some(Record {
            title,
            url,
            state,
            service: Service::GitHub,
            closed_at,
        }))
    }
}

pub struct GitHubBackend {
    client: Client,
    api_url: String,
    token: String,
}

impl GitHubBackend {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("assignee-finder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FinderError::service_unavailable(Service::GitHub, "client setup", e))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            token: token.into(),
        })
    }

    fn unavailable(subject: &str, reason: impl ToString) -> FinderError {
        FinderError::service_unavailable(Service::GitHub, subject, reason)
    }

    /// Runs one search query to exhaustion.
    async fn search(&self, subject: &str, search: &str) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut after: Option<String> = None;

        loop {
            tracing::debug!("GitHub search '{}' (after: {:?})", search, after);
            let body = serde_json::json!({
                "query": SEARCH_QUERY,
                "variables": { "search": search, "after": after },
            });

            let response = self
                .client
                .post(&self.api_url)
                .header("Authorization", format!("bearer {}", self.token))
                .json(&body)
                .send()
                .await
                .map_err(|e| Self::unavailable(subject, e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(Self::unavailable(
                    subject,
                    format!("request failed with status '{}'", status),
                ));
            }

            let page: GraphQlResponse = response
                .json()
                .await
                .map_err(|e| Self::unavailable(subject, format!("malformed response: {}", e)))?;

            if !page.errors.is_empty() {
                let messages: Vec<&str> = page.errors.iter().map(|e| e.message.as_str()).collect();
                return Err(Self::unavailable(subject, messages.join("; ")));
            }

            let connection = page
                .data
                .ok_or_else(|| Self::unavailable(subject, "response carries no data"))?
                .search;

            for node in connection.nodes.into_iter().flatten() {
                if let Some(record) = node
                    .into_record()
                    .map_err(|reason| Self::unavailable(subject, reason))?
                {
                    records.push(record);
                }
            }

            match connection.page_info {
                PageInfo {
                    has_next_page: true,
                    end_cursor: Some(cursor),
                } => after = Some(cursor),
                _ => break,
            }
        }

        tracing::debug!("GitHub search '{}' returned {} records", search, records.len());
        Ok(records)
    }

    async fn search_all(&self, subject: &str, searches: &[String]) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for search in searches {
            records.extend(self.search(subject, search).await?);
        }
        Ok(records)
    }
}

#[async_trait]
impl Backend for GitHubBackend {
    fn service(&self) -> Service {
        Service::GitHub
    }

    async fn fetch_assigned(&self, username: &str, window: &DateWindow) -> Result<Vec<Record>> {
        let since = window.since().format(DATE_FORMAT);
        let searches = [
            format!("assignee:{} is:issue is:open", username),
            format!("assignee:{} is:issue closed:>={}", username, since),
        ];
        self.search_all(username, &searches).await
    }

    async fn fetch_authored(&self, username: &str, window: &DateWindow) -> Result<Vec<Record>> {
        let since = window.since().format(DATE_FORMAT);
        let searches = [
            format!("author:{} is:pr is:open", username),
            format!("author:{} is:pr closed:>={}", username, since),
        ];
        self.search_all(username, &searches).await
    }

    async fn fetch_closed(&self, repository: &str, window: &DateWindow) -> Result<Vec<Record>> {
        let (owner, name) = parse_github_repository(repository)
            .map_err(|reason| Self::unavailable(repository, reason))?;
        let range = format!(
            "{}..{}",
            window.since().format(DATE_FORMAT),
            window.till().format(DATE_FORMAT)
        );
        let searches = [
            format!("repo:{}/{} is:issue is:closed closed:{}", owner, name, range),
            format!("repo:{}/{} is:pr is:merged closed:{}", owner, name, range),
        ];
        self.search_all(repository, &searches).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_node_is_skipped() {
        let node: SearchNode = serde_json::from_str("{}").unwrap();
        assert_eq!(node.into_record().unwrap(), None);
    }

    #[test]
    fn test_node_with_unknown_state_is_rejected() {
        let node: SearchNode = serde_json::from_value(serde_json::json!({
            "title": "Draft",
            "url": "https://github.com/o/r/pull/1",
            "state": "DRAFTING",
        }))
        .unwrap();
        assert!(node.into_record().is_err());
    }

    #[test]
    fn test_closed_at_is_parsed_as_utc() {
        let node: SearchNode = serde_json::from_value(serde_json::json!({
            "title": "Closed",
            "url": "https://github.com/o/r/issues/2",
            "state": "CLOSED",
            "closedAt": "2024-03-18T23:30:00-02:00",
        }))
        .unwrap();
        let record = node.into_record().unwrap().unwrap();
        let expected = DateTime::parse_from_rfc3339("2024-03-19T01:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(record.closed_at, Some(expected));
    }

    #[test]
    fn test_malformed_closed_at_is_rejected() {
        let node: SearchNode = serde_json::from_value(serde_json::json!({
            "title": "Closed",
            "url": "https://github.com/o/r/issues/2",
            "state": "CLOSED",
            "closedAt": "yesterday",
        }))
        .unwrap();
        assert!(node.into_record().is_err());
    }
}
