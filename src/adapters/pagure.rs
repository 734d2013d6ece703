use crate::domain::model::{Record, Service, TicketState};
use crate::domain::ports::Backend;
use crate::domain::window::DateWindow;
use crate::utils::error::{FinderError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// Where a listing endpoint keeps its entries and its pagination block.
#[derive(Debug, Clone, Copy)]
struct Listing {
    items_key: &'static str,
    pagination_key: &'static str,
}

const USER_ISSUES: Listing = Listing {
    items_key: "issues_assigned",
    pagination_key: "pagination_issues_assigned",
};

const USER_REQUESTS: Listing = Listing {
    items_key: "requests",
    pagination_key: "pagination",
};

const PROJECT_ISSUES: Listing = Listing {
    items_key: "issues",
    pagination_key: "pagination",
};

const PROJECT_REQUESTS: Listing = Listing {
    items_key: "requests",
    pagination_key: "pagination",
};

#[derive(Debug, Deserialize)]
struct PagureItem {
    title: String,
    full_url: String,
    status: String,
    #[serde(default)]
    closed_at: Value,
    #[serde(default)]
    date_created: Value,
}

/// Pagure sends timestamps as epoch seconds, usually inside a string.
fn parse_timestamp(value: &Value) -> std::result::Result<Option<DateTime<Utc>>, String> {
    let seconds = match value {
        Value::Null => return Ok(None),
        Value::String(s) if s.is_empty() => return Ok(None),
        Value::String(s) => s
            .parse::<i64>()
            .map_err(|_| format!("invalid timestamp '{}'", s))?,
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| format!("invalid timestamp '{}'", n))?,
        other => return Err(format!("invalid timestamp '{}'", other)),
    };

    DateTime::from_timestamp(seconds, 0)
        .map(Some)
        .ok_or_else(|| format!("timestamp out of range '{}'", seconds))
}

impl PagureItem {
    fn has_creation_date(&self) -> bool {
        match &self.date_created {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    fn into_record(self) -> std::result::Result<Record, String> {
        let state = TicketState::parse(&self.status)
            .ok_or_else(|| format!("unknown status '{}'", self.status))?;
        let closed_at = parse_timestamp(&self.closed_at)?;

        Ok(Record {
            title: self.title,
            url: self.full_url,
            state,
            service: Service::Pagure,
            closed_at,
        })
    }
}

pub struct PagureBackend {
    client: Client,
    base_url: String,
}

impl PagureBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("assignee-finder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FinderError::service_unavailable(Service::Pagure, "client setup", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn unavailable(subject: &str, reason: impl ToString) -> FinderError {
        FinderError::service_unavailable(Service::Pagure, subject, reason)
    }

    fn endpoint(&self, subject: &str, path: &str, params: &[(&str, String)]) -> Result<Url> {
        Url::parse_with_params(&format!("{}/api/0/{}", self.base_url, path), params)
            .map_err(|e| Self::unavailable(subject, format!("invalid URL: {}", e)))
    }

    /// Project path of a repository URL, e.g. `fedora-infra/ansible`.
    fn project_path(&self, repository: &str) -> Result<String> {
        let path = match repository.strip_prefix(&self.base_url) {
            Some(rest) => rest.to_string(),
            None => Url::parse(repository)
                .map_err(|e| Self::unavailable(repository, format!("invalid repository URL: {}", e)))?
                .path()
                .to_string(),
        };

        let path = path.trim_matches('/');
        if path.is_empty() {
            return Err(Self::unavailable(repository, "repository URL has no project path"));
        }
        Ok(path.to_string())
    }

    async fn fetch_page(&self, subject: &str, url: &str) -> Result<Value> {
        tracing::debug!("Pagure request: {}", url);
        let response = self
            .client
            .get(url)
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

        response
            .json()
            .await
            .map_err(|e| Self::unavailable(subject, format!("malformed response: {}", e)))
    }

    /// Follows `pagination.next` until the listing is exhausted.
    async fn collect(&self, subject: &str, first: Url, listing: Listing) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut next_page = Some(first.to_string());

        while let Some(url) = next_page.take() {
            let page = self.fetch_page(subject, &url).await?;

            let items = page
                .get(listing.items_key)
                .cloned()
                .ok_or_else(|| {
                    Self::unavailable(subject, format!("response has no '{}'", listing.items_key))
                })?;
            let items: Vec<PagureItem> = serde_json::from_value(items)
                .map_err(|e| Self::unavailable(subject, format!("malformed response: {}", e)))?;

            for item in items {
                if !item.has_creation_date() {
                    continue;
                }
                records.push(
                    item.into_record()
                        .map_err(|reason| Self::unavailable(subject, reason))?,
                );
            }

            next_page = page
                .get(listing.pagination_key)
                .and_then(|pagination| pagination.get("next"))
                .and_then(Value::as_str)
                .filter(|next| *next != url)
                .map(str::to_string);
        }

        // Open entries first, the rest in the order Pagure returned them.
        records.sort_by_key(|record| !record.is_open());
        tracing::debug!("Pagure returned {} records for '{}'", records.len(), subject);
        Ok(records)
    }
}

#[async_trait]
impl Backend for PagureBackend {
    fn service(&self) -> Service {
        Service::Pagure
    }

    async fn fetch_assigned(&self, username: &str, window: &DateWindow) -> Result<Vec<Record>> {
        let url = self.endpoint(
            username,
            &format!("user/{}/issues", username),
            &[
                ("status", "all".to_string()),
                ("author", "false".to_string()),
                ("since", window.since_timestamp().to_string()),
            ],
        )?;
        self.collect(username, url, USER_ISSUES).await
    }

    async fn fetch_authored(&self, username: &str, _window: &DateWindow) -> Result<Vec<Record>> {
        let url = self.endpoint(
            username,
            &format!("user/{}/requests/filed", username),
            &[("status", "all".to_string())],
        )?;
        self.collect(username, url, USER_REQUESTS).await
    }

    async fn fetch_closed(&self, repository: &str, window: &DateWindow) -> Result<Vec<Record>> {
        let project = self.project_path(repository)?;

        let issues_url = self.endpoint(
            repository,
            &format!("{}/issues", project),
            &[
                ("status", "Closed".to_string()),
                ("since", window.since_timestamp().to_string()),
            ],
        )?;
        let mut records = self.collect(repository, issues_url, PROJECT_ISSUES).await?;

        let requests_url = self.endpoint(
            repository,
            &format!("{}/pull-requests", project),
            &[("status", "Merged".to_string())],
        )?;
        records.extend(self.collect(repository, requests_url, PROJECT_REQUESTS).await?);

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_timestamp_variants() {
        assert_eq!(parse_timestamp(&Value::Null).unwrap(), None);
        assert_eq!(parse_timestamp(&json!("")).unwrap(), None);
        assert_eq!(
            parse_timestamp(&json!("1704067200")).unwrap(),
            DateTime::from_timestamp(1_704_067_200, 0)
        );
        assert_eq!(
            parse_timestamp(&json!(1_704_067_200)).unwrap(),
            DateTime::from_timestamp(1_704_067_200, 0)
        );
        assert!(parse_timestamp(&json!("soon")).is_err());
    }

    #[test]
    fn test_project_path_strips_base_url() {
        let backend = PagureBackend::new("https://pagure.io/").unwrap();
        assert_eq!(
            backend
                .project_path("https://pagure.io/fedora-infra/ansible")
                .unwrap(),
            "fedora-infra/ansible"
        );
        assert_eq!(
            backend
                .project_path("https://src.example.org/fork/user/project/")
                .unwrap(),
            "fork/user/project"
        );
        assert!(backend.project_path("https://pagure.io/").is_err());
    }

    #[test]
    fn test_item_without_creation_date_is_flagged() {
        let item: PagureItem = serde_json::from_value(json!({
            "title": "No date",
            "full_url": "https://pagure.io/p/issue/1",
            "status": "Open",
            "date_created": null,
        }))
        .unwrap();
        assert!(!item.has_creation_date());
    }
}
