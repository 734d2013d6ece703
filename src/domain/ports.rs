use crate::domain::model::{Record, Service};
use crate::domain::window::DateWindow;
use crate::utils::error::Result;
use async_trait::async_trait;

/// One issue-tracking service. Every failure is reported as
/// `FinderError::ServiceUnavailable`.
#[async_trait]
pub trait Backend: Send + Sync {
    fn service(&self) -> Service;

    /// Tickets assigned to `username`: open ones plus those closed since the window start.
    async fn fetch_assigned(&self, username: &str, window: &DateWindow) -> Result<Vec<Record>>;

    /// Pull requests authored by `username`: open ones plus those closed since the window start.
    async fn fetch_authored(&self, username: &str, window: &DateWindow) -> Result<Vec<Record>>;

    /// Closed tickets and merged pull requests of `repository`.
    async fn fetch_closed(&self, repository: &str, window: &DateWindow) -> Result<Vec<Record>>;
}
