// Adapters layer: HTTP clients for the supported services.

pub mod github;
pub mod pagure;

use crate::config::FinderConfig;
use crate::domain::model::Service;
use crate::domain::ports::Backend;
use crate::utils::error::Result;

pub use github::GitHubBackend;
pub use pagure::PagureBackend;

/// Builds the client for `service` from an already validated configuration.
pub fn backend_for(service: Service, config: &FinderConfig) -> Result<Box<dyn Backend>> {
    match service {
        Service::Pagure => Ok(Box::new(PagureBackend::new(&config.pagure.pagure_url)?)),
        Service::GitHub => Ok(Box::new(GitHubBackend::new(
            config.github.github_api_url.clone(),
            config.github_token()?,
        )?)),
    }
}
