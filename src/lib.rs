pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{Cli, Command, RunArgs};

pub use adapters::{GitHubBackend, PagureBackend};
pub use config::{FinderConfig, ServiceSettings};
pub use crate::core::{
    aggregator::{apply_excludes, Aggregator},
    engine::ReportEngine,
    report::{render_markdown, Report, ReportMode},
};
pub use domain::{
    model::{Record, Service, TicketState},
    ports::Backend,
    window::DateWindow,
};
pub use utils::error::{FinderError, Result};
