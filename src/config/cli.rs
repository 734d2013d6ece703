use crate::core::report::ReportMode;
use crate::domain::window::{DateWindow, DEFAULT_DAYS_AGO};
use crate::utils::error::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "assignee-finder")]
#[command(about = "Report tickets and pull requests from Pagure and GitHub as Markdown")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Get open and recently closed tickets assigned to the configured users
    GetTickets(RunArgs),
    /// Get open and recently closed pull requests authored by the configured users
    GetPullRequests(RunArgs),
    /// Get issues and pull requests closed on the configured repositories
    GetRepos(RunArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Path to the TOML configuration file
    #[arg(long)]
    pub config: PathBuf,

    /// How many days back to look for closed issues/pull requests
    #[arg(long, default_value_t = DEFAULT_DAYS_AGO)]
    pub days_ago: u32,

    /// Last day to include, YYYY-MM-DD (DD.MM.YYYY also accepted); defaults to today
    #[arg(long)]
    pub till: Option<String>,
}

impl Command {
    pub fn mode(&self) -> ReportMode {
        match self {
            Command::GetTickets(_) => ReportMode::AssignedTickets,
            Command::GetPullRequests(_) => ReportMode::AuthoredPullRequests,
            Command::GetRepos(_) => ReportMode::ClosedInRepositories,
        }
    }

    pub fn args(&self) -> &RunArgs {
        match self {
            Command::GetTickets(args)
            | Command::GetPullRequests(args)
            | Command::GetRepos(args) => args,
        }
    }

    /// Date window for this command. An inverted range is only fatal for
    /// `get-repos`; the user modes clamp it to the `--till` day.
    pub fn window(&self, today: NaiveDate) -> Result<DateWindow> {
        let args = self.args();
        let till = args.till_date()?;
        match self.mode() {
            ReportMode::ClosedInRepositories => DateWindow::new(args.days_ago, till, today),
            ReportMode::AssignedTickets | ReportMode::AuthoredPullRequests => {
                DateWindow::clamped(args.days_ago, till, today)
            }
        }
    }
}

impl RunArgs {
    pub fn till_date(&self) -> Result<Option<NaiveDate>> {
        self.till
            .as_deref()
            .map(DateWindow::parse_date)
            .transpose()
    }
}
