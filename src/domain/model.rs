use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Service {
    Pagure,
    GitHub,
}

impl Service {
    pub fn name(self) -> &'static str {
        match self {
            Service::Pagure => "Pagure",
            Service::GitHub => "GitHub",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketState {
    Open,
    Closed,
    Merged,
}

impl TicketState {
    /// Parses a state label as either service reports it (`Open`, `OPEN`, ...).
    pub fn parse(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "open" => Some(TicketState::Open),
            "closed" => Some(TicketState::Closed),
            "merged" => Some(TicketState::Merged),
            _ => None,
        }
    }

    /// Label in the casing `service` uses.
    pub fn label(self, service: Service) -> &'static str {
        match (service, self) {
            (Service::Pagure, TicketState::Open) => "Open",
            (Service::Pagure, TicketState::Closed) => "Closed",
            (Service::Pagure, TicketState::Merged) => "Merged",
            (Service::GitHub, TicketState::Open) => "OPEN",
            (Service::GitHub, TicketState::Closed) => "CLOSED",
            (Service::GitHub, TicketState::Merged) => "MERGED",
        }
    }
}

/// A single ticket or pull request as returned by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub title: String,
    pub url: String,
    pub state: TicketState,
    pub service: Service,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Record {
    pub fn is_open(&self) -> bool {
        self.state == TicketState::Open
    }

    pub fn state_label(&self) -> &'static str {
        self.state.label(self.service)
    }
}
