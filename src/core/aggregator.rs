use crate::adapters::backend_for;
use crate::config::{FinderConfig, ServiceSettings};
use crate::core::report::{Report, ReportMode, ServiceSection, SubjectReport};
use crate::domain::model::Record;
use crate::domain::ports::Backend;
use crate::domain::window::DateWindow;
use crate::utils::error::{FinderError, Result};

struct BackendSlot {
    backend: Box<dyn Backend>,
    settings: ServiceSettings,
}

/// Runs every enabled backend for every subject, sequentially, in
/// configuration order.
pub struct Aggregator {
    usernames: Vec<String>,
    slots: Vec<BackendSlot>,
}

/// Drops records whose URL starts with any of `excludes`.
pub fn apply_excludes(records: Vec<Record>, excludes: &[String]) -> Vec<Record> {
    records
        .into_iter()
        .filter(|record| !excludes.iter().any(|prefix| record.url.starts_with(prefix.as_str())))
        .collect()
}

/// User reports keep everything open, and closed records closed inside the
/// window or without a close date.
fn keep_for_user(record: &Record, window: &DateWindow) -> bool {
    record.is_open() || record.closed_at.map_or(true, |at| window.contains(at))
}

fn keep_for_repository(record: &Record, window: &DateWindow) -> bool {
    !record.is_open() && record.closed_at.is_some_and(|at| window.contains(at))
}

impl Aggregator {
    pub fn new(usernames: Vec<String>) -> Self {
        Self {
            usernames,
            slots: Vec::new(),
        }
    }

    pub fn with_backend(mut self, backend: Box<dyn Backend>, settings: ServiceSettings) -> Self {
        self.slots.push(BackendSlot { backend, settings });
        self
    }

    /// One backend per enabled service; disabled services never get a client.
    pub fn from_config(config: &FinderConfig) -> Result<Self> {
        let mut aggregator = Self::new(config.general.usernames.clone());
        for service in config.enabled_services() {
            tracing::debug!("Enabling {} backend", service);
            aggregator = aggregator.with_backend(backend_for(service, config)?, config.settings(service));
        }
        Ok(aggregator)
    }

    /// Repositories across all backends, first occurrence wins.
    pub fn repositories(&self) -> Vec<String> {
        let mut repositories: Vec<String> = Vec::new();
        for slot in &self.slots {
            for repository in &slot.settings.repositories {
                if !repositories.contains(repository) {
                    repositories.push(repository.clone());
                }
            }
        }
        repositories
    }

    pub async fn aggregate(&self, mode: ReportMode, window: &DateWindow) -> Report {
        match mode {
            ReportMode::AssignedTickets | ReportMode::AuthoredPullRequests => {
                self.by_user(mode, window).await
            }
            ReportMode::ClosedInRepositories => self.by_repository(window).await,
        }
    }

    async fn by_user(&self, mode: ReportMode, window: &DateWindow) -> Report {
        let mut report = Report::new(mode);

        for user in &self.usernames {
            let mut subject = SubjectReport::new(user.clone());

            for slot in &self.slots {
                let service = slot.backend.service();
                let Some(service_user) = slot.settings.usernames.get(user) else {
                    tracing::warn!("No {} username mapped for '{}'", service, user);
                    report.failures.push(FinderError::MissingConfigError {
                        field: format!("{}.usernames.{}", service, user),
                    });
                    continue;
                };

                let fetched = match mode {
                    ReportMode::AssignedTickets => {
                        slot.backend.fetch_assigned(service_user, window).await
                    }
                    _ => slot.backend.fetch_authored(service_user, window).await,
                };

                match fetched {
                    Ok(records) => {
                        let records: Vec<Record> = apply_excludes(records, &slot.settings.excludes)
                            .into_iter()
                            .filter(|record| keep_for_user(record, window))
                            .collect();
                        tracing::debug!("{}: {} records for '{}'", service, records.len(), user);
                        subject.sections.push(ServiceSection { service, records });
                    }
                    Err(e) => {
                        tracing::warn!("Skipping {} section for '{}': {}", service, user, e);
                        report.failures.push(e);
                    }
                }
            }

            report.subjects.push(subject);
        }

        report
    }

    async fn by_repository(&self, window: &DateWindow) -> Report {
        let mut report = Report::new(ReportMode::ClosedInRepositories);

        for repository in self.repositories() {
            let mut subject = SubjectReport::new(repository.clone());

            for slot in self
                .slots
                .iter()
                .filter(|slot| slot.settings.repositories.contains(&repository))
            {
                let service = slot.backend.service();
                match slot.backend.fetch_closed(&repository, window).await {
                    Ok(records) => {
                        let records: Vec<Record> = apply_excludes(records, &slot.settings.excludes)
                            .into_iter()
                            .filter(|record| keep_for_repository(record, window))
                            .collect();
                        tracing::debug!("{}: {} records for '{}'", service, records.len(), repository);
                        subject.sections.push(ServiceSection { service, records });
                    }
                    Err(e) => {
                        tracing::warn!("Skipping {} section for '{}': {}", service, repository, e);
                        report.failures.push(e);
                    }
                }
            }

            report.subjects.push(subject);
        }

        report
    }
}
