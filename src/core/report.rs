use crate::domain::model::{Record, Service};
use crate::utils::error::{FinderError, Result};
use std::fmt::Write;
use std::io::{self, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    AssignedTickets,
    AuthoredPullRequests,
    ClosedInRepositories,
}

impl ReportMode {
    pub fn heading(self, subject: &str) -> String {
        match self {
            ReportMode::AssignedTickets => format!("Issues assigned to '{}'", subject),
            ReportMode::AuthoredPullRequests => format!("Pull requests authored by '{}'", subject),
            ReportMode::ClosedInRepositories => format!("Issues/pull requests on '{}'", subject),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSection {
    pub service: Service,
    pub records: Vec<Record>,
}

/// Everything reported for one username or repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectReport {
    pub subject: String,
    pub sections: Vec<ServiceSection>,
}

impl SubjectReport {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            sections: Vec::new(),
        }
    }

    pub fn section(&self, service: Service) -> Option<&ServiceSection> {
        self.sections.iter().find(|section| section.service == service)
    }
}

#[derive(Debug)]
pub struct Report {
    pub mode: ReportMode,
    pub subjects: Vec<SubjectReport>,
    /// Backend calls that failed; their sections are absent from `subjects`.
    pub failures: Vec<FinderError>,
}

impl Report {
    pub fn new(mode: ReportMode) -> Self {
        Self {
            mode,
            subjects: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn subject(&self, subject: &str) -> Option<&SubjectReport> {
        self.subjects.iter().find(|report| report.subject == subject)
    }

    pub fn exit_code(&self) -> i32 {
        self.failures.first().map_or(0, FinderError::exit_code)
    }

    pub fn to_markdown(&self) -> String {
        render_markdown(self)
    }

    /// Writes the Markdown to `out`. A reader that went away (`| head`) is
    /// not an error.
    pub fn write_to<W: io::Write>(&self, out: &mut W) -> Result<()> {
        let written = out
            .write_all(self.to_markdown().as_bytes())
            .and_then(|()| out.flush());

        match written {
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
            other => Ok(other?),
        }
    }
}

/// Renders the report; sections without records are left out.
pub fn render_markdown(report: &Report) -> String {
    let mut out = String::new();

    for subject in &report.subjects {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "# {}\n", report.mode.heading(&subject.subject));

        for section in subject.sections.iter().filter(|s| !s.records.is_empty()) {
            let _ = writeln!(out, "## {} ({})\n", section.service, section.records.len());
            for record in &section.records {
                let _ = writeln!(
                    out,
                    "* [{}]({}) - {}",
                    record.title,
                    record.url,
                    record.state_label()
                );
            }
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::TicketState;

    fn record(service: Service, title: &str, state: TicketState) -> Record {
        Record {
            title: title.to_string(),
            url: format!("https://example.com/{}", title),
            state,
            service,
            closed_at: None,
        }
    }

    fn sample_report() -> Report {
        let mut subject = SubjectReport::new("zlopez");
        subject.sections.push(ServiceSection {
            service: Service::Pagure,
            records: vec![
                record(Service::Pagure, "a", TicketState::Open),
                record(Service::Pagure, "b", TicketState::Closed),
            ],
        });
        subject.sections.push(ServiceSection {
            service: Service::GitHub,
            records: vec![record(Service::GitHub, "c", TicketState::Open)],
        });

        let mut report = Report::new(ReportMode::AssignedTickets);
        report.subjects.push(subject);
        report
    }

    #[test]
    fn test_render_markdown_layout() {
        let expected = "\
# Issues assigned to 'zlopez'

## Pagure (2)

* [a](https://example.com/a) - Open
* [b](https://example.com/b) - Closed

## GitHub (1)

* [c](https://example.com/c) - OPEN

";
        assert_eq!(render_markdown(&sample_report()), expected);
    }

    #[test]
    fn test_render_is_deterministic() {
        let report = sample_report();
        assert_eq!(render_markdown(&report), render_markdown(&report));
    }

    #[test]
    fn test_empty_section_is_omitted() {
        let mut subject = SubjectReport::new("https://github.com/o/r");
        subject.sections.push(ServiceSection {
            service: Service::GitHub,
            records: Vec::new(),
        });
        let mut report = Report::new(ReportMode::ClosedInRepositories);
        report.subjects.push(subject);

        assert_eq!(
            render_markdown(&report),
            "# Issues/pull requests on 'https://github.com/o/r'\n\n"
        );
    }

    #[test]
    fn test_headings_per_mode() {
        assert_eq!(
            ReportMode::AuthoredPullRequests.heading("zlopez"),
            "Pull requests authored by 'zlopez'"
        );
    }

    #[test]
    fn test_exit_code_reflects_failures() {
        let mut report = sample_report();
        assert_eq!(report.exit_code(), 0);
        report.failures.push(FinderError::service_unavailable(
            Service::GitHub,
            "zlopez",
            "boom",
        ));
        assert_eq!(report.exit_code(), 2);
    }

    struct FailingWriter(ErrorKind);

    impl io::Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(self.0))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_to_stops_quietly_on_closed_pipe() {
        let report = sample_report();
        assert!(report.write_to(&mut FailingWriter(ErrorKind::BrokenPipe)).is_ok());
    }

    #[test]
    fn test_write_to_reports_other_io_errors() {
        let report = sample_report();
        let result = report.write_to(&mut FailingWriter(ErrorKind::PermissionDenied));
        match result {
            Err(e @ FinderError::IoError(_)) => assert_eq!(e.exit_code(), 1),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_write_to_emits_markdown() {
        let report = sample_report();
        let mut out = Vec::new();
        report.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), report.to_markdown());
    }
}
