use crate::domain::model::Service;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{service} is unavailable for '{subject}': {reason}")]
    ServiceUnavailable {
        service: Service,
        subject: String,
        reason: String,
    },

    #[error("Invalid date range: till {till} is earlier than {since}")]
    InvalidDateRange { since: NaiveDate, till: NaiveDate },

    #[error("Invalid date '{value}', expected YYYY-MM-DD or DD.MM.YYYY")]
    InvalidDate { value: String },
}

impl FinderError {
    pub fn service_unavailable(
        service: Service,
        subject: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        FinderError::ServiceUnavailable {
            service,
            subject: subject.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            FinderError::ConfigError { .. }
                | FinderError::MissingConfigError { .. }
                | FinderError::InvalidConfigValueError { .. }
                | FinderError::IoError(_)
        )
    }

    /// Process exit code for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            FinderError::ServiceUnavailable { .. } => 2,
            _ => 1,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            FinderError::IoError(_) => {
                "Check that the configuration file is readable and stdout is writable"
            }
            FinderError::ConfigError { .. }
            | FinderError::MissingConfigError { .. }
            | FinderError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and run the command again"
            }
            FinderError::ServiceUnavailable { .. } => {
                "Check network access, the service URL and the API token"
            }
            FinderError::InvalidDateRange { .. } => "Pass a later --till date or a larger --days-ago",
            FinderError::InvalidDate { .. } => "Use --till 2021-12-31 or --till 31.12.2021",
        }
    }
}

pub type Result<T> = std::result::Result<T, FinderError>;
