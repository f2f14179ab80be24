//! Error taxonomy for change-log operations.

use crate::change_log::types::ChangeStatus;
use crate::email::EmailError;
use chrono::NaiveDate;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, ChangeLogError>;

/// Errors raised while validating, persisting or notifying about records.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeLogError {
    /// A required attribute was absent at persist time
    MissingRequiredField(String),
    /// A referenced formulation, ingredient or unit does not exist
    InvalidReference { kind: &'static str, id: String },
    /// Requested status change is not a permitted forward transition
    InvalidTransition {
        from: ChangeStatus,
        to: ChangeStatus,
    },
    /// Supplied date lies after the current date
    FutureDate { date: NaiveDate, today: NaiveDate },
    /// Start date lies after end date
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    /// Formulation is not intended for the required purpose
    PurposeMismatch {
        formulation: String,
        expected: &'static str,
    },
    /// Notification delivery failed. Never aborts a save.
    NotificationFailure(String),
    /// Lookup or persistence miss
    NotFound { kind: &'static str, id: String },
    /// Stored version advanced since the record was read
    Conflict { id: String, expected: u32, found: u32 },
    /// Database operation failed
    Database(String),
}

impl ChangeLogError {
    /// True for errors produced by record validation (as opposed to
    /// infrastructure failures)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ChangeLogError::MissingRequiredField(_)
                | ChangeLogError::InvalidReference { .. }
                | ChangeLogError::InvalidTransition { .. }
                | ChangeLogError::FutureDate { .. }
                | ChangeLogError::InvalidDateRange { .. }
                | ChangeLogError::PurposeMismatch { .. }
        )
    }

    pub(crate) fn missing(field: &str) -> Self {
        ChangeLogError::MissingRequiredField(field.to_string())
    }
}

impl std::fmt::Display for ChangeLogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeLogError::MissingRequiredField(field) => {
                write!(f, "Missing required field: {}", field)
            }
            ChangeLogError::InvalidReference { kind, id } => {
                write!(f, "{} {} does not exist", kind, id)
            }
            ChangeLogError::InvalidTransition { from, to } => write!(
                f,
                "Cannot change status from {} to {}",
                from.as_str(),
                to.as_str()
            ),
            ChangeLogError::FutureDate { date, today } => {
                write!(f, "Date {} cannot be after today ({})", date, today)
            }
            ChangeLogError::InvalidDateRange { start, end } => {
                write!(f, "Start Date {} cannot be after End Date {}", start, end)
            }
            ChangeLogError::PurposeMismatch {
                formulation,
                expected,
            } => write!(
                f,
                "Formulation {} is not intended for {}",
                formulation, expected
            ),
            ChangeLogError::NotificationFailure(msg) => {
                write!(f, "Notification failure: {}", msg)
            }
            ChangeLogError::NotFound { kind, id } => write!(f, "{} {} not found", kind, id),
            ChangeLogError::Conflict {
                id,
                expected,
                found,
            } => write!(
                f,
                "{} was modified concurrently (read version {}, stored version {})",
                id, expected, found
            ),
            ChangeLogError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for ChangeLogError {}

impl From<sea_orm::DbErr> for ChangeLogError {
    fn from(e: sea_orm::DbErr) -> Self {
        ChangeLogError::Database(e.to_string())
    }
}

impl From<EmailError> for ChangeLogError {
    fn from(e: EmailError) -> Self {
        ChangeLogError::NotificationFailure(e.to_string())
    }
}

impl From<serde_json::Error> for ChangeLogError {
    fn from(e: serde_json::Error) -> Self {
        ChangeLogError::Database(format!("serialization failed: {}", e))
    }
}
