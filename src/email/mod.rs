//! Outgoing mail for stakeholder notifications
//!
//! With `email.mock` set (the default) messages are written to the log
//! instead of being handed to an SMTP relay.

pub mod smtp;

use crate::app_config::EmailConfig;

pub type EmailResult<T> = Result<T, EmailError>;

#[derive(Debug)]
pub enum EmailError {
    /// Bad address or relay settings
    ConfigError(String),
    /// Message could not be assembled
    BuildError(lettre::error::Error),
    /// Relay refused or was unreachable
    SendError(lettre::transport::smtp::Error),
}

impl std::fmt::Display for EmailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmailError::ConfigError(msg) => write!(f, "Mail settings rejected: {}", msg),
            EmailError::BuildError(e) => write!(f, "Could not build message: {}", e),
            EmailError::SendError(e) => write!(f, "SMTP delivery failed: {}", e),
        }
    }
}

impl std::error::Error for EmailError {}

impl From<lettre::error::Error> for EmailError {
    fn from(e: lettre::error::Error) -> Self {
        EmailError::BuildError(e)
    }
}

impl From<lettre::transport::smtp::Error> for EmailError {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        EmailError::SendError(e)
    }
}

/// Send a plain-text email
pub async fn send_email(
    config: &EmailConfig,
    to: &str,
    subject: &str,
    body_text: &str,
) -> EmailResult<()> {
    if config.mock {
        log::info!("Mock email to {}: {}\n{}", to, subject, body_text);
        return Ok(());
    }

    smtp::send_email(config, to, subject, body_text).await
}
