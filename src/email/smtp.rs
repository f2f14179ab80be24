//! Plain-text delivery over SMTP

use super::{EmailError, EmailResult};
use crate::app_config::EmailConfig;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

fn mailbox(value: &str, role: &str) -> EmailResult<Mailbox> {
    value.parse().map_err(|e| {
        EmailError::ConfigError(format!("Invalid {} address {:?}: {}", role, value, e))
    })
}

fn transport(config: &EmailConfig) -> EmailResult<SmtpTransport> {
    let builder = if config.smtp_tls {
        SmtpTransport::relay(&config.smtp_host)?
    } else {
        SmtpTransport::builder_dangerous(&config.smtp_host)
    }
    .port(config.smtp_port);

    // Relays without auth take no credentials at all
    let builder = if config.smtp_username.is_empty() {
        builder
    } else {
        builder.credentials(Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        ))
    };

    Ok(builder.build())
}

pub async fn send_email(
    config: &EmailConfig,
    to: &str,
    subject: &str,
    body_text: &str,
) -> EmailResult<()> {
    let sender = mailbox(
        &format!("{} <{}>", config.from_name, config.from_address),
        "from",
    )?;
    let recipient = mailbox(to, "recipient")?;

    let message = Message::builder()
        .from(sender)
        .to(recipient)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body_text.to_string())?;

    transport(config)?.send(&message)?;
    log::debug!("Delivered \"{}\" to {} via {}", subject, to, config.smtp_host);
    Ok(())
}
