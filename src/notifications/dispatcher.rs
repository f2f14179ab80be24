//! Concrete recipient resolution and mail delivery

use super::{Notification, NotificationDispatcher, RecipientResolver};
use crate::app_config::EmailConfig;
use crate::email;
use crate::error::{ChangeLogError, Result};
use crate::orm::has_roles;
use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::BTreeSet;

/// Resolves recipients from the `has_roles` table
pub struct RoleRecipientResolver {
    db: DatabaseConnection,
}

impl RoleRecipientResolver {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecipientResolver for RoleRecipientResolver {
    async fn users_with_roles(&self, roles: &[String]) -> Result<BTreeSet<String>> {
        if roles.is_empty() {
            return Ok(BTreeSet::new());
        }

        let assignments = has_roles::Entity::find()
            .filter(has_roles::Column::Role.is_in(roles.iter().cloned()))
            .all(&self.db)
            .await?;

        Ok(assignments.into_iter().map(|a| a.parent).collect())
    }
}

/// Delivers notifications as plain-text email, one message per recipient
pub struct EmailDispatcher {
    config: EmailConfig,
}

impl EmailDispatcher {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl NotificationDispatcher for EmailDispatcher {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        let mut failures = Vec::new();

        for recipient in &notification.recipients {
            let sent = email::send_email(
                &self.config,
                recipient,
                &notification.subject,
                &notification.body,
            )
            .await;
            if let Err(e) = sent {
                log::error!("Failed to email {}: {}", recipient, e);
                failures.push(recipient.as_str());
            }
        }

        if failures.is_empty() {
            log::info!(
                "Notified {} recipient(s) about {} {}",
                notification.recipients.len(),
                notification.reference.doctype,
                notification.reference.name
            );
            Ok(())
        } else {
            Err(ChangeLogError::NotificationFailure(format!(
                "delivery failed for {}",
                failures.join(", ")
            )))
        }
    }
}
