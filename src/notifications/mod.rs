//! Stakeholder notifications for change records
//!
//! The change-log service only sees the [`RecipientResolver`] and
//! [`NotificationDispatcher`] traits; concrete role queries and mail
//! delivery live in [`dispatcher`].

pub mod dispatcher;
pub mod types;

use crate::error::Result;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};

pub use dispatcher::{EmailDispatcher, RoleRecipientResolver};
pub use types::{DocumentRef, Notification};

/// Sends notifications. Delivery is best-effort; callers log failures and
/// carry on.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Resolves the users holding any of the given roles
#[async_trait]
pub trait RecipientResolver: Send + Sync {
    async fn users_with_roles(&self, roles: &[String]) -> Result<BTreeSet<String>>;
}

/// Fixed role-to-user assignments
#[derive(Debug, Clone, Default)]
pub struct StaticRecipients {
    roles: HashMap<String, BTreeSet<String>>,
}

impl StaticRecipients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: &str, role: &str) -> Self {
        self.roles
            .entry(role.to_string())
            .or_default()
            .insert(user.to_string());
        self
    }
}

#[async_trait]
impl RecipientResolver for StaticRecipients {
    async fn users_with_roles(&self, roles: &[String]) -> Result<BTreeSet<String>> {
        Ok(roles
            .iter()
            .filter_map(|role| self.roles.get(role))
            .flatten()
            .cloned()
            .collect())
    }
}
