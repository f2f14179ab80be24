//! Change record persistence pipeline
//!
//! Every insert and update runs the same steps before anything is written:
//! record-level validation, reference checks, recomputation of every
//! ingredient row and, for updates, the status transition check and title
//! derivation. Notifications go out only after a successful write.

use super::{
    approval_message, derive_title, validate, validate_transition, ChangeRecord, ChangeStatus,
};
use crate::app_config::{AppConfig, NotificationConfig};
use crate::constants::CHANGE_LOG_DOCTYPE;
use crate::error::{ChangeLogError, Result};
use crate::lookup::FormulationLookup;
use crate::notifications::{DocumentRef, Notification, NotificationDispatcher, RecipientResolver};
use crate::store::{ChangeLogStore, RecordKind};
use chrono::{Local, NaiveDate};
use serde_json::Value;
use std::sync::Arc;

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Orchestrates validation, derivation, persistence and notification
pub struct ChangeLogService {
    store: Arc<dyn ChangeLogStore>,
    lookup: Arc<dyn FormulationLookup>,
    recipients: Arc<dyn RecipientResolver>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    notifications: NotificationConfig,
    today: Clock,
}

impl ChangeLogService {
    pub fn new(
        store: Arc<dyn ChangeLogStore>,
        lookup: Arc<dyn FormulationLookup>,
        recipients: Arc<dyn RecipientResolver>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            lookup,
            recipients,
            dispatcher,
            notifications: NotificationConfig::default(),
            today: Arc::new(|| Local::now().date_naive()),
        }
    }

    /// Service using the notification settings of `config`
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn ChangeLogStore>,
        lookup: Arc<dyn FormulationLookup>,
        recipients: Arc<dyn RecipientResolver>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            notifications: config.notifications.clone(),
            ..Self::new(store, lookup, recipients, dispatcher)
        }
    }

    /// Replace the source of "today" used by the future-date check
    pub fn with_clock<F>(mut self, today: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        self.today = Arc::new(today);
        self
    }

    pub fn with_approval_roles(mut self, roles: &[&str]) -> Self {
        self.notifications.approval_roles = roles.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Store a new record in `Draft`.
    ///
    /// The title stays unset because the record has no identity yet at the
    /// time it is derived.
    pub async fn insert(&self, mut record: ChangeRecord) -> Result<ChangeRecord> {
        if record.status != ChangeStatus::Draft {
            return Err(ChangeLogError::InvalidTransition {
                from: ChangeStatus::Draft,
                to: record.status,
            });
        }

        record.name = None;
        record.version = 0;
        self.prepare(&mut record).await?;
        record.title = None;

        let stored = self.store.insert(record).await?;
        log::info!(
            "Inserted {} {} with {} ingredient change(s)",
            CHANGE_LOG_DOCTYPE,
            stored.name.as_deref().unwrap_or_default(),
            stored.ingredient_changes.len()
        );
        Ok(stored)
    }

    /// Persist a record, inserting it if it has never been stored.
    ///
    /// Stakeholders are notified when the save moves the record into
    /// `Approved`. Re-saving an approved record sends nothing.
    pub async fn save(&self, mut record: ChangeRecord) -> Result<ChangeRecord> {
        let name = match record.name.clone() {
            Some(name) => name,
            None => return self.insert(record).await,
        };

        let previous = self
            .store
            .get(&name)
            .await?
            .ok_or_else(|| ChangeLogError::NotFound {
                kind: CHANGE_LOG_DOCTYPE,
                id: name.clone(),
            })?;

        self.prepare(&mut record).await?;
        validate_transition(previous.status, record.status)?;
        record.title = self.title_for(&record).await?;

        let saved = self.store.update(record).await?;

        if previous.status != saved.status {
            log::info!(
                "{} {} moved from {} to {}",
                CHANGE_LOG_DOCTYPE,
                name,
                previous.status.as_str(),
                saved.status.as_str()
            );
            if saved.status == ChangeStatus::Approved {
                self.notify_approved(&saved).await;
            }
        } else {
            log::debug!("Saved {} {}", CHANGE_LOG_DOCTYPE, name);
        }

        Ok(saved)
    }

    /// Load, move to `status` and save
    pub async fn set_status(&self, name: &str, status: ChangeStatus) -> Result<ChangeRecord> {
        let mut record = self
            .get(name)
            .await?
            .ok_or_else(|| ChangeLogError::NotFound {
                kind: CHANGE_LOG_DOCTYPE,
                id: name.to_string(),
            })?;
        record.status = status;
        self.save(record).await
    }

    pub async fn get(&self, name: &str) -> Result<Option<ChangeRecord>> {
        self.store.get(name).await
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        self.store.exists(name).await
    }

    /// Delete a record together with its ingredient rows
    pub async fn delete(&self, name: &str) -> Result<()> {
        self.store.delete(name).await?;
        log::info!("Deleted {} {}", CHANGE_LOG_DOCTYPE, name);
        Ok(())
    }

    pub async fn get_value(
        &self,
        kind: RecordKind,
        id: &str,
        field: &str,
    ) -> Result<Option<Value>> {
        log::debug!("Reading {} of {} {}", field, kind.as_str(), id);
        self.store.get_value(kind, id, field).await
    }

    /// Validate the whole record graph and recompute derived row fields
    async fn prepare(&self, record: &mut ChangeRecord) -> Result<()> {
        validate(record, (self.today)())?;

        let formulation = record.formulation_id.clone().unwrap_or_default();
        if !self.lookup.formulation_exists(&formulation).await? {
            return Err(ChangeLogError::InvalidReference {
                kind: "Formulation",
                id: formulation,
            });
        }

        for delta in record.ingredient_changes.iter_mut() {
            delta.recompute(self.lookup.as_ref()).await?;
        }
        Ok(())
    }

    async fn title_for(&self, record: &ChangeRecord) -> Result<Option<String>> {
        let formulation = match record.formulation_id.as_deref() {
            Some(f) if !record.is_new() => f,
            _ => return Ok(None),
        };
        let display_name = match self.lookup.resolve_display_name(formulation).await {
            Ok(name) => name,
            Err(ChangeLogError::NotFound { .. }) => {
                return Err(ChangeLogError::InvalidReference {
                    kind: "Formulation",
                    id: formulation.to_string(),
                })
            }
            Err(e) => return Err(e),
        };
        Ok(derive_title(record, &display_name))
    }

    /// Tell the approval roles about an approved record.
    ///
    /// Failures are logged and never reach the caller of `save`.
    async fn notify_approved(&self, record: &ChangeRecord) {
        if !self.notifications.enabled {
            return;
        }
        let name = record.name.clone().unwrap_or_default();

        let recipients = match self
            .recipients
            .users_with_roles(&self.notifications.approval_roles)
            .await
        {
            Ok(recipients) => recipients,
            Err(e) => {
                log::error!("Could not resolve approval recipients for {}: {}", name, e);
                return;
            }
        };

        if recipients.is_empty() {
            log::warn!(
                "No users hold {:?}; approval of {} not announced",
                self.notifications.approval_roles,
                name
            );
            return;
        }

        let (subject, body) = approval_message(record);
        let notification = Notification {
            recipients,
            subject,
            body,
            reference: DocumentRef::new(CHANGE_LOG_DOCTYPE, &name),
        };

        match self.dispatcher.notify(&notification).await {
            Ok(()) => log::info!(
                "Approval of {} sent to {} recipient(s)",
                name,
                notification.recipients.len()
            ),
            Err(e) => log::error!("Approval notification for {} failed: {}", name, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_log::{ChangeType, IngredientDelta};
    use crate::lookup::MemoryLookup;
    use crate::notifications::StaticRecipients;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Outbox(Mutex<Vec<Notification>>);

    #[async_trait]
    impl NotificationDispatcher for Outbox {
        async fn notify(&self, notification: &Notification) -> Result<()> {
            self.0.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    fn service(outbox: Arc<Outbox>) -> ChangeLogService {
        let lookup = MemoryLookup::new()
            .with_formulation("FORM-001", "Broiler Starter", "Animal Nutrition")
            .with_item("ING-001", "Maize")
            .with_unit("Kg");
        let recipients = StaticRecipients::new().with_user("qm@example.com", "Quality Manager");
        ChangeLogService::new(
            Arc::new(MemoryStore::default()),
            Arc::new(lookup),
            Arc::new(recipients),
            outbox,
        )
        .with_clock(day)
    }

    fn record() -> ChangeRecord {
        ChangeRecord::new("FORM-001", day(), "rnd@example.com", ChangeType::QuantityChange)
            .with_ingredient_change(IngredientDelta::new("ING-001", 40.0, 42.0, "Kg"))
    }

    #[actix_rt::test]
    async fn test_insert_assigns_identity_without_title() {
        let svc = service(Arc::default());
        let stored = svc.insert(record()).await.unwrap();

        assert_eq!(stored.name.as_deref(), Some("FCL-00001"));
        assert_eq!(stored.title, None);
        assert_eq!(stored.ingredient_changes[0].change_percentage, Some(5.0));
        assert_eq!(
            stored.ingredient_changes[0].ingredient_display_name.as_deref(),
            Some("Maize")
        );
    }

    #[actix_rt::test]
    async fn test_insert_outside_draft_is_rejected() {
        let mut rec = record();
        rec.status = ChangeStatus::Approved;
        let err = service(Arc::default()).insert(rec).await.unwrap_err();
        assert_eq!(
            err,
            ChangeLogError::InvalidTransition {
                from: ChangeStatus::Draft,
                to: ChangeStatus::Approved
            }
        );
    }

    #[actix_rt::test]
    async fn test_unknown_formulation_is_invalid_reference() {
        let mut rec = record();
        rec.formulation_id = Some("FORM-404".into());
        let err = service(Arc::default()).insert(rec).await.unwrap_err();
        assert!(matches!(
            err,
            ChangeLogError::InvalidReference { kind: "Formulation", .. }
        ));
    }

    #[actix_rt::test]
    async fn test_resave_derives_title() {
        let svc = service(Arc::default());
        let stored = svc.insert(record()).await.unwrap();
        let saved = svc.save(stored).await.unwrap();
        assert_eq!(
            saved.title.as_deref(),
            Some("Broiler Starter - Quantity Change")
        );
    }

    #[actix_rt::test]
    async fn test_approval_notifies_once() {
        let outbox = Arc::new(Outbox::default());
        let svc = service(outbox.clone());
        let stored = svc.insert(record()).await.unwrap();
        let name = stored.name.clone().unwrap();

        let approved = svc.set_status(&name, ChangeStatus::Approved).await.unwrap();
        svc.save(approved).await.unwrap();

        let sent = outbox.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, format!("Formulation Change Approved: {}", name));
        assert!(sent[0].recipients.contains("qm@example.com"));
        assert_eq!(sent[0].reference, DocumentRef::new(CHANGE_LOG_DOCTYPE, &name));
    }

    #[actix_rt::test]
    async fn test_disabled_notifications_send_nothing() {
        let outbox = Arc::new(Outbox::default());
        let mut config = AppConfig::default();
        config.notifications.enabled = false;
        let svc = ChangeLogService::from_config(
            &config,
            Arc::new(MemoryStore::default()),
            Arc::new(
                MemoryLookup::new()
                    .with_formulation("FORM-001", "Broiler Starter", "")
                    .with_item("ING-001", "Maize")
                    .with_unit("Kg"),
            ),
            Arc::new(StaticRecipients::new().with_user("qm@example.com", "Quality Manager")),
            outbox.clone(),
        )
        .with_clock(day);

        let stored = svc.insert(record()).await.unwrap();
        svc.set_status(stored.name.as_deref().unwrap(), ChangeStatus::Approved)
            .await
            .unwrap();

        assert!(outbox.0.lock().unwrap().is_empty());
    }
}
