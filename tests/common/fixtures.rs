//! Test fixtures for creating services and change records
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use rnd_nutrition::change_log::service::ChangeLogService;
use rnd_nutrition::change_log::{ChangeRecord, ChangeType, IngredientDelta};
use rnd_nutrition::lookup::MemoryLookup;
use rnd_nutrition::notifications::{Notification, NotificationDispatcher, StaticRecipients};
use rnd_nutrition::store::MemoryStore;
use rnd_nutrition::{ChangeLogError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const TEST_FORMULATION: &str = "TEST-FORM-001";
pub const TEST_FORMULATION_NAME: &str = "Test Formulation";
pub const ANIMAL_FORMULATION: &str = "TEST-FORM-ANIMAL";
pub const ANIMAL_FORMULATION_NAME: &str = "Test Layer Feed";
pub const TEST_INGREDIENT: &str = "TEST-INGREDIENT-001";
pub const TEST_INGREDIENT_NAME: &str = "Test Ingredient";
pub const TEST_UOM: &str = "TEST-UOM";
pub const RND_MANAGER_EMAIL: &str = "rnd.manager@example.com";
pub const QUALITY_MANAGER_EMAIL: &str = "quality.manager@example.com";

/// Install a test logger; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Fixed "today" for every service built here
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

/// Lookup tables seeded with one plant and one animal formulation
pub fn test_lookup() -> MemoryLookup {
    MemoryLookup::new()
        .with_formulation(TEST_FORMULATION, TEST_FORMULATION_NAME, "Plant Nutrition")
        .with_formulation(ANIMAL_FORMULATION, ANIMAL_FORMULATION_NAME, "Animal Nutrition")
        .with_item(TEST_INGREDIENT, TEST_INGREDIENT_NAME)
        .with_unit("Kg")
        .with_unit(TEST_UOM)
}

pub fn test_recipients() -> StaticRecipients {
    StaticRecipients::new()
        .with_user(RND_MANAGER_EMAIL, "RND Manager")
        .with_user(QUALITY_MANAGER_EMAIL, "Quality Manager")
        .with_user("stock.user@example.com", "Stock User")
}

/// Dispatcher that keeps every notification it is handed
#[derive(Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingDispatcher {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Dispatcher whose deliveries always fail
#[derive(Default)]
pub struct FailingDispatcher {
    attempts: AtomicUsize,
}

impl FailingDispatcher {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationDispatcher for FailingDispatcher {
    async fn notify(&self, _notification: &Notification) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ChangeLogError::NotificationFailure(
            "SMTP connection refused".to_string(),
        ))
    }
}

/// Service over in-memory collaborators, with handles kept for assertions
pub struct TestContext {
    pub service: ChangeLogService,
    pub store: Arc<MemoryStore>,
    pub lookup: Arc<MemoryLookup>,
    pub dispatcher: Arc<RecordingDispatcher>,
}

pub fn setup() -> TestContext {
    init_logging();

    let store = Arc::new(MemoryStore::default());
    let lookup = Arc::new(test_lookup());
    let dispatcher = Arc::new(RecordingDispatcher::default());

    let service = ChangeLogService::new(
        store.clone(),
        lookup.clone(),
        Arc::new(test_recipients()),
        dispatcher.clone(),
    )
    .with_clock(today);

    TestContext {
        service,
        store,
        lookup,
        dispatcher,
    }
}

/// Service whose notifications go to `dispatcher`
pub fn service_with_dispatcher(dispatcher: Arc<dyn NotificationDispatcher>) -> ChangeLogService {
    init_logging();
    ChangeLogService::new(
        Arc::new(MemoryStore::default()),
        Arc::new(test_lookup()),
        Arc::new(test_recipients()),
        dispatcher,
    )
    .with_clock(today)
}

pub fn ingredient_change(old_quantity: f64, new_quantity: f64) -> IngredientDelta {
    IngredientDelta::new(TEST_INGREDIENT, old_quantity, new_quantity, "Kg")
}

/// Draft record against the test formulation with one ingredient row
pub fn change_record(change_type: ChangeType) -> ChangeRecord {
    ChangeRecord::new(TEST_FORMULATION, today(), "Administrator", change_type)
        .with_description("Test formulation change")
        .with_ingredient_change(ingredient_change(10.0, 12.0).with_reason("Test change"))
}
