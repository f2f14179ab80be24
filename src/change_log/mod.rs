//! Formulation change records
//!
//! A change record logs one change to a formulation. Derivation and
//! validation are plain functions over the record; the
//! [`service`] module runs them at the pre-insert and pre-update points.

pub mod ingredient;
pub mod service;
pub mod types;

use crate::error::{ChangeLogError, Result};
use chrono::NaiveDate;
use ingredient::is_blank;
use serde::{Deserialize, Serialize};

pub use ingredient::{change_percentage, IngredientDelta};
pub use types::{ChangeStatus, ChangeType};

/// One formulation-change event and its ingredient deltas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Stored identity; `None` until the record is first inserted
    pub name: Option<String>,
    /// Stored version the record was read at; `0` before the first insert
    pub version: u32,
    pub formulation_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub changed_by: Option<String>,
    pub change_type: Option<ChangeType>,
    pub description: Option<String>,
    pub status: ChangeStatus,
    /// `<formulation display name> - <change type>`, derived once stored
    pub title: Option<String>,
    /// Ingredient rows in insertion order
    pub ingredient_changes: Vec<IngredientDelta>,
}

/// One line of the ingredient change summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub ingredient: String,
    pub old_quantity: Option<f64>,
    pub new_quantity: Option<f64>,
    pub unit: String,
    pub change: Option<String>,
}

impl ChangeRecord {
    pub fn new(
        formulation_id: &str,
        date: NaiveDate,
        changed_by: &str,
        change_type: ChangeType,
    ) -> Self {
        Self {
            formulation_id: Some(formulation_id.to_string()),
            date: Some(date),
            changed_by: Some(changed_by.to_string()),
            change_type: Some(change_type),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_ingredient_change(mut self, delta: IngredientDelta) -> Self {
        self.push_ingredient_change(delta);
        self
    }

    /// Append an ingredient row after the existing ones
    pub fn push_ingredient_change(&mut self, delta: IngredientDelta) {
        self.ingredient_changes.push(delta);
    }

    /// True until the store has assigned an identity
    pub fn is_new(&self) -> bool {
        self.name.is_none()
    }

    pub fn summary_rows(&self) -> Vec<SummaryRow> {
        self.ingredient_changes
            .iter()
            .map(|delta| SummaryRow {
                ingredient: delta.ingredient_id.clone().unwrap_or_default(),
                old_quantity: delta.old_quantity,
                new_quantity: delta.new_quantity,
                unit: delta.unit.clone().unwrap_or_default(),
                change: delta.display_percentage(),
            })
            .collect()
    }
}

/// Check the record-level invariants that need no lookups.
///
/// Runs before every insert and update regardless of status.
pub fn validate(record: &ChangeRecord, today: NaiveDate) -> Result<()> {
    if is_blank(&record.formulation_id) {
        return Err(ChangeLogError::missing("formulation"));
    }
    let date = record.date.ok_or_else(|| ChangeLogError::missing("date"))?;
    if is_blank(&record.changed_by) {
        return Err(ChangeLogError::missing("changed_by"));
    }
    if record.change_type.is_none() {
        return Err(ChangeLogError::missing("change_type"));
    }

    if is_blank(&record.description) && record.ingredient_changes.is_empty() {
        return Err(ChangeLogError::MissingRequiredField(
            "description or ingredient_changes".to_string(),
        ));
    }

    if date > today {
        return Err(ChangeLogError::FutureDate { date, today });
    }

    for delta in &record.ingredient_changes {
        delta.check_required()?;
    }

    Ok(())
}

/// Check a status change. Staying in the same status is allowed.
pub fn validate_transition(from: ChangeStatus, to: ChangeStatus) -> Result<()> {
    if from == to || from.next() == Some(to) {
        Ok(())
    } else {
        Err(ChangeLogError::InvalidTransition { from, to })
    }
}

/// Title for a stored record, `None` while the record has no identity or
/// no formulation
pub fn derive_title(record: &ChangeRecord, formulation_display_name: &str) -> Option<String> {
    if record.is_new() || is_blank(&record.formulation_id) {
        return None;
    }
    let change_type = record.change_type.map(|t| t.as_str()).unwrap_or_default();
    Some(format!("{} - {}", formulation_display_name, change_type))
}

/// Subject and body announcing an approved change
pub fn approval_message(record: &ChangeRecord) -> (String, String) {
    let name = record.name.as_deref().unwrap_or_default();
    let subject = format!("Formulation Change Approved: {}", name);
    let body = format!(
        "Formulation Change {} has been approved.\nChange Type: {}\nDescription: {}",
        name,
        record.change_type.map(|t| t.as_str()).unwrap_or_default(),
        record.description.as_deref().unwrap_or_default()
    );
    (subject, body)
}
