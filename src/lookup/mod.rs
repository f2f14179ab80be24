//! Read-only lookups of formulations, ingredients and units.
//!
//! Supports multiple backends:
//! - `memory`: Seeded in-process tables (fixtures, embedding)
//! - `db`: The `formulations`, `items` and `uoms` tables via SeaORM

pub mod db;

use crate::error::{ChangeLogError, Result};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

pub use db::DbLookup;

/// Trait for lookup backends.
///
/// Validation and derivation only read through this trait, so the change-log
/// core never depends on a concrete storage engine.
#[async_trait]
pub trait FormulationLookup: Send + Sync {
    /// Human-readable name of a formulation.
    ///
    /// Fails with `NotFound` if the formulation does not exist.
    async fn resolve_display_name(&self, formulation_id: &str) -> Result<String>;

    /// Human-readable name of an ingredient item.
    ///
    /// Fails with `NotFound` if the item does not exist.
    async fn resolve_ingredient_name(&self, ingredient_id: &str) -> Result<String>;

    /// Intended use category of a formulation (e.g. `Animal Nutrition`).
    ///
    /// Empty when the formulation has no purpose set.
    async fn get_purpose(&self, formulation_id: &str) -> Result<String>;

    /// Check if a formulation exists.
    async fn formulation_exists(&self, formulation_id: &str) -> Result<bool>;

    /// Check if an ingredient item exists.
    async fn ingredient_exists(&self, ingredient_id: &str) -> Result<bool>;

    /// Check if a unit belongs to the recognized unit vocabulary.
    async fn is_known_unit(&self, unit: &str) -> Result<bool>;
}

struct FormulationEntry {
    display_name: String,
    purpose: String,
}

/// In-memory lookup tables.
///
/// Entries can be changed after construction, which lets callers model
/// upstream renames.
#[derive(Default)]
pub struct MemoryLookup {
    formulations: DashMap<String, FormulationEntry>,
    items: DashMap<String, String>,
    units: DashSet<String>,
}

impl MemoryLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_formulation(self, id: &str, display_name: &str, purpose: &str) -> Self {
        self.set_formulation(id, display_name, purpose);
        self
    }

    pub fn with_item(self, id: &str, display_name: &str) -> Self {
        self.set_item(id, display_name);
        self
    }

    pub fn with_unit(self, unit: &str) -> Self {
        self.units.insert(unit.to_string());
        self
    }

    pub fn set_formulation(&self, id: &str, display_name: &str, purpose: &str) {
        self.formulations.insert(
            id.to_string(),
            FormulationEntry {
                display_name: display_name.to_string(),
                purpose: purpose.to_string(),
            },
        );
    }

    /// Insert or rename an ingredient item
    pub fn set_item(&self, id: &str, display_name: &str) {
        self.items.insert(id.to_string(), display_name.to_string());
    }

    pub fn remove_unit(&self, unit: &str) {
        self.units.remove(unit);
    }
}

#[async_trait]
impl FormulationLookup for MemoryLookup {
    async fn resolve_display_name(&self, formulation_id: &str) -> Result<String> {
        self.formulations
            .get(formulation_id)
            .map(|f| f.display_name.clone())
            .ok_or_else(|| ChangeLogError::NotFound {
                kind: "Formulation",
                id: formulation_id.to_string(),
            })
    }

    async fn resolve_ingredient_name(&self, ingredient_id: &str) -> Result<String> {
        self.items
            .get(ingredient_id)
            .map(|name| name.clone())
            .ok_or_else(|| ChangeLogError::NotFound {
                kind: "Item",
                id: ingredient_id.to_string(),
            })
    }

    async fn get_purpose(&self, formulation_id: &str) -> Result<String> {
        self.formulations
            .get(formulation_id)
            .map(|f| f.purpose.clone())
            .ok_or_else(|| ChangeLogError::NotFound {
                kind: "Formulation",
                id: formulation_id.to_string(),
            })
    }

    async fn formulation_exists(&self, formulation_id: &str) -> Result<bool> {
        Ok(self.formulations.contains_key(formulation_id))
    }

    async fn ingredient_exists(&self, ingredient_id: &str) -> Result<bool> {
        Ok(self.items.contains_key(ingredient_id))
    }

    async fn is_known_unit(&self, unit: &str) -> Result<bool> {
        Ok(self.units.contains(unit))
    }
}
