//! Persistence boundary for change records.
//!
//! Supports multiple backends:
//! - `memory`: Process-local map, used for embedding and tests
//! - `db`: SeaORM tables `formulation_change_logs` and `change_log_ingredients`
//!
//! Child ingredient rows are stored with their parent and never addressed
//! for writes on their own.

pub mod db;
pub mod memory;

use crate::change_log::ChangeRecord;
use crate::constants::NAMING_SERIES_WIDTH;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

pub use db::DbStore;
pub use memory::MemoryStore;

/// Record kinds addressable through [`ChangeLogStore::get_value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    ChangeRecord,
    IngredientDelta,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChangeRecord => "Formulation Change Log",
            Self::IngredientDelta => "Change Log Ingredient Reference",
        }
    }
}

/// Trait for change record stores.
///
/// All writes cover the whole record graph: a parent is written together
/// with its ingredient rows or not at all.
#[async_trait]
pub trait ChangeLogStore: Send + Sync {
    /// Store a new record.
    ///
    /// Assigns the record name from the naming series, sets `version` to 1
    /// and numbers the ingredient rows.
    async fn insert(&self, record: ChangeRecord) -> Result<ChangeRecord>;

    /// Replace a stored record.
    ///
    /// Fails with `Conflict` if the stored version is not the version the
    /// record was read at. Bumps `version` on success.
    async fn update(&self, record: ChangeRecord) -> Result<ChangeRecord>;

    /// Load a record with its ingredient rows in order.
    async fn get(&self, name: &str) -> Result<Option<ChangeRecord>>;

    /// Check if a record exists.
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Delete a record and its ingredient rows.
    async fn delete(&self, name: &str) -> Result<()>;

    /// Fetch one attribute without handing out the full record.
    ///
    /// Returns `None` for unknown records or fields.
    async fn get_value(&self, kind: RecordKind, id: &str, field: &str) -> Result<Option<Value>>;
}

/// Name for counter `n` of a naming series, e.g. `FCL-00042`
pub fn series_name(prefix: &str, n: u64) -> String {
    format!("{}{:0width$}", prefix, n, width = NAMING_SERIES_WIDTH)
}

/// Counter encoded in a series name, if it belongs to `prefix`
pub fn series_counter(prefix: &str, name: &str) -> Option<u64> {
    name.strip_prefix(prefix)?.parse().ok()
}

/// Counter following the highest numbered name of a series.
///
/// Names outside the series or without a numeric suffix are ignored, so the
/// result never depends on how the names sort as strings.
pub fn next_series_counter<'a, I>(prefix: &str, names: I) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .filter_map(|name| series_counter(prefix, name))
        .max()
        .unwrap_or(0)
        + 1
}

/// Number ingredient rows after their position in the parent
pub(crate) fn stamp_children(record: &mut ChangeRecord) {
    let parent = record.name.clone().unwrap_or_default();
    for (i, delta) in record.ingredient_changes.iter_mut().enumerate() {
        delta.idx = (i + 1) as u32;
        delta.name = Some(format!("{}-{}", parent, delta.idx));
    }
}

pub(crate) fn field_value<T: Serialize>(value: &T, field: &str) -> Result<Option<Value>> {
    Ok(serde_json::to_value(value)?.get(field).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_log::IngredientDelta;

    #[test]
    fn test_series_name_is_zero_padded() {
        assert_eq!(series_name("FCL-", 1), "FCL-00001");
        assert_eq!(series_name("FCL-", 123456), "FCL-123456");
    }

    #[test]
    fn test_series_counter() {
        assert_eq!(series_counter("FCL-", "FCL-00042"), Some(42));
        assert_eq!(series_counter("FCL-", "CHG-00042"), None);
        assert_eq!(series_counter("FCL-", "FCL-abc"), None);
    }

    #[test]
    fn test_next_counter_past_five_digits() {
        let names = [series_name("FCL-", 99999), series_name("FCL-", 100000)];
        let next = next_series_counter("FCL-", names.iter().map(String::as_str));
        assert_eq!(series_name("FCL-", next), "FCL-100001");
    }

    #[test]
    fn test_next_counter_ignores_foreign_names() {
        let names = ["FCL-00007", "FCL-manual", "CHG-00900", "FCL-00003"];
        assert_eq!(next_series_counter("FCL-", names), 8);
        assert_eq!(next_series_counter("FCL-", ["FCL-manual"]), 1);
        assert_eq!(next_series_counter("FCL-", Vec::<&str>::new()), 1);
    }

    #[test]
    fn test_stamp_children_follows_position() {
        let mut record = ChangeRecord {
            name: Some("FCL-00003".into()),
            ..Default::default()
        };
        record.push_ingredient_change(IngredientDelta::new("ING-1", 1.0, 2.0, "Kg"));
        record.push_ingredient_change(IngredientDelta::new("ING-2", 1.0, 2.0, "Kg"));
        stamp_children(&mut record);

        assert_eq!(record.ingredient_changes[0].idx, 1);
        assert_eq!(record.ingredient_changes[1].name.as_deref(), Some("FCL-00003-2"));
    }
}
