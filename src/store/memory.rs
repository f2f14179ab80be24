//! In-memory change record store.

use super::{field_value, series_name, stamp_children, ChangeLogStore, RecordKind};
use crate::change_log::ChangeRecord;
use crate::constants::{CHANGE_LOG_DOCTYPE, DEFAULT_NAMING_PREFIX};
use crate::error::{ChangeLogError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// Change records held in a concurrent map.
pub struct MemoryStore {
    records: DashMap<String, ChangeRecord>,
    counter: AtomicU64,
    prefix: String,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_NAMING_PREFIX)
    }
}

impl MemoryStore {
    /// Create an empty store naming records `<prefix>00001`, `<prefix>00002`, ...
    pub fn new(prefix: &str) -> Self {
        Self {
            records: DashMap::new(),
            counter: AtomicU64::new(0),
            prefix: prefix.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn unsaved() -> ChangeLogError {
    ChangeLogError::NotFound {
        kind: CHANGE_LOG_DOCTYPE,
        id: "<unsaved>".to_string(),
    }
}

#[async_trait]
impl ChangeLogStore for MemoryStore {
    async fn insert(&self, mut record: ChangeRecord) -> Result<ChangeRecord> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let name = series_name(&self.prefix, n);

        record.name = Some(name.clone());
        record.version = 1;
        stamp_children(&mut record);

        self.records.insert(name, record.clone());
        Ok(record)
    }

    async fn update(&self, mut record: ChangeRecord) -> Result<ChangeRecord> {
        let name = record.name.clone().ok_or_else(unsaved)?;
        let mut stored = self
            .records
            .get_mut(&name)
            .ok_or_else(|| ChangeLogError::NotFound {
                kind: CHANGE_LOG_DOCTYPE,
                id: name.clone(),
            })?;

        if stored.version != record.version {
            return Err(ChangeLogError::Conflict {
                id: name,
                expected: record.version,
                found: stored.version,
            });
        }

        record.version += 1;
        stamp_children(&mut record);
        *stored = record.clone();
        Ok(record)
    }

    async fn get(&self, name: &str) -> Result<Option<ChangeRecord>> {
        Ok(self.records.get(name).map(|r| r.clone()))
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.records.contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.records
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ChangeLogError::NotFound {
                kind: CHANGE_LOG_DOCTYPE,
                id: name.to_string(),
            })
    }

    async fn get_value(&self, kind: RecordKind, id: &str, field: &str) -> Result<Option<Value>> {
        match kind {
            RecordKind::ChangeRecord => match self.records.get(id) {
                Some(record) => field_value(&*record, field),
                None => Ok(None),
            },
            RecordKind::IngredientDelta => {
                for record in self.records.iter() {
                    if let Some(delta) = record
                        .ingredient_changes
                        .iter()
                        .find(|d| d.name.as_deref() == Some(id))
                    {
                        return field_value(delta, field);
                    }
                }
                Ok(None)
            }
        }
    }
}
