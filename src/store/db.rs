//! Database change record store.

use super::{
    field_value, next_series_counter, series_name, stamp_children, ChangeLogStore, RecordKind,
};
use crate::change_log::{ChangeRecord, IngredientDelta};
use crate::constants::CHANGE_LOG_DOCTYPE;
use crate::error::{ChangeLogError, Result};
use crate::orm::{change_log_ingredients, formulation_change_logs, naming_series};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    entity::*, query::*, sea_query::Expr, DatabaseConnection, DatabaseTransaction, Set,
    TransactionTrait,
};
use serde_json::Value;

const SERIES_ATTEMPTS: usize = 5;

/// Change records in the `formulation_change_logs` and
/// `change_log_ingredients` tables.
///
/// Every write runs in a single transaction covering the parent and its rows.
pub struct DbStore {
    db: DatabaseConnection,
    prefix: String,
}

impl DbStore {
    pub fn new(db: DatabaseConnection, prefix: &str) -> Self {
        Self {
            db,
            prefix: prefix.to_string(),
        }
    }

    /// Take the next name of the series from its counter row.
    ///
    /// The counter is advanced with a compare-and-set inside the insert
    /// transaction, so concurrent inserts never share a name. A missing
    /// counter row is seeded from the highest name already stored.
    async fn next_name(&self, txn: &DatabaseTransaction) -> Result<String> {
        for _ in 0..SERIES_ATTEMPTS {
            let counter = naming_series::Entity::find_by_id(self.prefix.clone())
                .one(txn)
                .await?;

            let next = match counter {
                Some(row) => {
                    let result = naming_series::Entity::update_many()
                        .col_expr(naming_series::Column::Current, Expr::value(row.current + 1))
                        .filter(naming_series::Column::Name.eq(self.prefix.as_str()))
                        .filter(naming_series::Column::Current.eq(row.current))
                        .exec(txn)
                        .await?;
                    if result.rows_affected == 0 {
                        log::debug!("Naming series {} moved under us, retrying", self.prefix);
                        continue;
                    }
                    row.current + 1
                }
                None => {
                    let next = self.seed_counter(txn).await?;
                    naming_series::ActiveModel {
                        name: Set(self.prefix.clone()),
                        current: Set(next),
                    }
                    .insert(txn)
                    .await?;
                    next
                }
            };
            return Ok(series_name(&self.prefix, next as u64));
        }

        Err(ChangeLogError::Database(format!(
            "naming series {} still contended after {} attempts",
            self.prefix, SERIES_ATTEMPTS
        )))
    }

    async fn seed_counter(&self, txn: &DatabaseTransaction) -> Result<i64> {
        let existing = formulation_change_logs::Entity::find()
            .filter(formulation_change_logs::Column::Name.starts_with(&self.prefix))
            .all(txn)
            .await?;
        let next = next_series_counter(&self.prefix, existing.iter().map(|m| m.name.as_str()));
        Ok(next as i64)
    }

    async fn rows(&self, parent: &str) -> Result<Vec<change_log_ingredients::Model>> {
        Ok(change_log_ingredients::Entity::find()
            .filter(change_log_ingredients::Column::Parent.eq(parent))
            .order_by_asc(change_log_ingredients::Column::Idx)
            .all(&self.db)
            .await?)
    }

    async fn insert_rows(&self, txn: &DatabaseTransaction, record: &ChangeRecord) -> Result<()> {
        let parent = record.name.clone().unwrap_or_default();
        for delta in &record.ingredient_changes {
            row_active_model(&parent, delta)?.insert(txn).await?;
        }
        Ok(())
    }
}

fn required<T: Clone>(value: &Option<T>, field: &str) -> Result<T> {
    value.clone().ok_or_else(|| ChangeLogError::missing(field))
}

fn active_model(record: &ChangeRecord) -> Result<formulation_change_logs::ActiveModel> {
    Ok(formulation_change_logs::ActiveModel {
        name: Set(required(&record.name, "name")?),
        formulation: Set(required(&record.formulation_id, "formulation")?),
        date: Set(required(&record.date, "date")?),
        changed_by: Set(required(&record.changed_by, "changed_by")?),
        change_type: Set(required(&record.change_type, "change_type")?),
        description: Set(record.description.clone()),
        status: Set(record.status),
        title: Set(record.title.clone()),
        version: Set(record.version as i32),
        modified: Set(Utc::now().naive_utc()),
    })
}

fn row_active_model(
    parent: &str,
    delta: &IngredientDelta,
) -> Result<change_log_ingredients::ActiveModel> {
    Ok(change_log_ingredients::ActiveModel {
        name: Set(required(&delta.name, "name")?),
        parent: Set(parent.to_string()),
        idx: Set(delta.idx as i32),
        ingredient: Set(required(&delta.ingredient_id, "ingredient")?),
        ingredient_name: Set(delta.ingredient_display_name.clone()),
        old_quantity: Set(required(&delta.old_quantity, "old_quantity")?),
        new_quantity: Set(required(&delta.new_quantity, "new_quantity")?),
        uom: Set(required(&delta.unit, "uom")?),
        reason: Set(delta.reason.clone()),
        change_percentage: Set(delta.change_percentage),
    })
}

fn from_models(
    model: formulation_change_logs::Model,
    rows: Vec<change_log_ingredients::Model>,
) -> ChangeRecord {
    ChangeRecord {
        name: Some(model.name),
        version: model.version as u32,
        formulation_id: Some(model.formulation),
        date: Some(model.date),
        changed_by: Some(model.changed_by),
        change_type: Some(model.change_type),
        description: model.description,
        status: model.status,
        title: model.title,
        ingredient_changes: rows.into_iter().map(delta_from_model).collect(),
    }
}

fn delta_from_model(row: change_log_ingredients::Model) -> IngredientDelta {
    IngredientDelta {
        name: Some(row.name),
        idx: row.idx as u32,
        ingredient_id: Some(row.ingredient),
        ingredient_display_name: row.ingredient_name,
        old_quantity: Some(row.old_quantity),
        new_quantity: Some(row.new_quantity),
        unit: Some(row.uom),
        reason: row.reason,
        change_percentage: row.change_percentage,
    }
}

#[async_trait]
impl ChangeLogStore for DbStore {
    async fn insert(&self, mut record: ChangeRecord) -> Result<ChangeRecord> {
        let txn = self.db.begin().await?;

        record.name = Some(self.next_name(&txn).await?);
        record.version = 1;
        stamp_children(&mut record);

        active_model(&record)?.insert(&txn).await?;
        self.insert_rows(&txn, &record).await?;

        txn.commit().await?;
        Ok(record)
    }

    async fn update(&self, record: ChangeRecord) -> Result<ChangeRecord> {
        let name = required(&record.name, "name")?;
        let txn = self.db.begin().await?;

        let stored = formulation_change_logs::Entity::find_by_id(name.clone())
            .one(&txn)
            .await?
            .ok_or_else(|| ChangeLogError::NotFound {
                kind: CHANGE_LOG_DOCTYPE,
                id: name.clone(),
            })?;

        let conflict = |found: i32| ChangeLogError::Conflict {
            id: name.clone(),
            expected: record.version,
            found: found as u32,
        };
        if stored.version as u32 != record.version {
            return Err(conflict(stored.version));
        }

        let mut next = record.clone();
        next.version += 1;
        stamp_children(&mut next);

        let result = formulation_change_logs::Entity::update_many()
            .set(active_model(&next)?)
            .filter(formulation_change_logs::Column::Name.eq(name.as_str()))
            .filter(formulation_change_logs::Column::Version.eq(stored.version))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(conflict(stored.version + 1));
        }

        change_log_ingredients::Entity::delete_many()
            .filter(change_log_ingredients::Column::Parent.eq(name.as_str()))
            .exec(&txn)
            .await?;
        self.insert_rows(&txn, &next).await?;

        txn.commit().await?;
        Ok(next)
    }

    async fn get(&self, name: &str) -> Result<Option<ChangeRecord>> {
        let model = match formulation_change_logs::Entity::find_by_id(name.to_string())
            .one(&self.db)
            .await?
        {
            Some(model) => model,
            None => return Ok(None),
        };
        let rows = self.rows(name).await?;
        Ok(Some(from_models(model, rows)))
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let count = formulation_change_logs::Entity::find()
            .filter(formulation_change_logs::Column::Name.eq(name))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let txn = self.db.begin().await?;

        change_log_ingredients::Entity::delete_many()
            .filter(change_log_ingredients::Column::Parent.eq(name))
            .exec(&txn)
            .await?;
        let result = formulation_change_logs::Entity::delete_many()
            .filter(formulation_change_logs::Column::Name.eq(name))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ChangeLogError::NotFound {
                kind: CHANGE_LOG_DOCTYPE,
                id: name.to_string(),
            });
        }

        txn.commit().await?;
        Ok(())
    }

    async fn get_value(&self, kind: RecordKind, id: &str, field: &str) -> Result<Option<Value>> {
        match kind {
            RecordKind::ChangeRecord => match self.get(id).await? {
                Some(record) => field_value(&record, field),
                None => Ok(None),
            },
            RecordKind::IngredientDelta => {
                match change_log_ingredients::Entity::find_by_id(id.to_string())
                    .one(&self.db)
                    .await?
                {
                    Some(row) => field_value(&delta_from_model(row), field),
                    None => Ok(None),
                }
            }
        }
    }
}
