//! Database lookup backend.

use super::FormulationLookup;
use crate::error::{ChangeLogError, Result};
use crate::orm::{formulations, items, uoms};
use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

/// Lookups against the `formulations`, `items` and `uoms` tables.
pub struct DbLookup {
    db: DatabaseConnection,
}

impl DbLookup {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn formulation(&self, formulation_id: &str) -> Result<formulations::Model> {
        formulations::Entity::find_by_id(formulation_id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| ChangeLogError::NotFound {
                kind: "Formulation",
                id: formulation_id.to_string(),
            })
    }
}

#[async_trait]
impl FormulationLookup for DbLookup {
    async fn resolve_display_name(&self, formulation_id: &str) -> Result<String> {
        Ok(self.formulation(formulation_id).await?.formulation_name)
    }

    async fn resolve_ingredient_name(&self, ingredient_id: &str) -> Result<String> {
        items::Entity::find_by_id(ingredient_id.to_string())
            .one(&self.db)
            .await?
            .map(|item| item.item_name)
            .ok_or_else(|| ChangeLogError::NotFound {
                kind: "Item",
                id: ingredient_id.to_string(),
            })
    }

    async fn get_purpose(&self, formulation_id: &str) -> Result<String> {
        Ok(self
            .formulation(formulation_id)
            .await?
            .purpose
            .unwrap_or_default())
    }

    async fn formulation_exists(&self, formulation_id: &str) -> Result<bool> {
        let count = formulations::Entity::find()
            .filter(formulations::Column::Name.eq(formulation_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn ingredient_exists(&self, ingredient_id: &str) -> Result<bool> {
        let count = items::Entity::find()
            .filter(items::Column::ItemCode.eq(ingredient_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn is_known_unit(&self, unit: &str) -> Result<bool> {
        let count = uoms::Entity::find()
            .filter(uoms::Column::UomName.eq(unit))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }
}
