//! SeaORM Entity for formulation change records

use crate::change_log::types::{ChangeStatus, ChangeType};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "formulation_change_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    pub formulation: String,
    pub date: Date,
    pub changed_by: String,
    pub change_type: ChangeType,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub status: ChangeStatus,
    pub title: Option<String>,
    /// Optimistic concurrency counter, bumped on every update
    pub version: i32,
    pub modified: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::change_log_ingredients::Entity")]
    Ingredients,
    #[sea_orm(
        belongs_to = "super::formulations::Entity",
        from = "Column::Formulation",
        to = "super::formulations::Column::Name",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Formulation,
}

impl Related<super::change_log_ingredients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ingredients.def()
    }
}

impl Related<super::formulations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Formulation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
