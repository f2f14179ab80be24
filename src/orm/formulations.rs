//! SeaORM Entity for formulations

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "formulations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    pub formulation_name: String,
    /// Intended use category, e.g. "Animal Nutrition"
    pub purpose: Option<String>,
    pub status: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::formulation_change_logs::Entity")]
    ChangeLogs,
}

impl Related<super::formulation_change_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChangeLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
