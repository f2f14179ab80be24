//! SeaORM Entity for ingredient rows of a change record
//!
//! Rows are owned by their parent and removed with it.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "change_log_ingredients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    pub parent: String,
    pub idx: i32,
    pub ingredient: String,
    pub ingredient_name: Option<String>,
    pub old_quantity: f64,
    pub new_quantity: f64,
    pub uom: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub reason: Option<String>,
    pub change_percentage: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::formulation_change_logs::Entity",
        from = "Column::Parent",
        to = "super::formulation_change_logs::Column::Name",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    ChangeLog,
}

impl Related<super::formulation_change_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChangeLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
