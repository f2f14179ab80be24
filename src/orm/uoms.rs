//! SeaORM Entity for the unit-of-measure vocabulary

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "uoms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uom_name: String,
    pub must_be_whole_number: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
