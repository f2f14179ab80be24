//! SeaORM Entity for user role assignments

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "has_roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// User identifier (email) holding the role
    pub parent: String,
    pub role: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
