//! Change type and status definitions

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of change a record logs
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum ChangeType {
    #[sea_orm(string_value = "Ingredient Change")]
    #[serde(rename = "Ingredient Change")]
    IngredientChange,
    #[sea_orm(string_value = "Process Change")]
    #[serde(rename = "Process Change")]
    ProcessChange,
    #[sea_orm(string_value = "Quantity Change")]
    #[serde(rename = "Quantity Change")]
    QuantityChange,
    #[sea_orm(string_value = "New Formulation")]
    #[serde(rename = "New Formulation")]
    NewFormulation,
    #[sea_orm(string_value = "Other")]
    Other,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IngredientChange => "Ingredient Change",
            Self::ProcessChange => "Process Change",
            Self::QuantityChange => "Quantity Change",
            Self::NewFormulation => "New Formulation",
            Self::Other => "Other",
        }
    }
}

/// Lifecycle status of a change record.
///
/// Only moves forward: `Draft -> Approved -> Implemented`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
pub enum ChangeStatus {
    #[sea_orm(string_value = "Draft")]
    #[default]
    Draft,
    #[sea_orm(string_value = "Approved")]
    Approved,
    #[sea_orm(string_value = "Implemented")]
    Implemented,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Approved => "Approved",
            Self::Implemented => "Implemented",
        }
    }

    /// Statuses reachable in one step from `self`
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Draft => Some(Self::Approved),
            Self::Approved => Some(Self::Implemented),
            Self::Implemented => None,
        }
    }
}
