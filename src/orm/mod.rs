//! SeaORM entities backing change records and their lookups

pub mod change_log_ingredients;
pub mod formulation_change_logs;
pub mod formulations;
pub mod has_roles;
pub mod items;
pub mod naming_series;
pub mod uoms;
