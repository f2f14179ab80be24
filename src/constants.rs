//! Application-wide constants
//!
//! This module contains constants used throughout the application.

/// Document type name used when referencing change records from
/// notifications and audit trails
pub const CHANGE_LOG_DOCTYPE: &str = "Formulation Change Log";

/// Roles whose holders are told about approved formulation changes
pub const RND_MANAGER_ROLE: &str = "RND Manager";
pub const QUALITY_MANAGER_ROLE: &str = "Quality Manager";

/// Prefix of the naming series for change records (`FCL-00001`, ...)
pub const DEFAULT_NAMING_PREFIX: &str = "FCL-";

/// Width of the zero-padded counter in generated record names
pub const NAMING_SERIES_WIDTH: usize = 5;

/// Formulation purpose required by animal trials
pub const ANIMAL_NUTRITION_PURPOSE: &str = "Animal Nutrition";

/// Trial results longer than this are truncated in reports
pub const TRIAL_RESULTS_SUMMARY_LEN: usize = 500;
