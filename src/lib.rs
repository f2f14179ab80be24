//! Formulation change tracking for R&D nutrition records.
//!
//! A [`ChangeRecord`](change_log::ChangeRecord) logs one change to a
//! formulation together with the per-ingredient quantity deltas it made.
//! Records are persisted through [`ChangeLogService`](change_log::service::ChangeLogService),
//! which recomputes derived fields, validates the record graph and notifies
//! managers when a change is approved.

pub mod app_config;
pub mod change_log;
pub mod constants;
pub mod email;
pub mod error;
pub mod lookup;
pub mod notifications;
pub mod orm;
pub mod store;
pub mod trials;

pub use error::{ChangeLogError, Result};
