//! Per-ingredient quantity deltas owned by a change record

use crate::error::{ChangeLogError, Result};
use crate::lookup::FormulationLookup;
use serde::{Deserialize, Serialize};

/// Signed percentage change from `old` to `new`.
///
/// Returns `None` when `old` is zero; the percentage is undefined there and
/// is neither defaulted nor reported as an error.
pub fn change_percentage(old: f64, new: f64) -> Option<f64> {
    if old == 0.0 {
        return None;
    }
    let pct = ((new - old) / old) * 100.0;
    if pct.is_finite() {
        Some(pct)
    } else {
        None
    }
}

/// One ingredient's quantity change within a change record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientDelta {
    /// Row identifier, assigned by the store (`<parent>-<idx>`)
    pub name: Option<String>,
    /// 1-based position within the parent, assigned by the store
    pub idx: u32,
    pub ingredient_id: Option<String>,
    /// Cached display name of the ingredient; resolved only while empty
    pub ingredient_display_name: Option<String>,
    pub old_quantity: Option<f64>,
    pub new_quantity: Option<f64>,
    pub unit: Option<String>,
    pub reason: Option<String>,
    pub change_percentage: Option<f64>,
}

impl IngredientDelta {
    pub fn new(ingredient_id: &str, old_quantity: f64, new_quantity: f64, unit: &str) -> Self {
        Self {
            ingredient_id: Some(ingredient_id.to_string()),
            old_quantity: Some(old_quantity),
            new_quantity: Some(new_quantity),
            unit: Some(unit.to_string()),
            ..Default::default()
        }
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    /// Check that every required attribute is present
    pub fn check_required(&self) -> Result<()> {
        if is_blank(&self.ingredient_id) {
            return Err(ChangeLogError::missing("ingredient"));
        }
        if self.old_quantity.is_none() {
            return Err(ChangeLogError::missing("old_quantity"));
        }
        if self.new_quantity.is_none() {
            return Err(ChangeLogError::missing("new_quantity"));
        }
        if is_blank(&self.unit) {
            return Err(ChangeLogError::missing("uom"));
        }
        Ok(())
    }

    /// Recompute derived fields before the row is persisted.
    ///
    /// Validates required fields and both references, refreshes the change
    /// percentage and fills the ingredient display name if it is empty.
    pub async fn recompute(&mut self, lookup: &dyn FormulationLookup) -> Result<()> {
        self.check_required()?;

        let unit = self.unit.clone().unwrap_or_default();
        if !lookup.is_known_unit(&unit).await? {
            return Err(ChangeLogError::InvalidReference {
                kind: "UOM",
                id: unit,
            });
        }

        let ingredient = self.ingredient_id.clone().unwrap_or_default();
        if !lookup.ingredient_exists(&ingredient).await? {
            return Err(ChangeLogError::InvalidReference {
                kind: "Item",
                id: ingredient,
            });
        }

        self.change_percentage = match (self.old_quantity, self.new_quantity) {
            (Some(old), Some(new)) => change_percentage(old, new),
            _ => None,
        };

        if is_blank(&self.ingredient_display_name) {
            let name = match lookup.resolve_ingredient_name(&ingredient).await {
                Ok(name) => name,
                Err(ChangeLogError::NotFound { .. }) => {
                    return Err(ChangeLogError::InvalidReference {
                        kind: "Item",
                        id: ingredient,
                    })
                }
                Err(e) => return Err(e),
            };
            log::debug!("Resolved ingredient {} to {:?}", ingredient, name);
            self.ingredient_display_name = Some(name);
        }

        Ok(())
    }

    /// Percentage formatted for summaries, e.g. `-20.00%`
    pub fn display_percentage(&self) -> Option<String> {
        self.change_percentage.map(|pct| format!("{:.2}%", pct))
    }
}

pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}
