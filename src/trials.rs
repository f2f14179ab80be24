//! Plant and animal trials run against a formulation
//!
//! Trials share the formulation lookup with the change log. Animal trials
//! additionally require a formulation meant for animal nutrition.

use crate::constants::{ANIMAL_NUTRITION_PURPOSE, TRIAL_RESULTS_SUMMARY_LEN};
use crate::error::{ChangeLogError, Result};
use crate::lookup::FormulationLookup;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialKind {
    #[serde(rename = "Plant Trial")]
    Plant,
    #[serde(rename = "Animal Trial")]
    Animal,
}

impl TrialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plant => "Plant Trial",
            Self::Animal => "Animal Trial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    Draft,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub kind: TrialKind,
    pub trial_name: String,
    pub formulation_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub results: Option<String>,
    pub status: TrialStatus,
}

impl Trial {
    pub fn new(kind: TrialKind, trial_name: &str) -> Self {
        Self {
            kind,
            trial_name: trial_name.to_string(),
            formulation_id: None,
            start_date: None,
            end_date: None,
            results: None,
            status: TrialStatus::Draft,
        }
    }

    pub fn with_formulation(mut self, formulation_id: &str) -> Self {
        self.formulation_id = Some(formulation_id.to_string());
        self
    }

    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Mark the trial completed, replacing the results when given
    pub fn complete(&mut self, results: Option<&str>) {
        if let Some(results) = results.filter(|r| !r.is_empty()) {
            self.results = Some(results.to_string());
        }
        self.status = TrialStatus::Completed;
    }

    pub fn has_results(&self) -> bool {
        self.results.as_deref().map_or(false, |r| !r.is_empty())
    }
}

/// `Plant Trial - <name>` or `Animal Trial - <name>`
pub fn default_trial_name(kind: TrialKind, formulation_display_name: &str) -> String {
    format!("{} - {}", kind.as_str(), formulation_display_name)
}

/// Check dates and the formulation reference of a trial
pub async fn validate_trial(trial: &Trial, lookup: &dyn FormulationLookup) -> Result<()> {
    if let (Some(start), Some(end)) = (trial.start_date, trial.end_date) {
        if start > end {
            return Err(ChangeLogError::InvalidDateRange { start, end });
        }
    }

    match trial.formulation_id.as_deref() {
        Some(formulation) if !formulation.trim().is_empty() => {
            check_formulation(trial.kind, formulation, lookup).await
        }
        _ => Ok(()),
    }
}

async fn check_formulation(
    kind: TrialKind,
    formulation: &str,
    lookup: &dyn FormulationLookup,
) -> Result<()> {
    if !lookup.formulation_exists(formulation).await? {
        return Err(ChangeLogError::InvalidReference {
            kind: "Formulation",
            id: formulation.to_string(),
        });
    }

    if kind != TrialKind::Animal {
        return Ok(());
    }

    let purpose = lookup.get_purpose(formulation).await?;
    if purpose != ANIMAL_NUTRITION_PURPOSE {
        return Err(ChangeLogError::PurposeMismatch {
            formulation: formulation.to_string(),
            expected: ANIMAL_NUTRITION_PURPOSE,
        });
    }
    Ok(())
}

/// New draft trial for a formulation, starting `today`.
///
/// Without a `trial_name` the default name for the kind is used.
pub async fn trial_from_formulation(
    kind: TrialKind,
    formulation_id: &str,
    trial_name: Option<&str>,
    lookup: &dyn FormulationLookup,
    today: NaiveDate,
) -> Result<Trial> {
    check_formulation(kind, formulation_id, lookup).await?;

    let trial_name = match trial_name.filter(|n| !n.trim().is_empty()) {
        Some(name) => name.to_string(),
        None => default_trial_name(kind, &lookup.resolve_display_name(formulation_id).await?),
    };

    let trial = Trial::new(kind, &trial_name)
        .with_formulation(formulation_id)
        .with_dates(Some(today), None);
    log::info!("Created {} {} for {}", kind.as_str(), trial_name, formulation_id);
    Ok(trial)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulationInfo {
    pub name: String,
    pub formulation_name: String,
    pub purpose: String,
}

/// Overview of a trial and the formulation it tested
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialReport {
    pub trial_name: String,
    pub trial_type: TrialKind,
    pub start_date: Option<NaiveDate>,
    pub status: TrialStatus,
    pub has_results: bool,
    /// Results, cut to the first 500 characters followed by `...`
    pub results_summary: Option<String>,
    pub formulation: Option<FormulationInfo>,
}

impl TrialReport {
    pub async fn build(trial: &Trial, lookup: &dyn FormulationLookup) -> Result<Self> {
        let mut formulation = None;
        if let Some(id) = trial.formulation_id.as_deref() {
            if lookup.formulation_exists(id).await? {
                formulation = Some(FormulationInfo {
                    name: id.to_string(),
                    formulation_name: lookup.resolve_display_name(id).await?,
                    purpose: lookup.get_purpose(id).await?,
                });
            }
        }

        Ok(Self {
            trial_name: trial.trial_name.clone(),
            trial_type: trial.kind,
            start_date: trial.start_date,
            status: trial.status,
            has_results: trial.has_results(),
            results_summary: trial.results.as_deref().map(summarize_results),
            formulation,
        })
    }
}

pub fn summarize_results(results: &str) -> String {
    match results.char_indices().nth(TRIAL_RESULTS_SUMMARY_LEN) {
        Some((cut, _)) => format!("{}...", &results[..cut]),
        None => results.to_string(),
    }
}
