//! Grid Reconciliation Engine
//!
//! Restores the per-day law `sum(projects[*].hours[d]) == daily_totals[d]`
//! by trying correction strategies in a fixed order and accepting the first
//! edit that makes every day consistent:
//!
//! 1. Simple Move (one cell to another day, same project)
//! 2. Cross-Project Swap (one cell to another project's empty day)
//! 3. Proportional Scaling (uniform shortfall across mismatched days)
//! 4. Complex Redistribution (two simultaneous fixes)
//!
//! If nothing works the timesheet is left untouched and the outcome says
//! which days are over and under, for manual review. A consistent grid is
//! never modified.

use super::grid::{GridSnapshot, MismatchAnalysis, ProposedEdit};
use super::strategies::{HypothesisBudget, SearchOutcome, Strategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tsr_common::config::ReconcileSettings;
use tsr_common::WeeklyTimesheet;

/// Final state of one reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStatus {
    /// Invariant already held; nothing changed
    AlreadyConsistent,
    /// A strategy restored consistency
    Corrected,
    /// Zero-hour timesheet; not reconciled
    Skipped,
    /// No strategy restored consistency
    Unresolved,
    /// Search stopped at the hypothesis cap
    BudgetExhausted,
}

/// Reconciliation outcome, serialized into the processing report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub status: ReconcileStatus,
    /// Consistency was restored by an edit
    pub success: bool,
    pub strategy: Option<Strategy>,
    /// Audit line for the correction, or the failure diagnostic
    pub explanation: String,
    /// Mismatches found before any correction
    pub mismatches: MismatchAnalysis,
    pub hypotheses_tried: usize,
}

impl Reconciliation {
    pub fn needs_review(&self) -> bool {
        matches!(self.status, ReconcileStatus::Unresolved | ReconcileStatus::BudgetExhausted)
    }

    fn without_edit(status: ReconcileStatus, explanation: String, mismatches: MismatchAnalysis, tried: usize) -> Self {
        Self {
            status,
            success: false,
            strategy: None,
            explanation,
            mismatches,
            hypotheses_tried: tried,
        }
    }
}

/// Grid Reconciliation Engine
pub struct ReconciliationEngine {
    tolerance: f64,
    scaling_spread: f64,
    max_hypotheses: usize,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::from_settings(&ReconcileSettings::default())
    }
}

impl ReconciliationEngine {
    pub fn from_settings(settings: &ReconcileSettings) -> Self {
        Self {
            tolerance: settings.tolerance,
            scaling_spread: settings.scaling_ratio_spread,
            max_hypotheses: settings.max_hypotheses,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Search for a correction without modifying the timesheet
    ///
    /// Returns the outcome and, on success, the edit to apply.
    pub fn evaluate(&self, sheet: &WeeklyTimesheet) -> (Reconciliation, Option<ProposedEdit>) {
        if sheet.is_zero_hour {
            return (
                Reconciliation::without_edit(
                    ReconcileStatus::Skipped,
                    "Zero-hour timesheet; nothing to reconcile".to_string(),
                    MismatchAnalysis::default(),
                    0,
                ),
                None,
            );
        }

        let grid = GridSnapshot::new(sheet, self.tolerance);
        let analysis = grid.analyze();
        if analysis.is_consistent() {
            return (
                Reconciliation::without_edit(
                    ReconcileStatus::AlreadyConsistent,
                    "No correction needed".to_string(),
                    analysis,
                    0,
                ),
                None,
            );
        }

        debug!(
            resource = %sheet.resource_name,
            mismatches = %analysis.summary(),
            "Grid inconsistent, searching for correction"
        );

        let mut budget = HypothesisBudget::new(self.max_hypotheses);
        for strategy in Strategy::ORDER {
            match strategy.attempt(&grid, &analysis, &mut budget, self.scaling_spread) {
                SearchOutcome::Found(correction) => {
                    let explanation = format!("{} [Strategy: {}]", correction.explanation, strategy.label());
                    let outcome = Reconciliation {
                        status: ReconcileStatus::Corrected,
                        success: true,
                        strategy: Some(strategy),
                        explanation,
                        mismatches: analysis,
                        hypotheses_tried: budget.spent(),
                    };
                    return (outcome, Some(correction.edit));
                }
                SearchOutcome::NotFound => {
                    debug!(strategy = %strategy, tried = budget.spent(), "Strategy found no correction");
                }
                SearchOutcome::BudgetExhausted => {
                    let explanation = format!(
                        "Search stopped after {} hypotheses; needs manual review. {}",
                        budget.limit(),
                        analysis.summary()
                    );
                    let tried = budget.spent();
                    return (
                        Reconciliation::without_edit(ReconcileStatus::BudgetExhausted, explanation, analysis, tried),
                        None,
                    );
                }
            }
        }

        let explanation = format!("Could not auto-correct. {}", analysis.summary());
        let tried = budget.spent();
        (
            Reconciliation::without_edit(ReconcileStatus::Unresolved, explanation, analysis, tried),
            None,
        )
    }

    /// Search for a correction and apply it in place
    pub fn reconcile(&self, sheet: &mut WeeklyTimesheet) -> Reconciliation {
        let (outcome, edit) = self.evaluate(sheet);

        if let Some(edit) = edit {
            edit.apply(sheet);
            info!(
                resource = %sheet.resource_name,
                strategy = ?outcome.strategy,
                correction = %outcome.explanation,
                "Reconciled timesheet grid"
            );
        } else if outcome.needs_review() {
            warn!(
                resource = %sheet.resource_name,
                diagnostic = %outcome.explanation,
                "Grid needs manual review"
            );
        }

        outcome
    }
}
