//! Grid snapshot and proposed edits
//!
//! Strategies never touch the timesheet. They read a [`GridSnapshot`] and
//! describe a candidate fix as a [`ProposedEdit`] (a handful of cell
//! overrides). The snapshot evaluates daily sums with the overrides in place;
//! only the accepted edit is applied to the timesheet.

use serde::{Deserialize, Serialize};
use tsr_common::models::{round_hours, DAY_ABBREVIATIONS, WeekHours};
use tsr_common::{WeeklyTimesheet, DAYS_PER_WEEK};

pub use tsr_common::models::within_tolerance;

/// One cell override: `projects[project].hours[day] = value`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellEdit {
    pub project: usize,
    pub day: usize,
    pub value: f64,
}

/// A candidate correction; later edits to the same cell win
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProposedEdit {
    cells: Vec<CellEdit>,
}

impl ProposedEdit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style cell override
    pub fn set(mut self, project: usize, day: usize, value: f64) -> Self {
        self.cells.push(CellEdit { project, day, value });
        self
    }

    pub fn cells(&self) -> &[CellEdit] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Override for a cell, if any
    fn value_for(&self, project: usize, day: usize) -> Option<f64> {
        self.cells
            .iter()
            .rev()
            .find(|c| c.project == project && c.day == day)
            .map(|c| c.value)
    }

    /// Write the edit into the timesheet
    pub fn apply(&self, sheet: &mut WeeklyTimesheet) {
        for cell in &self.cells {
            if let Some(line) = sheet.projects.get_mut(cell.project) {
                if cell.day < DAYS_PER_WEEK {
                    line.hours[cell.day] = cell.value;
                }
            }
        }
    }
}

/// Signed mismatch for one day (calculated minus header)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayMismatch {
    pub day: usize,
    pub difference: f64,
}

impl DayMismatch {
    /// `"Mon +2.50"`
    pub fn label(&self) -> String {
        format!("{} {:+.2}", DAY_ABBREVIATIONS[self.day], self.difference)
    }
}

/// Which days are over or under their header total
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MismatchAnalysis {
    pub over: Vec<DayMismatch>,
    pub under: Vec<DayMismatch>,
}

impl MismatchAnalysis {
    pub fn is_consistent(&self) -> bool {
        self.over.is_empty() && self.under.is_empty()
    }

    pub fn over_days(&self) -> impl Iterator<Item = usize> + '_ {
        self.over.iter().map(|m| m.day)
    }

    pub fn under_days(&self) -> impl Iterator<Item = usize> + '_ {
        self.under.iter().map(|m| m.day)
    }

    /// All mismatched days, Monday first
    pub fn mismatched_days(&self) -> Vec<usize> {
        let mut days: Vec<usize> = self.over_days().chain(self.under_days()).collect();
        days.sort_unstable();
        days
    }

    /// `"Over: [Mon +2.50], Under: [Tue -2.50]"`
    pub fn summary(&self) -> String {
        let join = |list: &[DayMismatch]| list.iter().map(DayMismatch::label).collect::<Vec<_>>().join(", ");
        format!("Over: [{}], Under: [{}]", join(&self.over), join(&self.under))
    }
}

/// Read-only view of a timesheet grid
#[derive(Debug, Clone, Copy)]
pub struct GridSnapshot<'a> {
    sheet: &'a WeeklyTimesheet,
    tolerance: f64,
}

impl<'a> GridSnapshot<'a> {
    pub fn new(sheet: &'a WeeklyTimesheet, tolerance: f64) -> Self {
        Self { sheet, tolerance }
    }

    pub fn project_count(&self) -> usize {
        self.sheet.projects.len()
    }

    pub fn project_code(&self, project: usize) -> &'a str {
        self.sheet
            .projects
            .get(project)
            .map(|line| line.project_code.as_str())
            .unwrap_or("")
    }

    pub fn header(&self, day: usize) -> f64 {
        self.sheet.daily_totals[day]
    }

    /// Current value of a cell
    pub fn cell(&self, project: usize, day: usize) -> f64 {
        self.sheet.projects[project].hours[day]
    }

    /// Value of a cell with `edit` applied
    pub fn cell_with(&self, project: usize, day: usize, edit: &ProposedEdit) -> f64 {
        edit.value_for(project, day).unwrap_or_else(|| self.cell(project, day))
    }

    /// Per-day sums of the project rows with `edit` applied
    pub fn daily_sums(&self, edit: &ProposedEdit) -> WeekHours {
        let mut sums = [0.0; DAYS_PER_WEEK];
        for (day, sum) in sums.iter_mut().enumerate() {
            *sum = (0..self.project_count()).map(|p| self.cell_with(p, day, edit)).sum();
        }
        sums
    }

    /// Over/under classification with `edit` applied
    pub fn analyze_with(&self, edit: &ProposedEdit) -> MismatchAnalysis {
        let sums = self.daily_sums(edit);
        let mut analysis = MismatchAnalysis::default();

        for day in 0..DAYS_PER_WEEK {
            let difference = sums[day] - self.header(day);
            if within_tolerance(difference, self.tolerance) {
                continue;
            }
            let mismatch = DayMismatch {
                day,
                difference: round_hours(difference),
            };
            if difference > 0.0 {
                analysis.over.push(mismatch);
            } else {
                analysis.under.push(mismatch);
            }
        }
        analysis
    }

    pub fn analyze(&self) -> MismatchAnalysis {
        self.analyze_with(&ProposedEdit::new())
    }

    /// Every day's sum matches its header with `edit` applied
    pub fn is_consistent_with(&self, edit: &ProposedEdit) -> bool {
        let sums = self.daily_sums(edit);
        (0..DAYS_PER_WEEK).all(|day| within_tolerance(sums[day] - self.header(day), self.tolerance))
    }
}
