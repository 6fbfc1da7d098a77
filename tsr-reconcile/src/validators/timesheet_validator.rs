//! Timesheet Validator
//!
//! Final integrity report for a timesheet after field validation and grid
//! reconciliation.
//!
//! # Checks
//! 1. **Daily totals**: project hours per day match the header
//! 2. **Weekly total**: all project hours match the header weekly total
//! 3. **Header consistency**: header daily totals sum to the weekly total
//! 4. **Posted Actuals**: weekly total above the limit means the wrong column
//!    was extracted (error); a single project above its limit is a warning
//! 5. **Zero-hour**: a zero-hour sheet carries no projects and zero totals
//!
//! # Status
//! - Pass: no errors, no warnings
//! - Warning: warnings only
//! - Fail: any error

use crate::reconcile::within_tolerance;
use serde::{Deserialize, Serialize};
use tsr_common::config::{TomlConfig, ValidationSettings};
use tsr_common::models::DAY_NAMES;
use tsr_common::{WeeklyTimesheet, DAYS_PER_WEEK};

/// Validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    /// All checks passed
    Pass,
    /// Warnings only (non-blocking)
    Warning,
    /// At least one error (review required)
    Fail,
}

/// Validation report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    /// No errors
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub summary: String,
}

/// Timesheet Validator
pub struct TimesheetValidator {
    tolerance: f64,
    limits: ValidationSettings,
}

impl Default for TimesheetValidator {
    fn default() -> Self {
        Self::from_config(&TomlConfig::default())
    }
}

impl TimesheetValidator {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            tolerance: config.reconcile.tolerance,
            limits: config.validation.clone(),
        }
    }

    /// Validate one timesheet
    pub fn validate(&self, sheet: &WeeklyTimesheet) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if sheet.is_zero_hour {
            self.check_zero_hour(sheet, &mut errors);
            return self.finish(sheet, errors, warnings, true);
        }

        // Check 1: per-day body vs header
        let calculated = sheet.calculated_daily_totals();
        for day in 0..DAYS_PER_WEEK {
            if !within_tolerance(calculated[day] - sheet.daily_totals[day], self.tolerance) {
                errors.push(format!(
                    "{}: Project hours sum to {:.2} but header shows {:.2}",
                    DAY_NAMES[day], calculated[day], sheet.daily_totals[day]
                ));
            }
        }

        // Check 2: weekly body vs header
        let calculated_weekly = sheet.calculated_weekly_total();
        if !within_tolerance(calculated_weekly - sheet.weekly_total, self.tolerance) {
            errors.push(format!(
                "Weekly total mismatch: Project hours sum to {:.2} but header shows {:.2}",
                calculated_weekly, sheet.weekly_total
            ));
        }

        // Check 3: header internal consistency
        let header_sum = sheet.header_daily_sum();
        if !within_tolerance(header_sum - sheet.weekly_total, self.tolerance) {
            errors.push(format!(
                "Header inconsistency: Daily totals sum to {:.2} but weekly total shows {:.2}",
                header_sum, sheet.weekly_total
            ));
        }

        // Check 4: Posted Actuals
        if sheet.weekly_total > self.limits.posted_actuals_weekly_limit {
            errors.push(format!(
                "Weekly total is {} hours, above {}; likely extracted 'Posted Actuals' instead of 'Total'",
                sheet.weekly_total, self.limits.posted_actuals_weekly_limit
            ));
        }
        for line in &sheet.projects {
            let total = line.total();
            if total > self.limits.project_week_warning {
                warnings.push(format!(
                    "Project '{}' has {} hours in one week; check whether 'Posted Actuals' was extracted instead of 'Total'",
                    line.project_code, total
                ));
            }
        }

        self.finish(sheet, errors, warnings, false)
    }

    fn check_zero_hour(&self, sheet: &WeeklyTimesheet, errors: &mut Vec<String>) {
        let logged: f64 = sheet.calculated_weekly_total();
        if !sheet.projects.is_empty() {
            errors.push(format!(
                "Zero-hour timesheet lists {} project(s) ({}h logged)",
                sheet.projects.len(),
                logged
            ));
        }
        if !within_tolerance(sheet.header_daily_sum(), self.tolerance)
            || !within_tolerance(sheet.weekly_total, self.tolerance)
        {
            errors.push(format!(
                "Zero-hour timesheet has non-zero totals (daily sum {:.2}, weekly {:.2})",
                sheet.header_daily_sum(),
                sheet.weekly_total
            ));
        }
    }

    fn finish(
        &self,
        sheet: &WeeklyTimesheet,
        errors: Vec<String>,
        warnings: Vec<String>,
        zero_hour: bool,
    ) -> ValidationReport {
        let name = &sheet.resource_name;
        let (status, summary) = if !errors.is_empty() {
            (
                ValidationStatus::Fail,
                format!(
                    "VALIDATION FAILED for {}: {} error(s), {} warning(s)",
                    name,
                    errors.len(),
                    warnings.len()
                ),
            )
        } else if !warnings.is_empty() {
            (
                ValidationStatus::Warning,
                format!("VALIDATION PASSED WITH WARNINGS for {}: {} warning(s)", name, warnings.len()),
            )
        } else if zero_hour {
            (
                ValidationStatus::Pass,
                format!("Zero-hour timesheet validation passed for {}", name),
            )
        } else {
            (
                ValidationStatus::Pass,
                format!("VALIDATION PASSED for {}: All hours match correctly", name),
            )
        };

        ValidationReport {
            status,
            valid: errors.is_empty(),
            errors,
            warnings,
            summary,
        }
    }
}
