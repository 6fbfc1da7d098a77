//! Timesheet processing pipeline
//!
//! One extracted document in, one auditable report out:
//!
//! 1. Structural check (the only hard failure)
//! 2. Field validation (hours and codes, per cell)
//! 3. Bank-holiday enforcement
//! 4. Grid reconciliation
//! 5. Person resolution
//! 6. Project resolution, quality analysis and name-format fix
//! 7. Similar-code warnings
//! 8. Validation report
//!
//! Every change lands in `correction_log`; every problem lands in `issues`.
//! Nothing below the structural check aborts processing.

use crate::reconcile::{ReconcileStatus, Reconciliation, ReconciliationEngine};
use crate::services::{
    find_similar_code_pairs, fix_project_name_format, BankHolidayCalendar, FieldValidator, PersonResolver,
    ProjectResolver,
};
use crate::types::{Decision, Issue, IssueKind, MatchResult, QualityReport};
use crate::validators::{TimesheetValidator, ValidationReport};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tsr_common::config::TomlConfig;
use tsr_common::models::RawTimesheet;
use tsr_common::{Result, Rosters, WeeklyTimesheet};

/// Person resolution outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonResolution {
    pub raw_name: String,
    pub result: MatchResult,
    pub decision: Decision,
}

/// Project resolution outcome for one line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectResolution {
    pub line: usize,
    pub raw_code: String,
    pub raw_name: String,
    pub result: MatchResult,
    pub decision: Decision,
    pub quality: QualityReport,
}

/// Per-person and per-line identity results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub person: PersonResolution,
    pub projects: Vec<ProjectResolution>,
}

/// Full processing output for one timesheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedTimesheet {
    pub timesheet: WeeklyTimesheet,
    /// Human-readable audit trail of every change made
    pub correction_log: Vec<String>,
    pub resolution_report: ResolutionReport,
    /// Project name/code format issues
    pub quality_issues: Vec<String>,
    /// Suspicious but possibly valid patterns
    pub quality_warnings: Vec<String>,
    pub issues: Vec<Issue>,
    pub validation: ValidationReport,
    pub reconciliation: Reconciliation,
    pub needs_review: bool,
}

/// Timesheet processing pipeline
pub struct TimesheetPipeline {
    config: TomlConfig,
    fields: FieldValidator,
    holidays: BankHolidayCalendar,
    engine: ReconciliationEngine,
    people: PersonResolver,
    projects: ProjectResolver,
    validator: TimesheetValidator,
}

impl TimesheetPipeline {
    pub fn new(config: TomlConfig) -> Self {
        Self {
            fields: FieldValidator::from_config(&config),
            holidays: BankHolidayCalendar::new(&config.bank_holidays),
            engine: ReconciliationEngine::from_settings(&config.reconcile),
            people: PersonResolver::from_settings(&config.matching),
            projects: ProjectResolver::from_config(&config),
            validator: TimesheetValidator::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &TomlConfig {
        &self.config
    }

    fn decide(&self, result: &MatchResult) -> Decision {
        let matching = &self.config.matching;
        Decision::for_match(result, matching.accept_threshold, matching.review_threshold)
    }

    /// Process one extracted timesheet
    ///
    /// # Errors
    /// `Error::Structure` when the extraction breaks the structural contract
    /// (hours rows or daily totals not 7 long, week not Monday..Sunday).
    pub fn process(&self, raw: &RawTimesheet, rosters: &Rosters) -> Result<ProcessedTimesheet> {
        let range = raw.check_structure()?;

        // Field validation
        let fields = self.fields.validate_timesheet(raw, range, &rosters.projects);
        let mut sheet = fields.timesheet;
        let mut log = fields.corrections;
        let mut issues = fields.issues;
        let mut needs_review = fields.needs_review;

        // Bank holidays
        log.extend(self.holidays.enforce(&mut sheet));

        // Grid reconciliation
        let reconciliation = self.engine.reconcile(&mut sheet);
        match reconciliation.status {
            ReconcileStatus::Corrected => log.push(reconciliation.explanation.clone()),
            ReconcileStatus::Unresolved | ReconcileStatus::BudgetExhausted => {
                issues.push(Issue::new(IssueKind::Consistency, reconciliation.explanation.clone()));
                needs_review = true;
            }
            ReconcileStatus::AlreadyConsistent | ReconcileStatus::Skipped => {}
        }

        // Person
        let person = self.resolve_person(&mut sheet, rosters, &mut log, &mut issues, &mut needs_review);

        // Projects
        let mut quality_issues = Vec::new();
        let mut quality_warnings = Vec::new();
        let mut project_resolutions = Vec::with_capacity(sheet.projects.len());
        for index in 0..sheet.projects.len() {
            let resolution = self.resolve_project(
                &mut sheet,
                index,
                rosters,
                &mut log,
                &mut issues,
                &mut needs_review,
            );
            quality_issues.extend(
                resolution
                    .quality
                    .issues
                    .iter()
                    .map(|issue| format!("{}: {}", resolution.raw_code, issue)),
            );
            quality_warnings.extend(
                resolution
                    .quality
                    .warnings
                    .iter()
                    .map(|warning| format!("{}: {}", resolution.raw_code, warning)),
            );
            project_resolutions.push(resolution);
        }

        // Similar codes
        for pair in find_similar_code_pairs(&sheet.projects, &self.config.matching) {
            quality_warnings.push(pair.describe());
        }

        // Validation
        let validation = self.validator.validate(&sheet);
        if !validation.valid {
            needs_review = true;
        }

        info!(
            resource = %sheet.resource_name,
            week = %sheet.week_start(),
            corrections = log.len(),
            issues = issues.len(),
            needs_review = needs_review,
            "Processed timesheet"
        );

        Ok(ProcessedTimesheet {
            timesheet: sheet,
            correction_log: log,
            resolution_report: ResolutionReport {
                person,
                projects: project_resolutions,
            },
            quality_issues,
            quality_warnings,
            issues,
            validation,
            reconciliation,
            needs_review,
        })
    }

    fn resolve_person(
        &self,
        sheet: &mut WeeklyTimesheet,
        rosters: &Rosters,
        log: &mut Vec<String>,
        issues: &mut Vec<Issue>,
        needs_review: &mut bool,
    ) -> PersonResolution {
        let raw_name = sheet.resource_name.clone();
        let result = self.people.resolve(&raw_name, &rosters.people);
        let decision = self.decide(&result);

        if decision == Decision::Accept {
            if result.canonical_value != raw_name {
                log.push(format!(
                    "Resolved person '{}' → '{}' ({}, {:.2})",
                    raw_name, result.canonical_value, result.match_kind, result.confidence
                ));
                sheet.resource_name = result.canonical_value.clone();
            }
        } else if rosters.people.is_empty() {
            debug!(name = %raw_name, "No team roster loaded; person left unresolved");
        } else {
            warn!(
                name = %raw_name,
                confidence = result.confidence,
                decision = decision.as_str(),
                "Person not resolved"
            );
            issues.push(Issue::new(
                IssueKind::UnknownIdentity,
                format!(
                    "Person '{}' not resolved (best confidence {:.2}, {})",
                    raw_name,
                    result.confidence,
                    decision.as_str()
                ),
            ));
            *needs_review = true;
        }

        PersonResolution {
            raw_name,
            result,
            decision,
        }
    }

    fn resolve_project(
        &self,
        sheet: &mut WeeklyTimesheet,
        index: usize,
        rosters: &Rosters,
        log: &mut Vec<String>,
        issues: &mut Vec<Issue>,
        needs_review: &mut bool,
    ) -> ProjectResolution {
        let roster = &rosters.projects;
        let raw_code = sheet.projects[index].project_code.clone();
        let raw_name = sheet.projects[index].project_name.clone();

        // Category label / alternative reference on the line: look in the name
        let recovered = self.projects.recover_code_from_name(&raw_code, &raw_name, roster);
        let from_name = recovered.is_some();
        let result = recovered.unwrap_or_else(|| self.projects.resolve_code(&raw_code, roster));
        let decision = if from_name {
            Decision::Accept
        } else {
            self.decide(&result)
        };
        let code_known = if roster.is_empty() {
            self.projects.grammar().is_valid(&result.canonical_value)
        } else {
            decision == Decision::Accept
        };

        if decision == Decision::Accept && result.canonical_value != raw_code {
            if from_name {
                log.push(format!(
                    "Recovered project code {} from name (extracted code was '{}')",
                    result.canonical_value, raw_code
                ));
            } else {
                log.push(format!(
                    "Resolved project code {} → {} ({}, {:.2})",
                    raw_code, result.canonical_value, result.match_kind, result.confidence
                ));
            }
            sheet.projects[index].project_code = result.canonical_value.clone();
        }

        if !code_known && !roster.is_empty() {
            issues.push(Issue::new(
                IssueKind::UnknownIdentity,
                format!(
                    "Project code '{}' not resolved (best confidence {:.2}, {})",
                    raw_code,
                    result.confidence,
                    decision.as_str()
                ),
            ));
            *needs_review = true;
        }

        // Quality judged on the line as it now stands
        let code = sheet.projects[index].project_code.clone();
        let quality = self.projects.analyze_quality(&code, &raw_name);
        for issue in &quality.issues {
            issues.push(Issue::new(IssueKind::FormatViolation, format!("{}: {}", code, issue)));
        }

        if code_known && !quality.format_correct {
            let fixed = fix_project_name_format(&raw_name, &code);
            log.push(format!("Fixed project name format for {}: '{}' → '{}'", code, raw_name, fixed));
            sheet.projects[index].project_name = fixed;
        } else if !code_known && !quality.issues.is_empty() {
            *needs_review = true;
        }

        ProjectResolution {
            line: index,
            raw_code,
            raw_name,
            result,
            decision,
            quality,
        }
    }
}

/// Process one timesheet with a fresh pipeline
pub fn process(raw: &RawTimesheet, rosters: &Rosters, config: &TomlConfig) -> Result<ProcessedTimesheet> {
    TimesheetPipeline::new(config.clone()).process(raw, rosters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsr_common::roster::CanonicalProject;
    use tsr_common::{PersonRoster, ProjectRoster};

    fn rosters() -> Rosters {
        Rosters::new(
            PersonRoster::from_members(["Neil Pomfret", "Barry Breden"]),
            ProjectRoster::from_projects([
                CanonicalProject::new("PJ024483", "ICT platform upgrade"),
                CanonicalProject::new("PJ024642", "Roaming Bar"),
            ]),
        )
    }

    fn raw(json: &str) -> RawTimesheet {
        RawTimesheet::from_json(json).unwrap()
    }

    #[test]
    fn test_full_pipeline_corrects_and_logs() {
        let sheet = raw(r#"{
            "resource_name": "Niel Pomfret",
            "date_range": "Sep 29 2025 - Oct 5 2025",
            "projects": [
                {"project_code": "PJ024483", "project_name": "ICT platform upgrade (PJ024483)",
                 "hours_by_day": [7.5, 5.0, 7.5, 7.5, 7.5, 0, 0]},
                {"project_code": "PJ024542", "project_name": "Roaming Bar",
                 "hours_by_day": [2.5, 0, 0, 0, 0, 0, 0]}
            ],
            "daily_totals": [7.5, 7.5, 7.5, 7.5, 7.5, 0, 0],
            "weekly_total": 37.5
        }"#);

        let out = process(&sheet, &rosters(), &TomlConfig::compiled_defaults()).unwrap();

        assert_eq!(out.timesheet.resource_name, "Neil Pomfret");
        assert_eq!(out.resolution_report.person.decision, Decision::Accept);
        assert_eq!(out.timesheet.projects[1].project_code, "PJ024642");
        assert_eq!(out.timesheet.projects[1].project_name, "Roaming Bar (PJ024642)");
        assert_eq!(out.timesheet.projects[1].hours[0], 0.0);
        assert_eq!(out.timesheet.projects[1].hours[1], 2.5);
        assert_eq!(out.reconciliation.status, ReconcileStatus::Corrected);
        assert!(out.validation.valid);
        assert!(!out.needs_review);

        let log = out.correction_log.join("\n");
        assert!(log.contains("PJ024542 → PJ024642"));
        assert!(log.contains("Moved 2.5h from Monday to Tuesday in PJ024642 [Strategy: Simple Move]"));
        assert!(log.contains("Resolved person 'Niel Pomfret' → 'Neil Pomfret'"));
        assert!(log.contains("Fixed project name format for PJ024642"));
        assert!(out
            .issues
            .iter()
            .any(|issue| issue.kind == IssueKind::FormatViolation));
    }

    #[test]
    fn test_unknown_person_kept_raw_and_flagged() {
        let sheet = raw(r#"{
            "resource_name": "Jonathan Mays",
            "date_range": "Sep 29 2025 - Oct 5 2025",
            "projects": [
                {"project_code": "PJ024483", "project_name": "ICT platform upgrade (PJ024483)",
                 "hours_by_day": [7.5, 7.5, 7.5, 7.5, 7.5, 0, 0]}
            ],
            "daily_totals": [7.5, 7.5, 7.5, 7.5, 7.5, 0, 0],
            "weekly_total": 37.5
        }"#);

        let out = process(&sheet, &rosters(), &TomlConfig::compiled_defaults()).unwrap();

        assert_eq!(out.timesheet.resource_name, "Jonathan Mays");
        assert_ne!(out.resolution_report.person.decision, Decision::Accept);
        assert!(out
            .issues
            .iter()
            .any(|issue| issue.kind == IssueKind::UnknownIdentity));
        assert!(out.needs_review);
        assert_eq!(out.reconciliation.status, ReconcileStatus::AlreadyConsistent);
    }

    #[test]
    fn test_category_label_recovered_from_name() {
        let sheet = raw(r#"{
            "resource_name": "Neil Pomfret",
            "date_range": "Sep 29 2025 - Oct 5 2025",
            "projects": [
                {"project_code": "DESIGN", "project_name": "ICT platform upgrade (PJ024483)",
                 "hours_by_day": [7.5, 7.5, 7.5, 7.5, 7.5, 0, 0]}
            ],
            "daily_totals": [7.5, 7.5, 7.5, 7.5, 7.5, 0, 0],
            "weekly_total": 37.5
        }"#);

        let out = process(&sheet, &rosters(), &TomlConfig::compiled_defaults()).unwrap();

        assert_eq!(out.timesheet.projects[0].project_code, "PJ024483");
        assert!(out
            .correction_log
            .iter()
            .any(|entry| entry.contains("Recovered project code PJ024483")));
        assert_eq!(out.resolution_report.projects[0].decision, Decision::Accept);
    }

    #[test]
    fn test_structure_violation_is_hard_failure() {
        let sheet = raw(r#"{
            "resource_name": "Neil Pomfret",
            "date_range": "Sep 29 2025 - Oct 5 2025",
            "projects": [
                {"project_code": "PJ024483", "project_name": "ICT (PJ024483)",
                 "hours_by_day": [7.5, 7.5, 7.5]}
            ],
            "daily_totals": [7.5, 7.5, 7.5, 0, 0, 0, 0],
            "weekly_total": 22.5
        }"#);

        let err = process(&sheet, &rosters(), &TomlConfig::compiled_defaults()).unwrap_err();
        assert!(matches!(err, tsr_common::Error::Structure(_)));
    }
}
