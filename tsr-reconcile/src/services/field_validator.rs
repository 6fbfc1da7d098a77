//! Field Validator
//!
//! Per-cell auto-correction run before grid reconciliation.
//!
//! # Hours
//! - Comma decimal and letter O are normalized (`7,5` → 7.5, `O` → 0)
//! - Missing decimal point: a multiple of 5 in 70..=85 is divided by 10
//! - Double entry: exact values from the configured table (15 → 7.5, 16 → 8)
//! - Rounded to 2 decimal places; negative or > 24 is a range error
//!
//! # Project codes
//! Uppercased; for the 2-letter + 6-character shape, letters in the numeric
//! suffix are mapped to the digits OCR confuses them with. Category labels,
//! alternative references and letters-only tokens are `UNKNOWN_CODE`. Anything
//! else is checked against the roster: exact, single substitution, adjacent
//! transposition, otherwise `UNKNOWN_CODE`.

use crate::error::FieldError;
use crate::services::project_resolver::CodeGrammar;
use crate::similarity::{is_adjacent_transposition, is_single_substitution};
use crate::types::{Issue, IssueKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tsr_common::config::{HourCorrection, HoursSettings, TomlConfig};
use tsr_common::models::{round_hours, DateRange, RawHours, RawTimesheet, DAY_NAMES, WeekHours};
use tsr_common::{ProjectLine, ProjectRoster, WeeklyTimesheet, DAYS_PER_WEEK};

static CODE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]{2})([A-Z0-9]{6})$").expect("code shape pattern is valid"));

/// Floating point slack when matching exact configured hour values
const EXACT_EPSILON: f64 = 1e-9;

/// Which heuristic changed an hours value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoursCorrection {
    MissingDecimal,
    DoubleEntry,
}

impl HoursCorrection {
    fn describe(&self) -> &'static str {
        match self {
            HoursCorrection::MissingDecimal => "missing decimal",
            HoursCorrection::DoubleEntry => "double entry",
        }
    }
}

/// Accepted hours value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedHours {
    pub value: f64,
    pub correction: Option<HoursCorrection>,
}

/// Result classification of a code check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CodeOutcome {
    /// Known code (or no roster to check against)
    Valid,
    /// Suffix letters mapped or a single-character roster correction applied
    AutoCorrected,
    /// Adjacent-transposition roster correction applied
    Transposed,
    /// Not in the roster, or a category label, alternative reference or
    /// letters-only token
    UnknownCode,
    Empty,
}

/// Validated project code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeCheck {
    pub code: String,
    pub outcome: CodeOutcome,
}

/// Timesheet after per-field validation
#[derive(Debug, Clone)]
pub struct FieldValidation {
    pub timesheet: WeeklyTimesheet,
    pub corrections: Vec<String>,
    pub issues: Vec<Issue>,
    /// A field was rejected as impossible
    pub needs_review: bool,
}

/// Field Validator
pub struct FieldValidator {
    hours: HoursSettings,
    suffix_digits: BTreeMap<char, char>,
    grammar: CodeGrammar,
}

impl Default for FieldValidator {
    fn default() -> Self {
        Self::from_config(&TomlConfig::default())
    }
}

impl FieldValidator {
    pub fn from_config(config: &TomlConfig) -> Self {
        let suffix_digits = config
            .codes
            .suffix_letter_digits
            .iter()
            .filter_map(|(letter, digit)| {
                let letter = letter.chars().next()?.to_ascii_uppercase();
                let digit = digit.chars().next()?;
                Some((letter, digit))
            })
            .collect();

        Self {
            hours: config.hours.clone(),
            suffix_digits,
            grammar: CodeGrammar::from_settings(&config.codes),
        }
    }

    /// Validate and auto-correct one hours cell
    ///
    /// Blank cells (absent, empty, `-`) are zero.
    ///
    /// # Errors
    /// `FieldError::Parse` when the text is not a number after normalization,
    /// `FieldError::Range` for negative values or more than the daily maximum.
    pub fn validate_hours(&self, raw: Option<&str>) -> Result<ValidatedHours, FieldError> {
        let mut hours = match parse_number(raw) {
            Ok(value) => value,
            Err(FieldError::Empty) => {
                return Ok(ValidatedHours {
                    value: 0.0,
                    correction: None,
                })
            }
            Err(e) => return Err(e),
        };
        let mut correction = None;

        if self.is_missing_decimal(hours) {
            hours /= 10.0;
            correction = Some(HoursCorrection::MissingDecimal);
        }

        if let Some(entry) = self.double_entry(hours) {
            hours = entry.to;
            correction = Some(HoursCorrection::DoubleEntry);
        }

        let hours = round_hours(hours);

        if hours < 0.0 {
            return Err(FieldError::Range {
                value: hours,
                reason: "negative hours".to_string(),
            });
        }
        if hours > self.hours.max_daily_hours {
            return Err(FieldError::Range {
                value: hours,
                reason: format!("more than {} hours in one day", self.hours.max_daily_hours),
            });
        }

        Ok(ValidatedHours {
            value: hours,
            correction,
        })
    }

    fn is_missing_decimal(&self, hours: f64) -> bool {
        let settings = &self.hours;
        if hours < settings.missing_decimal_min || hours > settings.missing_decimal_max {
            return false;
        }
        let remainder = hours % settings.missing_decimal_step;
        remainder.abs() < EXACT_EPSILON
    }

    fn double_entry(&self, hours: f64) -> Option<HourCorrection> {
        self.hours
            .double_entry
            .iter()
            .find(|entry| (entry.from - hours).abs() < EXACT_EPSILON)
            .copied()
    }

    /// Validate and auto-correct one project code
    pub fn validate_project_code(&self, raw: &str, roster: &ProjectRoster) -> CodeCheck {
        let original = raw.trim().to_uppercase();
        if original.is_empty() {
            return CodeCheck {
                code: original,
                outcome: CodeOutcome::Empty,
            };
        }

        let code = self.correct_suffix(&original);
        let suffix_changed = code != original;

        if self.grammar.is_rejected(&code) {
            return CodeCheck {
                code,
                outcome: CodeOutcome::UnknownCode,
            };
        }

        if roster.is_empty() {
            let outcome = if suffix_changed {
                CodeOutcome::AutoCorrected
            } else {
                CodeOutcome::Valid
            };
            return CodeCheck { code, outcome };
        }

        if roster.get(&code).is_some() {
            let outcome = if suffix_changed {
                CodeOutcome::AutoCorrected
            } else {
                CodeOutcome::Valid
            };
            return CodeCheck { code, outcome };
        }

        if let Some(known) = self.targets(roster).find(|known| is_single_substitution(&code, known)) {
            return CodeCheck {
                code: known.to_string(),
                outcome: CodeOutcome::AutoCorrected,
            };
        }

        if let Some(known) = self.targets(roster).find(|known| is_adjacent_transposition(&code, known)) {
            return CodeCheck {
                code: known.to_string(),
                outcome: CodeOutcome::Transposed,
            };
        }

        CodeCheck {
            code,
            outcome: CodeOutcome::UnknownCode,
        }
    }

    /// Roster codes a correction may land on
    fn targets<'r>(&'r self, roster: &'r ProjectRoster) -> impl Iterator<Item = &'r str> + 'r {
        roster.codes().filter(move |known| !self.grammar.is_rejected(known))
    }

    /// Map confusable letters in the numeric suffix of `AA999999`-shaped codes
    fn correct_suffix(&self, code: &str) -> String {
        let Some(caps) = CODE_SHAPE.captures(code) else {
            return code.to_string();
        };
        let (Some(prefix), Some(suffix)) = (caps.get(1), caps.get(2)) else {
            return code.to_string();
        };

        let mapped: Option<String> = suffix
            .as_str()
            .chars()
            .map(|c| {
                if c.is_ascii_digit() {
                    Some(c)
                } else {
                    self.suffix_digits.get(&c).copied()
                }
            })
            .collect();

        match mapped {
            Some(digits) => format!("{}{}", prefix.as_str(), digits),
            // a letter with no digit counterpart: not a numeric suffix
            None => code.to_string(),
        }
    }

    /// Convert a structurally checked raw extraction into a validated grid
    ///
    /// Every cell is run through [`validate_hours`](Self::validate_hours) and
    /// every code through [`validate_project_code`](Self::validate_project_code).
    /// Rejected cells become 0 and are reported; nothing here fails.
    pub fn validate_timesheet(&self, raw: &RawTimesheet, range: DateRange, roster: &ProjectRoster) -> FieldValidation {
        let mut corrections = Vec::new();
        let mut issues = Vec::new();
        let mut needs_review = false;

        let mut projects = Vec::with_capacity(raw.projects.len());
        for line in &raw.projects {
            let check = self.validate_project_code(&line.project_code, roster);
            match check.outcome {
                CodeOutcome::AutoCorrected | CodeOutcome::Transposed if check.code != line.project_code.trim() => {
                    corrections.push(format!(
                        "Corrected project code {} → {} ({})",
                        line.project_code.trim(),
                        check.code,
                        if check.outcome == CodeOutcome::Transposed {
                            "transposition"
                        } else {
                            "OCR character confusion"
                        }
                    ));
                }
                CodeOutcome::UnknownCode => {
                    tracing::warn!(code = %check.code, "Unknown project code");
                }
                _ => {}
            }

            let mut hours: WeekHours = [0.0; DAYS_PER_WEEK];
            for (day, cell) in line.hours_by_day.iter().take(DAYS_PER_WEEK).enumerate() {
                let text = cell.to_text();
                match self.validate_hours(text.as_deref()) {
                    Ok(validated) => {
                        hours[day] = validated.value;
                        if let Some(kind) = validated.correction {
                            corrections.push(format!(
                                "Corrected {} hours for {}: {} → {} ({})",
                                DAY_NAMES[day],
                                check.code,
                                text.as_deref().unwrap_or("").trim(),
                                validated.value,
                                kind.describe()
                            ));
                        }
                    }
                    Err(e) => {
                        let kind = match e {
                            FieldError::Range { .. } => {
                                needs_review = true;
                                IssueKind::Range
                            }
                            _ => IssueKind::Parse,
                        };
                        tracing::warn!(code = %check.code, day = DAY_NAMES[day], error = %e, "Rejected hours cell");
                        issues.push(Issue::new(
                            kind,
                            format!("{} hours for {}: {} (set to 0)", DAY_NAMES[day], check.code, e),
                        ));
                    }
                }
            }

            projects.push(ProjectLine::new(check.code, line.project_name.trim(), hours));
        }

        let mut daily_totals: WeekHours = [0.0; DAYS_PER_WEEK];
        for (day, cell) in raw.daily_totals.iter().take(DAYS_PER_WEEK).enumerate() {
            match parse_total(cell) {
                Ok(value) => daily_totals[day] = value,
                Err(e) => {
                    needs_review |= matches!(e, FieldError::Range { .. });
                    issues.push(Issue::new(
                        issue_kind(&e),
                        format!("{} header total: {} (set to 0)", DAY_NAMES[day], e),
                    ));
                }
            }
        }

        let daily_sum = round_hours(daily_totals.iter().sum());
        let weekly_total = match parse_total(&raw.weekly_total) {
            Ok(value) => value,
            Err(FieldError::Empty) => {
                if daily_sum > 0.0 {
                    corrections.push(format!(
                        "Weekly total missing; using sum of daily totals ({})",
                        daily_sum
                    ));
                }
                daily_sum
            }
            Err(e) => {
                needs_review |= matches!(e, FieldError::Range { .. });
                issues.push(Issue::new(
                    issue_kind(&e),
                    format!("Weekly header total: {} (using sum of daily totals)", e),
                ));
                daily_sum
            }
        };

        let timesheet = WeeklyTimesheet {
            resource_name: raw.resource_name.trim().to_string(),
            date_range: range,
            is_zero_hour: raw.is_zero_hour_timesheet,
            projects,
            daily_totals,
            weekly_total,
        };

        FieldValidation {
            timesheet,
            corrections,
            issues,
            needs_review,
        }
    }
}

fn issue_kind(error: &FieldError) -> IssueKind {
    match error {
        FieldError::Range { .. } => IssueKind::Range,
        _ => IssueKind::Parse,
    }
}

/// Normalize and parse a numeric cell
fn parse_number(raw: Option<&str>) -> Result<f64, FieldError> {
    let text = raw.map(str::trim).unwrap_or("");
    if text.is_empty() || text == "-" {
        return Err(FieldError::Empty);
    }

    let normalized: String = text
        .chars()
        .map(|c| match c {
            ',' => '.',
            'O' | 'o' => '0',
            other => other,
        })
        .collect();

    let value = normalized.parse::<f64>().map_err(|e| FieldError::Parse {
        raw: text.to_string(),
        reason: e.to_string(),
    })?;

    if !value.is_finite() {
        return Err(FieldError::Parse {
            raw: text.to_string(),
            reason: "not a finite number".to_string(),
        });
    }
    Ok(value)
}

/// Header totals: normalized and rounded, no single-cell heuristics
fn parse_total(raw: &RawHours) -> Result<f64, FieldError> {
    let value = round_hours(parse_number(raw.to_text().as_deref())?);
    if value < 0.0 {
        return Err(FieldError::Range {
            value,
            reason: "negative total".to_string(),
        });
    }
    Ok(value)
}
