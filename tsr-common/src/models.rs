//! Timesheet data model
//!
//! Two shapes live here:
//! - [`RawTimesheet`]: what the table/vision extraction step hands over, with
//!   loosely typed cells (numbers, strings, `{ "hours": "7.5" }` objects).
//! - [`WeeklyTimesheet`]: the validated person-week grid that the field
//!   validator, reconciliation engine and resolvers operate on.

use crate::week::{parse_date_range, week_dates};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of day columns in a weekly grid (Monday..Sunday)
pub const DAYS_PER_WEEK: usize = 7;

/// Full weekday names, Monday first
pub const DAY_NAMES: [&str; DAYS_PER_WEEK] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Short weekday names, Monday first
pub const DAY_ABBREVIATIONS: [&str; DAYS_PER_WEEK] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Hours for one project or header row, Monday..Sunday
pub type WeekHours = [f64; DAYS_PER_WEEK];

/// Round to two decimal places (all hour values carry 2 fractional digits)
pub fn round_hours(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Slack below the tolerance so a decimal difference of exactly the
/// tolerance still counts as a mismatch after binary rounding
const TOLERANCE_SLACK: f64 = 1e-9;

/// True when `difference` is small enough to count as equal
pub fn within_tolerance(difference: f64, tolerance: f64) -> bool {
    difference.abs() < tolerance - TOLERANCE_SLACK
}

// ============================================================================
// Validated model
// ============================================================================

/// Calendar span of a timesheet: a Monday and the following Sunday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, enforcing exactly 7 consecutive days starting Monday
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        week_dates(start, end)?;
        Ok(Self { start, end })
    }

    /// Parse an extracted range string such as `"Sep 29 2025 - Oct 5 2025"`
    pub fn parse(range: &str) -> Result<Self> {
        let (start, end) = parse_date_range(range)?;
        Self::new(start, end)
    }

    /// The seven dates of the week
    pub fn dates(&self) -> [NaiveDate; DAYS_PER_WEEK] {
        // Invariant established in new()
        week_dates(self.start, self.end).unwrap_or([self.start; DAYS_PER_WEEK])
    }
}

/// One project row within a weekly timesheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectLine {
    pub project_code: String,
    pub project_name: String,
    pub hours: WeekHours,
}

impl ProjectLine {
    pub fn new(code: impl Into<String>, name: impl Into<String>, hours: WeekHours) -> Self {
        Self {
            project_code: code.into(),
            project_name: name.into(),
            hours,
        }
    }

    /// Total hours logged on this project for the week
    pub fn total(&self) -> f64 {
        self.hours.iter().sum()
    }
}

/// One person, one ISO week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTimesheet {
    /// Raw extracted person name (before identity resolution)
    pub resource_name: String,
    pub date_range: DateRange,
    /// Presence recorded with no billable hours (leave/absence)
    pub is_zero_hour: bool,
    pub projects: Vec<ProjectLine>,
    /// Header totals extracted independently of the project rows
    pub daily_totals: WeekHours,
    pub weekly_total: f64,
}

impl WeeklyTimesheet {
    /// Per-day sums of the project rows
    pub fn calculated_daily_totals(&self) -> WeekHours {
        let mut sums = [0.0; DAYS_PER_WEEK];
        for line in &self.projects {
            for (day, hours) in line.hours.iter().enumerate() {
                sums[day] += hours;
            }
        }
        sums
    }

    /// Sum of every project cell
    pub fn calculated_weekly_total(&self) -> f64 {
        self.calculated_daily_totals().iter().sum()
    }

    /// Sum of the header daily totals
    pub fn header_daily_sum(&self) -> f64 {
        self.daily_totals.iter().sum()
    }

    /// True when every day's body sum matches its header total
    /// and the header daily totals sum to the weekly total
    pub fn is_consistent(&self, tolerance: f64) -> bool {
        let days_ok = self
            .calculated_daily_totals()
            .iter()
            .zip(self.daily_totals.iter())
            .all(|(calculated, header)| within_tolerance(calculated - header, tolerance));

        days_ok && within_tolerance(self.header_daily_sum() - self.weekly_total, tolerance)
    }

    /// Week-commencing date (the Monday)
    pub fn week_start(&self) -> NaiveDate {
        self.date_range.start
    }
}

// ============================================================================
// Raw extraction model
// ============================================================================

/// One extracted hours value as it arrives from OCR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawHours {
    Number(f64),
    Text(String),
    /// `{ "hours": ... }` day object
    Cell { hours: Option<Box<RawHours>> },
    /// JSON `null`
    Missing,
}

impl RawHours {
    /// Textual form of the value, `None` when absent
    pub fn to_text(&self) -> Option<String> {
        match self {
            RawHours::Number(n) => Some(n.to_string()),
            RawHours::Text(s) => Some(s.clone()),
            RawHours::Cell { hours } => hours.as_ref().and_then(|inner| inner.to_text()),
            RawHours::Missing => None,
        }
    }
}

impl From<f64> for RawHours {
    fn from(value: f64) -> Self {
        RawHours::Number(value)
    }
}

impl From<&str> for RawHours {
    fn from(value: &str) -> Self {
        RawHours::Text(value.to_string())
    }
}

/// Project row as extracted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProjectLine {
    #[serde(default)]
    pub project_code: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(alias = "hours")]
    pub hours_by_day: Vec<RawHours>,
}

/// Timesheet as extracted, before any validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTimesheet {
    pub resource_name: String,
    pub date_range: String,
    #[serde(default, alias = "is_zero_hour")]
    pub is_zero_hour_timesheet: bool,
    #[serde(default)]
    pub projects: Vec<RawProjectLine>,
    #[serde(default)]
    pub daily_totals: Vec<RawHours>,
    #[serde(default = "missing_hours")]
    pub weekly_total: RawHours,
}

fn missing_hours() -> RawHours {
    RawHours::Missing
}

impl RawTimesheet {
    /// Parse extractor output, tolerating a surrounding markdown code fence
    pub fn from_json(text: &str) -> Result<Self> {
        let body = strip_code_fence(text);
        Ok(serde_json::from_str(body)?)
    }

    /// Check the structural contract and return the validated date range
    ///
    /// # Errors
    /// `Error::Structure` when a project has other than 7 day cells, the header
    /// has other than 7 daily totals (non-zero-hour sheets), or the date range
    /// is not Monday..Sunday.
    pub fn check_structure(&self) -> Result<DateRange> {
        let range = DateRange::parse(&self.date_range)?;

        for (index, line) in self.projects.iter().enumerate() {
            if line.hours_by_day.len() != DAYS_PER_WEEK {
                return Err(Error::Structure(format!(
                    "Project {} ('{}') has {} day cells, expected {}",
                    index + 1,
                    line.project_code,
                    line.hours_by_day.len(),
                    DAYS_PER_WEEK
                )));
            }
        }

        let totals_ok = self.daily_totals.len() == DAYS_PER_WEEK
            || (self.is_zero_hour_timesheet && self.daily_totals.is_empty());
        if !totals_ok {
            return Err(Error::Structure(format!(
                "Header has {} daily totals, expected {}",
                self.daily_totals.len(),
                DAYS_PER_WEEK
            )));
        }

        Ok(range)
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    let after_open = &trimmed[open + 3..];
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raw_json() -> &'static str {
        r#"{
            "resource_name": "Neil Pomfret",
            "date_range": "Sep 29 2025 - Oct 5 2025",
            "projects": [
                {
                    "project_code": "PJ024483",
                    "project_name": "ICT platform upgrade (PJ024483)",
                    "hours_by_day": [{"hours": "7.5"}, 7.5, "7,5", {"hours": null}, "", 0, null]
                }
            ],
            "daily_totals": [7.5, 7.5, 7.5, 0, 0, 0, 0],
            "weekly_total": 22.5
        }"#
    }

    #[test]
    fn test_raw_timesheet_accepts_mixed_cells() {
        let raw = RawTimesheet::from_json(sample_raw_json()).unwrap();
        let cells = &raw.projects[0].hours_by_day;
        assert_eq!(cells.len(), 7);
        assert_eq!(cells[0].to_text().as_deref(), Some("7.5"));
        assert_eq!(cells[1].to_text().as_deref(), Some("7.5"));
        assert_eq!(cells[2].to_text().as_deref(), Some("7,5"));
        assert_eq!(cells[3].to_text(), None);
        assert_eq!(cells[6].to_text(), None);
        assert!(raw.check_structure().is_ok());
    }

    #[test]
    fn test_raw_timesheet_strips_code_fence() {
        let fenced = format!("```json\n{}\n```", sample_raw_json());
        let raw = RawTimesheet::from_json(&fenced).unwrap();
        assert_eq!(raw.resource_name, "Neil Pomfret");
    }

    #[test]
    fn test_check_structure_rejects_short_hours_row() {
        let mut raw = RawTimesheet::from_json(sample_raw_json()).unwrap();
        raw.projects[0].hours_by_day.pop();
        let err = raw.check_structure().unwrap_err();
        assert!(matches!(err, Error::Structure(_)));
        assert!(err.to_string().contains("6 day cells"));
    }

    #[test]
    fn test_check_structure_rejects_eight_day_week() {
        let mut raw = RawTimesheet::from_json(sample_raw_json()).unwrap();
        raw.date_range = "Sep 29 2025 - Oct 6 2025".to_string();
        assert!(matches!(raw.check_structure(), Err(Error::Structure(_))));
    }

    #[test]
    fn test_weekly_timesheet_consistency() {
        let range = DateRange::parse("Sep 29 2025 - Oct 5 2025").unwrap();
        let mut sheet = WeeklyTimesheet {
            resource_name: "Test".to_string(),
            date_range: range,
            is_zero_hour: false,
            projects: vec![
                ProjectLine::new("PJ000001", "A (PJ000001)", [4.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                ProjectLine::new("PJ000002", "B (PJ000002)", [3.5, 7.5, 0.0, 0.0, 0.0, 0.0, 0.0]),
            ],
            daily_totals: [7.5, 7.5, 0.0, 0.0, 0.0, 0.0, 0.0],
            weekly_total: 15.0,
        };
        assert_eq!(sheet.calculated_daily_totals()[0], 7.5);
        assert!(sheet.is_consistent(0.01));

        sheet.weekly_total = 16.0;
        assert!(!sheet.is_consistent(0.01));
    }

    #[test]
    fn test_consistency_uses_shared_tolerance() {
        assert!(within_tolerance(0.009, 0.01));
        assert!(!within_tolerance(0.011, 0.01));
        assert!(!within_tolerance(7.51 - 7.5, 0.01));

        let sheet = WeeklyTimesheet {
            resource_name: "Test".to_string(),
            date_range: DateRange::parse("Sep 29 2025 - Oct 5 2025").unwrap(),
            is_zero_hour: false,
            projects: vec![ProjectLine::new("PJ000001", "A (PJ000001)", [7.51, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])],
            daily_totals: [7.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            weekly_total: 7.5,
        };
        assert!(!sheet.is_consistent(0.01));
    }

    #[test]
    fn test_round_hours() {
        assert_eq!(round_hours(7.499999), 7.5);
        assert_eq!(round_hours(3.14159), 3.14);
    }
}
