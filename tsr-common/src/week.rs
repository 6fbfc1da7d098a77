//! Week and reporting-period helpers
//!
//! Timesheets cover one ISO week (Monday..Sunday). Coverage reporting groups
//! weeks into Clarity months, which run from the 16th of one calendar month to
//! the 15th of the next.

use crate::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Date formats accepted on either side of an extracted date range
const RANGE_DATE_FORMATS: [&str; 3] = ["%b %d %Y", "%d %b %Y", "%Y-%m-%d"];

/// Separators tried when splitting an extracted date range, in order
const RANGE_SEPARATORS: [&str; 3] = [" - ", " – ", " to "];

/// Parse an extracted date range such as `"Sep 29 2025 - Oct 5 2025"`
///
/// Both sides may use `Mon DD YYYY`, `DD Mon YYYY` or ISO `YYYY-MM-DD`.
pub fn parse_date_range(range: &str) -> Result<(NaiveDate, NaiveDate)> {
    let trimmed = range.trim();

    let (start, end) = RANGE_SEPARATORS
        .iter()
        .find_map(|sep| trimmed.split_once(sep))
        .ok_or_else(|| Error::Structure(format!("Invalid date range format: '{}'", range)))?;

    Ok((parse_range_date(start)?, parse_range_date(end)?))
}

fn parse_range_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    RANGE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .ok_or_else(|| Error::Structure(format!("Cannot parse date '{}'", value)))
}

/// Expand a (Monday, Sunday) pair into the seven dates of the week
///
/// # Errors
/// `Error::Structure` if the range is not exactly 7 consecutive days starting on a Monday.
pub fn week_dates(start: NaiveDate, end: NaiveDate) -> Result<[NaiveDate; 7]> {
    let span = (end - start).num_days() + 1;
    if span != 7 {
        return Err(Error::Structure(format!(
            "Date range must be exactly 7 days (Mon-Sun), got {} days",
            span
        )));
    }

    if start.weekday() != Weekday::Mon {
        return Err(Error::Structure(format!(
            "Week must start on Monday, but starts on {}",
            start.format("%A")
        )));
    }

    let mut dates = [start; 7];
    for (offset, slot) in dates.iter_mut().enumerate() {
        *slot = start + Duration::days(offset as i64);
    }
    Ok(dates)
}

/// Monday of the week containing `date`
pub fn week_commencing(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Organisation reporting period: 16th of `month` through the 15th of the next month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClarityMonth {
    pub year: i32,
    pub month: u32,
}

impl ClarityMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidInput(format!("Month out of range: {}", month)));
        }
        Ok(Self { year, month })
    }

    /// First day of the period (the 16th)
    pub fn start(&self) -> NaiveDate {
        // month validated in new()/from_str(); day 16 exists in every month
        NaiveDate::from_ymd_opt(self.year, self.month, 16).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the period (the 15th of the following month)
    pub fn end(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 15).unwrap_or(NaiveDate::MAX)
    }

    /// Week-commencing Mondays whose Monday falls inside the period
    pub fn weeks(&self) -> Vec<NaiveDate> {
        mondays_in_period(self.start(), self.end())
    }
}

impl fmt::Display for ClarityMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for ClarityMonth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| Error::InvalidInput(format!("Expected YYYY-MM, got '{}'", s)))?;
        let year = year
            .parse::<i32>()
            .map_err(|e| Error::InvalidInput(format!("Invalid year '{}': {}", year, e)))?;
        let month = month
            .parse::<u32>()
            .map_err(|e| Error::InvalidInput(format!("Invalid month '{}': {}", month, e)))?;
        ClarityMonth::new(year, month)
    }
}

/// Clarity month containing `date`
///
/// Days 1..=15 belong to the previous month's period.
pub fn clarity_month(date: NaiveDate) -> ClarityMonth {
    if date.day() <= 15 {
        let previous = date - Duration::days(date.day() as i64);
        ClarityMonth {
            year: previous.year(),
            month: previous.month(),
        }
    } else {
        ClarityMonth {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// Start and end dates of the Clarity month `year-month`
pub fn clarity_period(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let period = ClarityMonth::new(year, month)?;
    Ok((period.start(), period.end()))
}

/// All Mondays in `[start, end]`, beginning with the first Monday on or after `start`
pub fn mondays_in_period(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let offset = (7 - start.weekday().num_days_from_monday()) % 7;
    let mut current = start + Duration::days(offset as i64);

    let mut weeks = Vec::new();
    while current <= end {
        weeks.push(current);
        current += Duration::days(7);
    }
    weeks
}
