//! Coverage tracking
//!
//! Consumes reconciled, identity-resolved timesheets and answers, per
//! canonical person and week-commencing Monday, whether a timesheet was
//! submitted, submitted as zero-hour (leave/absence), or is missing.
//! Reporting periods are Clarity months (16th..15th).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tsr_common::week::{week_commencing, ClarityMonth};

/// Presence of one person in one week
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Missing,
    ZeroHour,
    Submitted,
}

/// One processed timesheet as seen by coverage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRecord {
    /// Canonical person name
    pub person: String,
    /// Any date in the timesheet week (normally the Monday)
    pub week_start: NaiveDate,
    #[serde(default)]
    pub is_zero_hour: bool,
}

/// Per-person presence across a set of weeks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageRow {
    pub person: String,
    pub cells: Vec<Presence>,
    pub submitted: usize,
    pub zero_hour: usize,
    pub missing: usize,
}

/// People × weeks presence grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageGrid {
    pub weeks: Vec<NaiveDate>,
    pub rows: Vec<CoverageRow>,
}

impl CoverageGrid {
    /// (person, week) pairs with no submission
    pub fn missing(&self) -> Vec<(&str, NaiveDate)> {
        self.rows
            .iter()
            .flat_map(|row| {
                row.cells
                    .iter()
                    .zip(&self.weeks)
                    .filter(|(presence, _)| **presence == Presence::Missing)
                    .map(move |(_, week)| (row.person.as_str(), *week))
            })
            .collect()
    }
}

/// In-memory coverage index keyed by (person, week-commencing Monday)
#[derive(Debug, Clone, Default)]
pub struct CoverageTracker {
    entries: BTreeMap<(String, NaiveDate), Presence>,
}

impl CoverageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one timesheet; a regular submission outranks a zero-hour one
    pub fn record(&mut self, person: &str, date: NaiveDate, is_zero_hour: bool) {
        let week = week_commencing(date);
        let presence = if is_zero_hour {
            Presence::ZeroHour
        } else {
            Presence::Submitted
        };

        let entry = self
            .entries
            .entry((person.trim().to_string(), week))
            .or_insert(Presence::Missing);
        *entry = (*entry).max(presence);
    }

    pub fn record_all<'a>(&mut self, records: impl IntoIterator<Item = &'a CoverageRecord>) {
        for record in records {
            self.record(&record.person, record.week_start, record.is_zero_hour);
        }
    }

    pub fn presence(&self, person: &str, week: NaiveDate) -> Presence {
        self.entries
            .get(&(person.to_string(), week_commencing(week)))
            .copied()
            .unwrap_or(Presence::Missing)
    }

    /// Weeks in `month` with any record for `person`
    pub fn weeks_recorded(&self, person: &str, month: ClarityMonth) -> Vec<NaiveDate> {
        month
            .weeks()
            .into_iter()
            .filter(|week| self.presence(person, *week) != Presence::Missing)
            .collect()
    }

    /// Presence grid for the given people and weeks, in the given order
    pub fn grid<S: AsRef<str>>(&self, people: &[S], weeks: &[NaiveDate]) -> CoverageGrid {
        let rows = people
            .iter()
            .map(|person| {
                let person = person.as_ref();
                let cells: Vec<Presence> = weeks.iter().map(|week| self.presence(person, *week)).collect();
                let count = |p: Presence| cells.iter().filter(|c| **c == p).count();
                CoverageRow {
                    person: person.to_string(),
                    submitted: count(Presence::Submitted),
                    zero_hour: count(Presence::ZeroHour),
                    missing: count(Presence::Missing),
                    cells,
                }
            })
            .collect();

        CoverageGrid {
            weeks: weeks.to_vec(),
            rows,
        }
    }

    /// Presence grid for every week of a Clarity month
    pub fn month_grid<S: AsRef<str>>(&self, people: &[S], month: ClarityMonth) -> CoverageGrid {
        self.grid(people, &month.weeks())
    }
}
