//! Bank holiday enforcement
//!
//! Nobody books time on a bank holiday; hours the extraction put there are
//! misplaced. Those cells are cleared before reconciliation so the engine
//! works on the real working days.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tsr_common::config::BankHoliday;
use tsr_common::models::{round_hours, DAY_NAMES};
use tsr_common::WeeklyTimesheet;

/// Configured bank holiday calendar
#[derive(Debug, Clone, Default)]
pub struct BankHolidayCalendar {
    holidays: BTreeMap<NaiveDate, String>,
}

impl BankHolidayCalendar {
    pub fn new(holidays: &[BankHoliday]) -> Self {
        Self {
            holidays: holidays.iter().map(|h| (h.date, h.name.clone())).collect(),
        }
    }

    pub fn is_bank_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains_key(&date)
    }

    pub fn holiday_name(&self, date: NaiveDate) -> Option<&str> {
        self.holidays.get(&date).map(String::as_str)
    }

    /// (day index, date, name) for every bank holiday in the timesheet's week
    pub fn holidays_in_week(&self, sheet: &WeeklyTimesheet) -> Vec<(usize, NaiveDate, &str)> {
        sheet
            .date_range
            .dates()
            .into_iter()
            .enumerate()
            .filter_map(|(day, date)| self.holiday_name(date).map(|name| (day, date, name)))
            .collect()
    }

    /// Zero every bank-holiday column (header and project cells) and
    /// recompute the weekly total from the daily totals
    ///
    /// Returns one log line per change. Zero-hour timesheets are left alone.
    pub fn enforce(&self, sheet: &mut WeeklyTimesheet) -> Vec<String> {
        if sheet.is_zero_hour {
            return Vec::new();
        }

        let mut log = Vec::new();
        let mut changed = false;

        for (day, date, name) in self.holidays_in_week(sheet) {
            let day_name = DAY_NAMES[day];

            if sheet.daily_totals[day] != 0.0 {
                log.push(format!(
                    "Bank holiday {} ({} {}): cleared header total {}",
                    name, day_name, date, sheet.daily_totals[day]
                ));
                sheet.daily_totals[day] = 0.0;
                changed = true;
            }

            for line in sheet.projects.iter_mut() {
                if line.hours[day] != 0.0 {
                    log.push(format!(
                        "Bank holiday {} ({} {}): cleared {}h from {}",
                        name, day_name, date, line.hours[day], line.project_code
                    ));
                    line.hours[day] = 0.0;
                    changed = true;
                }
            }
        }

        if changed {
            let recomputed = round_hours(sheet.header_daily_sum());
            if (recomputed - sheet.weekly_total).abs() > f64::EPSILON {
                log.push(format!(
                    "Weekly total recomputed after bank holiday: {} → {}",
                    sheet.weekly_total, recomputed
                ));
                sheet.weekly_total = recomputed;
            }
            tracing::info!(
                resource = %sheet.resource_name,
                changes = log.len(),
                "Cleared bank holiday hours"
            );
        }

        log
    }
}
