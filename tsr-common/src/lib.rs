//! # TSR Common Library
//!
//! Shared code for the timesheet reconciliation workspace including:
//! - Timesheet data model (raw extraction and validated grid)
//! - Reference rosters (people and projects) with alias administration
//! - Configuration loading
//! - Week and Clarity-month calendar helpers

pub mod config;
pub mod error;
pub mod models;
pub mod roster;
pub mod week;

pub use error::{Error, Result};
pub use models::{ProjectLine, WeeklyTimesheet, DAYS_PER_WEEK};
pub use roster::{PersonRoster, ProjectRoster, Rosters};
