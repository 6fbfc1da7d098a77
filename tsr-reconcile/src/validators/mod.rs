//! Whole-timesheet validation

pub mod timesheet_validator;

pub use timesheet_validator::{TimesheetValidator, ValidationReport, ValidationStatus};
