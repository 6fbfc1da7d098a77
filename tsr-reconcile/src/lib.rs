//! # TSR Reconcile
//!
//! Turns OCR-extracted weekly timesheets into trustworthy records:
//! - Field validation with OCR-aware hours and code correction
//! - Grid reconciliation (project rows vs header totals)
//! - Person and project identity resolution against curated rosters
//! - Project name-format quality checks
//! - Whole-timesheet validation and per-week coverage tracking

pub mod coverage;
pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod services;
pub mod similarity;
pub mod types;
pub mod validators;

pub use coverage::{CoverageTracker, Presence};
pub use error::FieldError;
pub use pipeline::{process, ProcessedTimesheet, TimesheetPipeline};
pub use reconcile::{ReconcileStatus, Reconciliation, ReconciliationEngine};
pub use types::{Decision, Issue, IssueKind, MatchKind, MatchResult, QualityReport};
