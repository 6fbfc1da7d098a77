//! Grid reconciliation: snapshot, strategies and the engine that orders them

pub mod engine;
pub mod grid;
pub mod strategies;

pub use engine::{ReconcileStatus, Reconciliation, ReconciliationEngine};
pub use grid::{within_tolerance, DayMismatch, GridSnapshot, MismatchAnalysis, ProposedEdit};
pub use strategies::{HypothesisBudget, Strategy};
