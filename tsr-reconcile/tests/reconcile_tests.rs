//! Grid reconciliation behaviour through the public engine API

use tsr_common::models::DateRange;
use tsr_common::{ProjectLine, WeeklyTimesheet};
use tsr_reconcile::reconcile::{ReconcileStatus, ReconciliationEngine, Strategy};

fn sheet(projects: Vec<ProjectLine>, daily: [f64; 7]) -> WeeklyTimesheet {
    WeeklyTimesheet {
        resource_name: "Neil Pomfret".to_string(),
        date_range: DateRange::parse("Sep 29 2025 - Oct 5 2025").unwrap(),
        is_zero_hour: false,
        projects,
        weekly_total: daily.iter().sum(),
        daily_totals: daily,
    }
}

#[test]
fn test_consistent_grid_is_untouched() {
    let original = sheet(
        vec![ProjectLine::new("PJ024483", "ICT (PJ024483)", [7.5, 7.5, 7.5, 7.5, 7.5, 0.0, 0.0])],
        [7.5, 7.5, 7.5, 7.5, 7.5, 0.0, 0.0],
    );
    let mut working = original.clone();

    let outcome = ReconciliationEngine::default().reconcile(&mut working);

    assert_eq!(outcome.status, ReconcileStatus::AlreadyConsistent);
    assert_eq!(outcome.explanation, "No correction needed");
    assert_eq!(working, original);
}

#[test]
fn test_reconcile_is_idempotent() {
    let mut working = sheet(
        vec![
            ProjectLine::new("PJ024483", "ICT (PJ024483)", [7.5, 5.0, 7.5, 7.5, 7.5, 0.0, 0.0]),
            ProjectLine::new("PJ024642", "Roaming Bar (PJ024642)", [2.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
        ],
        [7.5, 7.5, 7.5, 7.5, 7.5, 0.0, 0.0],
    );
    let engine = ReconciliationEngine::default();

    let first = engine.reconcile(&mut working);
    assert_eq!(first.status, ReconcileStatus::Corrected);
    let after_first = working.clone();

    let second = engine.reconcile(&mut working);
    assert_eq!(second.status, ReconcileStatus::AlreadyConsistent);
    assert_eq!(working, after_first);
}

#[test]
fn test_tolerance_boundary() {
    let engine = ReconciliationEngine::default();

    let mut inside = sheet(
        vec![ProjectLine::new("PJ024483", "ICT (PJ024483)", [7.509, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])],
        [7.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    );
    assert_eq!(engine.reconcile(&mut inside).status, ReconcileStatus::AlreadyConsistent);

    let mut outside = sheet(
        vec![ProjectLine::new("PJ024483", "ICT (PJ024483)", [7.511, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])],
        [7.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    );
    assert_ne!(engine.reconcile(&mut outside).status, ReconcileStatus::AlreadyConsistent);
}

#[test]
fn test_simple_move_within_project() {
    let mut working = sheet(
        vec![
            ProjectLine::new("PJ024483", "ICT (PJ024483)", [7.5, 5.0, 7.5, 7.5, 7.5, 0.0, 0.0]),
            ProjectLine::new("PJ024642", "Roaming Bar (PJ024642)", [2.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
        ],
        [7.5, 7.5, 7.5, 7.5, 7.5, 0.0, 0.0],
    );

    let outcome = ReconciliationEngine::default().reconcile(&mut working);

    assert!(outcome.success);
    assert_eq!(outcome.strategy, Some(Strategy::SimpleMove));
    assert!(outcome.explanation.contains("Monday"));
    assert!(outcome.explanation.contains("Tuesday"));
    assert!(outcome.explanation.contains("PJ024642"));
    assert!(outcome.explanation.ends_with("[Strategy: Simple Move]"));
    assert_eq!(working.projects[1].hours[0], 0.0);
    assert_eq!(working.projects[1].hours[1], 2.5);
    assert!(working.is_consistent(0.01));
}

#[test]
fn test_cross_project_swap() {
    // PJ024642's Monday hours belong to PJ024483's Tuesday
    let mut working = sheet(
        vec![
            ProjectLine::new("PJ024483", "ICT (PJ024483)", [7.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            ProjectLine::new("PJ024642", "Roaming Bar (PJ024642)", [3.0, 4.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
        ],
        [7.5, 7.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    );

    let outcome = ReconciliationEngine::default().reconcile(&mut working);

    assert!(outcome.success);
    assert_eq!(outcome.strategy, Some(Strategy::CrossProjectSwap));
    assert!(outcome.explanation.contains("[Strategy: Cross-Project Swap]"));
    assert_eq!(working.projects[1].hours[0], 0.0);
    assert_eq!(working.projects[0].hours[1], 3.0);
    assert!(working.is_consistent(0.01));
}

#[test]
fn test_proportional_scaling() {
    let mut working = sheet(
        vec![ProjectLine::new("PJ024483", "ICT (PJ024483)", [3.75, 3.75, 7.5, 7.5, 7.5, 0.0, 0.0])],
        [7.5, 7.5, 7.5, 7.5, 7.5, 0.0, 0.0],
    );

    let outcome = ReconciliationEngine::default().reconcile(&mut working);

    assert!(outcome.success);
    assert_eq!(outcome.strategy, Some(Strategy::ProportionalScaling));
    assert!(outcome.explanation.contains("Proportional Scaling"));
    assert!(outcome.explanation.contains("2.00x"));
    assert_eq!(working.projects[0].hours[0], 7.5);
    assert_eq!(working.projects[0].hours[1], 7.5);
}

#[test]
fn test_unresolvable_grid_left_unmodified() {
    let original = sheet(
        vec![ProjectLine::new("PJ024483", "ICT (PJ024483)", [7.5, 7.5, 0.0, 0.0, 0.0, 0.0, 0.0])],
        [5.0, 9.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    );
    let mut working = original.clone();

    let outcome = ReconciliationEngine::default().reconcile(&mut working);

    assert!(!outcome.success);
    assert_eq!(outcome.status, ReconcileStatus::Unresolved);
    assert!(outcome.needs_review());
    assert_eq!(
        outcome.explanation,
        "Could not auto-correct. Over: [Mon +2.50], Under: [Tue -1.50]"
    );
    assert_eq!(outcome.mismatches.over.len(), 1);
    assert_eq!(outcome.mismatches.under.len(), 1);
    assert_eq!(working, original);
}

#[test]
fn test_zero_hour_sheet_skipped() {
    let mut working = sheet(vec![], [0.0; 7]);
    working.is_zero_hour = true;

    let outcome = ReconciliationEngine::default().reconcile(&mut working);

    assert_eq!(outcome.status, ReconcileStatus::Skipped);
    assert!(!outcome.needs_review());
}

#[test]
fn test_evaluate_does_not_modify() {
    let original = sheet(
        vec![
            ProjectLine::new("PJ024483", "ICT (PJ024483)", [7.5, 5.0, 7.5, 7.5, 7.5, 0.0, 0.0]),
            ProjectLine::new("PJ024642", "Roaming Bar (PJ024642)", [2.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
        ],
        [7.5, 7.5, 7.5, 7.5, 7.5, 0.0, 0.0],
    );

    let (outcome, edit) = ReconciliationEngine::default().evaluate(&original);

    assert!(outcome.success);
    let edit = edit.unwrap();
    assert!(!edit.is_empty());

    let mut applied = original.clone();
    edit.apply(&mut applied);
    assert!(applied.is_consistent(0.01));
}

#[test]
fn test_three_independent_misplacements_are_unresolved() {
    let original = sheet(
        vec![
            ProjectLine::new("PJ024483", "ICT (PJ024483)", [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            ProjectLine::new("PJ024642", "Roaming Bar (PJ024642)", [0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0]),
            ProjectLine::new("PJ021931", "Network refresh (PJ021931)", [0.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0]),
        ],
        [0.0, 1.0, 0.0, 2.0, 0.0, 3.0, 0.0],
    );
    let mut working = original.clone();

    let outcome = ReconciliationEngine::default().reconcile(&mut working);

    assert!(!outcome.success);
    assert_eq!(outcome.status, ReconcileStatus::Unresolved);
    assert_eq!(outcome.mismatches.over.len(), 3);
    assert_eq!(outcome.mismatches.under.len(), 3);
    assert!(outcome
        .explanation
        .ends_with("Over: [Mon +1.00, Wed +2.00, Fri +3.00], Under: [Tue -1.00, Thu -2.00, Sat -3.00]"));
    assert!(outcome.hypotheses_tried > 0);
    assert_eq!(working, original);
}
