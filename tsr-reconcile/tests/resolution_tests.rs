//! Identity resolution, field validation and decision policy

use tsr_common::config::TomlConfig;
use tsr_common::roster::{AliasType, CanonicalProject};
use tsr_common::{PersonRoster, ProjectRoster};
use tsr_reconcile::error::FieldError;
use tsr_reconcile::services::{CodeOutcome, FieldValidator, PersonResolver, ProjectResolver};
use tsr_reconcile::similarity::confusable_variations;
use tsr_reconcile::types::{Decision, MatchKind, MatchMethod, MatchResult};

fn team() -> PersonRoster {
    let mut roster = PersonRoster::from_members([
        "Neil Pomfret",
        "Barry Breden",
        "abcdefghijklmnopqrst",
        "abcdefghijklmnopqrstuvwxy",
    ]);
    roster.add_alias("N. Pomfret", "Neil Pomfret").unwrap();
    roster
}

fn projects() -> ProjectRoster {
    let mut roster = ProjectRoster::from_projects([
        CanonicalProject::new("PJ024483", "ICT platform upgrade"),
        CanonicalProject::new("PJ024642", "Roaming Bar"),
        CanonicalProject::new("PJ021931", "Network refresh"),
    ]);
    roster.add_alias("PJ024483", AliasType::Code, "PJ24483").unwrap();
    roster
}

#[test]
fn test_person_exact_and_alias() {
    let resolver = PersonResolver::new();

    let exact = resolver.resolve("Neil Pomfret", &team());
    assert_eq!(exact.match_kind, MatchKind::Exact);
    assert_eq!(exact.confidence, 1.0);

    let alias = resolver.resolve("N. Pomfret", &team());
    assert_eq!(alias.match_kind, MatchKind::Alias);
    assert_eq!(alias.canonical_value, "Neil Pomfret");
}

#[test]
fn test_person_threshold_boundary() {
    let resolver = PersonResolver::new();

    // ratio exactly 0.85 against "abcdefghijklmnopqrst"
    let at = resolver.resolve("abcdefXhijklmYopqrsZ", &team());
    assert_eq!(at.match_kind, MatchKind::Fuzzy);
    assert_eq!(at.canonical_value, "abcdefghijklmnopqrst");
    assert_eq!(at.confidence, 0.85);

    // ratio 0.84 against "abcdefghijklmnopqrstuvwxy"
    let below = resolver.resolve("abcde1ghijk2mnopq3stuv4xy", &team());
    assert_eq!(below.match_kind, MatchKind::Unknown);
    assert_eq!(below.canonical_value, "abcde1ghijk2mnopq3stuv4xy");
}

#[test]
fn test_person_empty_roster() {
    let result = PersonResolver::new().resolve("Neil Pomfret", &PersonRoster::new());
    assert_eq!(result.match_kind, MatchKind::Unknown);
    assert_eq!(result.confidence, 0.0);
}

#[test]
fn test_decision_never_accepts_unknown() {
    let unknown = MatchResult::unknown("PJ777777", 0.95);
    assert_eq!(Decision::for_match(&unknown, 0.85, 0.60), Decision::Review);

    let fuzzy = MatchResult::fuzzy("Neil Pomfret", 0.70, MatchMethod::Similarity);
    assert_eq!(Decision::for_match(&fuzzy, 0.85, 0.60), Decision::Review);
    assert_eq!(Decision::from_confidence(0.59, 0.85, 0.60), Decision::Reject);
    assert_eq!(Decision::from_confidence(0.85, 0.85, 0.60), Decision::Accept);
}

#[test]
fn test_confusable_round_trip() {
    let resolver = ProjectResolver::default();
    assert!(confusable_variations("PJ024542").contains("PJ024642"));
    assert!(confusable_variations("PJ024642").contains("PJ024542"));

    let result = resolver.resolve_code("PJ024542", &projects());
    assert_eq!(result.canonical_value, "PJ024642");
    assert_eq!(result.match_kind, MatchKind::Fuzzy);
}

#[test]
fn test_project_alias_and_transposition() {
    let resolver = ProjectResolver::default();

    let alias = resolver.resolve_code("PJ24483", &projects());
    assert_eq!(alias.match_kind, MatchKind::Alias);
    assert_eq!(alias.canonical_value, "PJ024483");

    let transposed = resolver.resolve_code("PJ021391", &projects());
    assert_eq!(transposed.canonical_value, "PJ021931");
    assert_eq!(transposed.method, Some(MatchMethod::Transposition));
}

#[test]
fn test_category_label_never_resolves() {
    let resolver = ProjectResolver::default();
    let (result, quality) = resolver.resolve("DESIGN", "Roaming Bar (DESIGN)", &projects());

    assert_eq!(result.match_kind, MatchKind::Unknown);
    assert!(!quality.valid);
    assert!(quality
        .issues
        .iter()
        .any(|issue| issue.contains("Category label used as code")));
}

#[test]
fn test_hours_heuristics() {
    let validator = FieldValidator::from_config(&TomlConfig::compiled_defaults());

    assert_eq!(validator.validate_hours(Some("75")).unwrap().value, 7.5);
    assert_eq!(validator.validate_hours(Some("15.0")).unwrap().value, 7.5);
    assert_eq!(validator.validate_hours(Some("16")).unwrap().value, 8.0);
    assert_eq!(validator.validate_hours(Some("7.5")).unwrap().value, 7.5);
    assert_eq!(validator.validate_hours(None).unwrap().value, 0.0);
    assert_eq!(validator.validate_hours(Some("-")).unwrap().value, 0.0);

    assert!(matches!(validator.validate_hours(Some("25")), Err(FieldError::Range { .. })));
    assert!(matches!(validator.validate_hours(Some("abc")), Err(FieldError::Parse { .. })));
}

#[test]
fn test_code_validation_outcomes() {
    let validator = FieldValidator::from_config(&TomlConfig::compiled_defaults());
    let roster = projects();

    assert_eq!(validator.validate_project_code("PJ024483", &roster).outcome, CodeOutcome::Valid);

    let substituted = validator.validate_project_code("PJ024542", &roster);
    assert_eq!(substituted.outcome, CodeOutcome::AutoCorrected);
    assert_eq!(substituted.code, "PJ024642");

    let transposed = validator.validate_project_code("PJ021391", &roster);
    assert_eq!(transposed.outcome, CodeOutcome::Transposed);
    assert_eq!(transposed.code, "PJ021931");

    assert_eq!(validator.validate_project_code("DESIGN", &roster).outcome, CodeOutcome::UnknownCode);
    assert_eq!(validator.validate_project_code("", &roster).outcome, CodeOutcome::Empty);
}

#[test]
fn test_letters_only_code_never_resolves() {
    let mut roster = projects();
    roster.add_project("PLANNING", "Planning");
    let resolver = ProjectResolver::default();

    let exact = resolver.resolve_code("PLANNING", &roster);
    assert_eq!(exact.match_kind, MatchKind::Unknown);
    assert_eq!(exact.canonical_value, "PLANNING");

    let near = resolver.resolve_code("PLANNIN6", &roster);
    assert_eq!(near.match_kind, MatchKind::Unknown);
    assert_ne!(near.canonical_value, "PLANNING");

    let validator = FieldValidator::from_config(&TomlConfig::compiled_defaults());
    assert_eq!(
        validator.validate_project_code("PLANNING", &ProjectRoster::new()).outcome,
        CodeOutcome::UnknownCode
    );
    assert_eq!(validator.validate_project_code("PLANNIN6", &roster).outcome, CodeOutcome::UnknownCode);
}
