//! Correction strategies
//!
//! Each strategy searches for a [`ProposedEdit`] after which every day's
//! project sum matches its header total. Strategies are pure: they read the
//! snapshot and spend from a shared [`HypothesisBudget`].

use super::grid::{GridSnapshot, MismatchAnalysis, ProposedEdit};
use serde::{Deserialize, Serialize};
use std::fmt;
use tsr_common::models::{round_hours, DAY_NAMES};

/// Correction strategies, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    SimpleMove,
    CrossProjectSwap,
    ProportionalScaling,
    ComplexRedistribution,
}

impl Strategy {
    pub const ORDER: [Strategy; 4] = [
        Strategy::SimpleMove,
        Strategy::CrossProjectSwap,
        Strategy::ProportionalScaling,
        Strategy::ComplexRedistribution,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Strategy::SimpleMove => "Simple Move",
            Strategy::CrossProjectSwap => "Cross-Project Swap",
            Strategy::ProportionalScaling => "Proportional Scaling",
            Strategy::ComplexRedistribution => "Complex Redistribution",
        }
    }

    /// Run this strategy against the snapshot
    pub fn attempt(
        &self,
        grid: &GridSnapshot<'_>,
        analysis: &MismatchAnalysis,
        budget: &mut HypothesisBudget,
        scaling_spread: f64,
    ) -> SearchOutcome {
        match self {
            Strategy::SimpleMove => try_simple_move(grid, analysis, budget),
            Strategy::CrossProjectSwap => try_cross_project_swap(grid, analysis, budget),
            Strategy::ProportionalScaling => try_proportional_scaling(grid, analysis, budget, scaling_spread),
            Strategy::ComplexRedistribution => try_complex_redistribution(grid, analysis, budget),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Cap on hypotheses evaluated across all strategies for one timesheet
#[derive(Debug, Clone)]
pub struct HypothesisBudget {
    limit: usize,
    spent: usize,
}

impl HypothesisBudget {
    pub fn new(limit: usize) -> Self {
        Self { limit, spent: 0 }
    }

    /// Take one hypothesis; `false` once the cap is reached
    pub fn spend(&mut self) -> bool {
        if self.spent >= self.limit {
            return false;
        }
        self.spent += 1;
        true
    }

    pub fn spent(&self) -> usize {
        self.spent
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Accepted edit plus its audit explanation
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub edit: ProposedEdit,
    pub explanation: String,
}

/// Result of one strategy's search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(Correction),
    NotFound,
    BudgetExhausted,
}

/// Evaluate one hypothesis; `None` means the budget ran out
fn check(grid: &GridSnapshot<'_>, budget: &mut HypothesisBudget, edit: &ProposedEdit) -> Option<bool> {
    if !budget.spend() {
        return None;
    }
    Some(grid.is_consistent_with(edit))
}

/// An intra-project move of a whole cell from an over-day to an empty under-day
#[derive(Debug, Clone, Copy)]
struct Move {
    project: usize,
    from: usize,
    to: usize,
    value: f64,
}

impl Move {
    fn edit(&self, edit: ProposedEdit) -> ProposedEdit {
        edit.set(self.project, self.to, self.value).set(self.project, self.from, 0.0)
    }

    fn describe(&self, grid: &GridSnapshot<'_>) -> String {
        format!(
            "{}h in {} ({}→{})",
            self.value,
            grid.project_code(self.project),
            DAY_NAMES[self.from],
            DAY_NAMES[self.to]
        )
    }
}

/// All candidate intra-project moves, project by project
fn candidate_moves(grid: &GridSnapshot<'_>, analysis: &MismatchAnalysis) -> Vec<Move> {
    let mut moves = Vec::new();
    for project in 0..grid.project_count() {
        for from in analysis.over_days() {
            let value = grid.cell(project, from);
            if value <= 0.0 {
                continue;
            }
            for to in analysis.under_days() {
                if grid.cell(project, to) > 0.0 {
                    continue;
                }
                moves.push(Move {
                    project,
                    from,
                    to,
                    value,
                });
            }
        }
    }
    moves
}

/// Strategy 1: move one cell to another day within the same project
pub fn try_simple_move(
    grid: &GridSnapshot<'_>,
    analysis: &MismatchAnalysis,
    budget: &mut HypothesisBudget,
) -> SearchOutcome {
    for mv in candidate_moves(grid, analysis) {
        let edit = mv.edit(ProposedEdit::new());
        match check(grid, budget, &edit) {
            None => return SearchOutcome::BudgetExhausted,
            Some(true) => {
                return SearchOutcome::Found(Correction {
                    edit,
                    explanation: format!(
                        "Moved {}h from {} to {} in {}",
                        mv.value,
                        DAY_NAMES[mv.from],
                        DAY_NAMES[mv.to],
                        grid.project_code(mv.project)
                    ),
                })
            }
            Some(false) => {}
        }
    }
    SearchOutcome::NotFound
}

/// Strategy 2: move one project's over-day cell into another project's empty under-day
pub fn try_cross_project_swap(
    grid: &GridSnapshot<'_>,
    analysis: &MismatchAnalysis,
    budget: &mut HypothesisBudget,
) -> SearchOutcome {
    let count = grid.project_count();
    for source in 0..count {
        for target in (0..count).filter(|&t| t != source) {
            for from in analysis.over_days() {
                let value = grid.cell(source, from);
                if value <= 0.0 {
                    continue;
                }
                for to in analysis.under_days() {
                    if grid.cell(target, to) > 0.0 {
                        continue;
                    }
                    let edit = ProposedEdit::new().set(source, from, 0.0).set(target, to, value);
                    match check(grid, budget, &edit) {
                        None => return SearchOutcome::BudgetExhausted,
                        Some(true) => {
                            return SearchOutcome::Found(Correction {
                                edit,
                                explanation: format!(
                                    "Moved {}h from {}'s {} to {}'s {}",
                                    value,
                                    grid.project_code(source),
                                    DAY_NAMES[from],
                                    grid.project_code(target),
                                    DAY_NAMES[to]
                                ),
                            })
                        }
                        Some(false) => {}
                    }
                }
            }
        }
    }
    SearchOutcome::NotFound
}

/// Strategy 3: every mismatched day is off by the same factor; scale them
///
/// Applies only when each mismatched day has a non-zero calculated total and
/// every header/calculated ratio lies within `spread` of the mean ratio.
pub fn try_proportional_scaling(
    grid: &GridSnapshot<'_>,
    analysis: &MismatchAnalysis,
    budget: &mut HypothesisBudget,
    spread: f64,
) -> SearchOutcome {
    let days = analysis.mismatched_days();
    if days.is_empty() {
        return SearchOutcome::NotFound;
    }

    let sums = grid.daily_sums(&ProposedEdit::new());
    if days.iter().any(|&day| sums[day] <= 0.0) {
        return SearchOutcome::NotFound;
    }

    let ratios: Vec<f64> = days.iter().map(|&day| grid.header(day) / sums[day]).collect();
    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    if ratios.iter().any(|ratio| (ratio - mean).abs() >= spread) {
        return SearchOutcome::NotFound;
    }

    let mut edit = ProposedEdit::new();
    for &day in &days {
        for project in 0..grid.project_count() {
            let value = grid.cell(project, day);
            if value > 0.0 {
                edit = edit.set(project, day, round_hours(value * mean));
            }
        }
    }

    match check(grid, budget, &edit) {
        None => SearchOutcome::BudgetExhausted,
        Some(true) => {
            let day_list = days.iter().map(|&d| DAY_NAMES[d]).collect::<Vec<_>>().join(", ");
            SearchOutcome::Found(Correction {
                edit,
                explanation: format!(
                    "Scaled hours on {} by {:.2}x (likely missing subtask, extracted partial data)",
                    day_list, mean
                ),
            })
        }
        Some(false) => SearchOutcome::NotFound,
    }
}

/// Strategy 4: two simultaneous fixes
///
/// (a) two intra-project moves in two different projects;
/// (b) one intra-project move plus adding the same value to another
///     project's empty under-day on a different day.
pub fn try_complex_redistribution(
    grid: &GridSnapshot<'_>,
    analysis: &MismatchAnalysis,
    budget: &mut HypothesisBudget,
) -> SearchOutcome {
    let moves = candidate_moves(grid, analysis);

    // (a) paired moves
    for (i, first) in moves.iter().enumerate() {
        for second in moves[i + 1..].iter().filter(|m| m.project != first.project) {
            let edit = second.edit(first.edit(ProposedEdit::new()));
            match check(grid, budget, &edit) {
                None => return SearchOutcome::BudgetExhausted,
                Some(true) => {
                    return SearchOutcome::Found(Correction {
                        edit,
                        explanation: format!(
                            "Multi-fix: moved {} and {}",
                            first.describe(grid),
                            second.describe(grid)
                        ),
                    })
                }
                Some(false) => {}
            }
        }
    }

    // (b) move plus additive fix
    for mv in &moves {
        for target in (0..grid.project_count()).filter(|&t| t != mv.project) {
            for to in analysis.under_days().filter(|&d| d != mv.to) {
                if grid.cell(target, to) > 0.0 {
                    continue;
                }
                let edit = mv.edit(ProposedEdit::new()).set(target, to, mv.value);
                match check(grid, budget, &edit) {
                    None => return SearchOutcome::BudgetExhausted,
                    Some(true) => {
                        return SearchOutcome::Found(Correction {
                            edit,
                            explanation: format!(
                                "Multi-fix: moved {} and added {}h to {}'s {}",
                                mv.describe(grid),
                                mv.value,
                                grid.project_code(target),
                                DAY_NAMES[to]
                            ),
                        })
                    }
                    Some(false) => {}
                }
            }
        }
    }

    SearchOutcome::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsr_common::models::{DateRange, WeekHours};
    use tsr_common::{ProjectLine, WeeklyTimesheet};

    fn sheet(rows: &[(&str, WeekHours)], header: WeekHours) -> WeeklyTimesheet {
        WeeklyTimesheet {
            resource_name: "Test".to_string(),
            date_range: DateRange::parse("Sep 29 2025 - Oct 5 2025").unwrap(),
            is_zero_hour: false,
            projects: rows
                .iter()
                .map(|(code, hours)| ProjectLine::new(*code, format!("Row ({})", code), *hours))
                .collect(),
            daily_totals: header,
            weekly_total: header.iter().sum(),
        }
    }

    fn run(strategy: Strategy, sheet: &WeeklyTimesheet) -> SearchOutcome {
        let grid = GridSnapshot::new(sheet, 0.01);
        let analysis = grid.analyze();
        strategy.attempt(&grid, &analysis, &mut HypothesisBudget::new(10_000), 0.1)
    }

    #[test]
    fn test_cross_project_swap() {
        let sheet = sheet(
            &[
                ("PJ000001", [7.5, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                ("PJ000002", [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            ],
            [7.5, 0.0, 3.0, 0.0, 0.0, 0.0, 0.0],
        );
        match run(Strategy::CrossProjectSwap, &sheet) {
            SearchOutcome::Found(c) => {
                assert_eq!(c.explanation, "Moved 3h from PJ000001's Tuesday to PJ000002's Wednesday")
            }
            other => panic!("expected swap, got {:?}", other),
        }
    }

    #[test]
    fn test_scaling_rejects_uneven_ratios() {
        let sheet = sheet(
            &[("PJ000001", [2.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0])],
            [4.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        );
        assert_eq!(run(Strategy::ProportionalScaling, &sheet), SearchOutcome::NotFound);
    }

    #[test]
    fn test_complex_paired_moves() {
        let sheet = sheet(
            &[
                ("PJ000001", [4.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                ("PJ000002", [0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 0.0]),
            ],
            [0.0, 4.0, 0.0, 3.0, 0.0, 0.0, 0.0],
        );
        assert_eq!(run(Strategy::SimpleMove, &sheet), SearchOutcome::NotFound);
        match run(Strategy::ComplexRedistribution, &sheet) {
            SearchOutcome::Found(c) => {
                assert!(c.explanation.starts_with("Multi-fix: moved 4h in PJ000001 (Monday→Tuesday)"));
                assert!(c.explanation.contains("3h in PJ000002 (Wednesday→Thursday)"));
            }
            other => panic!("expected multi-fix, got {:?}", other),
        }
    }

    #[test]
    fn test_complex_move_plus_addition() {
        let sheet = sheet(
            &[
                ("PJ000001", [2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                ("PJ000002", [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            ],
            [0.0, 2.0, 2.0, 0.0, 0.0, 0.0, 0.0],
        );
        match run(Strategy::ComplexRedistribution, &sheet) {
            SearchOutcome::Found(c) => assert_eq!(
                c.explanation,
                "Multi-fix: moved 2h in PJ000001 (Monday→Tuesday) and added 2h to PJ000002's Wednesday"
            ),
            other => panic!("expected move plus addition, got {:?}", other),
        }
    }

    #[test]
    fn test_budget_exhaustion() {
        let sheet = sheet(
            &[("PJ000001", [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])],
            [0.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0],
        );
        let grid = GridSnapshot::new(&sheet, 0.01);
        let analysis = grid.analyze();
        let mut budget = HypothesisBudget::new(1);
        assert_eq!(
            Strategy::SimpleMove.attempt(&grid, &analysis, &mut budget, 0.1),
            SearchOutcome::BudgetExhausted
        );
        assert_eq!(budget.spent(), 1);
    }
}
