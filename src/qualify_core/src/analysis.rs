//! Checks run over exported scenarios after the fact: how well they predicted
//! the real results, how many repeat, and where they leave a given team.

use std::collections::HashMap;
use tracing::warn;

use crate::constants::{TIE_POINTS, WIN_POINTS};
use crate::export::ExportedScenario;
use crate::fixture::{Fixture, MatchResult};
use crate::standings::{sorted_table, PointsMap};

/// A scenario that predicted enough of the real results.
#[derive(Clone, Debug, PartialEq)]
pub struct CompatibleScenario {
    pub outcome_index: u64,
    /// Real results compared (ties excluded)
    pub compared: usize,
    pub correct: usize,
    pub match_percentage: f64,
}

/// Scenarios whose predictions agree with at least `min_percentage` of the
/// completed real results they cover.
///
/// Fixtures are matched by their `"Home vs Away"` label. Real ties are left
/// out of the comparison, as are scenarios that cover no real result.
pub fn compatible_scenarios(
    scenarios: &[ExportedScenario],
    actual: &[Fixture],
    min_percentage: f64,
) -> Vec<CompatibleScenario> {
    let results: HashMap<String, &str> = actual
        .iter()
        .filter_map(|fixture| match &fixture.result {
            Some(MatchResult::Winner(winner)) => Some((fixture.label(), winner.as_str())),
            _ => None,
        })
        .collect();

    scenarios
        .iter()
        .filter_map(|scenario| {
            let mut compared = 0;
            let mut correct = 0;
            for prediction in &scenario.predictions {
                if let Some(&winner) = results.get(&prediction.fixture.label()) {
                    compared += 1;
                    if prediction.winner.label() == winner {
                        correct += 1;
                    }
                }
            }
            if compared == 0 {
                return None;
            }
            let match_percentage = 100.0 * correct as f64 / compared as f64;
            (match_percentage >= min_percentage).then_some(CompatibleScenario {
                outcome_index: scenario.outcome_index,
                compared,
                correct,
                match_percentage,
            })
        })
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DuplicateSummary {
    pub total: usize,
    /// Scenarios repeating an earlier one's results, first occurrences excluded
    pub duplicated: usize,
    /// Result sets that occur more than once
    pub distinct_duplicated: usize,
    pub unique: usize,
}

/// Count scenarios that share the exact same ordered list of winners.
pub fn duplicate_summary(scenarios: &[ExportedScenario]) -> DuplicateSummary {
    let mut groups: HashMap<Vec<&str>, usize> = HashMap::new();
    for scenario in scenarios {
        let winners = scenario.predictions.iter().map(|p| p.winner.label()).collect();
        *groups.entry(winners).or_insert(0) += 1;
    }

    DuplicateSummary {
        total: scenarios.len(),
        duplicated: groups.values().filter(|&&n| n > 1).map(|n| n - 1).sum(),
        distinct_duplicated: groups.values().filter(|&&n| n > 1).count(),
        unique: groups.len(),
    }
}

/// Final standings implied by an exported scenario on top of `base`.
///
/// Winners missing from `base` are logged and ignored.
pub fn replay(base: &PointsMap, scenario: &ExportedScenario) -> PointsMap {
    let mut points = base.clone();
    for prediction in &scenario.predictions {
        match &prediction.winner {
            MatchResult::Winner(winner) => match points.get_mut(winner) {
                Some(total) => *total += WIN_POINTS,
                None => warn!(
                    outcome = scenario.outcome_index,
                    winner = %winner,
                    "winner not in base standings"
                ),
            },
            MatchResult::Tie => {
                for side in [&prediction.fixture.home, &prediction.fixture.away] {
                    if let Some(total) = points.get_mut(side) {
                        *total += TIE_POINTS;
                    }
                }
            }
        }
    }
    points
}

/// Outcome indices of the scenarios in which `team` finishes in the top `n`.
///
/// Positions follow [`sorted_table`]: points descending, then name.
pub fn top_n_finishes(
    base: &PointsMap,
    scenarios: &[ExportedScenario],
    team: &str,
    n: usize,
) -> Vec<u64> {
    scenarios
        .iter()
        .filter(|scenario| {
            sorted_table(&replay(base, scenario))
                .iter()
                .take(n)
                .any(|(name, _)| name == team)
        })
        .map(|scenario| scenario.outcome_index)
        .collect()
}
