use serde::{Deserialize, Serialize};

use crate::constants::{TIE_POINTS, WIN_POINTS};
use crate::fixture::{Fixture, MatchResult};
use crate::outcome::{FixtureResult, Outcome};
use crate::standings::PointsMap;

/// A remaining fixture paired with its predicted result.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prediction {
    pub fixture: Fixture,
    pub winner: MatchResult,
}

impl Prediction {
    pub fn new(fixture: &Fixture, result: FixtureResult) -> Self {
        let winner = match result {
            FixtureResult::Home => MatchResult::Winner(fixture.home.clone()),
            FixtureResult::Away => MatchResult::Winner(fixture.away.clone()),
            FixtureResult::Tie => MatchResult::Tie,
        };
        Prediction {
            fixture: Fixture::remaining(fixture.home.clone(), fixture.away.clone()),
            winner,
        }
    }
}

/// Final standings for one outcome.
///
/// Returns a fresh map; `base` is never modified. Teams absent from `base`
/// earn nothing, so the result always has exactly the base's keys.
pub fn project(base: &PointsMap, fixtures: &[Fixture], outcome: &Outcome) -> PointsMap {
    debug_assert_eq!(fixtures.len(), outcome.results.len());

    let mut points = base.clone();
    for (fixture, result) in fixtures.iter().zip(&outcome.results) {
        match result {
            FixtureResult::Home => award(&mut points, &fixture.home, WIN_POINTS),
            FixtureResult::Away => award(&mut points, &fixture.away, WIN_POINTS),
            FixtureResult::Tie => {
                award(&mut points, &fixture.home, TIE_POINTS);
                award(&mut points, &fixture.away, TIE_POINTS);
            }
        }
    }
    points
}

/// The per-fixture predicted winners of an outcome, in schedule order.
pub fn predictions(fixtures: &[Fixture], outcome: &Outcome) -> Vec<Prediction> {
    fixtures
        .iter()
        .zip(&outcome.results)
        .map(|(fixture, &result)| Prediction::new(fixture, result))
        .collect()
}

fn award(points: &mut PointsMap, team: &str, amount: u32) {
    if let Some(total) = points.get_mut(team) {
        *total += amount;
    }
}
