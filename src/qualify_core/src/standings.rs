use std::collections::HashMap;
use tracing::warn;

use crate::constants::{TIE_POINTS, WIN_POINTS};
use crate::error::Error;
use crate::fixture::{Fixture, MatchResult};
use crate::team::Roster;

/// Team name to points. Holds exactly one entry per known team.
pub type PointsMap = HashMap<String, u32>;

/// Current standings derived from completed matches.
#[derive(Debug, Default)]
pub struct Standings {
    pub points: PointsMap,
    /// Completed matches that could not be scored. Each one was skipped.
    pub warnings: Vec<Error>,
}

/// Score every completed match in the schedule.
///
/// Every roster team starts at zero. A win is worth [`WIN_POINTS`] to the
/// winner, a tie [`TIE_POINTS`] to both sides. A result naming a team outside
/// the roster is skipped and recorded as an `UnknownTeamResult` warning.
pub fn calculate_standings(roster: &Roster, fixtures: &[Fixture]) -> Standings {
    let mut points = roster.zeroed_points();
    let mut warnings = Vec::new();

    for fixture in fixtures {
        let Some(result) = &fixture.result else {
            continue;
        };

        let awarded = match result {
            MatchResult::Winner(winner) => {
                if let Some(total) = points.get_mut(winner) {
                    *total += WIN_POINTS;
                    true
                } else {
                    false
                }
            }
            MatchResult::Tie => {
                if roster.contains(&fixture.home) && roster.contains(&fixture.away) {
                    for side in [&fixture.home, &fixture.away] {
                        if let Some(total) = points.get_mut(side) {
                            *total += TIE_POINTS;
                        }
                    }
                    true
                } else {
                    false
                }
            }
        };

        if !awarded {
            warn!(
                home = %fixture.home,
                away = %fixture.away,
                result = %result.label(),
                "skipping completed match with unknown result team"
            );
            warnings.push(Error::UnknownTeamResult {
                home: fixture.home.clone(),
                away: fixture.away.clone(),
                result: result.label().to_string(),
            });
        }
    }

    Standings { points, warnings }
}

/// Standings as a table: points descending, then name ascending.
pub fn sorted_table(points: &PointsMap) -> Vec<(String, u32)> {
    let mut table: Vec<(String, u32)> =
        points.iter().map(|(team, &p)| (team.clone(), p)).collect();
    table.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    table
}
