use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{is_tie_marker, FIXTURE_SEPARATOR, TIE_MARKER, WIN_POINTS};
use crate::error::{Error, Result};
use crate::team::Roster;

/// Result of a completed match.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResult {
    Winner(String),
    Tie,
}

impl MatchResult {
    /// Parse a raw result cell. Blank cells mean the match has not been played.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else if is_tie_marker(raw) {
            Some(MatchResult::Tie)
        } else {
            Some(MatchResult::Winner(raw.to_string()))
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MatchResult::Winner(name) => name,
            MatchResult::Tie => TIE_MARKER,
        }
    }
}

/// A scheduled contest between two teams.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fixture {
    pub home: String,
    pub away: String,
    pub result: Option<MatchResult>,
}

impl Fixture {
    pub fn new(
        home: impl Into<String>,
        away: impl Into<String>,
        result: Option<MatchResult>,
    ) -> Self {
        Fixture {
            home: home.into(),
            away: away.into(),
            result,
        }
    }

    /// A fixture that has not been played yet.
    pub fn remaining(home: impl Into<String>, away: impl Into<String>) -> Self {
        Fixture::new(home, away, None)
    }

    /// A completed fixture won by `winner`.
    pub fn won(
        home: impl Into<String>,
        away: impl Into<String>,
        winner: impl Into<String>,
    ) -> Self {
        Fixture::new(home, away, Some(MatchResult::Winner(winner.into())))
    }

    /// A completed fixture that ended level.
    pub fn tied(home: impl Into<String>, away: impl Into<String>) -> Self {
        Fixture::new(home, away, Some(MatchResult::Tie))
    }

    pub fn is_completed(&self) -> bool {
        self.result.is_some()
    }

    /// Label used in exports and for matching against real results.
    pub fn label(&self) -> String {
        format!("{}{}{}", self.home, FIXTURE_SEPARATOR, self.away)
    }

    /// Split a `"Home vs Away"` label back into its teams.
    pub fn parse_label(label: &str) -> Option<(String, String)> {
        let (home, away) = label.split_once(FIXTURE_SEPARATOR)?;
        let (home, away) = (home.trim(), away.trim());
        if home.is_empty() || away.is_empty() {
            return None;
        }
        Some((home.to_string(), away.to_string()))
    }
}

impl fmt::Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Some(result) => write!(
                f,
                "{}{}{} ({})",
                self.home,
                FIXTURE_SEPARATOR,
                self.away,
                result.label()
            ),
            None => write!(f, "{}{}{}", self.home, FIXTURE_SEPARATOR, self.away),
        }
    }
}

/// A schedule together with the teams it is played between.
///
/// Loaded once per session and read-only afterwards.
#[derive(Clone, Debug)]
pub struct Tournament {
    pub roster: Roster,
    pub fixtures: Vec<Fixture>,
}

impl Tournament {
    pub fn new(roster: Roster, fixtures: Vec<Fixture>) -> Self {
        Tournament { roster, fixtures }
    }

    /// Build a tournament whose roster is every team named in the schedule.
    pub fn from_fixtures(fixtures: Vec<Fixture>) -> Self {
        let roster = Roster::from_fixtures(&fixtures);
        Tournament { roster, fixtures }
    }

    pub fn completed(&self) -> impl Iterator<Item = &Fixture> {
        self.fixtures.iter().filter(|f| f.is_completed())
    }

    /// Fixtures still to be played, in schedule order.
    pub fn remaining(&self) -> Vec<Fixture> {
        self.fixtures.iter().filter(|f| !f.is_completed()).cloned().collect()
    }

    pub fn remaining_count(&self) -> usize {
        self.fixtures.iter().filter(|f| !f.is_completed()).count()
    }

    /// Remaining fixtures, or `EmptySchedule` when every match has been played.
    pub fn require_remaining(&self) -> Result<Vec<Fixture>> {
        let remaining = self.remaining();
        if remaining.is_empty() {
            return Err(Error::EmptySchedule);
        }
        Ok(remaining)
    }

    /// Highest threshold any team could conceivably reach: winning every scheduled match.
    pub fn threshold_ceiling(&self) -> u32 {
        max_points(self.fixtures.len())
    }

    /// Reject thresholds that are zero or beyond anything the schedule can produce.
    pub fn validate_threshold(&self, threshold: u32) -> Result<()> {
        let ceiling = self.threshold_ceiling();
        if threshold == 0 || threshold > ceiling {
            return Err(Error::InvalidThreshold { threshold, ceiling });
        }
        Ok(())
    }
}

/// Points for winning `scheduled` matches, saturating at `u32::MAX`.
fn max_points(scheduled: usize) -> u32 {
    WIN_POINTS.saturating_mul(u32::try_from(scheduled).unwrap_or(u32::MAX))
}
