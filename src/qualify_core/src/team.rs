use std::collections::HashSet;

use crate::fixture::Fixture;
use crate::standings::PointsMap;

/// The set of teams taking part in a tournament.
///
/// Teams are plain name keys. Order of insertion is kept so that reports and
/// snapshots break ties between equal entries the same way on every run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roster {
    names: Vec<String>,
    index: HashSet<String>,
}

impl Roster {
    /// Create a roster from team names. Duplicates are ignored.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut roster = Roster::default();
        for name in names {
            roster.insert(name.into());
        }
        roster
    }

    /// Collect every team that appears as home or away in a schedule.
    pub fn from_fixtures(fixtures: &[Fixture]) -> Self {
        let mut roster = Roster::default();
        for fixture in fixtures {
            roster.insert(fixture.home.clone());
            roster.insert(fixture.away.clone());
        }
        roster
    }

    pub fn insert(&mut self, name: String) -> bool {
        if self.index.contains(&name) {
            return false;
        }
        self.index.insert(name.clone());
        self.names.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// A points map with every team at zero.
    pub fn zeroed_points(&self) -> PointsMap {
        self.names.iter().map(|name| (name.clone(), 0)).collect()
    }
}
