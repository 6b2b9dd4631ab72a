use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use std::collections::HashMap;
use std::path::Path;

use crate::aggregator::simulate;
use crate::config::{SimulationConfig, TiePolicy};
use crate::error::Error;
use crate::export;
use crate::fixture::{Fixture, MatchResult, Tournament};
use crate::team::Roster;

impl From<Error> for PyErr {
    fn from(err: Error) -> PyErr {
        match err {
            Error::Io(_) | Error::Csv(_) | Error::Json(_) => PyIOError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

/// Build a tournament from `(home, away, result)` rows. A missing or blank
/// result marks the match as remaining.
fn build_tournament(
    fixtures: Vec<(String, String, Option<String>)>,
    teams: Option<Vec<String>>,
) -> Tournament {
    let fixtures: Vec<Fixture> = fixtures
        .into_iter()
        .map(|(home, away, result)| {
            let result = result.as_deref().and_then(MatchResult::parse);
            Fixture::new(home, away, result)
        })
        .collect();
    match teams {
        Some(teams) => Tournament::new(Roster::new(teams), fixtures),
        None => Tournament::from_fixtures(fixtures),
    }
}

fn build_config(
    threshold: u32,
    simulations: Option<u64>,
    seed_offset: u64,
    include_ties: bool,
) -> SimulationConfig {
    let mut config = SimulationConfig::new(threshold);
    if let Some(n) = simulations {
        config.simulations = n;
    }
    config.seed_offset = seed_offset;
    if include_ties {
        config.tie_policy = TiePolicy::IncludeTies;
    }
    config
}

/// Qualification percentage (0-100) for every team.
#[pyfunction]
#[pyo3(signature = (
    fixtures, threshold, teams = None, simulations = None, seed_offset = 0, include_ties = false
))]
fn qualification_probabilities(
    fixtures: Vec<(String, String, Option<String>)>,
    threshold: u32,
    teams: Option<Vec<String>>,
    simulations: Option<u64>,
    seed_offset: u64,
    include_ties: bool,
) -> PyResult<HashMap<String, f64>> {
    let tournament = build_tournament(fixtures, teams);
    let config = SimulationConfig {
        retain_scenarios: false,
        ..build_config(threshold, simulations, seed_offset, include_ties)
    };
    let run = simulate(&tournament, &config)?;
    Ok(run.report.percentages())
}

/// Run the simulation and write `team`'s qualifying scenarios to `path`.
///
/// Returns the number of scenarios written.
#[pyfunction]
#[pyo3(signature = (
    fixtures,
    threshold,
    team,
    path,
    teams = None,
    simulations = None,
    seed_offset = 0,
    include_ties = false
))]
#[allow(clippy::too_many_arguments)]
fn export_team_scenarios(
    fixtures: Vec<(String, String, Option<String>)>,
    threshold: u32,
    team: &str,
    path: &str,
    teams: Option<Vec<String>>,
    simulations: Option<u64>,
    seed_offset: u64,
    include_ties: bool,
) -> PyResult<usize> {
    let tournament = build_tournament(fixtures, teams);
    let config = build_config(threshold, simulations, seed_offset, include_ties);
    let run = simulate(&tournament, &config)?;
    let summary = export::export_team_scenarios(&run, team, Path::new(path))?;
    Ok(summary.outcomes)
}

/// Python module definition
#[pymodule]
fn qualify_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(qualification_probabilities, m)?)?;
    m.add_function(wrap_pyfunction!(export_team_scenarios, m)?)?;

    // Constants
    m.add("WIN_POINTS", crate::constants::WIN_POINTS)?;
    m.add("TIE_POINTS", crate::constants::TIE_POINTS)?;
    m.add("TIE_MARKER", crate::constants::TIE_MARKER)?;
    m.add("DEFAULT_ENUMERATION_LIMIT", crate::constants::DEFAULT_ENUMERATION_LIMIT)?;

    Ok(())
}
