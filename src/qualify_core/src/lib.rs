//! Qualify Core - tournament qualification odds from a partially played schedule.
//!
//! Current standings come from completed matches; the remaining fixtures are
//! either enumerated outright or sampled with seeded coin flips, and every
//! projected table is checked against a qualifying points threshold.
//! Python bindings are available with the `python` feature.

pub mod aggregator;
pub mod analysis;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod fixture;
pub mod outcome;
pub mod projection;
pub mod report;
pub mod standings;
pub mod team;

#[cfg(feature = "python")]
mod python;

pub use aggregator::{
    aggregate, aggregate_parallel, simulate, simulate_with_cancel, CancelToken,
    QualificationAggregator, QualificationRun, ScenarioRecord,
};
pub use config::{ModeSelection, SimulationConfig, TiePolicy};
pub use constants::{TIE_MARKER, TIE_POINTS, WIN_POINTS};
pub use error::{Error, Result};
pub use export::{export_all_scenarios, export_team_scenarios, read_scenarios, ExportedScenario};
pub use fixture::{Fixture, MatchResult, Tournament};
pub use outcome::{
    ExhaustiveOutcomes, FixtureResult, GenerationMode, Outcome, OutcomeGenerator, OutcomeSource,
    SampledOutcomes,
};
pub use projection::{project, Prediction};
pub use report::{QualificationReport, QualificationRow};
pub use standings::{calculate_standings, PointsMap, Standings};
pub use team::Roster;
