use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::config::SimulationConfig;
use crate::error::{Error, Result};
use crate::fixture::{Fixture, Tournament};
use crate::outcome::{GenerationMode, Outcome, OutcomeGenerator, OutcomeSource};
use crate::projection::{predictions, project, Prediction};
use crate::report::QualificationReport;
use crate::standings::{calculate_standings, PointsMap};

/// Detail kept for one outcome in which a team qualified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioRecord {
    pub outcome_index: u64,
    /// The team's projected points in this outcome.
    pub points: u32,
    /// Predicted winner of every remaining fixture. Shared by all teams
    /// qualifying in the same outcome.
    pub predictions: Arc<[Prediction]>,
}

pub type ScenarioMap = HashMap<String, Vec<ScenarioRecord>>;

/// Cooperative cancellation flag checked once per outcome.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Tallies qualifying teams across projected outcomes.
///
/// Tallies are seeded with every team in `base`, so teams that never qualify
/// still appear with a zero count.
#[derive(Clone, Debug)]
pub struct QualificationAggregator<'a> {
    threshold: u32,
    base: &'a PointsMap,
    fixtures: &'a [Fixture],
    retain_scenarios: bool,
    tallies: HashMap<String, u64>,
    scenarios: ScenarioMap,
    considered: u64,
}

impl<'a> QualificationAggregator<'a> {
    pub fn new(
        threshold: u32,
        base: &'a PointsMap,
        fixtures: &'a [Fixture],
        retain_scenarios: bool,
    ) -> Self {
        QualificationAggregator {
            threshold,
            base,
            fixtures,
            retain_scenarios,
            tallies: base.keys().map(|team| (team.clone(), 0)).collect(),
            scenarios: HashMap::new(),
            considered: 0,
        }
    }

    /// Project one outcome and count every team at or above the threshold.
    ///
    /// Returns how many teams qualified in this outcome.
    pub fn observe(&mut self, outcome: &Outcome) -> usize {
        let projected = project(self.base, self.fixtures, outcome);
        let fixtures = self.fixtures;
        let mut shared: Option<Arc<[Prediction]>> = None;
        let mut qualified = 0;

        for (team, &points) in &projected {
            if points < self.threshold {
                continue;
            }
            qualified += 1;
            if let Some(count) = self.tallies.get_mut(team) {
                *count += 1;
            }
            if self.retain_scenarios {
                let predicted = shared
                    .get_or_insert_with(|| predictions(fixtures, outcome).into())
                    .clone();
                self.scenarios.entry(team.clone()).or_default().push(ScenarioRecord {
                    outcome_index: outcome.index,
                    points,
                    predictions: predicted,
                });
            }
        }

        self.considered += 1;
        qualified
    }

    /// Observe a sequence of outcomes, stopping early if `cancel` is raised.
    pub fn consume<I>(&mut self, outcomes: I, cancel: &CancelToken) -> Result<()>
    where
        I: IntoIterator<Item = Outcome>,
    {
        for outcome in outcomes {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled {
                    considered: self.considered,
                });
            }
            self.observe(&outcome);
        }
        Ok(())
    }

    /// Fold another aggregator's counts into this one.
    ///
    /// Scenario lists are appended, so merging partials in index order keeps
    /// every team's records ordered by outcome index.
    pub fn merge(&mut self, other: QualificationAggregator<'_>) {
        for (team, count) in other.tallies {
            *self.tallies.entry(team).or_insert(0) += count;
        }
        for (team, records) in other.scenarios {
            self.scenarios.entry(team).or_default().extend(records);
        }
        self.considered += other.considered;
    }

    pub fn considered(&self) -> u64 {
        self.considered
    }

    pub fn tallies(&self) -> &HashMap<String, u64> {
        &self.tallies
    }

    pub fn into_parts(self, mode: GenerationMode) -> (QualificationReport, ScenarioMap) {
        let report = QualificationReport {
            threshold: self.threshold,
            mode,
            total_outcomes: self.considered,
            tallies: self.tallies,
        };
        (report, self.scenarios)
    }
}

/// Run every outcome of `source` through a fresh aggregator on the current thread.
pub fn aggregate<'a, S: OutcomeSource>(
    source: &S,
    threshold: u32,
    base: &'a PointsMap,
    fixtures: &'a [Fixture],
    retain_scenarios: bool,
    cancel: &CancelToken,
) -> Result<QualificationAggregator<'a>> {
    let mut aggregator = QualificationAggregator::new(threshold, base, fixtures, retain_scenarios);
    aggregator.consume(source.outcomes(), cancel)?;
    Ok(aggregator)
}

/// Like [`aggregate`], but splits the index space into contiguous chunks
/// across the rayon pool and merges the partial tallies.
///
/// Produces exactly the same counts and scenario order as the sequential run.
pub fn aggregate_parallel<'a, S: OutcomeSource>(
    source: &S,
    threshold: u32,
    base: &'a PointsMap,
    fixtures: &'a [Fixture],
    retain_scenarios: bool,
    cancel: &CancelToken,
) -> Result<QualificationAggregator<'a>> {
    let total = source.len();
    let chunks = (rayon::current_num_threads() as u64 * 4).clamp(1, total.max(1));
    let chunk_size = total.div_ceil(chunks).max(1);

    let mut merged = (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * chunk_size;
            let mut partial =
                QualificationAggregator::new(threshold, base, fixtures, retain_scenarios);
            partial.consume(source.outcomes_in(start..start + chunk_size), cancel)?;
            Ok::<_, Error>(partial)
        })
        .try_reduce(
            || QualificationAggregator::new(threshold, base, fixtures, retain_scenarios),
            |mut left, right| {
                left.merge(right);
                Ok(left)
            },
        )?;

    for records in merged.scenarios.values_mut() {
        records.sort_by_key(|record| record.outcome_index);
    }
    Ok(merged)
}

/// Everything produced by one qualification run.
#[derive(Debug)]
pub struct QualificationRun {
    pub report: QualificationReport,
    pub scenarios: ScenarioMap,
    /// Standings before any remaining match is played.
    pub base: PointsMap,
    /// Remaining fixtures in schedule order, as projected.
    pub remaining: Vec<Fixture>,
    /// Completed matches skipped while computing the base standings.
    pub warnings: Vec<Error>,
    /// Whether per-outcome scenario records were kept. When false,
    /// `scenarios` is empty regardless of the tallies.
    pub retained: bool,
}

impl QualificationRun {
    /// Retained scenarios for `team`, empty if it never qualified.
    pub fn scenarios_for(&self, team: &str) -> Result<&[ScenarioRecord]> {
        if !self.base.contains_key(team) {
            return Err(Error::UnknownTeam(team.to_string()));
        }
        Ok(self.scenarios.get(team).map(Vec::as_slice).unwrap_or(&[]))
    }
}

/// Estimate every team's chance of reaching the configured threshold.
pub fn simulate(tournament: &Tournament, config: &SimulationConfig) -> Result<QualificationRun> {
    simulate_with_cancel(tournament, config, &CancelToken::new())
}

pub fn simulate_with_cancel(
    tournament: &Tournament,
    config: &SimulationConfig,
    cancel: &CancelToken,
) -> Result<QualificationRun> {
    config.validate()?;
    let threshold = config.qualifying_points;
    tournament.validate_threshold(threshold)?;

    let standings = calculate_standings(&tournament.roster, &tournament.fixtures);
    let remaining = tournament.remaining();
    if remaining.is_empty() {
        info!("no remaining matches; checking current standings only");
    }

    let generator = OutcomeGenerator::select(remaining.len(), config)?;
    let mode = generator.mode();
    info!(
        ?mode,
        outcomes = generator.len(),
        remaining = remaining.len(),
        threshold,
        parallel = config.parallel,
        "starting qualification run"
    );

    let started = Instant::now();
    let retain = config.retain_scenarios;
    let aggregator = if config.parallel {
        aggregate_parallel(&generator, threshold, &standings.points, &remaining, retain, cancel)?
    } else {
        aggregate(&generator, threshold, &standings.points, &remaining, retain, cancel)?
    };
    let (report, scenarios) = aggregator.into_parts(mode);
    info!(
        outcomes = report.total_outcomes,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "qualification run complete"
    );

    Ok(QualificationRun {
        report,
        scenarios,
        base: standings.points,
        remaining,
        warnings: standings.warnings,
        retained: retain,
    })
}
