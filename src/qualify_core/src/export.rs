use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::aggregator::{QualificationRun, ScenarioRecord};
use crate::constants::EXPORT_HEADER;
use crate::error::{Error, Result};
use crate::fixture::{Fixture, MatchResult};
use crate::projection::Prediction;
use crate::standings::{sorted_table, PointsMap};

/// One CSV line: a single fixture of a single outcome.
#[derive(Debug, Serialize, Deserialize)]
struct ScenarioRow {
    #[serde(rename = "Simulation Number")]
    outcome_index: u64,
    #[serde(rename = "Match")]
    fixture: String,
    #[serde(rename = "Winner")]
    winner: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub outcomes: usize,
    pub rows: usize,
}

/// A scenario read back from an export file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedScenario {
    pub outcome_index: u64,
    pub predictions: Vec<Prediction>,
}

/// Write every retained qualifying outcome of `team` to a CSV file.
///
/// Fails with `UnknownTeam` for a team outside the run,
/// `ScenariosNotRetained` when the run kept no records, `EmptySchedule` when
/// no match remains and `NoQualifyingScenarios` when the team never
/// qualified. Nothing is written on failure.
pub fn export_team_scenarios(
    run: &QualificationRun,
    team: &str,
    path: &Path,
) -> Result<ExportSummary> {
    let threshold = run.report.threshold;
    let records = run.scenarios_for(team)?;
    check_exportable(run)?;
    let records: Vec<&ScenarioRecord> =
        records.iter().filter(|record| record.points >= threshold).collect();
    if records.is_empty() {
        return Err(Error::NoQualifyingScenarios(team.to_string()));
    }

    let summary = write_scenarios(
        path,
        records.iter().map(|record| (record.outcome_index, &record.predictions[..])),
    )?;
    info!(
        team,
        path = %path.display(),
        outcomes = summary.outcomes,
        "exported qualifying scenarios"
    );
    Ok(summary)
}

/// Write the union of every team's qualifying outcomes, each outcome once,
/// in outcome index order.
pub fn export_all_scenarios(run: &QualificationRun, path: &Path) -> Result<ExportSummary> {
    check_exportable(run)?;
    let threshold = run.report.threshold;
    let mut unique: BTreeMap<u64, &[Prediction]> = BTreeMap::new();
    for records in run.scenarios.values() {
        for record in records.iter().filter(|record| record.points >= threshold) {
            unique.entry(record.outcome_index).or_insert(&record.predictions[..]);
        }
    }
    if unique.is_empty() {
        return Err(Error::NoQualifyingScenarios("any team".to_string()));
    }

    let summary = write_scenarios(path, unique.into_iter())?;
    info!(path = %path.display(), outcomes = summary.outcomes, "exported all qualifying scenarios");
    Ok(summary)
}

/// An export needs retained records and at least one remaining fixture;
/// with none left every outcome is empty and would write no rows.
fn check_exportable(run: &QualificationRun) -> Result<()> {
    if !run.retained {
        return Err(Error::ScenariosNotRetained);
    }
    if run.remaining.is_empty() {
        return Err(Error::EmptySchedule);
    }
    Ok(())
}

fn write_scenarios<'a, I>(path: &Path, scenarios: I) -> Result<ExportSummary>
where
    I: Iterator<Item = (u64, &'a [Prediction])>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut outcomes = 0;
    let mut rows = 0;

    for (outcome_index, predictions) in scenarios {
        outcomes += 1;
        for prediction in predictions {
            writer.serialize(ScenarioRow {
                outcome_index,
                fixture: prediction.fixture.label(),
                winner: prediction.winner.label().to_string(),
            })?;
            rows += 1;
        }
    }

    let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    write_atomic(path, &bytes)?;

    Ok(ExportSummary {
        path: path.to_path_buf(),
        outcomes,
        rows,
    })
}

/// Read a scenario export back into structured predictions, grouped by
/// outcome index in order of first appearance.
pub fn read_scenarios(path: &Path) -> Result<Vec<ExportedScenario>> {
    let malformed = |reason: String| Error::MalformedExport {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    if headers.iter().map(str::trim).ne(EXPORT_HEADER) {
        return Err(malformed(format!("unexpected header {:?}", headers)));
    }

    let mut scenarios: Vec<ExportedScenario> = Vec::new();
    let mut positions: HashMap<u64, usize> = HashMap::new();

    for row in reader.deserialize() {
        let row: ScenarioRow = row?;
        let (home, away) = Fixture::parse_label(&row.fixture)
            .ok_or_else(|| malformed(format!("bad match label {:?}", row.fixture)))?;
        let winner = MatchResult::parse(&row.winner)
            .ok_or_else(|| malformed(format!("missing winner for {:?}", row.fixture)))?;

        let position = *positions.entry(row.outcome_index).or_insert_with(|| {
            scenarios.push(ExportedScenario {
                outcome_index: row.outcome_index,
                predictions: Vec::new(),
            });
            scenarios.len() - 1
        });
        scenarios[position].predictions.push(Prediction {
            fixture: Fixture::remaining(home, away),
            winner,
        });
    }

    Ok(scenarios)
}

/// Persist standings as a JSON object ordered by points, highest first.
pub fn write_standings_snapshot(points: &PointsMap, path: &Path) -> Result<()> {
    let mut object = serde_json::Map::new();
    for (team, total) in sorted_table(points) {
        object.insert(team, serde_json::Value::from(total));
    }
    let bytes = serde_json::to_vec_pretty(&serde_json::Value::Object(object))?;
    write_atomic(path, &bytes)
}

pub fn read_standings_snapshot(path: &Path) -> Result<PointsMap> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Write through a sibling temporary file so readers never see a partial file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("export"));
    name.push(".tmp");
    let tmp = path.with_file_name(name);

    let written = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path));
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::simulate;
    use crate::config::SimulationConfig;
    use crate::fixture::Tournament;
    use crate::team::Roster;
    use proptest::prelude::*;

    fn small_run(threshold: u32) -> QualificationRun {
        simulate(&small_league(), &SimulationConfig::new(threshold)).unwrap()
    }

    fn small_league() -> Tournament {
        Tournament::new(
            Roster::new(["A", "B", "C"]),
            vec![
                Fixture::won("A", "B", "A"),
                Fixture::remaining("A", "C"),
                Fixture::remaining("B", "C"),
                Fixture::remaining("C", "A"),
            ],
        )
    }

    /// Single round-robin of `teams` teams with the first `played` fixtures
    /// won by the home side.
    fn league(teams: usize, played: usize) -> Tournament {
        let names: Vec<String> = (0..teams).map(|i| format!("Team{}", i)).collect();
        let mut fixtures = Vec::new();
        for i in 0..teams {
            for j in (i + 1)..teams {
                fixtures.push(Fixture::remaining(names[i].clone(), names[j].clone()));
            }
        }
        for fixture in fixtures.iter_mut().take(played) {
            fixture.result = Some(MatchResult::Winner(fixture.home.clone()));
        }
        Tournament::new(Roster::new(names), fixtures)
    }

    #[test]
    fn test_export_team_writes_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.csv");
        let run = small_run(4);

        let summary = export_team_scenarios(&run, "A", &path).unwrap();
        let expected = run.scenarios["A"].len();
        assert_eq!(summary.outcomes, expected);
        assert_eq!(summary.rows, expected * 3);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Simulation Number,Match,Winner"));
        assert!(text.contains("A vs C,"));
    }

    #[test]
    fn test_export_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.csv");
        let run = small_run(4);

        export_team_scenarios(&run, "C", &path).unwrap();
        let read = read_scenarios(&path).unwrap();
        let records = &run.scenarios["C"];

        assert_eq!(read.len(), records.len());
        for (exported, record) in read.iter().zip(records) {
            assert_eq!(exported.outcome_index, record.outcome_index);
            assert_eq!(&exported.predictions[..], &record.predictions[..]);
        }
    }

    #[test]
    fn test_no_scenarios_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.csv");
        // B lost its only completed match and can reach at most 2 points
        let run = small_run(4);

        let result = export_team_scenarios(&run, "B", &path);
        assert!(matches!(result, Err(Error::NoQualifyingScenarios(team)) if team == "B"));
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unretained_run_is_not_reported_as_unqualified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.csv");
        let config = SimulationConfig {
            retain_scenarios: false,
            ..SimulationConfig::new(2)
        };
        let run = simulate(&small_league(), &config).unwrap();
        // A already has 2 points and qualifies in every outcome
        assert_eq!(run.report.percentage("A"), Some(100.0));

        let result = export_team_scenarios(&run, "A", &path);
        assert!(matches!(result, Err(Error::ScenariosNotRetained)));
        let result = export_all_scenarios(&run, &path);
        assert!(matches!(result, Err(Error::ScenariosNotRetained)));
        assert!(!path.exists());

        // Unknown teams are still reported as such
        let result = export_team_scenarios(&run, "Z", &path);
        assert!(matches!(result, Err(Error::UnknownTeam(_))));
    }

    #[test]
    fn test_finished_schedule_exports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.csv");
        let tournament = Tournament::from_fixtures(vec![
            Fixture::won("A", "B", "A"),
            Fixture::won("B", "C", "C"),
        ]);
        let run = simulate(&tournament, &SimulationConfig::new(2)).unwrap();
        assert_eq!(run.report.total_outcomes, 1);
        assert_eq!(run.scenarios["A"].len(), 1);

        let result = export_team_scenarios(&run, "A", &path);
        assert!(matches!(result, Err(Error::EmptySchedule)));
        let result = export_all_scenarios(&run, &path);
        assert!(matches!(result, Err(Error::EmptySchedule)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unknown_team_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("z.csv");
        let result = export_team_scenarios(&small_run(4), "Z", &path);
        assert!(matches!(result, Err(Error::UnknownTeam(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_export_all_deduplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all.csv");
        let run = small_run(4);

        let summary = export_all_scenarios(&run, &path).unwrap();
        let mut indices: Vec<u64> = run
            .scenarios
            .values()
            .flatten()
            .map(|record| record.outcome_index)
            .collect();
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(summary.outcomes, indices.len());

        let read = read_scenarios(&path).unwrap();
        let read_indices: Vec<u64> = read.iter().map(|s| s.outcome_index).collect();
        assert_eq!(read_indices, indices);
    }

    #[test]
    fn test_read_rejects_bad_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "Sim,Game,Who\n1,A vs B,A\n").unwrap();
        assert!(matches!(read_scenarios(&path), Err(Error::MalformedExport { .. })));
    }

    #[test]
    fn test_read_rejects_bad_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "Simulation Number,Match,Winner\n1,A-B,A\n").unwrap();
        assert!(matches!(read_scenarios(&path), Err(Error::MalformedExport { .. })));
    }

    #[test]
    fn test_standings_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");
        let points: PointsMap =
            [("B".to_string(), 2), ("A".to_string(), 6), ("C".to_string(), 4)]
                .into_iter()
                .collect();

        write_standings_snapshot(&points, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let a = text.find("\"A\"").unwrap();
        let c = text.find("\"C\"").unwrap();
        let b = text.find("\"B\"").unwrap();
        assert!(a < c && c < b);

        assert_eq!(read_standings_snapshot(&path).unwrap(), points);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_team_export_roundtrip(
            played in 0usize..9,
            threshold in 1u32..9,
            team in 0usize..5,
        ) {
            let tournament = league(5, played);
            let run = simulate(&tournament, &SimulationConfig::new(threshold)).unwrap();
            let team = format!("Team{}", team);
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("team.csv");

            match export_team_scenarios(&run, &team, &path) {
                Ok(summary) => {
                    let records = &run.scenarios[&team];
                    let read = read_scenarios(&path).unwrap();
                    prop_assert_eq!(summary.outcomes, records.len());
                    prop_assert_eq!(summary.rows, records.len() * run.remaining.len());
                    prop_assert_eq!(read.len(), records.len());
                    for (exported, record) in read.iter().zip(records) {
                        prop_assert_eq!(exported.outcome_index, record.outcome_index);
                        prop_assert_eq!(&exported.predictions[..], &record.predictions[..]);
                    }
                }
                Err(Error::NoQualifyingScenarios(name)) => {
                    prop_assert_eq!(name, team.clone());
                    prop_assert_eq!(run.report.tally(&team), Some(0));
                    prop_assert!(!path.exists());
                }
                Err(err) => prop_assert!(false, "unexpected error {}", err),
            }
        }
    }
}
