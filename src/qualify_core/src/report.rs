use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::HashMap;

use crate::outcome::GenerationMode;

/// Per-team qualification counts over every outcome a run considered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualificationReport {
    pub threshold: u32,
    pub mode: GenerationMode,
    /// 2^R (or 3^R) for exhaustive runs, N for sampled runs.
    pub total_outcomes: u64,
    pub tallies: HashMap<String, u64>,
}

/// One line of the report table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualificationRow {
    pub team: String,
    pub qualified: u64,
    /// Percentage rounded to two decimals
    pub percentage: f64,
}

impl QualificationReport {
    pub fn tally(&self, team: &str) -> Option<u64> {
        self.tallies.get(team).copied()
    }

    /// Share of outcomes in which `team` qualified, 0 to 100.
    pub fn percentage(&self, team: &str) -> Option<f64> {
        let count = self.tally(team)?;
        if self.total_outcomes == 0 {
            return Some(0.0);
        }
        Some(100.0 * count as f64 / self.total_outcomes as f64)
    }

    /// Rounded percentages for every team.
    pub fn percentages(&self) -> HashMap<String, f64> {
        self.tallies
            .iter()
            .map(|(team, _)| (team.clone(), round2(self.percentage(team).unwrap_or(0.0))))
            .collect()
    }

    /// Report rows, highest percentage first and ties broken by team name.
    pub fn rows(&self) -> Vec<QualificationRow> {
        let mut rows: Vec<QualificationRow> = self
            .tallies
            .iter()
            .map(|(team, &qualified)| QualificationRow {
                team: team.clone(),
                qualified,
                percentage: round2(self.percentage(team).unwrap_or(0.0)),
            })
            .collect();
        rows.sort_by(|a, b| b.qualified.cmp(&a.qualified).then_with(|| a.team.cmp(&b.team)));
        rows
    }

    /// Wilson score interval for a team's percentage at confidence `level` (e.g. 0.95).
    ///
    /// Exhaustive runs are exact, so their interval has zero width.
    pub fn confidence_interval(&self, team: &str, level: f64) -> Option<(f64, f64)> {
        if !(level > 0.0 && level < 1.0) {
            return None;
        }
        let percentage = self.percentage(team)?;
        if self.mode == GenerationMode::Exhaustive || self.total_outcomes == 0 {
            return Some((percentage, percentage));
        }

        let normal = Normal::new(0.0, 1.0).ok()?;
        let z = normal.inverse_cdf(1.0 - (1.0 - level) / 2.0);
        let n = self.total_outcomes as f64;
        let p = percentage / 100.0;

        let z2 = z * z;
        let denom = 1.0 + z2 / n;
        let center = (p + z2 / (2.0 * n)) / denom;
        let half = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denom;

        Some((
            100.0 * (center - half).max(0.0),
            100.0 * (center + half).min(1.0),
        ))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
