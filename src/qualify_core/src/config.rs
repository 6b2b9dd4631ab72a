use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::constants::{
    DEFAULT_ENUMERATION_LIMIT, DEFAULT_QUALIFYING_POINTS, DEFAULT_SIMULATIONS,
    MAX_ENUMERATION_LIMIT,
};
use crate::error::{Error, Result};

/// How remaining fixtures may resolve.
///
/// Completed ties always award a point to each side; this only controls
/// whether projected outcomes include a tie branch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiePolicy {
    /// Every remaining fixture is won by home or away (2^R outcomes).
    #[default]
    Binary,
    /// Remaining fixtures may also end tied (3^R outcomes).
    IncludeTies,
}

impl TiePolicy {
    /// Number of results a single fixture can take.
    pub fn branches(self) -> u64 {
        match self {
            TiePolicy::Binary => 2,
            TiePolicy::IncludeTies => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSelection {
    /// Enumerate when the remaining count is within the limit, sample otherwise.
    #[default]
    Auto,
    Exhaustive,
    Sampled,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub qualifying_points: u32,
    pub enumeration_limit: usize,
    pub simulations: u64,
    /// Sample `i` is seeded with `seed_offset + i`.
    pub seed_offset: u64,
    pub tie_policy: TiePolicy,
    pub mode: ModeSelection,
    /// Keep per-team scenario records for export.
    pub retain_scenarios: bool,
    /// Spread the outcome index space across the rayon pool.
    pub parallel: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            qualifying_points: DEFAULT_QUALIFYING_POINTS,
            enumeration_limit: DEFAULT_ENUMERATION_LIMIT,
            simulations: DEFAULT_SIMULATIONS,
            seed_offset: 0,
            tie_policy: TiePolicy::Binary,
            mode: ModeSelection::Auto,
            retain_scenarios: true,
            parallel: false,
        }
    }
}

impl SimulationConfig {
    pub fn new(qualifying_points: u32) -> Self {
        SimulationConfig {
            qualifying_points,
            ..Default::default()
        }
    }

    /// Read a configuration from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: SimulationConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.simulations == 0 {
            return Err(Error::InvalidSimulationCount);
        }
        if self.enumeration_limit > MAX_ENUMERATION_LIMIT {
            return Err(Error::InvalidEnumerationLimit(self.enumeration_limit));
        }
        Ok(())
    }
}
