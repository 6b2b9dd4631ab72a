use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Match {home} vs {away} names unknown result team: {result}")]
    UnknownTeamResult {
        home: String,
        away: String,
        result: String,
    },

    #[error("No remaining matches; current standings are final")]
    EmptySchedule,

    #[error("Invalid qualifying threshold {threshold} (must be between 1 and {ceiling})")]
    InvalidThreshold { threshold: u32, ceiling: u32 },

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("No qualifying scenarios found for {0}")]
    NoQualifyingScenarios(String),

    #[error("Scenario records were not retained for this run")]
    ScenariosNotRetained,

    #[error("{remaining} remaining matches exceed the enumeration limit of {limit}; use sampling")]
    EnumerationOverflow { remaining: usize, limit: usize },

    #[error("Invalid enumeration limit {0}")]
    InvalidEnumerationLimit(usize),

    #[error("Simulation count must be positive")]
    InvalidSimulationCount,

    #[error("Run cancelled after {considered} outcomes")]
    Cancelled { considered: u64 },

    #[error("Malformed scenario export {path}: {reason}")]
    MalformedExport { path: PathBuf, reason: String },

    #[error("Failed to read or write file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read or write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read or write JSON: {0}")]
    Json(#[from] serde_json::Error),
}
