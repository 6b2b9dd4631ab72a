/// Points awarded to the winner of a match
pub const WIN_POINTS: u32 = 2;

/// Points awarded to each side of a tied match
pub const TIE_POINTS: u32 = 1;

/// Result marker for a tied match, in match sources and scenario exports
pub const TIE_MARKER: &str = "TIE";

/// Separator between home and away team in a fixture label
pub const FIXTURE_SEPARATOR: &str = " vs ";

/// Remaining-match count up to which every outcome is enumerated (2^15 = 32,768)
pub const DEFAULT_ENUMERATION_LIMIT: usize = 15;

/// Largest enumeration limit accepted; 3^40 still fits an outcome index
pub const MAX_ENUMERATION_LIMIT: usize = 40;

/// Monte Carlo sample count used when the schedule is too large to enumerate
pub const DEFAULT_SIMULATIONS: u64 = 50_000;

/// Qualifying threshold used when none is configured
pub const DEFAULT_QUALIFYING_POINTS: u32 = 16;

/// Minimum share of real results a scenario must have predicted to count as compatible
pub const DEFAULT_COMPATIBILITY_PERCENT: f64 = 95.0;

/// Scenario export header
pub const EXPORT_HEADER: [&str; 3] = ["Simulation Number", "Match", "Winner"];

/// Whether a result string denotes a tie.
pub fn is_tie_marker(result: &str) -> bool {
    result.trim().eq_ignore_ascii_case(TIE_MARKER)
}
