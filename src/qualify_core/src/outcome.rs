use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::ops::Range;
use tracing::debug;

use crate::config::{ModeSelection, SimulationConfig, TiePolicy};
use crate::constants::MAX_ENUMERATION_LIMIT;
use crate::error::{Error, Result};

/// How a single remaining fixture resolves in an outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixtureResult {
    Home,
    Away,
    Tie,
}

impl FixtureResult {
    fn from_digit(digit: u64) -> Self {
        match digit {
            0 => FixtureResult::Home,
            1 => FixtureResult::Away,
            _ => FixtureResult::Tie,
        }
    }
}

/// One complete assignment of results to the remaining fixtures, in schedule order.
///
/// Equality and hashing look at `results` only: two samples that drew the
/// same completion are the same outcome whatever their index.
#[derive(Clone, Debug)]
pub struct Outcome {
    /// Ordinal of this outcome within its source.
    pub index: u64,
    pub results: Vec<FixtureResult>,
}

impl PartialEq for Outcome {
    fn eq(&self, other: &Self) -> bool {
        self.results == other.results
    }
}

impl Eq for Outcome {}

impl Hash for Outcome {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.results.hash(state);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    Exhaustive,
    Sampled,
}

/// A finite, restartable sequence of outcomes addressed by index.
///
/// Every outcome is a pure function of its index, so any sub-range can be
/// generated independently of the rest.
pub trait OutcomeSource: Send + Sync {
    /// Number of outcomes the source yields.
    fn len(&self) -> u64;

    /// The outcome at `index`. `index` must be below [`OutcomeSource::len`].
    fn outcome_at(&self, index: u64) -> Outcome;

    fn mode(&self) -> GenerationMode;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lazily yield every outcome in index order.
    fn outcomes(&self) -> Outcomes<'_, Self>
    where
        Self: Sized,
    {
        Outcomes::new(self, 0..self.len())
    }

    /// Lazily yield the outcomes in `range`, clamped to the source length.
    fn outcomes_in(&self, range: Range<u64>) -> Outcomes<'_, Self>
    where
        Self: Sized,
    {
        let end = range.end.min(self.len());
        Outcomes::new(self, range.start.min(end)..end)
    }
}

/// Iterator over a contiguous index range of an [`OutcomeSource`].
pub struct Outcomes<'a, S: ?Sized> {
    source: &'a S,
    range: Range<u64>,
}

impl<'a, S: OutcomeSource + ?Sized> Outcomes<'a, S> {
    pub fn new(source: &'a S, range: Range<u64>) -> Self {
        Outcomes { source, range }
    }
}

impl<S: OutcomeSource + ?Sized> Iterator for Outcomes<'_, S> {
    type Item = Outcome;

    fn next(&mut self) -> Option<Outcome> {
        let index = self.range.next()?;
        Some(self.source.outcome_at(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

/// Every combination of results, lexicographic over fixture index with
/// Home before Away before Tie. The first fixture is the most significant digit.
#[derive(Clone, Debug)]
pub struct ExhaustiveOutcomes {
    fixtures: usize,
    branches: u64,
    total: u64,
}

impl ExhaustiveOutcomes {
    pub fn new(fixtures: usize, tie_policy: TiePolicy) -> Result<Self> {
        if fixtures > MAX_ENUMERATION_LIMIT {
            return Err(Error::EnumerationOverflow {
                remaining: fixtures,
                limit: MAX_ENUMERATION_LIMIT,
            });
        }
        let branches = tie_policy.branches();
        Ok(ExhaustiveOutcomes {
            fixtures,
            branches,
            total: branches.pow(fixtures as u32),
        })
    }
}

impl OutcomeSource for ExhaustiveOutcomes {
    fn len(&self) -> u64 {
        self.total
    }

    fn outcome_at(&self, index: u64) -> Outcome {
        let mut results = vec![FixtureResult::Home; self.fixtures];
        let mut rest = index;
        for slot in results.iter_mut().rev() {
            *slot = FixtureResult::from_digit(rest % self.branches);
            rest /= self.branches;
        }
        Outcome { index, results }
    }

    fn mode(&self) -> GenerationMode {
        GenerationMode::Exhaustive
    }
}

/// Independent coin-flip completions of the schedule.
///
/// Sample `i` draws from a generator seeded with `seed_offset + i`, so a run
/// is reproducible from the sample count alone.
#[derive(Clone, Debug)]
pub struct SampledOutcomes {
    fixtures: usize,
    samples: u64,
    seed_offset: u64,
    tie_policy: TiePolicy,
}

impl SampledOutcomes {
    pub fn new(
        fixtures: usize,
        samples: u64,
        seed_offset: u64,
        tie_policy: TiePolicy,
    ) -> Result<Self> {
        if samples == 0 {
            return Err(Error::InvalidSimulationCount);
        }
        Ok(SampledOutcomes {
            fixtures,
            // Nothing to sample: the only completion is the empty one.
            samples: if fixtures == 0 { 1 } else { samples },
            seed_offset,
            tie_policy,
        })
    }
}

impl OutcomeSource for SampledOutcomes {
    fn len(&self) -> u64 {
        self.samples
    }

    fn outcome_at(&self, index: u64) -> Outcome {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed_offset.wrapping_add(index));
        let results = (0..self.fixtures)
            .map(|_| match self.tie_policy {
                TiePolicy::Binary => {
                    if rng.gen_bool(0.5) {
                        FixtureResult::Home
                    } else {
                        FixtureResult::Away
                    }
                }
                TiePolicy::IncludeTies => FixtureResult::from_digit(rng.gen_range(0..3)),
            })
            .collect();
        Outcome { index, results }
    }

    fn mode(&self) -> GenerationMode {
        GenerationMode::Sampled
    }
}

/// Either outcome source, chosen from the remaining-match count.
#[derive(Clone, Debug)]
pub enum OutcomeGenerator {
    Exhaustive(ExhaustiveOutcomes),
    Sampled(SampledOutcomes),
}

impl OutcomeGenerator {
    /// Pick the generation strategy for `remaining` fixtures.
    ///
    /// `Auto` enumerates up to the configured limit and samples beyond it.
    /// An explicit `Exhaustive` request past the limit is an `EnumerationOverflow`.
    pub fn select(remaining: usize, config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        let limit = config.enumeration_limit;
        let exhaustive = match config.mode {
            ModeSelection::Auto => remaining <= limit,
            ModeSelection::Exhaustive => {
                if remaining > limit {
                    return Err(Error::EnumerationOverflow { remaining, limit });
                }
                true
            }
            ModeSelection::Sampled => false,
        };

        let generator = if exhaustive {
            OutcomeGenerator::Exhaustive(ExhaustiveOutcomes::new(remaining, config.tie_policy)?)
        } else {
            OutcomeGenerator::Sampled(SampledOutcomes::new(
                remaining,
                config.simulations,
                config.seed_offset,
                config.tie_policy,
            )?)
        };
        debug!(
            remaining,
            limit,
            mode = ?generator.mode(),
            outcomes = generator.len(),
            "selected outcome generator"
        );
        Ok(generator)
    }
}

impl OutcomeSource for OutcomeGenerator {
    fn len(&self) -> u64 {
        match self {
            OutcomeGenerator::Exhaustive(source) => source.len(),
            OutcomeGenerator::Sampled(source) => source.len(),
        }
    }

    fn outcome_at(&self, index: u64) -> Outcome {
        match self {
            OutcomeGenerator::Exhaustive(source) => source.outcome_at(index),
            OutcomeGenerator::Sampled(source) => source.outcome_at(index),
        }
    }

    fn mode(&self) -> GenerationMode {
        match self {
            OutcomeGenerator::Exhaustive(source) => source.mode(),
            OutcomeGenerator::Sampled(source) => source.mode(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::FixtureResult::{Away, Home, Tie};
    use std::collections::HashSet;

    #[test]
    fn test_exhaustive_order() {
        let source = ExhaustiveOutcomes::new(2, TiePolicy::Binary).unwrap();
        let all: Vec<_> = source.outcomes().map(|o| o.results).collect();
        assert_eq!(
            all,
            vec![vec![Home, Home], vec![Home, Away], vec![Away, Home], vec![Away, Away]]
        );
    }

    #[test]
    fn test_exhaustive_counts() {
        let binary = ExhaustiveOutcomes::new(10, TiePolicy::Binary).unwrap();
        assert_eq!(binary.len(), 1024);

        let ties = ExhaustiveOutcomes::new(4, TiePolicy::IncludeTies).unwrap();
        assert_eq!(ties.len(), 81);
        let distinct: HashSet<_> = ties.outcomes().map(|o| o.results).collect();
        assert_eq!(distinct.len(), 81);
        assert_eq!(ties.outcome_at(80).results, vec![Tie, Tie, Tie, Tie]);
    }

    #[test]
    fn test_exhaustive_indices_tagged() {
        let source = ExhaustiveOutcomes::new(3, TiePolicy::Binary).unwrap();
        for (expected, outcome) in source.outcomes().enumerate() {
            assert_eq!(outcome.index, expected as u64);
            assert_eq!(outcome.results.len(), 3);
        }
    }

    #[test]
    fn test_zero_remaining_yields_one_empty_outcome() {
        let exhaustive = ExhaustiveOutcomes::new(0, TiePolicy::Binary).unwrap();
        let all: Vec<_> = exhaustive.outcomes().collect();
        assert_eq!(all.len(), 1);
        assert!(all[0].results.is_empty());

        let sampled = SampledOutcomes::new(0, 500, 0, TiePolicy::Binary).unwrap();
        assert_eq!(sampled.len(), 1);
        assert!(sampled.outcome_at(0).results.is_empty());
    }

    #[test]
    fn test_sampled_reproducible() {
        let source = SampledOutcomes::new(20, 50, 0, TiePolicy::Binary).unwrap();
        let first: Vec<_> = source.outcomes().map(|o| (o.index, o.results)).collect();
        let second: Vec<_> = source.outcomes().map(|o| (o.index, o.results)).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 50);

        // Restartable from any index
        let again = source.outcome_at(17);
        assert_eq!((again.index, again.results), first[17]);
    }

    #[test]
    fn test_outcome_equality_ignores_index() {
        // One fixture, ten draws: some pair must repeat a result
        let source = SampledOutcomes::new(1, 10, 0, TiePolicy::Binary).unwrap();
        let all: Vec<_> = source.outcomes().collect();
        let (a, b) = all
            .iter()
            .enumerate()
            .find_map(|(i, a)| {
                all[i + 1..].iter().find(|b| b.results == a.results).map(|b| (a, b))
            })
            .unwrap();

        assert_ne!(a.index, b.index);
        assert_eq!(a, b);
        let distinct: HashSet<&Outcome> = [a, b].into_iter().collect();
        assert_eq!(distinct.len(), 1);

        let other = Outcome { index: a.index, results: vec![Tie] };
        assert_ne!(*a, other);
    }

    #[test]
    fn test_sampled_seed_offset_changes_samples() {
        let a = SampledOutcomes::new(30, 1, 0, TiePolicy::Binary).unwrap();
        let b = SampledOutcomes::new(30, 1, 1, TiePolicy::Binary).unwrap();
        let shifted = SampledOutcomes::new(30, 2, 0, TiePolicy::Binary).unwrap();
        assert_ne!(a.outcome_at(0).results, b.outcome_at(0).results);
        assert_eq!(b.outcome_at(0).results, shifted.outcome_at(1).results);
    }

    #[test]
    fn test_sampled_is_roughly_fair() {
        let source = SampledOutcomes::new(1, 10_000, 0, TiePolicy::Binary).unwrap();
        let homes = source.outcomes().filter(|o| o.results[0] == Home).count();
        assert!((4_500..=5_500).contains(&homes), "home wins: {}", homes);
    }

    #[test]
    fn test_sampled_rejects_zero_samples() {
        assert!(matches!(
            SampledOutcomes::new(3, 0, 0, TiePolicy::Binary),
            Err(Error::InvalidSimulationCount)
        ));
    }

    #[test]
    fn test_outcomes_in_clamps() {
        let source = ExhaustiveOutcomes::new(2, TiePolicy::Binary).unwrap();
        let tail: Vec<_> = source.outcomes_in(2..10).map(|o| o.index).collect();
        assert_eq!(tail, vec![2, 3]);
        assert_eq!(source.outcomes_in(9..12).count(), 0);
    }

    #[test]
    fn test_select_modes() {
        let config = SimulationConfig::new(10);
        assert_eq!(
            OutcomeGenerator::select(15, &config).unwrap().mode(),
            GenerationMode::Exhaustive
        );
        assert_eq!(
            OutcomeGenerator::select(16, &config).unwrap().mode(),
            GenerationMode::Sampled
        );

        let forced = SimulationConfig {
            mode: ModeSelection::Exhaustive,
            ..config.clone()
        };
        assert!(matches!(
            OutcomeGenerator::select(16, &forced),
            Err(Error::EnumerationOverflow { remaining: 16, limit: 15 })
        ));

        let sampled = SimulationConfig {
            mode: ModeSelection::Sampled,
            simulations: 100,
            ..config
        };
        let generator = OutcomeGenerator::select(3, &sampled).unwrap();
        assert_eq!(generator.mode(), GenerationMode::Sampled);
        assert_eq!(generator.len(), 100);
    }
}
