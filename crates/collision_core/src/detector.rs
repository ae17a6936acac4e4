//! Collision and cluster-match detection between a disclosure and a trace.

use crate::codes::SliceCodeStream;
use crate::receiver::ReceptionTrace;

/// How many collisions a window of slices needs before it counts as a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterRule {
    /// Inclusive threshold of collisions inside the window.
    pub matches_needed: usize,
    /// Window width in slices.
    pub cluster_slices: usize,
}

impl ClusterRule {
    pub fn new(matches_needed: usize, cluster_slices: usize) -> Self {
        Self {
            matches_needed,
            cluster_slices,
        }
    }
}

/// Collisions and matches found for one disclosure/receiver pair, or summed
/// over many.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionCount {
    pub collisions: u64,
    pub matches: u64,
}

impl std::ops::AddAssign for CollisionCount {
    fn add_assign(&mut self, other: Self) {
        self.collisions += other.collisions;
        self.matches += other.matches;
    }
}

impl std::iter::Sum for CollisionCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut total, count| {
            total += count;
            total
        })
    }
}

/// Whether the window starting at `start_index` holds at least
/// `rule.matches_needed` collisions. The window is clipped to the disclosure.
pub fn is_cluster_match(
    disclosure: &SliceCodeStream,
    trace: &ReceptionTrace,
    rule: ClusterRule,
    start_index: usize,
) -> bool {
    let end_index = start_index
        .saturating_add(rule.cluster_slices)
        .min(disclosure.len());

    let collisions: usize = (start_index..end_index)
        .map(|slice_index| trace.occurrences_at(slice_index, disclosure.codes()[slice_index]))
        .sum();

    collisions >= rule.matches_needed
}

/// Count every collision between `disclosure` and `trace`, and every
/// collision whose window starting at its slice is a cluster match.
///
/// Each received copy of a colliding code is evaluated on its own, so a
/// burst of consecutive collisions can produce several matches.
pub fn count_collisions(
    disclosure: &SliceCodeStream,
    trace: &ReceptionTrace,
    rule: ClusterRule,
) -> CollisionCount {
    let mut count = CollisionCount::default();

    for (slice_index, &code) in disclosure.codes().iter().enumerate() {
        let occurrences = trace.occurrences_at(slice_index, code);
        if occurrences == 0 {
            continue;
        }

        count.collisions += occurrences as u64;
        if is_cluster_match(disclosure, trace, rule, slice_index) {
            count.matches += occurrences as u64;
        }
    }

    count
}

/// Sum of [`count_collisions`] over a whole receiver population.
pub fn count_population_collisions(
    disclosure: &SliceCodeStream,
    population: &[ReceptionTrace],
    rule: ClusterRule,
) -> CollisionCount {
    population
        .iter()
        .map(|trace| count_collisions(disclosure, trace, rule))
        .sum()
}
