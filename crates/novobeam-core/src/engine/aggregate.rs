use super::beam::{ScoredSequence, Termination};
use itertools::Itertools;
use std::cmp::Ordering;
use tracing::trace;

/// Ranking wrapper: better sequences compare as smaller.
#[derive(Debug, Clone)]
struct Ranked(ScoredSequence);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .total_log_probability
            .total_cmp(&self.0.total_log_probability)
            .then_with(|| self.0.step_count().cmp(&other.0.step_count()))
            .then_with(|| self.0.tokens.cmp(&other.0.tokens))
    }
}

/// Collects terminated beams and returns the best distinct sequences.
#[derive(Debug, Clone)]
pub struct SequenceAggregator {
    capacity: usize,
    include_truncated: bool,
    candidates: Vec<ScoredSequence>,
}

impl SequenceAggregator {
    pub fn new(capacity: usize, include_truncated: bool) -> Self {
        Self {
            capacity,
            include_truncated,
            candidates: Vec::new(),
        }
    }

    pub fn push(&mut self, sequence: ScoredSequence) {
        if !self.include_truncated && sequence.termination == Termination::Truncated {
            trace!("Dropping truncated sequence {:?}", sequence.sequence);
            return;
        }
        self.candidates.push(sequence);
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Best first; identical token sequences keep only their best score.
    pub fn into_ranked(self) -> Vec<ScoredSequence> {
        self.candidates
            .into_iter()
            .map(Ranked)
            .sorted()
            .unique_by(|ranked| ranked.0.tokens.clone())
            .take(self.capacity)
            .map(|ranked| ranked.0)
            .collect()
    }
}

impl Extend<ScoredSequence> for SequenceAggregator {
    fn extend<I: IntoIterator<Item = ScoredSequence>>(&mut self, iter: I) {
        for sequence in iter {
            self.push(sequence);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(tokens: &[usize], steps: &[f64], termination: Termination) -> ScoredSequence {
        ScoredSequence {
            tokens: tokens.to_vec(),
            sequence: tokens.iter().map(|t| t.to_string()).collect(),
            total_log_probability: steps.iter().sum(),
            token_log_probabilities: steps.to_vec(),
            termination,
            residue_mass: 0,
            precursor_match: false,
        }
    }

    #[test]
    fn ranks_by_log_probability_descending() {
        let mut aggregator = SequenceAggregator::new(10, true);
        aggregator.push(sequence(&[3], &[-2.0], Termination::Truncated));
        aggregator.push(sequence(&[4], &[-0.5, 0.0], Termination::EndOfSequence));
        aggregator.push(sequence(&[5], &[-1.0], Termination::Truncated));

        let ranked = aggregator.into_ranked();
        let scores: Vec<f64> = ranked.iter().map(|s| s.total_log_probability).collect();
        assert_eq!(scores, vec![-0.5, -1.0, -2.0]);
    }

    #[test]
    fn ties_prefer_shorter_sequences() {
        let mut aggregator = SequenceAggregator::new(10, true);
        aggregator.push(sequence(&[3, 3], &[-0.5, -0.5], Termination::Truncated));
        aggregator.push(sequence(&[4], &[-1.0], Termination::Truncated));

        let ranked = aggregator.into_ranked();
        assert_eq!(ranked[0].tokens, vec![4]);
    }

    #[test]
    fn truncated_sequences_can_be_excluded() {
        let mut aggregator = SequenceAggregator::new(10, false);
        aggregator.push(sequence(&[3], &[-0.1], Termination::Truncated));
        aggregator.push(sequence(&[4], &[-3.0, -0.1], Termination::EndOfSequence));
        assert_eq!(aggregator.len(), 1);

        let ranked = aggregator.into_ranked();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].termination, Termination::EndOfSequence);
    }

    #[test]
    fn duplicates_keep_the_higher_score() {
        let mut aggregator = SequenceAggregator::new(10, true);
        aggregator.extend([
            sequence(&[3, 4], &[-2.0, -2.0], Termination::Truncated),
            sequence(&[3, 4], &[-1.0, -1.0, -0.5], Termination::EndOfSequence),
        ]);

        let ranked = aggregator.into_ranked();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].total_log_probability, -2.5);
    }

    #[test]
    fn capacity_limits_results_and_empty_input_is_fine() {
        let mut aggregator = SequenceAggregator::new(2, true);
        for t in 3..8 {
            aggregator.push(sequence(&[t], &[-(t as f64)], Termination::Truncated));
        }
        assert_eq!(aggregator.into_ranked().len(), 2);

        let empty = SequenceAggregator::new(5, true);
        assert!(empty.is_empty());
        assert!(empty.into_ranked().is_empty());
    }
}
