use super::aggregate::SequenceAggregator;
use super::beam::{Beam, ScoredSequence};
use super::cancel::CancellationToken;
use super::config::DecodingConfig;
use super::error::EngineError;
use crate::core::knapsack::Knapsack;
use crate::core::precursor::{Precursor, PrecursorWindow};
use crate::core::residues::{ControlToken, ResidueSet};
use crate::core::scoring::{Scorer, ScorerError};
use std::cmp::Ordering;
use tracing::{debug, instrument, trace};

#[derive(Debug, Clone, Copy)]
struct MassFilter<'a> {
    knapsack: &'a Knapsack,
    window: PrecursorWindow,
}

impl MassFilter<'_> {
    fn admits_residue(&self, mass: i64) -> bool {
        !self.window.exceeded_by(mass)
            && self
                .knapsack
                .feasible_remaining(mass, self.window.target, self.window.tolerance)
    }

    fn admits_end(&self, mass: i64) -> bool {
        self.window.contains(mass)
    }
}

#[derive(Debug, Clone, Copy)]
enum Expansion {
    Carry,
    DeadEnd,
    Residue {
        token: usize,
        log_probability: f64,
        mass: i64,
    },
    End {
        token: usize,
        log_probability: f64,
    },
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    parent: usize,
    score: f64,
    steps: usize,
    expansion: Expansion,
}

impl Candidate {
    fn unchanged(parent: usize, beam: &Beam, expansion: Expansion) -> Self {
        Self {
            parent,
            score: beam.log_probability,
            steps: beam.step_count(),
            expansion,
        }
    }

    fn token(&self) -> Option<usize> {
        match self.expansion {
            Expansion::Carry | Expansion::DeadEnd => None,
            Expansion::Residue { token, .. } | Expansion::End { token, .. } => Some(token),
        }
    }

    /// Total order: score descending, then fewer steps, parent index, token index.
    fn rank(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.steps.cmp(&other.steps))
            .then_with(|| self.parent.cmp(&other.parent))
            .then_with(|| self.token().cmp(&other.token()))
    }

    fn materialize(&self, beams: &[Beam]) -> Beam {
        let parent = &beams[self.parent];
        match self.expansion {
            Expansion::Carry => parent.clone(),
            Expansion::DeadEnd => parent.clone().truncate(),
            Expansion::Residue {
                token,
                log_probability,
                mass,
            } => parent.extend(token, log_probability, mass),
            Expansion::End {
                log_probability, ..
            } => parent.end(log_probability),
        }
    }
}

/// Mass-constrained beam search over an external [`Scorer`].
///
/// The engine holds only shared references, so one instance can serve many
/// spectra concurrently. Greedy decoding is the `beam_size = 1` case.
pub struct BeamSearch<'a, S: Scorer> {
    scorer: &'a S,
    residues: &'a ResidueSet,
    knapsack: Option<&'a Knapsack>,
    config: &'a DecodingConfig,
}

impl<'a, S: Scorer> BeamSearch<'a, S> {
    /// Validates the configuration and the knapsack before any scorer call.
    pub fn new(
        scorer: &'a S,
        residues: &'a ResidueSet,
        knapsack: Option<&'a Knapsack>,
        config: &'a DecodingConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        if config.use_mass_filter && knapsack.is_none() {
            return Err(EngineError::InvalidConfiguration(
                "the mass filter requires a knapsack".to_string(),
            ));
        }
        if let Some(knapsack) = knapsack {
            knapsack.check_compatible(residues)?;
        }
        debug!(
            mode = %config.mode(),
            beam_size = config.beam_size,
            max_length = config.max_length,
            "Beam search engine ready."
        );
        Ok(Self {
            scorer,
            residues,
            knapsack,
            config,
        })
    }

    pub fn config(&self) -> &DecodingConfig {
        self.config
    }

    pub fn residues(&self) -> &ResidueSet {
        self.residues
    }

    /// Decodes one spectrum into at most `min(beam_size, num_results)` ranked sequences.
    #[instrument(skip_all, name = "decode", fields(mz = precursor.mz, charge = precursor.charge))]
    pub fn decode(
        &self,
        spectrum: &S::Spectrum,
        precursor: &Precursor,
        cancel: &CancellationToken,
    ) -> Result<Vec<ScoredSequence>, EngineError> {
        let window = precursor.window(self.residues, self.config.precursor_tolerance)?;
        let filter = self.mass_filter(window)?;

        let mut beams = vec![Beam::root()];
        let mut step = 0;
        while step < self.config.max_length && beams.iter().any(Beam::is_active) {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled { steps: step });
            }
            beams = self.step(spectrum, precursor, &beams, filter.as_ref(), step)?;
            trace!(step, beams = beams.len(), "Search step complete.");
            step += 1;
        }

        let mut aggregator =
            SequenceAggregator::new(self.config.result_limit(), self.config.include_truncated);
        aggregator.extend(
            beams
                .into_iter()
                .map(|beam| beam.truncate().into_scored(self.residues, &window)),
        );
        let results = aggregator.into_ranked();
        debug!(steps = step, results = results.len(), "Decoding finished.");
        Ok(results)
    }

    fn mass_filter(&self, window: PrecursorWindow) -> Result<Option<MassFilter<'a>>, EngineError> {
        if !self.config.use_mass_filter {
            return Ok(None);
        }
        let knapsack = self.knapsack.ok_or_else(|| {
            EngineError::InvalidConfiguration("the mass filter requires a knapsack".to_string())
        })?;
        if window.upper() > knapsack.max_mass() {
            return Err(EngineError::InvalidConfiguration(format!(
                "precursor window upper bound {} exceeds the knapsack maximum mass {}",
                window.upper(),
                knapsack.max_mass()
            )));
        }
        Ok(Some(MassFilter { knapsack, window }))
    }

    fn step(
        &self,
        spectrum: &S::Spectrum,
        precursor: &Precursor,
        beams: &[Beam],
        filter: Option<&MassFilter<'_>>,
        step: usize,
    ) -> Result<Vec<Beam>, EngineError> {
        let active: Vec<usize> = beams
            .iter()
            .enumerate()
            .filter(|(_, beam)| beam.is_active())
            .map(|(i, _)| i)
            .collect();
        let prefixes: Vec<&[usize]> = active.iter().map(|&i| beams[i].tokens.as_slice()).collect();

        let distributions = self.scorer.score_batch(spectrum, precursor, &prefixes)?;
        if distributions.len() != prefixes.len() {
            return Err(ScorerError::new(format!(
                "returned {} distributions for {} prefixes",
                distributions.len(),
                prefixes.len()
            ))
            .into());
        }

        let mut candidates: Vec<Candidate> = beams
            .iter()
            .enumerate()
            .filter(|(_, beam)| !beam.is_active())
            .map(|(parent, beam)| Candidate::unchanged(parent, beam, Expansion::Carry))
            .collect();

        let vocab_size = self.residues.vocab_size();
        for (&parent, distribution) in active.iter().zip(&distributions) {
            if distribution.len() != vocab_size {
                return Err(ScorerError::new(format!(
                    "distribution has {} entries, vocabulary has {vocab_size}",
                    distribution.len()
                ))
                .into());
            }
            let beam = &beams[parent];
            let before = candidates.len();
            self.expand(parent, beam, distribution, filter, step, &mut candidates)?;
            if candidates.len() == before {
                trace!(parent, "Beam has no admissible extension.");
                candidates.push(Candidate::unchanged(parent, beam, Expansion::DeadEnd));
            }
        }

        candidates.sort_unstable_by(|a, b| a.rank(b));
        candidates.truncate(self.config.beam_size);
        Ok(candidates.iter().map(|c| c.materialize(beams)).collect())
    }

    fn expand(
        &self,
        parent: usize,
        beam: &Beam,
        distribution: &[f64],
        filter: Option<&MassFilter<'_>>,
        step: usize,
        candidates: &mut Vec<Candidate>,
    ) -> Result<(), EngineError> {
        let eos = ControlToken::End.index();
        let steps = beam.step_count() + 1;
        for (token, &log_probability) in distribution.iter().enumerate() {
            if !log_probability.is_finite() {
                continue;
            }
            let score = beam.log_probability + log_probability;
            let expansion = if token == eos {
                if filter.is_some_and(|f| !f.admits_end(beam.mass)) {
                    continue;
                }
                Expansion::End {
                    token,
                    log_probability,
                }
            } else if let Some(residue_mass) = self.residues.scaled_mass(token) {
                let mass = beam
                    .mass
                    .checked_add(residue_mass)
                    .ok_or(EngineError::MassOverflow { step })?;
                if filter.is_some_and(|f| !f.admits_residue(mass)) {
                    continue;
                }
                Expansion::Residue {
                    token,
                    log_probability,
                    mass,
                }
            } else {
                continue;
            };
            candidates.push(Candidate {
                parent,
                score,
                steps,
                expansion,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::precursor::MassTolerance;
    use crate::core::residues::masses::{H2O_MASS, PROTON_MASS_AMU};
    use crate::core::scoring::{PositionalScorer, StepDistributions, log_probabilities_from};
    use crate::engine::beam::Termination;
    use crate::engine::config::{DecodingConfigBuilder, DecodingMode};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    const G: usize = 3;
    const A: usize = 4;
    const EOS: usize = 2;

    fn residues() -> ResidueSet {
        ResidueSet::from_symbols(&["G", "A"], 100).unwrap()
    }

    fn any_precursor() -> Precursor {
        Precursor::new(500.0, 2).unwrap()
    }

    /// Precursor whose residue mass is exactly G + A.
    fn glycine_alanine_precursor() -> Precursor {
        Precursor::new(57.021464 + 71.037114 + H2O_MASS + PROTON_MASS_AMU, 1).unwrap()
    }

    fn config(beam_size: usize, max_length: usize) -> DecodingConfig {
        DecodingConfigBuilder::new()
            .beam_size(beam_size)
            .max_length(max_length)
            .precursor_tolerance(MassTolerance::Da(0.02))
            .build()
            .unwrap()
    }

    /// Prefix-dependent scorer; unknown prefixes have no finite entry.
    struct TableScorer {
        vocab_size: usize,
        table: HashMap<Vec<usize>, Vec<f64>>,
    }

    impl TableScorer {
        fn new(vocab_size: usize, entries: &[(&[usize], &[(usize, f64)])]) -> Self {
            let table = entries
                .iter()
                .map(|(prefix, probabilities)| {
                    let mut row = vec![0.0; vocab_size];
                    for &(token, p) in probabilities.iter() {
                        row[token] = p;
                    }
                    (prefix.to_vec(), log_probabilities_from(&row))
                })
                .collect();
            Self { vocab_size, table }
        }
    }

    impl Scorer for TableScorer {
        type Spectrum = ();

        fn score_next(
            &self,
            _spectrum: &(),
            _precursor: &Precursor,
            prefix: &[usize],
        ) -> Result<Vec<f64>, ScorerError> {
            Ok(self
                .table
                .get(prefix)
                .cloned()
                .unwrap_or_else(|| vec![f64::NEG_INFINITY; self.vocab_size]))
        }
    }

    struct CountingScorer {
        calls: AtomicUsize,
    }

    impl Scorer for CountingScorer {
        type Spectrum = ();

        fn score_next(
            &self,
            _spectrum: &(),
            _precursor: &Precursor,
            _prefix: &[usize],
        ) -> Result<Vec<f64>, ScorerError> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(vec![0.0; 5])
        }
    }

    struct FailingScorer;

    impl Scorer for FailingScorer {
        type Spectrum = ();

        fn score_next(
            &self,
            _spectrum: &(),
            _precursor: &Precursor,
            _prefix: &[usize],
        ) -> Result<Vec<f64>, ScorerError> {
            Err(ScorerError::new("accelerator unavailable"))
        }
    }

    fn greedy_trap() -> TableScorer {
        TableScorer::new(
            5,
            &[
                (&[], &[(G, 0.6), (A, 0.4)]),
                (&[G], &[(EOS, 0.1), (G, 0.45), (A, 0.45)]),
                (&[A], &[(EOS, 0.9), (G, 0.05), (A, 0.05)]),
            ],
        )
    }

    fn decode_with<S: Scorer>(
        scorer: &S,
        spectrum: &S::Spectrum,
        knapsack: Option<&Knapsack>,
        config: &DecodingConfig,
        precursor: &Precursor,
    ) -> Result<Vec<ScoredSequence>, EngineError> {
        let residues = residues();
        BeamSearch::new(scorer, &residues, knapsack, config)?.decode(
            spectrum,
            precursor,
            &CancellationToken::new(),
        )
    }

    #[test]
    fn greedy_decoding_is_deterministic() {
        let steps = StepDistributions::from_probabilities(
            vec![
                vec![0.0, 0.0, 0.1, 0.6, 0.3],
                vec![0.0, 0.0, 0.2, 0.5, 0.3],
                vec![0.0, 0.0, 0.9, 0.05, 0.05],
            ],
            5,
        )
        .unwrap();
        let scorer = PositionalScorer::new(5);
        let greedy = DecodingConfigBuilder::new()
            .mode(DecodingMode::Greedy)
            .max_length(10)
            .build()
            .unwrap();

        let first = decode_with(&scorer, &steps, None, &greedy, &any_precursor()).unwrap();
        let second = decode_with(&scorer, &steps, None, &greedy, &any_precursor()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].peptide(), "GG");
        assert_eq!(first[0].termination, Termination::EndOfSequence);
        assert_eq!(first[0].step_count(), 3);
    }

    #[test]
    fn beam_of_width_one_matches_greedy_mode() {
        let scorer = greedy_trap();
        let greedy = DecodingConfigBuilder::new()
            .mode(DecodingMode::Greedy)
            .max_length(2)
            .build()
            .unwrap();
        let beam = DecodingConfigBuilder::new()
            .mode(DecodingMode::Beam)
            .beam_size(1)
            .max_length(2)
            .build()
            .unwrap();

        let a = decode_with(&scorer, &(), None, &greedy, &any_precursor()).unwrap();
        let b = decode_with(&scorer, &(), None, &beam, &any_precursor()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wider_beams_never_lower_the_best_score() {
        let scorer = greedy_trap();
        let mut previous = f64::NEG_INFINITY;
        for k in 1..=4 {
            let results = decode_with(&scorer, &(), None, &config(k, 2), &any_precursor()).unwrap();
            let best = results[0].total_log_probability;
            assert!(best >= previous, "k = {k}: {best} < {previous}");
            previous = best;
        }

        let greedy = decode_with(&scorer, &(), None, &config(1, 2), &any_precursor()).unwrap();
        assert_eq!(greedy[0].tokens, vec![G, G]);
        assert_eq!(greedy[0].termination, Termination::Truncated);

        let wide = decode_with(&scorer, &(), None, &config(2, 2), &any_precursor()).unwrap();
        assert_eq!(wide[0].peptide(), "A");
        assert_eq!(wide[0].termination, Termination::EndOfSequence);
        assert!((wide[0].total_log_probability - 0.36f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn ranking_is_global_across_parents() {
        let scorer = greedy_trap();
        let results = decode_with(&scorer, &(), None, &config(3, 2), &any_precursor()).unwrap();
        let peptides: Vec<String> = results.iter().map(ScoredSequence::peptide).collect();
        // A+EOS (0.36) beats both children of G (0.27 each); G before A on ties.
        assert_eq!(peptides, vec!["A", "GG", "GA"]);
    }

    #[test]
    fn mass_filter_keeps_the_best_feasible_sequence() {
        let scorer = TableScorer::new(
            5,
            &[
                (&[], &[(G, 0.7), (A, 0.3)]),
                (&[G], &[(G, 0.6), (A, 0.4)]),
                (&[A], &[(G, 0.5), (A, 0.5)]),
                (&[G, G], &[(EOS, 1.0)]),
                (&[G, A], &[(EOS, 1.0)]),
                (&[A, G], &[(EOS, 1.0)]),
            ],
        );
        let precursor = glycine_alanine_precursor();
        let knapsack = Knapsack::for_residues(&residues(), 300.0, 1000.0).unwrap();

        let unfiltered = decode_with(&scorer, &(), None, &config(2, 4), &precursor).unwrap();
        assert_eq!(unfiltered[0].peptide(), "GG");
        assert!(!unfiltered[0].precursor_match);

        let filtered_config = DecodingConfig {
            use_mass_filter: true,
            ..config(2, 4)
        };
        let filtered =
            decode_with(&scorer, &(), Some(&knapsack), &filtered_config, &precursor).unwrap();
        assert_eq!(filtered[0].peptide(), "GA");
        assert_eq!(filtered[0].termination, Termination::EndOfSequence);
        assert_eq!(filtered[0].residue_mass, 12_806);
        assert!(filtered.iter().all(|s| s.precursor_match));
        assert!((filtered[0].total_log_probability - 0.28f64.ln()).abs() < 1e-12);
        assert!(filtered.len() <= unfiltered.len());
    }

    #[test]
    fn immediate_eos_yields_a_single_one_step_sequence() {
        let steps = StepDistributions::from_probabilities(vec![vec![0.0, 0.0, 1.0, 0.0, 0.0]], 5)
            .unwrap();
        let results =
            decode_with(&PositionalScorer::new(5), &steps, None, &config(3, 5), &any_precursor())
                .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].step_count(), 1);
        assert!(results[0].tokens.is_empty());
        assert_eq!(results[0].termination, Termination::EndOfSequence);
    }

    #[test]
    fn max_length_truncates_active_beams() {
        let steps =
            StepDistributions::from_probabilities(vec![vec![0.0, 0.0, 0.0, 1.0, 0.0]; 10], 5)
                .unwrap();
        let results =
            decode_with(&PositionalScorer::new(5), &steps, None, &config(2, 3), &any_precursor())
                .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tokens, vec![G, G, G]);
        assert_eq!(results[0].termination, Termination::Truncated);
    }

    #[test]
    fn dead_ends_are_truncated_and_can_be_excluded() {
        let steps = StepDistributions::from_probabilities(vec![vec![0.0, 0.0, 0.0, 1.0, 0.0]], 5)
            .unwrap();
        let scorer = PositionalScorer::new(5);

        let kept = decode_with(&scorer, &steps, None, &config(2, 5), &any_precursor()).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].tokens, vec![G]);
        assert_eq!(kept[0].termination, Termination::Truncated);

        let excluded = DecodingConfig {
            include_truncated: false,
            ..config(2, 5)
        };
        let results = decode_with(&scorer, &steps, None, &excluded, &any_precursor()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn invalid_configuration_fails_before_scoring() {
        let scorer = CountingScorer {
            calls: AtomicUsize::new(0),
        };
        let residues = residues();

        let zero_beam = DecodingConfig {
            beam_size: 0,
            ..config(2, 5)
        };
        assert!(matches!(
            BeamSearch::new(&scorer, &residues, None, &zero_beam),
            Err(EngineError::InvalidConfiguration(_))
        ));

        let filter_without_knapsack = DecodingConfig {
            use_mass_filter: true,
            ..config(2, 5)
        };
        assert!(matches!(
            BeamSearch::new(&scorer, &residues, None, &filter_without_knapsack),
            Err(EngineError::InvalidConfiguration(_))
        ));

        assert_eq!(scorer.calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn mismatched_knapsack_is_rejected() {
        let other = ResidueSet::from_symbols(&["G", "S"], 100).unwrap();
        let knapsack = Knapsack::for_residues(&other, 300.0, 1000.0).unwrap();
        let residues = residues();
        let config = config(2, 5);
        assert!(matches!(
            BeamSearch::new(&FailingScorer, &residues, Some(&knapsack), &config),
            Err(EngineError::KnapsackMismatch(_))
        ));
    }

    #[test]
    fn window_beyond_knapsack_bound_fails_the_item() {
        let knapsack = Knapsack::for_residues(&residues(), 100.0, 1000.0).unwrap();
        let config = DecodingConfig {
            use_mass_filter: true,
            ..config(2, 5)
        };
        let scorer = CountingScorer {
            calls: AtomicUsize::new(0),
        };
        let result = decode_with(
            &scorer,
            &(),
            Some(&knapsack),
            &config,
            &glycine_alanine_precursor(),
        );
        assert!(matches!(result, Err(EngineError::InvalidConfiguration(_))));
        assert_eq!(scorer.calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn precursors_beyond_the_mass_lattice_fail_the_item() {
        let knapsack = Knapsack::for_residues(&residues(), 300.0, 1000.0).unwrap();
        let scorer = CountingScorer {
            calls: AtomicUsize::new(0),
        };
        let wide = DecodingConfig {
            use_mass_filter: true,
            precursor_tolerance: MassTolerance::Da(1e300),
            ..config(2, 5)
        };
        let result = decode_with(
            &scorer,
            &(),
            Some(&knapsack),
            &wide,
            &Precursor::new(100.0, 1).unwrap(),
        );
        assert!(matches!(result, Err(EngineError::Precursor(_))));

        let narrow = DecodingConfig {
            use_mass_filter: true,
            precursor_tolerance: MassTolerance::Ppm(50.0),
            ..config(2, 5)
        };
        let result = decode_with(
            &scorer,
            &(),
            Some(&knapsack),
            &narrow,
            &Precursor::new(1e300, 1).unwrap(),
        );
        assert!(matches!(result, Err(EngineError::Precursor(_))));
        assert_eq!(scorer.calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn scorer_failures_propagate() {
        let result = decode_with(&FailingScorer, &(), None, &config(2, 5), &any_precursor());
        match result {
            Err(EngineError::Scorer { source }) => {
                assert_eq!(source.message(), "accelerator unavailable")
            }
            other => panic!("expected scorer failure, got {other:?}"),
        }
    }

    #[test]
    fn wrong_distribution_length_is_a_scorer_failure() {
        let steps = StepDistributions::from_log_probabilities(vec![vec![0.0; 4]], 4).unwrap();
        let result =
            decode_with(&PositionalScorer::new(4), &steps, None, &config(2, 5), &any_precursor());
        assert!(matches!(result, Err(EngineError::Scorer { .. })));
    }

    #[test]
    fn cancellation_is_checked_before_each_step() {
        let scorer = CountingScorer {
            calls: AtomicUsize::new(0),
        };
        let residues = residues();
        let config = config(2, 5);
        let engine = BeamSearch::new(&scorer, &residues, None, &config).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = engine.decode(&(), &any_precursor(), &cancel);
        assert!(matches!(result, Err(EngineError::Cancelled { steps: 0 })));
        assert_eq!(scorer.calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn cancellation_during_a_decode_stops_at_the_next_step() {
        struct CancellingScorer {
            cancel: CancellationToken,
        }

        impl Scorer for CancellingScorer {
            type Spectrum = ();

            fn score_next(
                &self,
                _spectrum: &(),
                _precursor: &Precursor,
                _prefix: &[usize],
            ) -> Result<Vec<f64>, ScorerError> {
                self.cancel.cancel();
                Ok(vec![f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY, 0.0, -1.0])
            }
        }

        let cancel = CancellationToken::new();
        let scorer = CancellingScorer {
            cancel: cancel.clone(),
        };
        let residues = residues();
        let config = config(2, 5);
        let engine = BeamSearch::new(&scorer, &residues, None, &config).unwrap();

        let result = engine.decode(&(), &any_precursor(), &cancel);
        assert!(matches!(result, Err(EngineError::Cancelled { steps: 1 })));
    }

    #[test]
    fn mass_overflow_is_reported() {
        let residues = ResidueSet::new([("X", 1e15)], 10_000).unwrap();
        let steps = StepDistributions::from_log_probabilities(
            vec![vec![f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY, 0.0]; 3],
            4,
        )
        .unwrap();
        let scorer = PositionalScorer::new(4);
        let config = config(1, 3);
        let engine = BeamSearch::new(&scorer, &residues, None, &config).unwrap();

        let result = engine.decode(&steps, &any_precursor(), &CancellationToken::new());
        assert!(matches!(result, Err(EngineError::MassOverflow { step: 1 })));
    }
}
