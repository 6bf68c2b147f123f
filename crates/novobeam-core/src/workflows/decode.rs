use crate::core::precursor::Precursor;
use crate::core::scoring::Scorer;
use crate::engine::beam::ScoredSequence;
use crate::engine::cancel::CancellationToken;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::search::BeamSearch;
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One spectrum of a batch, in the scorer's encoding.
#[derive(Debug, Clone)]
pub struct DecodeRequest<T> {
    pub id: String,
    pub spectrum: T,
    pub precursor: Precursor,
}

#[derive(Debug)]
pub struct DecodeOutcome {
    pub id: String,
    pub result: Result<Vec<ScoredSequence>, EngineError>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Items that returned at least one sequence.
    pub decoded: usize,
    /// Items that succeeded without any surviving sequence.
    pub empty: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[DecodeOutcome]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut summary, outcome| {
                match &outcome.result {
                    Ok(sequences) if sequences.is_empty() => summary.empty += 1,
                    Ok(_) => summary.decoded += 1,
                    Err(e) if e.is_cancelled() => summary.cancelled += 1,
                    Err(_) => summary.failed += 1,
                }
                summary
            })
    }

    pub fn total(&self) -> usize {
        self.decoded + self.empty + self.failed + self.cancelled
    }
}

/// Decodes every request with the shared engine.
///
/// A failing item never aborts the batch; its error is carried in its
/// [`DecodeOutcome`]. Outcomes are returned in request order.
#[instrument(skip_all, name = "decode_workflow", fields(items = requests.len()))]
pub fn run<S: Scorer>(
    requests: &[DecodeRequest<S::Spectrum>],
    engine: &BeamSearch<'_, S>,
    reporter: &ProgressReporter,
    cancel: &CancellationToken,
) -> Vec<DecodeOutcome> {
    info!(
        mode = %engine.config().mode(),
        beam_size = engine.config().beam_size,
        "Starting batch decoding."
    );
    reporter.report(Progress::PhaseStart { name: "Decoding" });
    reporter.report(Progress::TaskStart {
        total_steps: requests.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = requests.iter();

    #[cfg(feature = "parallel")]
    let iterator = requests.par_iter();

    let outcomes: Vec<DecodeOutcome> = iterator
        .map(|request| {
            let result = if cancel.is_cancelled() {
                Err(EngineError::Cancelled { steps: 0 })
            } else {
                engine.decode(&request.spectrum, &request.precursor, cancel)
            };
            if let Err(e) = &result {
                if !e.is_cancelled() {
                    warn!(id = %request.id, error = %e, "Decoding failed.");
                    reporter.report(Progress::ItemFailed {
                        id: request.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            reporter.report(Progress::TaskIncrement);
            DecodeOutcome {
                id: request.id.clone(),
                result,
            }
        })
        .collect();

    reporter.report(Progress::TaskFinish);

    let summary = BatchSummary::from_outcomes(&outcomes);
    info!(
        decoded = summary.decoded,
        empty = summary.empty,
        failed = summary.failed,
        cancelled = summary.cancelled,
        "Batch decoding finished."
    );
    reporter.report(Progress::PhaseFinish);
    outcomes
}
