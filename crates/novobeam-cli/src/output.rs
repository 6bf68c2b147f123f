use crate::error::Result;
use novobeam::workflows::decode::DecodeOutcome;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

#[derive(Serialize, Debug)]
struct ResultRow<'a> {
    spectrum_id: &'a str,
    rank: usize,
    peptide: String,
    log_probability: f64,
    token_log_probabilities: String,
    termination: String,
    precursor_match: bool,
}

fn join_log_probabilities(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.6}"))
        .collect::<Vec<_>>()
        .join(";")
}

/// Writes one CSV row per ranked sequence; failed items produce no rows.
pub fn write_results<W: Write>(writer: W, outcomes: &[DecodeOutcome]) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut rows = 0;
    for outcome in outcomes {
        let Ok(sequences) = &outcome.result else {
            debug!("Skipping failed item {} in output.", outcome.id);
            continue;
        };
        for (rank, sequence) in sequences.iter().enumerate() {
            csv_writer.serialize(ResultRow {
                spectrum_id: &outcome.id,
                rank: rank + 1,
                peptide: sequence.peptide(),
                log_probability: sequence.total_log_probability,
                token_log_probabilities: join_log_probabilities(&sequence.token_log_probabilities),
                termination: sequence.termination.to_string(),
                precursor_match: sequence.precursor_match,
            })?;
            rows += 1;
        }
    }
    csv_writer.flush()?;
    Ok(rows)
}

pub fn write_results_to_path(path: &Path, outcomes: &[DecodeOutcome]) -> Result<usize> {
    let rows = write_results(File::create(path)?, outcomes)?;
    info!("Wrote {} result row(s) to {:?}", rows, path);
    Ok(rows)
}
