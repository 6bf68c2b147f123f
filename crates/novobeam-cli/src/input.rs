use crate::error::{CliError, Result};
use novobeam::core::precursor::Precursor;
use novobeam::core::scoring::StepDistributions;
use novobeam::workflows::decode::DecodeRequest;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// One spectrum of a JSON batch with its per-step token distributions.
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct SpectrumRecord {
    id: String,
    precursor_mz: f64,
    precursor_charge: u8,
    #[serde(default)]
    probabilities: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    log_probabilities: Option<Vec<Vec<f64>>>,
}

impl SpectrumRecord {
    fn into_request(self, vocab_size: usize) -> Result<DecodeRequest<StepDistributions>> {
        let invalid = |reason: String| CliError::InvalidRecord {
            id: self.id.clone(),
            reason,
        };
        let precursor = Precursor::new(self.precursor_mz, self.precursor_charge)
            .map_err(|e| invalid(e.to_string()))?;
        let spectrum = match (self.probabilities, self.log_probabilities) {
            (Some(steps), None) => StepDistributions::from_probabilities(steps, vocab_size),
            (None, Some(steps)) => StepDistributions::from_log_probabilities(steps, vocab_size),
            _ => {
                return Err(invalid(
                    "exactly one of `probabilities` and `log_probabilities` is required"
                        .to_string(),
                ));
            }
        }
        .map_err(|e| invalid(e.message().to_string()))?;

        Ok(DecodeRequest {
            id: self.id,
            spectrum,
            precursor,
        })
    }
}

/// Parses a JSON array of spectrum records.
pub fn parse_batch(content: &str, vocab_size: usize) -> Result<Vec<DecodeRequest<StepDistributions>>> {
    let records: Vec<SpectrumRecord> =
        serde_json::from_str(content).map_err(|e| CliError::Other(e.into()))?;
    records
        .into_iter()
        .map(|record| record.into_request(vocab_size))
        .collect()
}

pub fn read_batch(path: &Path, vocab_size: usize) -> Result<Vec<DecodeRequest<StepDistributions>>> {
    debug!("Reading spectrum batch from {:?}", path);
    let content = fs::read_to_string(path)?;
    let requests = parse_batch(&content, vocab_size).map_err(|e| match e {
        CliError::Other(source) => CliError::FileParsing {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    info!("Loaded {} spectra from {:?}", requests.len(), path);
    Ok(requests)
}
