use crate::cache::KnapsackCache;
use crate::cli::DecodeArgs;
use crate::config::{AppConfig, build_config};
use crate::error::{CliError, Result};
use crate::input::read_batch;
use crate::output::write_results_to_path;
use crate::utils::progress::CliProgressHandler;
use novobeam::{
    core::{knapsack::Knapsack, residues::ResidueSet, scoring::PositionalScorer},
    engine::{cancel::CancellationToken, progress::ProgressReporter, search::BeamSearch},
    workflows::{self, decode::BatchSummary},
};
use tracing::{info, warn};

pub async fn run(args: DecodeArgs, cancel: CancellationToken) -> Result<()> {
    info!("Merging configuration from defaults, file and CLI arguments...");
    let config = build_config(&args)?;

    info!("Loading residue vocabulary...");
    let residues = config.residues.load()?;

    info!("Loading spectra from {:?}", &config.input_path);
    let requests = read_batch(&config.input_path, residues.vocab_size())?;
    if requests.is_empty() {
        warn!("Input batch {:?} contains no spectra.", &config.input_path);
    }

    let knapsack = if config.decoding.use_mass_filter {
        Some(tokio::task::block_in_place(|| {
            resolve_knapsack(&config, &residues)
        })?)
    } else {
        None
    };

    let scorer = PositionalScorer::new(residues.vocab_size());
    let engine = BeamSearch::new(&scorer, &residues, knapsack.as_ref(), &config.decoding)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Decoding {} spectra ({} mode, beam size {})...",
        requests.len(),
        config.decoding.mode(),
        config.decoding.beam_size
    );
    let outcomes = tokio::task::block_in_place(|| {
        workflows::decode::run(&requests, &engine, &reporter, &cancel)
    });

    let rows = write_results_to_path(&config.output_path, &outcomes)?;
    let summary = BatchSummary::from_outcomes(&outcomes);
    info!("Wrote {} row(s) to {:?}", rows, &config.output_path);

    println!(
        "Decoded {}/{} spectra ({} empty, {} failed, {} cancelled); {} sequence(s) written to {}",
        summary.decoded,
        summary.total(),
        summary.empty,
        summary.failed,
        summary.cancelled,
        rows,
        config.output_path.display()
    );

    if cancel.is_cancelled() {
        return Err(CliError::Interrupted);
    }
    Ok(())
}

/// Picks the knapsack for a mass-filtered run: an explicit file, the cache, or a fresh build.
fn resolve_knapsack(config: &AppConfig, residues: &ResidueSet) -> Result<Knapsack> {
    let settings = &config.knapsack;
    if let Some(path) = &settings.path {
        info!("Loading knapsack from {:?}", path);
        return Knapsack::load_matching(path, residues).map_err(CliError::from);
    }
    if settings.use_cache {
        let cache = KnapsackCache::new()?;
        return cache.load_or_build(residues, settings.max_mass, settings.negative_mass_sentinel);
    }
    info!("Building knapsack in memory (max mass {} Da).", settings.max_mass);
    Ok(Knapsack::for_residues(
        residues,
        settings.max_mass,
        settings.negative_mass_sentinel,
    )?)
}
