use crate::cache::KnapsackCache;
use crate::cli::{KnapsackArgs, KnapsackCommands};
use crate::config::{DefaultsConfig, ResidueSource};
use crate::error::Result;
use novobeam::core::knapsack::Knapsack;
use novobeam::core::residues::masses::scale_mass;
use std::path::{Path, PathBuf};
use tracing::info;

pub async fn run(args: KnapsackArgs) -> Result<()> {
    match args.command {
        KnapsackCommands::Build {
            output,
            residues,
            max_mass,
            mass_scale,
            negative_mass_sentinel,
        } => {
            tokio::task::block_in_place(|| {
                handle_build(&output, residues, max_mass, mass_scale, negative_mass_sentinel)
            })?;
        }
        KnapsackCommands::Inspect { path, masses } => {
            handle_inspect(&path, &masses)?;
        }
        KnapsackCommands::CachePath => {
            handle_cache_path()?;
        }
        KnapsackCommands::ClearCache => {
            handle_clear_cache()?;
        }
    }
    Ok(())
}

fn handle_build(
    output: &Path,
    residues: Option<PathBuf>,
    max_mass: Option<f64>,
    mass_scale: Option<i64>,
    negative_mass_sentinel: Option<f64>,
) -> Result<()> {
    let defaults = DefaultsConfig::default();
    let source = match residues {
        Some(path) => ResidueSource::File(path),
        None => ResidueSource::Standard {
            mass_scale: mass_scale.unwrap_or(defaults.mass_scale),
        },
    };
    let residues = source.load()?;
    let max_mass = max_mass.unwrap_or(defaults.max_mass);
    let sentinel =
        negative_mass_sentinel.unwrap_or_else(|| DefaultsConfig::negative_mass_sentinel(max_mass));

    println!(
        "Building knapsack for {} residues up to {} Da (scale {})...",
        residues.residue_count(),
        max_mass,
        residues.mass_scale()
    );
    let knapsack = Knapsack::for_residues(&residues, max_mass, sentinel)?;
    knapsack.save(output)?;
    info!("Knapsack written to {:?}", output);
    println!("✓ Knapsack written to: {}", output.display());
    Ok(())
}

fn handle_inspect(path: &Path, masses: &[f64]) -> Result<()> {
    let knapsack = Knapsack::load(path)?;
    let parameters = knapsack.parameters();

    println!("Knapsack: {}", path.display());
    println!("  mass scale: {}", parameters.mass_scale);
    println!(
        "  max mass:   {} ({:.4} Da)",
        parameters.max_mass,
        parameters.max_mass as f64 / parameters.mass_scale as f64
    );
    println!("  residues:   {}", parameters.residue_masses.len());
    for (symbol, mass) in &parameters.residue_masses {
        let index = parameters.residue_indices.get(symbol).copied().unwrap_or_default();
        println!("    {:>3}  {:<16} {}", index, symbol, mass);
    }

    for &mass in masses {
        let scaled = scale_mass(mass, parameters.mass_scale);
        match knapsack.decompose(scaled) {
            Some(residues) => println!(
                "  {} Da ({}): reachable as {}",
                mass,
                scaled,
                residues.join("")
            ),
            None if scaled > knapsack.max_mass() => {
                println!("  {} Da ({}): beyond the knapsack bound", mass, scaled)
            }
            None => println!("  {} Da ({}): not reachable", mass, scaled),
        }
    }
    Ok(())
}

fn handle_cache_path() -> Result<()> {
    let cache = KnapsackCache::new()?;
    println!("{}", cache.path().display());
    Ok(())
}

fn handle_clear_cache() -> Result<()> {
    let cache = KnapsackCache::new()?;
    let removed = cache.clear()?;
    println!(
        "✓ Removed {} cached knapsack(s) from {}",
        removed,
        cache.path().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn build_then_inspect_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("standard.bin");

        handle_build(&output, None, Some(300.0), Some(100), None).unwrap();
        let knapsack = Knapsack::load(&output).unwrap();
        assert_eq!(knapsack.max_mass(), 30_000);
        assert_eq!(knapsack.mass_scale(), 100);

        handle_inspect(&output, &[0.0, 57.02, 1.0, 1000.0]).unwrap();
    }

    #[test]
    fn build_fails_for_a_missing_residue_file() {
        let dir = tempdir().unwrap();
        let result = handle_build(
            &dir.path().join("out.bin"),
            Some(dir.path().join("missing.toml")),
            None,
            None,
            None,
        );
        assert!(result.is_err());
        assert!(!dir.path().join("out.bin").exists());
    }
}
