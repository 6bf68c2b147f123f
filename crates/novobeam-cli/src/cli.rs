use clap::{Args, Parser, Subcommand};
use novobeam::engine::config::DecodingMode;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The novobeam developers",
    version,
    about = "novobeam - mass-constrained beam-search decoding of peptide sequences from per-step token distributions.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to decode spectra in parallel.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode a batch of spectra into ranked peptide sequences.
    Decode(DecodeArgs),
    /// Build, inspect and cache knapsack feasibility indexes.
    Knapsack(KnapsackArgs),
}

/// Arguments for the `decode` subcommand.
#[derive(Args, Debug, Default)]
pub struct DecodeArgs {
    /// Path to the JSON batch of spectra with per-step token distributions.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the CSV file of ranked sequences.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Decoding mode: greedy, beam or knapsack-beam.
    #[arg(short, long, value_name = "MODE")]
    pub mode: Option<DecodingMode>,

    /// Override the beam width.
    #[arg(short = 'k', long, value_name = "INT")]
    pub beam_size: Option<usize>,

    /// Override the maximum number of decoding steps.
    #[arg(long, value_name = "INT")]
    pub max_length: Option<usize>,

    /// Precursor tolerance in ppm of the neutral precursor mass.
    #[arg(long, value_name = "FLOAT", conflicts_with = "tolerance_da")]
    pub tolerance_ppm: Option<f64>,

    /// Precursor tolerance in Da.
    #[arg(long, value_name = "FLOAT")]
    pub tolerance_da: Option<f64>,

    /// Override the number of sequences reported per spectrum.
    #[arg(short, long, value_name = "INT")]
    pub num_results: Option<usize>,

    /// Only report sequences that ended with [EOS].
    #[arg(long)]
    pub exclude_truncated: bool,

    /// Residue vocabulary in TOML format; defaults to the built-in residue set.
    #[arg(short, long, value_name = "PATH")]
    pub residues: Option<PathBuf>,

    /// Use a prebuilt knapsack instead of the cache.
    #[arg(long, value_name = "PATH")]
    pub knapsack: Option<PathBuf>,

    /// Build the knapsack in memory without reading or writing the cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S decoding.beam-size=10
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `knapsack` subcommand.
#[derive(Args, Debug)]
pub struct KnapsackArgs {
    #[command(subcommand)]
    pub command: KnapsackCommands,
}

#[derive(Subcommand, Debug)]
pub enum KnapsackCommands {
    /// Build a knapsack for a residue vocabulary and save it.
    Build {
        /// Destination of the knapsack file.
        #[arg(short, long, required = true, value_name = "PATH")]
        output: PathBuf,

        /// Residue vocabulary in TOML format; defaults to the built-in residue set.
        #[arg(short, long, value_name = "PATH")]
        residues: Option<PathBuf>,

        /// Largest residue mass (Da) the knapsack answers for.
        #[arg(long, value_name = "DA")]
        max_mass: Option<f64>,

        /// Integer scale of the mass lattice; ignored when --residues is given.
        #[arg(long, value_name = "INT")]
        mass_scale: Option<i64>,

        /// Mass (Da) substituted for residues with a non-positive mass.
        #[arg(long, value_name = "DA")]
        negative_mass_sentinel: Option<f64>,
    },
    /// Print the parameters of a saved knapsack and query masses.
    Inspect {
        /// The knapsack file.
        #[arg(required = true)]
        path: PathBuf,

        /// Residue masses (Da) to test for reachability.
        #[arg(long = "mass", value_name = "DA")]
        masses: Vec<f64>,
    },
    /// Show the knapsack cache directory.
    CachePath,
    /// Remove every cached knapsack.
    ClearCache,
}
