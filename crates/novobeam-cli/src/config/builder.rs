use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::{AppConfig, KnapsackSettings, ResidueSource};
use crate::cli::DecodeArgs;
use crate::error::{CliError, Result};
use novobeam::core::precursor::MassTolerance;
use novobeam::engine::config::{DecodingConfigBuilder, DecodingMode};
use std::path::PathBuf;
use std::str::FromStr;

/// Merges defaults, the config file, `--set` values and flags, in increasing precedence.
pub fn build_config(args: &DecodeArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let decoding_file = file_config.decoding.take().unwrap_or_default();
    let file_mode = decoding_file
        .mode
        .as_deref()
        .map(DecodingMode::from_str)
        .transpose()
        .map_err(|e| CliError::Config(e.to_string()))?;
    let mode = args.mode.or(file_mode).unwrap_or(defaults.mode);
    let beam_size = args
        .beam_size
        .or(decoding_file.beam_size)
        .unwrap_or(defaults.beam_size);
    let max_length = args
        .max_length
        .or(decoding_file.max_length)
        .unwrap_or(defaults.max_length);
    let include_truncated = if args.exclude_truncated {
        false
    } else {
        decoding_file
            .include_truncated
            .unwrap_or(defaults.include_truncated)
    };

    let precursor_file = file_config.precursor.take().unwrap_or_default();
    let tolerance = merge_tolerance(args, &precursor_file, &defaults)?;

    let mut builder = DecodingConfigBuilder::new()
        .mode(mode)
        .beam_size(beam_size)
        .max_length(max_length)
        .precursor_tolerance(tolerance)
        .include_truncated(include_truncated);
    if let Some(n) = args.num_results.or(decoding_file.num_results) {
        builder = builder.num_results(n);
    }
    let decoding = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;
    decoding
        .validate()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let residues_file = file_config.residues.take().unwrap_or_default();
    let residues = match args.residues.clone().or(residues_file.path) {
        Some(path) => ResidueSource::File(path),
        None => ResidueSource::Standard {
            mass_scale: residues_file.mass_scale.unwrap_or(defaults.mass_scale),
        },
    };

    let knapsack_file = file_config.knapsack.take().unwrap_or_default();
    let max_mass = knapsack_file.max_mass.unwrap_or(defaults.max_mass);
    let knapsack = KnapsackSettings {
        path: args.knapsack.clone().or(knapsack_file.path),
        max_mass,
        negative_mass_sentinel: knapsack_file
            .negative_mass_sentinel
            .unwrap_or_else(|| DefaultsConfig::negative_mass_sentinel(max_mass)),
        use_cache: !args.no_cache && knapsack_file.cache.unwrap_or(defaults.use_cache),
    };

    Ok(AppConfig {
        input_path: args.input.clone(),
        output_path: args.output.clone(),
        decoding,
        residues,
        knapsack,
    })
}

fn merge_tolerance(
    args: &DecodeArgs,
    file: &super::file::FilePrecursorConfig,
    defaults: &DefaultsConfig,
) -> Result<MassTolerance> {
    if let Some(ppm) = args.tolerance_ppm {
        return Ok(MassTolerance::Ppm(ppm));
    }
    if let Some(da) = args.tolerance_da {
        return Ok(MassTolerance::Da(da));
    }
    match (file.tolerance_ppm, file.tolerance_da) {
        (Some(_), Some(_)) => Err(CliError::Config(
            "`precursor` accepts only one of `tolerance-ppm` and `tolerance-da`".to_string(),
        )),
        (Some(ppm), None) => Ok(MassTolerance::Ppm(ppm)),
        (None, Some(da)) => Ok(MassTolerance::Da(da)),
        (None, None) => Ok(MassTolerance::Ppm(defaults.tolerance_ppm)),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();

        match key {
            "decoding.mode" => {
                config.decoding.get_or_insert_with(Default::default).mode =
                    Some(value_str.trim().to_string());
            }
            "decoding.beam-size" => {
                config.decoding.get_or_insert_with(Default::default).beam_size =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "decoding.max-length" => {
                config.decoding.get_or_insert_with(Default::default).max_length =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "decoding.num-results" => {
                config.decoding.get_or_insert_with(Default::default).num_results =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "decoding.include-truncated" => {
                config
                    .decoding
                    .get_or_insert_with(Default::default)
                    .include_truncated = Some(parse_value(key, value_str, "boolean")?);
            }
            "precursor.tolerance-ppm" => {
                let precursor = config.precursor.get_or_insert_with(Default::default);
                precursor.tolerance_ppm = Some(parse_value(key, value_str, "float")?);
                precursor.tolerance_da = None;
            }
            "precursor.tolerance-da" => {
                let precursor = config.precursor.get_or_insert_with(Default::default);
                precursor.tolerance_da = Some(parse_value(key, value_str, "float")?);
                precursor.tolerance_ppm = None;
            }
            "residues.path" => {
                config.residues.get_or_insert_with(Default::default).path =
                    Some(PathBuf::from(value_str.trim()));
            }
            "residues.mass-scale" => {
                config.residues.get_or_insert_with(Default::default).mass_scale =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "knapsack.path" => {
                config.knapsack.get_or_insert_with(Default::default).path =
                    Some(PathBuf::from(value_str.trim()));
            }
            "knapsack.max-mass" => {
                config.knapsack.get_or_insert_with(Default::default).max_mass =
                    Some(parse_value(key, value_str, "float")?);
            }
            "knapsack.negative-mass-sentinel" => {
                config
                    .knapsack
                    .get_or_insert_with(Default::default)
                    .negative_mass_sentinel = Some(parse_value(key, value_str, "float")?);
            }
            "knapsack.cache" => {
                config.knapsack.get_or_insert_with(Default::default).cache =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
