use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileDecodingConfig {
    pub mode: Option<String>,
    pub beam_size: Option<usize>,
    pub max_length: Option<usize>,
    pub num_results: Option<usize>,
    pub include_truncated: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FilePrecursorConfig {
    pub tolerance_ppm: Option<f64>,
    pub tolerance_da: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileResiduesConfig {
    pub path: Option<PathBuf>,
    pub mass_scale: Option<i64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileKnapsackConfig {
    pub path: Option<PathBuf>,
    pub max_mass: Option<f64>,
    pub negative_mass_sentinel: Option<f64>,
    pub cache: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub decoding: Option<FileDecodingConfig>,
    pub precursor: Option<FilePrecursorConfig>,
    pub residues: Option<FileResiduesConfig>,
    pub knapsack: Option<FileKnapsackConfig>,
}

impl FileConfig {
    /// Reads a TOML config; relative paths inside it resolve against its directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: FileConfig =
            toml::from_str(&content).map_err(|e| CliError::FileParsing {
                path: path.to_path_buf(),
                source: e.into(),
            })?;

        if let Some(base) = path.parent() {
            let resolve = |p: &mut PathBuf| {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            };
            if let Some(p) = config.residues.as_mut().and_then(|r| r.path.as_mut()) {
                resolve(p);
            }
            if let Some(p) = config.knapsack.as_mut().and_then(|k| k.path.as_mut()) {
                resolve(p);
            }
        }
        Ok(config)
    }
}
