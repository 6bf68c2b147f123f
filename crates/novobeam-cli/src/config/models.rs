use crate::error::Result;
use novobeam::core::residues::ResidueSet;
use novobeam::engine::config::DecodingConfig;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum ResidueSource {
    Standard { mass_scale: i64 },
    File(PathBuf),
}

impl ResidueSource {
    pub fn load(&self) -> Result<ResidueSet> {
        Ok(match self {
            ResidueSource::Standard { mass_scale } => ResidueSet::standard(*mass_scale)?,
            ResidueSource::File(path) => ResidueSet::load(path)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KnapsackSettings {
    /// Prebuilt knapsack; bypasses the cache.
    pub path: Option<PathBuf>,
    pub max_mass: f64,
    pub negative_mass_sentinel: f64,
    pub use_cache: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub decoding: DecodingConfig,
    pub residues: ResidueSource,
    pub knapsack: KnapsackSettings,
}
