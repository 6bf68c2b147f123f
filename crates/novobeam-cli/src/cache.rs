use crate::error::{CliError, Result};
use directories::ProjectDirs;
use novobeam::core::knapsack::{Knapsack, KnapsackParameters};
use novobeam::core::residues::ResidueSet;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// On-disk store of built knapsacks, keyed by their build parameters.
#[derive(Debug)]
pub struct KnapsackCache {
    base_path: PathBuf,
}

impl KnapsackCache {
    pub fn new() -> Result<Self> {
        let path = Self::default_cache_path()?;
        debug!("KnapsackCache initialized with path: {:?}", &path);
        Ok(Self { base_path: path })
    }

    pub fn with_path(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn path(&self) -> &Path {
        &self.base_path
    }

    /// Entry file for `parameters`, named after a SHA-256 digest of their bincode encoding.
    pub fn entry_path(&self, parameters: &KnapsackParameters) -> Result<PathBuf> {
        let encoded = bincode::serde::encode_to_vec(parameters, bincode::config::standard())
            .map_err(|e| CliError::Cache(format!("Failed to encode knapsack parameters: {e}")))?;
        let fingerprint: String = Sha256::digest(&encoded)[..8]
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect();
        Ok(self.base_path.join(format!(
            "knapsack-s{}-m{}-{}.bin",
            parameters.mass_scale, parameters.max_mass, fingerprint
        )))
    }

    /// Loads the cached knapsack for these parameters, building and storing it on a miss.
    pub fn load_or_build(
        &self,
        residues: &ResidueSet,
        max_mass: f64,
        negative_mass_sentinel: f64,
    ) -> Result<Knapsack> {
        let parameters =
            KnapsackParameters::for_residues(residues, max_mass, negative_mass_sentinel)?;
        let path = self.entry_path(&parameters)?;

        if path.exists() {
            match Knapsack::load_matching(&path, residues) {
                Ok(knapsack) if knapsack.parameters() == &parameters => {
                    info!("Loaded cached knapsack from {:?}", path);
                    return Ok(knapsack);
                }
                Ok(_) => warn!("Cached knapsack {:?} has different parameters; rebuilding.", path),
                Err(e) => warn!("Ignoring unreadable cached knapsack {:?}: {}", path, e),
            }
        }

        info!("Building knapsack (max mass {} Da); this may take a while.", max_mass);
        let knapsack = Knapsack::from_parameters(parameters)?;
        fs::create_dir_all(&self.base_path)?;
        if let Err(e) = knapsack.save(&path) {
            warn!("Failed to write knapsack cache entry {:?}: {}", path, e);
        }
        Ok(knapsack)
    }

    /// Removes every cache entry and returns how many were deleted.
    pub fn clear(&self) -> Result<usize> {
        if !self.base_path.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            let is_entry = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("knapsack-") && n.ends_with(".bin"));
            if is_entry {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        info!("Removed {} cached knapsack(s) from {:?}", removed, self.base_path);
        Ok(removed)
    }

    fn default_cache_path() -> Result<PathBuf> {
        ProjectDirs::from("org", "novobeam", "novobeam")
            .map(|dirs| dirs.cache_dir().join("knapsack"))
            .ok_or_else(|| {
                CliError::Cache("Could not determine the cache directory path.".to_string())
            })
    }
}
