use super::bitset::MassBitset;
use super::{Knapsack, KnapsackError, KnapsackParameters, table_size};
use crate::core::residues::ResidueSet;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct KnapsackFileRef<'a> {
    version: u32,
    parameters: &'a KnapsackParameters,
    reachable: &'a [u64],
    backpointers: &'a [u8],
}

#[derive(Deserialize)]
struct KnapsackFile {
    version: u32,
    parameters: KnapsackParameters,
    reachable: Vec<u64>,
    backpointers: Vec<u8>,
}

impl Knapsack {
    /// Writes the index and its build parameters as a versioned bincode blob.
    pub fn save(&self, path: &Path) -> Result<(), KnapsackError> {
        let file = File::create(path).map_err(|e| io_error(path, e))?;
        let mut writer = BufWriter::new(file);
        let blob = KnapsackFileRef {
            version: FORMAT_VERSION,
            parameters: &self.parameters,
            reachable: self.reachable.words(),
            backpointers: &self.backpointers,
        };
        let bytes =
            bincode::serde::encode_into_std_write(&blob, &mut writer, bincode::config::standard())?;
        writer.flush().map_err(|e| io_error(path, e))?;
        info!("Saved knapsack ({} bytes) to {:?}", bytes, path);
        Ok(())
    }

    /// Restores an index written by [`Knapsack::save`].
    ///
    /// The stored parameters are not compared against any residue set; use
    /// [`Knapsack::load_matching`] when the caller's vocabulary is known.
    pub fn load(path: &Path) -> Result<Self, KnapsackError> {
        let file = File::open(path).map_err(|e| io_error(path, e))?;
        let mut reader = BufReader::new(file);
        let blob: KnapsackFile =
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())?;
        debug!("Decoded knapsack blob version {} from {:?}", blob.version, path);
        Self::from_blob(blob)
    }

    /// Restores an index and verifies it was built for `residues`.
    pub fn load_matching(path: &Path, residues: &ResidueSet) -> Result<Self, KnapsackError> {
        let knapsack = Self::load(path)?;
        knapsack.check_compatible(residues)?;
        Ok(knapsack)
    }

    fn from_blob(blob: KnapsackFile) -> Result<Self, KnapsackError> {
        if blob.version != FORMAT_VERSION {
            return Err(KnapsackError::UnsupportedVersion {
                found: blob.version,
                expected: FORMAT_VERSION,
            });
        }
        blob.parameters.validate()?;
        let size = table_size(blob.parameters.max_mass)?;
        let reachable = MassBitset::from_words(blob.reachable, size).ok_or_else(|| {
            KnapsackError::Corrupt(format!(
                "reachability table does not cover {size} lattice masses"
            ))
        })?;
        if blob.backpointers.len() != reachable.len() {
            return Err(KnapsackError::Corrupt(format!(
                "expected {} backpointers, found {}",
                reachable.len(),
                blob.backpointers.len()
            )));
        }
        if !reachable.get(0) {
            return Err(KnapsackError::Corrupt(
                "mass zero is not marked reachable".to_string(),
            ));
        }
        let residues = blob.parameters.ordered_residues();
        let knapsack = Self {
            parameters: blob.parameters,
            residues,
            reachable,
            backpointers: blob.backpointers,
        };
        knapsack.check_backpointers()?;
        Ok(knapsack)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> KnapsackError {
    KnapsackError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::tempdir;

    fn residues() -> ResidueSet {
        ResidueSet::from_symbols(&["G", "A", "S", "P", "[UNIMOD:385]"], 100).unwrap()
    }

    #[test]
    fn save_then_load_is_bit_identical() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("knapsack.bin");
        let original = Knapsack::for_residues(&residues(), 500.0, 5000.0).unwrap();

        original.save(&path).unwrap();
        let restored = Knapsack::load(&path).unwrap();

        assert_eq!(restored, original);
        assert_eq!(restored.reachable.words(), original.reachable.words());
        for m in 0..=original.max_mass() {
            assert_eq!(restored.is_reachable(m), original.is_reachable(m));
        }
    }

    #[test]
    fn load_matching_accepts_same_residues() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("knapsack.bin");
        Knapsack::for_residues(&residues(), 300.0, 5000.0)
            .unwrap()
            .save(&path)
            .unwrap();

        assert!(Knapsack::load_matching(&path, &residues()).is_ok());
    }

    #[test]
    fn load_matching_rejects_other_residues() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("knapsack.bin");
        Knapsack::for_residues(&residues(), 300.0, 5000.0)
            .unwrap()
            .save(&path)
            .unwrap();

        let other = ResidueSet::from_symbols(&["G", "A"], 100).unwrap();
        assert!(Knapsack::load(&path).is_ok());
        assert!(matches!(
            Knapsack::load_matching(&path, &other),
            Err(KnapsackError::ParameterMismatch(_))
        ));
    }

    #[test]
    fn load_rejects_garbage_and_missing_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.bin");
        fs::write(&path, b"definitely not a knapsack").unwrap();
        assert!(Knapsack::load(&path).is_err());

        assert!(matches!(
            Knapsack::load(&dir.path().join("missing.bin")),
            Err(KnapsackError::Io { .. })
        ));
    }

    #[test]
    fn from_blob_rejects_wrong_version_and_truncated_tables() {
        let knapsack = Knapsack::for_residues(&residues(), 100.0, 5000.0).unwrap();
        let blob = |version: u32, reachable: Vec<u64>, backpointers: Vec<u8>| KnapsackFile {
            version,
            parameters: knapsack.parameters.clone(),
            reachable,
            backpointers,
        };
        let words = knapsack.reachable.words().to_vec();

        assert!(matches!(
            Knapsack::from_blob(blob(99, words.clone(), knapsack.backpointers.clone())),
            Err(KnapsackError::UnsupportedVersion { found: 99, .. })
        ));
        assert!(matches!(
            Knapsack::from_blob(blob(FORMAT_VERSION, words[1..].to_vec(), knapsack.backpointers.clone())),
            Err(KnapsackError::Corrupt(_))
        ));
        assert!(matches!(
            Knapsack::from_blob(blob(FORMAT_VERSION, words, vec![0; 3])),
            Err(KnapsackError::Corrupt(_))
        ));
    }

    #[test]
    fn from_blob_rejects_backpointers_to_heavier_residues() {
        let masses: BTreeMap<String, f64> =
            [("G".to_string(), 5.0), ("L".to_string(), 7.0)].into();
        let indices: BTreeMap<String, usize> =
            [("G".to_string(), 3), ("L".to_string(), 4)].into();
        let knapsack = Knapsack::construct(&masses, &indices, 30.0, 1).unwrap();
        let mut backpointers = knapsack.backpointers.clone();
        backpointers[5] = 1;

        let result = Knapsack::from_blob(KnapsackFile {
            version: FORMAT_VERSION,
            parameters: knapsack.parameters.clone(),
            reachable: knapsack.reachable.words().to_vec(),
            backpointers,
        });
        assert!(matches!(result, Err(KnapsackError::Corrupt(_))));
    }

    #[test]
    fn corrupted_file_fails_to_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("knapsack.bin");
        let masses: BTreeMap<String, f64> =
            [("G".to_string(), 5.0), ("Z".to_string(), 0.0)].into();
        let indices: BTreeMap<String, usize> =
            [("G".to_string(), 3), ("Z".to_string(), 4)].into();
        let mut knapsack = Knapsack::construct(&masses, &indices, 30.0, 1).unwrap();
        knapsack.backpointers[10] = 0;
        knapsack.save(&path).unwrap();

        assert!(matches!(
            Knapsack::load(&path),
            Err(KnapsackError::Corrupt(_))
        ));
    }

    #[test]
    fn plain_load_restores_without_a_residue_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("knapsack.bin");
        let masses: BTreeMap<String, f64> = [("G".to_string(), 57.02)].into();
        let indices: BTreeMap<String, usize> = [("G".to_string(), 3)].into();
        Knapsack::construct(&masses, &indices, 200.0, 100)
            .unwrap()
            .save(&path)
            .unwrap();

        let restored = Knapsack::load(&path).unwrap();
        assert_eq!(restored.parameters().residue_masses["G"], 5702);
        assert!(restored.is_reachable(11_404));
    }
}
