use super::masses::{self, STANDARD_RESIDUES};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Control tokens that occupy the first vocabulary slots and never carry mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlToken {
    Padding,
    Start,
    End,
}

impl ControlToken {
    const ALL: [ControlToken; 3] = [ControlToken::Padding, ControlToken::Start, ControlToken::End];

    pub const fn symbol(self) -> &'static str {
        match self {
            ControlToken::Padding => "[PAD]",
            ControlToken::Start => "[SOS]",
            ControlToken::End => "[EOS]",
        }
    }

    /// Fixed vocabulary index of the control token.
    pub const fn index(self) -> usize {
        match self {
            ControlToken::Padding => 0,
            ControlToken::Start => 1,
            ControlToken::End => 2,
        }
    }
}

impl fmt::Display for ControlToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Control(ControlToken),
    Residue { mass: f64, scaled_mass: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub symbol: String,
    pub kind: TokenKind,
}

#[derive(Debug, Error)]
pub enum ResidueError {
    #[error("Mass scale must be a positive integer, got {0}")]
    InvalidMassScale(i64),

    #[error("Duplicate residue symbol '{0}'")]
    DuplicateSymbol(String),

    #[error("Residue '{symbol}' has a non-finite mass ({mass})")]
    InvalidMass { symbol: String, mass: f64 },

    #[error("Residue symbol '{0}' is not in the mass table and no mass was given")]
    UnknownSymbol(String),

    #[error("Residue symbol '{0}' is reserved for a control token")]
    ReservedSymbol(String),

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawResidueFile {
    mass_scale: i64,
    #[serde(rename = "residue", default)]
    residues: Vec<RawResidue>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawResidue {
    symbol: String,
    mass: Option<f64>,
}

/// The ordered token vocabulary of a sequencing model.
///
/// Indices `0..3` hold the control tokens (`[PAD]`, `[SOS]`, `[EOS]`), followed
/// by residues in insertion order. The index of a token is its position in the
/// scorer's output distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueSet {
    tokens: Vec<Token>,
    index: HashMap<String, usize>,
    mass_scale: i64,
}

impl ResidueSet {
    pub fn new<I, S>(residues: I, mass_scale: i64) -> Result<Self, ResidueError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        if mass_scale < 1 {
            return Err(ResidueError::InvalidMassScale(mass_scale));
        }

        let mut tokens: Vec<Token> = ControlToken::ALL
            .iter()
            .map(|&control| Token {
                symbol: control.symbol().to_string(),
                kind: TokenKind::Control(control),
            })
            .collect();
        let mut index: HashMap<String, usize> = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| (token.symbol.clone(), i))
            .collect();

        for (symbol, mass) in residues {
            let symbol = symbol.into();
            if ControlToken::ALL.iter().any(|c| c.symbol() == symbol) {
                return Err(ResidueError::ReservedSymbol(symbol));
            }
            if index.contains_key(&symbol) {
                return Err(ResidueError::DuplicateSymbol(symbol));
            }
            if !mass.is_finite() {
                return Err(ResidueError::InvalidMass { symbol, mass });
            }
            index.insert(symbol.clone(), tokens.len());
            tokens.push(Token {
                symbol,
                kind: TokenKind::Residue {
                    mass,
                    scaled_mass: masses::scale_mass(mass, mass_scale),
                },
            });
        }

        Ok(Self {
            tokens,
            index,
            mass_scale,
        })
    }

    /// The standard amino acids plus common modifications, see [`STANDARD_RESIDUES`].
    pub fn standard(mass_scale: i64) -> Result<Self, ResidueError> {
        Self::from_symbols(STANDARD_RESIDUES, mass_scale)
    }

    /// Builds a set from symbols of the built-in mass table.
    pub fn from_symbols<S: AsRef<str>>(symbols: &[S], mass_scale: i64) -> Result<Self, ResidueError> {
        let residues = symbols
            .iter()
            .map(|s| {
                let symbol = s.as_ref().trim();
                masses::monoisotopic_mass(symbol)
                    .map(|mass| (symbol.to_string(), mass))
                    .ok_or_else(|| ResidueError::UnknownSymbol(symbol.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(residues, mass_scale)
    }

    /// Loads a residue set from a TOML file.
    ///
    /// ```toml
    /// mass-scale = 10000
    ///
    /// [[residue]]
    /// symbol = "G"
    ///
    /// [[residue]]
    /// symbol = "C[UNIMOD:4]"
    /// mass = 160.030649
    /// ```
    pub fn load(path: &Path) -> Result<Self, ResidueError> {
        let content = std::fs::read_to_string(path).map_err(|e| ResidueError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ResidueError::Toml { source, .. } => ResidueError::Toml {
                path: path.to_string_lossy().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ResidueError> {
        let raw: RawResidueFile = toml::from_str(content).map_err(|e| ResidueError::Toml {
            path: "<string>".to_string(),
            source: e,
        })?;
        let residues = raw
            .residues
            .into_iter()
            .map(|r| match r.mass {
                Some(mass) => Ok((r.symbol, mass)),
                None => masses::monoisotopic_mass(&r.symbol)
                    .map(|mass| (r.symbol.clone(), mass))
                    .ok_or(ResidueError::UnknownSymbol(r.symbol)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(residues, raw.mass_scale)
    }

    pub fn mass_scale(&self) -> i64 {
        self.mass_scale
    }

    /// Number of tokens in the vocabulary, control tokens included.
    pub fn vocab_size(&self) -> usize {
        self.tokens.len()
    }

    pub fn residue_count(&self) -> usize {
        self.tokens.len() - ControlToken::ALL.len()
    }

    pub fn eos_index(&self) -> usize {
        ControlToken::End.index()
    }

    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.index.get(symbol).copied()
    }

    pub fn token(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn symbol(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(|t| t.symbol.as_str())
    }

    pub fn is_residue(&self, index: usize) -> bool {
        matches!(
            self.tokens.get(index).map(|t| &t.kind),
            Some(TokenKind::Residue { .. })
        )
    }

    /// Scaled lattice mass of a residue token; `None` for control tokens.
    pub fn scaled_mass(&self, index: usize) -> Option<i64> {
        match self.tokens.get(index)?.kind {
            TokenKind::Residue { scaled_mass, .. } => Some(scaled_mass),
            TokenKind::Control(_) => None,
        }
    }

    pub fn scale(&self, mass: f64) -> i64 {
        masses::scale_mass(mass, self.mass_scale)
    }

    /// Iterates `(index, symbol, mass)` over residue tokens.
    pub fn residues(&self) -> impl Iterator<Item = (usize, &str, f64)> {
        self.tokens
            .iter()
            .enumerate()
            .filter_map(|(i, token)| match token.kind {
                TokenKind::Residue { mass, .. } => Some((i, token.symbol.as_str(), mass)),
                TokenKind::Control(_) => None,
            })
    }

    /// Symbols of the given residue tokens; control tokens are skipped.
    pub fn decode_tokens(&self, indices: &[usize]) -> Vec<String> {
        indices
            .iter()
            .filter(|&&i| self.is_residue(i))
            .filter_map(|&i| self.symbol(i).map(str::to_string))
            .collect()
    }

    /// Mass and index maps for knapsack construction.
    ///
    /// Residues with a zero or negative mass (loss modifications) are mapped to
    /// `sentinel_mass`, which must be larger than any precursor the knapsack will
    /// be queried with.
    pub fn knapsack_inputs(
        &self,
        sentinel_mass: f64,
    ) -> (BTreeMap<String, f64>, BTreeMap<String, usize>) {
        let mut residue_masses = BTreeMap::new();
        let mut residue_indices = BTreeMap::new();
        for (i, symbol, mass) in self.residues() {
            let mass = if self.scale(mass) <= 0 {
                sentinel_mass
            } else {
                mass
            };
            residue_masses.insert(symbol.to_string(), mass);
            residue_indices.insert(symbol.to_string(), i);
        }
        (residue_masses, residue_indices)
    }
}
