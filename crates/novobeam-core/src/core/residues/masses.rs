use phf::{Map, phf_map};

/// Mass of a proton in unified atomic mass units.
pub const PROTON_MASS_AMU: f64 = 1.007276;

/// Monoisotopic mass of water, added once per peptide for the termini.
pub const H2O_MASS: f64 = 18.010_564_7;

/// Monoisotopic residue masses (Da) for the standard amino acids and the
/// modified tokens used by common de novo vocabularies.
static RESIDUE_MASSES: Map<&'static str, f64> = phf_map! {
    "G" => 57.021464,
    "A" => 71.037114,
    "S" => 87.032028,
    "P" => 97.052764,
    "V" => 99.068414,
    "T" => 101.047670,
    "C" => 103.009185,
    "L" => 113.084064,
    "I" => 113.084064,
    "N" => 114.042927,
    "D" => 115.026943,
    "Q" => 128.058578,
    "K" => 128.094963,
    "E" => 129.042593,
    "M" => 131.040485,
    "H" => 137.058912,
    "F" => 147.068414,
    "R" => 156.101111,
    "Y" => 163.063329,
    "W" => 186.079313,
    // Oxidation
    "M[UNIMOD:35]" => 147.035400,
    // Carbamidomethylation
    "C[UNIMOD:4]" => 160.030649,
    // Deamidation
    "N[UNIMOD:7]" => 115.026943,
    "Q[UNIMOD:7]" => 129.042594,
    // Phosphorylation
    "S[UNIMOD:21]" => 166.998359,
    "T[UNIMOD:21]" => 181.014009,
    "Y[UNIMOD:21]" => 243.029660,
    // N-terminal acetylation, carbamylation and ammonia loss
    "[UNIMOD:1]" => 42.010565,
    "[UNIMOD:5]" => 43.005814,
    "[UNIMOD:385]" => -17.026549,
};

/// Vocabulary order used by [`super::ResidueSet::standard`].
pub const STANDARD_RESIDUES: &[&str] = &[
    "G", "A", "S", "P", "V", "T", "C", "L", "I", "N", "D", "Q", "K", "E", "M", "H", "F", "R", "Y",
    "W", "M[UNIMOD:35]", "C[UNIMOD:4]", "N[UNIMOD:7]", "Q[UNIMOD:7]", "S[UNIMOD:21]",
    "T[UNIMOD:21]", "Y[UNIMOD:21]", "[UNIMOD:1]", "[UNIMOD:5]", "[UNIMOD:385]",
];

/// Looks up the monoisotopic mass of a residue symbol.
pub fn monoisotopic_mass(symbol: &str) -> Option<f64> {
    RESIDUE_MASSES.get(symbol.trim()).copied()
}

/// Converts a mass in Da to the integer lattice used for exact arithmetic.
pub fn scale_mass(mass: f64, mass_scale: i64) -> i64 {
    (mass * mass_scale as f64).round() as i64
}
