use novobeam::engine::config::DecodingMode;

pub struct DefaultsConfig {
    pub mode: DecodingMode,
    pub beam_size: usize,
    pub max_length: usize,
    pub tolerance_ppm: f64,
    pub include_truncated: bool,
    pub mass_scale: i64,
    pub max_mass: f64,
    pub use_cache: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            mode: DecodingMode::Beam,
            beam_size: 5,
            max_length: 40,
            tolerance_ppm: 50.0,
            include_truncated: true,
            mass_scale: 10_000,
            max_mass: 4_000.0,
            use_cache: true,
        }
    }
}

impl DefaultsConfig {
    /// Sentinel for non-positive residue masses: just past the table, so never reachable.
    pub fn negative_mass_sentinel(max_mass: f64) -> f64 {
        max_mass + 1.0
    }
}
