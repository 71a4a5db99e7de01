use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::Result;

///////////
// Enums //
///////////

/// How the initial archetype matrix is generated when none is supplied
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InitMethod {
    /// Adaptive greedy column subset selection on the kernel
    #[default]
    Greedy,
    /// Seeded random selection of distinct points
    Random,
    /// Greedy up to `greedy_threshold` points, random above
    Auto,
}

////////////
// Params //
////////////

/// Structure to store the SEACells parameters
///
/// ### Fields
///
/// * `n_sea_cells` - Number of archetypes (metacells) to detect.
/// * `max_fw_iters` - Frank-Wolfe steps per A or B update.
/// * `n_iter` - Outer alternating iterations (A update, then B update).
/// * `init_method` - How to generate B0 if none is supplied.
/// * `greedy_threshold` - For `InitMethod::Auto`: maximum number of points
///   before defaulting to the random selection.
/// * `seed` - Seed for the random selection.
/// * `track_residuals` - Record the residual before the loop and after every
///   outer iteration.
/// * `assume_unit_diagonal` - Use `n` instead of `tr(K)` in the residual.
///   Only valid for kernels with a unit diagonal.
/// * `verbose` - Emit progress messages at info level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SEACellsParams {
    pub n_sea_cells: usize,
    pub max_fw_iters: usize,
    pub n_iter: usize,
    pub init_method: InitMethod,
    pub greedy_threshold: usize,
    pub seed: u64,
    pub track_residuals: bool,
    pub assume_unit_diagonal: bool,
    pub verbose: bool,
}

impl Default for SEACellsParams {
    fn default() -> Self {
        Self {
            n_sea_cells: 0,
            max_fw_iters: 50,
            n_iter: 8,
            init_method: InitMethod::Greedy,
            greedy_threshold: 20000,
            seed: 42,
            track_residuals: true,
            assume_unit_diagonal: false,
            verbose: false,
        }
    }
}

impl SEACellsParams {
    /// Parameters for `n_sea_cells` archetypes, everything else default
    pub fn new(n_sea_cells: usize) -> Self {
        Self {
            n_sea_cells,
            ..Self::default()
        }
    }

    /// Generate SEACellsParams from a TOML string
    ///
    /// Missing keys fall back to the defaults. Environment variables with the
    /// prefix `SEACELLS_` (e.g. `SEACELLS_N_ITER`) override the string.
    ///
    /// ### Params
    ///
    /// * `toml` - The TOML content
    ///
    /// ### Returns
    ///
    /// The parsed parameters
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let parsed = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .add_source(Environment::with_prefix("SEACELLS").try_parsing(true))
            .build()?;

        Ok(parsed.try_deserialize()?)
    }

    /// Generate SEACellsParams from a TOML file
    ///
    /// ### Params
    ///
    /// * `path` - Path to the settings file
    ///
    /// ### Returns
    ///
    /// The parsed parameters
    pub fn from_file(path: &str) -> Result<Self> {
        let parsed = Config::builder()
            .add_source(File::with_name(path).format(FileFormat::Toml))
            .add_source(Environment::with_prefix("SEACELLS").try_parsing(true))
            .build()?;

        Ok(parsed.try_deserialize()?)
    }
}
