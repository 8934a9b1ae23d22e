//! LuciPHOr2 interface: configuration rendering and results parsing.
//!
//! The localization tool is driven by a key-value configuration file and
//! answers with two tab-separated tables: one row per PSM with the best
//! predicted permutation, and an all-permutation score table keyed by
//! spectrum id. This module renders the configuration from classified
//! modification tables and reads both result tables back.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::Ms2Tolerance;
use crate::modification::ModClassifier;
use crate::peptide::PtmNames;
use crate::psm_table::{require_column, TableError};

/// Neutral-loss specification for phosphorylation. Hard-coded chemistry:
/// phospho-peptides lose H3PO4 from S/T/Y under CID/HCD, and LuciPHOr2
/// models the matching decoy loss on all other residues.
const PHOSPHO_NEUTRAL_LOSS: &str = "sty -H3PO4 -97.97690";
const PHOSPHO_DECOY_NEUTRAL_LOSS: &str = "X -H3PO4 -97.07690";

/// A LuciPHOr2 configuration file under construction.
///
/// Field population follows the classifier: fixed modifications become
/// `FIXED_MOD` lines, non-labile variable modifications `VAR_MOD` lines,
/// labile PTMs `TARGET_MOD` lines plus their effective masses in the decoy
/// mass set. LuciPHOr2 cannot score PTMs sharing a residue with a fixed
/// modification, which is why the adjusted masses are used throughout.
#[derive(Debug, Clone)]
pub struct LuciphorConfig {
    /// Directory holding the spectrum files.
    pub spectrum_path: PathBuf,
    /// Spectrum file extension (e.g. `mzML`).
    pub spectrum_suffix: String,
    /// Path of the PSM input file handed to LuciPHOr2.
    pub input_file: PathBuf,
    /// Path LuciPHOr2 writes its results to.
    pub output_file: PathBuf,
    /// Fragment tolerance and unit.
    pub ms2_tol: Ms2Tolerance,
    /// `FIXED_MOD` payloads (`<residue> <mass>`).
    pub fixed_mods: Vec<String>,
    /// `VAR_MOD` payloads.
    pub var_mods: Vec<String>,
    /// `TARGET_MOD` payloads (the labile PTMs to localize).
    pub target_mods: Vec<String>,
    /// Decoy neutral masses, one per distinct target PTM mass.
    pub decoy_masses: Vec<f64>,
    /// `NL` neutral-loss payloads.
    pub neutral_losses: Vec<String>,
    /// `DECOY_NL` payloads.
    pub decoy_neutral_losses: Vec<String>,
}

impl LuciphorConfig {
    /// Populate a configuration from classified modification tables.
    pub fn from_classifier(
        classifier: &ModClassifier,
        names: &PtmNames,
        ms2_tol: Ms2Tolerance,
        spectrum_path: PathBuf,
        spectrum_suffix: String,
        input_file: PathBuf,
        output_file: PathBuf,
    ) -> Self {
        let mut config = Self {
            spectrum_path,
            spectrum_suffix,
            input_file,
            output_file,
            ms2_tol,
            fixed_mods: Vec::new(),
            var_mods: Vec::new(),
            target_mods: Vec::new(),
            decoy_masses: Vec::new(),
            neutral_losses: Vec::new(),
            decoy_neutral_losses: Vec::new(),
        };

        for def in classifier.fixed_mods() {
            config.fixed_mods.extend(ModClassifier::luciphor_mod_lines(def));
        }
        for def in classifier.variable_mods() {
            if names.is_labile(def.name()) {
                config.target_mods.extend(ModClassifier::luciphor_mod_lines(def));
                let mass = def.adjusted_mass();
                if !config.decoy_masses.contains(&mass) {
                    config.decoy_masses.push(mass);
                }
            } else {
                config.var_mods.extend(ModClassifier::luciphor_mod_lines(def));
            }
            if def.name() == "Phospho" {
                config.neutral_losses.push(PHOSPHO_NEUTRAL_LOSS.to_string());
                config
                    .decoy_neutral_losses
                    .push(PHOSPHO_DECOY_NEUTRAL_LOSS.to_string());
            }
        }
        debug!(
            "luciphor config: {} fixed, {} var, {} target mods",
            config.fixed_mods.len(),
            config.var_mods.len(),
            config.target_mods.len()
        );
        config
    }

    /// Render the complete configuration file text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Infallible: writing to a String cannot fail.
        let _ = writeln!(out, "## LuciPHOr2 input configuration");
        let _ = writeln!(out);
        let _ = writeln!(out, "SPECTRUM_PATH = {}", self.spectrum_path.display());
        let _ = writeln!(out, "SPECTRUM_SUFFIX = {}", self.spectrum_suffix);
        let _ = writeln!(out, "INPUT_DATA = {}", self.input_file.display());
        let _ = writeln!(out, "INPUT_TYPE = 1");
        let _ = writeln!(out, "ALGORITHM = 1");
        let _ = writeln!(out, "TSV_HDR = 1");
        let _ = writeln!(out, "MS2_TOL = {}", self.ms2_tol.value);
        let _ = writeln!(out, "MS2_TOL_UNITS = {}", self.ms2_tol.unit.code());
        let _ = writeln!(out, "MIN_MZ = 150.0");
        let _ = writeln!(out, "OUTPUT_FILE = {}", self.output_file.display());
        let _ = writeln!(out, "WRITE_MATCHED_PEAKS_FILE = 0");
        for payload in &self.fixed_mods {
            let _ = writeln!(out, "FIXED_MOD = {}", payload);
        }
        for payload in &self.var_mods {
            let _ = writeln!(out, "VAR_MOD = {}", payload);
        }
        for payload in &self.target_mods {
            let _ = writeln!(out, "TARGET_MOD = {}", payload);
        }
        for payload in &self.neutral_losses {
            let _ = writeln!(out, "NL = {}", payload);
        }
        for mass in &self.decoy_masses {
            let _ = writeln!(out, "DECOY_MASS = {}", mass);
        }
        for payload in &self.decoy_neutral_losses {
            let _ = writeln!(out, "DECOY_NL = {}", payload);
        }
        let _ = writeln!(out, "MAX_CHARGE_STATE = 5");
        let _ = writeln!(out, "MAX_PEP_LEN = 40");
        let _ = writeln!(out, "MAX_NUM_PERM = 16384");
        let _ = writeln!(out, "SELECTION_METHOD = 0");
        let _ = writeln!(out, "MODELING_SCORE_THRESHOLD = 0.95");
        let _ = writeln!(out, "SCORING_THRESHOLD = 0");
        let _ = writeln!(out, "MIN_NUM_PSMS_MODEL = 50");
        let _ = writeln!(out, "MOD_PEP_REP = 0");
        let _ = writeln!(out, "NUM_THREADS = 0");
        let _ = writeln!(out, "RUN_MODE = 0");
        out
    }

    /// Render and write the configuration to a file.
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.render().as_bytes())
    }
}

/// One row of LuciPHOr2's main results table.
#[derive(Debug, Clone)]
pub struct LuciphorRecord {
    /// Spectrum identifier.
    pub spec_id: String,
    /// Best predicted permutation, bracketed-site notation.
    pub predicted_pep: String,
    /// Score of the best permutation.
    pub pep1_score: f64,
    /// Global false-localization-rate estimate.
    pub global_flr: f64,
}

/// One row of LuciPHOr2's all-permutation score table.
#[derive(Debug, Clone)]
pub struct ScorePermutation {
    /// Spectrum identifier, keyed back to the results table.
    pub spec_id: String,
    /// Scored permutation, modified residues down-cased.
    pub permutation: String,
    /// Permutation score.
    pub score: f64,
}

fn parse_float(column: &str, value: &str) -> Result<f64, TableError> {
    value.parse::<f64>().map_err(|_| TableError::InvalidValue {
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Read LuciPHOr2's results table (`specId`, `predictedPep1`, `pep1score`,
/// `globalFLR`; order-independent via header indexing).
pub fn read_luciphor_results<R: Read>(reader: R) -> Result<Vec<LuciphorRecord>, TableError> {
    let mut table = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader);
    let headers = table.headers()?.clone();
    let spec_id = require_column(&headers, "specId")?;
    let predicted = require_column(&headers, "predictedPep1")?;
    let score = require_column(&headers, "pep1score")?;
    let flr = require_column(&headers, "globalFLR")?;

    let mut records = Vec::new();
    for row in table.records() {
        let row = row?;
        records.push(LuciphorRecord {
            spec_id: row.get(spec_id).unwrap_or_default().to_string(),
            predicted_pep: row.get(predicted).unwrap_or_default().to_string(),
            pep1_score: parse_float("pep1score", row.get(score).unwrap_or_default())?,
            global_flr: parse_float("globalFLR", row.get(flr).unwrap_or_default())?,
        });
    }
    Ok(records)
}

/// Read LuciPHOr2's all-permutation score table (`specId`,
/// `curPermutation`, `score`).
pub fn read_score_permutations<R: Read>(reader: R) -> Result<Vec<ScorePermutation>, TableError> {
    let mut table = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader);
    let headers = table.headers()?.clone();
    let spec_id = require_column(&headers, "specId")?;
    let permutation = require_column(&headers, "curPermutation")?;
    let score = require_column(&headers, "score")?;

    let mut records = Vec::new();
    for row in table.records() {
        let row = row?;
        records.push(ScorePermutation {
            spec_id: row.get(spec_id).unwrap_or_default().to_string(),
            permutation: row.get(permutation).unwrap_or_default().to_string(),
            score: parse_float("score", row.get(score).unwrap_or_default())?,
        });
    }
    Ok(records)
}
