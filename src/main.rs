//! # ptmBridge CLI
//!
//! Command-line frontend for the PTM annotation normalizer.
//!
//! ## Usage
//!
//! ```bash
//! # Write the search engine's modification file
//! ptmbridge modfile --library mods_library.txt --mods "tmt6plex;phospho" --num-mods 2
//!
//! # Render the LuciPHOr2 configuration (MS2TOLVALUE/MS2TOLTYPE from the environment)
//! ptmbridge luciphor-config --library mods_library.txt --mods tmt6plex --labile-ptms phospho \
//!     --spectrum-path /data/spectra --input lucipsms.txt --luciphor-output luciphor_out.tsv
//!
//! # Select PSMs carrying labile PTMs into the LuciPHOr2 input file
//! ptmbridge luciphor-psms --library mods_library.txt --mods tmt6plex --labile-ptms phospho \
//!     --psms psmtable.txt -o lucipsms.txt
//!
//! # Fold LuciPHOr2 results back into a PTM report
//! ptmbridge luciphor-parse --library mods_library.txt --mods tmt6plex --labile-ptms phospho \
//!     --results luciphor_out.tsv --scores all_scores.tsv -o ptms.tsv
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use ptmbridge::config::Ms2Tolerance;
use ptmbridge::luciphor::{read_luciphor_results, read_score_permutations, LuciphorConfig};
use ptmbridge::modification::{classify_requested, ModClassifier, ModLibrary};
use ptmbridge::peptide::{Psm, PtmNames};
use ptmbridge::psm_table::{LuciphorPsmWriter, PsmTableReader};

/// ptmBridge - Peptide Modification Annotation Normalizer
#[derive(Parser)]
#[command(name = "ptmbridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Modification selection shared by every subcommand.
#[derive(Args)]
struct ModArgs {
    /// Modification library file (comma-separated spec lines)
    #[arg(long, value_name = "FILE")]
    library: PathBuf,

    /// Modification names to apply (library names or raw spec lines;
    /// repeatable, entries may be ';'-separated)
    #[arg(long = "mods", value_name = "NAME")]
    mods: Vec<String>,

    /// Labile PTM names: localization-scored and removable before scoring
    #[arg(long = "labile-ptms", value_name = "NAME")]
    labile_ptms: Vec<String>,
}

/// Split repeatable CLI entries that may themselves be ';'-separated.
fn split_entries(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .flat_map(|entry| entry.split(';'))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

impl ModArgs {
    fn load(&self) -> Result<(ModLibrary, ModClassifier, PtmNames)> {
        let library = ModLibrary::from_path(&self.library).with_context(|| {
            format!("Failed to load modification library {}", self.library.display())
        })?;
        let labile = split_entries(&self.labile_ptms);
        let other = split_entries(&self.mods);
        let requested: Vec<String> = labile.iter().chain(other.iter()).cloned().collect();
        let classifier = classify_requested(&library, &requested)
            .context("Failed to classify requested modifications")?;
        // Every non-labile requested name counts as a stable PTM candidate:
        // if it resolves to a variable modification it is reported, just
        // not localization-scored.
        let names = PtmNames::new(&labile, &other);
        Ok((library, classifier, names))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write the search engine's modification file (NumMods=... plus spec lines)
    Modfile {
        #[command(flatten)]
        mods: ModArgs,

        /// Maximum number of variable modifications per peptide
        #[arg(long, default_value = "2")]
        num_mods: u32,

        /// Output modification file
        #[arg(short, long, default_value = "mods.txt")]
        output: PathBuf,
    },

    /// Render the LuciPHOr2 configuration file
    LuciphorConfig {
        #[command(flatten)]
        mods: ModArgs,

        /// Directory containing the spectrum files
        #[arg(long, value_name = "DIR")]
        spectrum_path: PathBuf,

        /// Spectrum file suffix
        #[arg(long, default_value = "mzML")]
        spectrum_suffix: String,

        /// PSM input file referenced from the configuration
        #[arg(long, value_name = "FILE", default_value = "lucipsms.txt")]
        input: PathBuf,

        /// Results file LuciPHOr2 should write
        #[arg(long, value_name = "FILE", default_value = "luciphor_out.tsv")]
        luciphor_output: PathBuf,

        /// Output configuration file
        #[arg(short, long, default_value = "luciphor_config.txt")]
        output: PathBuf,
    },

    /// Select PSMs carrying labile PTMs into the LuciPHOr2 input file
    LuciphorPsms {
        #[command(flatten)]
        mods: ModArgs,

        /// Search engine PSM table (tab-separated, header-indexed)
        #[arg(long, value_name = "FILE")]
        psms: PathBuf,

        /// Output LuciPHOr2 PSM input file
        #[arg(short, long, default_value = "lucipsms.txt")]
        output: PathBuf,
    },

    /// Fold LuciPHOr2 results back into a per-PSM PTM report
    LuciphorParse {
        #[command(flatten)]
        mods: ModArgs,

        /// LuciPHOr2 results table
        #[arg(long, value_name = "FILE")]
        results: PathBuf,

        /// LuciPHOr2 all-permutation score table
        #[arg(long, value_name = "FILE")]
        scores: Option<PathBuf>,

        /// Search engine PSM table; its modifications (e.g. stable PTMs
        /// LuciPHOr2 never re-emits) are merged into the report
        #[arg(long, value_name = "FILE")]
        psms: Option<PathBuf>,

        /// Minimum permutation score for an alternative localization
        #[arg(long, default_value = "0.75")]
        min_score: f64,

        /// Output report table
        #[arg(short, long, default_value = "ptms.tsv")]
        output: PathBuf,
    },

    /// Display the classified modification tables
    Info {
        #[command(flatten)]
        mods: ModArgs,

        /// Emit the tables as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Modfile {
            mods,
            num_mods,
            output,
        } => run_modfile(mods, num_mods, output),
        Commands::LuciphorConfig {
            mods,
            spectrum_path,
            spectrum_suffix,
            input,
            luciphor_output,
            output,
        } => run_luciphor_config(
            mods,
            spectrum_path,
            spectrum_suffix,
            input,
            luciphor_output,
            output,
        ),
        Commands::LuciphorPsms { mods, psms, output } => run_luciphor_psms(mods, psms, output),
        Commands::LuciphorParse {
            mods,
            results,
            scores,
            psms,
            min_score,
            output,
        } => run_luciphor_parse(mods, results, scores, psms, min_score, output),
        Commands::Info { mods, json } => run_info(mods, json),
    }
}

/// Write the search engine's modification file
fn run_modfile(mods: ModArgs, num_mods: u32, output: PathBuf) -> Result<()> {
    let (_, classifier, _) = mods.load()?;

    let mut writer = BufWriter::new(
        File::create(&output)
            .with_context(|| format!("Failed to create {}", output.display()))?,
    );
    classifier
        .write_msgf_modfile(num_mods, &mut writer)
        .context("Failed to write modification file")?;
    writer.flush()?;

    info!("Wrote {} with NumMods={}", output.display(), num_mods);
    Ok(())
}

/// Render the LuciPHOr2 configuration file
fn run_luciphor_config(
    mods: ModArgs,
    spectrum_path: PathBuf,
    spectrum_suffix: String,
    input: PathBuf,
    luciphor_output: PathBuf,
    output: PathBuf,
) -> Result<()> {
    // Resolve the tolerance before anything else: a bad unit must abort
    // before any row is processed.
    let ms2_tol = Ms2Tolerance::from_env().context("Failed to resolve MS2 tolerance")?;
    let (_, classifier, names) = mods.load()?;

    let config = LuciphorConfig::from_classifier(
        &classifier,
        &names,
        ms2_tol,
        spectrum_path,
        spectrum_suffix,
        input,
        luciphor_output,
    );
    config
        .write_to_path(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Wrote LuciPHOr2 configuration to {}", output.display());
    Ok(())
}

/// Select PSMs carrying labile PTMs into the LuciPHOr2 input file
fn run_luciphor_psms(mods: ModArgs, psms: PathBuf, output: PathBuf) -> Result<()> {
    let (_, classifier, names) = mods.load()?;
    let mass_map = classifier.msgf_mass_map();

    let mut reader = PsmTableReader::from_path(&psms)
        .with_context(|| format!("Failed to open PSM table {}", psms.display()))?;
    let mut writer = LuciphorPsmWriter::to_path(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let mut total = 0usize;
    for row in reader.rows() {
        let row = row.context("Malformed PSM table row")?;
        total += 1;
        let mut psm = Psm::new();
        psm.parse_msgf_sequence(&row.peptide, &mass_map, &names)
            .with_context(|| format!("Failed to parse peptide '{}'", row.peptide))?;
        writer.write_psm(&row, &psm)?;
    }

    info!(
        "Wrote {} of {} PSMs to {}",
        writer.rows_written(),
        total,
        output.display()
    );
    Ok(())
}

/// The spectrum identifier LuciPHOr2 derives for a PSM table row:
/// `<source file stem>.<scan>.<scan>.<charge>`.
fn luciphor_spec_id(row: &ptmbridge::psm_table::PsmRow) -> String {
    let stem = std::path::Path::new(&row.spectra_file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| row.spectra_file.clone());
    format!("{}.{}.{}.{}", stem, row.scan_num, row.scan_num, row.charge)
}

/// Fold LuciPHOr2 results back into a per-PSM PTM report
fn run_luciphor_parse(
    mods: ModArgs,
    results: PathBuf,
    scores: Option<PathBuf>,
    psms: Option<PathBuf>,
    min_score: f64,
    output: PathBuf,
) -> Result<()> {
    let (_, classifier, names) = mods.load()?;
    let site_map = classifier.luciphor_site_map();

    let records = read_luciphor_results(
        File::open(&results)
            .with_context(|| format!("Failed to open {}", results.display()))?,
    )
    .context("Failed to read LuciPHOr2 results")?;

    let permutations = match scores {
        Some(path) => read_score_permutations(
            File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?,
        )
        .context("Failed to read LuciPHOr2 score table")?,
        None => Vec::new(),
    };

    // Re-parse the search-engine PSMs so modifications LuciPHOr2 never
    // re-emits (stable PTMs, plain variable chemistry) make it into the
    // report; merged add-if-absent by name.
    let mut table_psms: HashMap<String, Psm> = HashMap::new();
    if let Some(path) = psms {
        let mass_map = classifier.msgf_mass_map();
        let mut reader = PsmTableReader::from_path(&path)
            .with_context(|| format!("Failed to open PSM table {}", path.display()))?;
        for row in reader.rows() {
            let row = row.context("Malformed PSM table row")?;
            let mut psm = Psm::new();
            psm.parse_msgf_sequence(&row.peptide, &mass_map, &names)
                .with_context(|| format!("Failed to parse peptide '{}'", row.peptide))?;
            table_psms.insert(luciphor_spec_id(&row), psm);
        }
    }

    let mut writer = BufWriter::new(
        File::create(&output)
            .with_context(|| format!("Failed to create {}", output.display()))?,
    );
    writeln!(
        writer,
        "specId\tpeptide\ttopPTM\taltPTMsites\tscore\tglobalFLR"
    )?;

    for record in &records {
        let mut psm = Psm::new();
        psm.parse_luciphor_sequence(record, &site_map, &names)
            .with_context(|| format!("Failed to parse predicted peptide '{}'", record.predicted_pep))?;
        for permutation in permutations.iter().filter(|p| p.spec_id == record.spec_id) {
            psm.record_alt_localization(&permutation.permutation, permutation.score, min_score);
        }
        if let Some(source) = table_psms.get(&record.spec_id) {
            psm.merge_mods(&source.mods);
        }
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            record.spec_id,
            psm.sequence,
            psm.top_ptm_output(),
            psm.format_alt_ptm_locs(),
            record.pep1_score,
            record.global_flr
        )?;
    }
    writer.flush()?;

    info!("Wrote {} report rows to {}", records.len(), output.display());
    Ok(())
}

/// Display the classified modification tables
fn run_info(mods: ModArgs, json: bool) -> Result<()> {
    let (library, classifier, names) = mods.load()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&classifier)?);
        return Ok(());
    }

    println!("ptmBridge Modification Tables");
    println!("=============================");
    println!("Library names: {}", library.known_names().join(", "));
    println!();

    println!("Fixed modifications:");
    for def in classifier.fixed_mods() {
        println!("  {:<20} {:>12}  {}__{}", def.name(), def.mass(), def.residues(), def.position());
    }
    println!();

    println!("Variable modifications:");
    for def in classifier.variable_mods() {
        let class = if names.is_labile(def.name()) {
            "labile"
        } else if names.is_stable(def.name()) {
            "stable"
        } else {
            "variable"
        };
        let adjusted = if def.is_adjusted() {
            format!(" (adjusted: {})", def.adjusted_mass())
        } else {
            String::new()
        };
        println!(
            "  {:<20} {:>12}  {}__{}  [{}]{}",
            def.name(),
            def.mass(),
            def.residues(),
            def.position(),
            class,
            adjusted
        );
    }
    Ok(())
}
