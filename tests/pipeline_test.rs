//! Integration tests for ptmBridge
//!
//! These tests drive the full pipeline: library -> classifier -> peptide
//! parsing -> LuciPHOr2 input/config emission and back.

use std::fs;

use tempfile::tempdir;

use ptmbridge::config::{Ms2Tolerance, ToleranceUnit};
use ptmbridge::luciphor::{read_luciphor_results, read_score_permutations, LuciphorConfig};
use ptmbridge::modification::{classify_requested, ModLibrary};
use ptmbridge::peptide::{Psm, PtmNames};
use ptmbridge::psm_table::{LuciphorPsmWriter, PsmTableReader};

const LIBRARY: &str = "229.162932,*,fix,N-term,TMT6plex\n\
229.162932,K,fix,any,TMT6plex\n\
57.021464,C,fix,any,Carbamidomethyl\n\
15.994915,M,opt,any,Oxidation\n\
79.966331,STY,opt,any,Phospho\n";

const PSM_TABLE: &str = "SpecID\tSpectraFile\tScanNum\tCharge\tPeptide\tPSM q-value\n\
s1\trun1.mzML\t1201\t2\t+229.163AS+79.966DMK\t0.001\n\
s2\trun1.mzML\t1305\t3\t+229.163PEPTIDEK\t0.004\n\
s3\trun2.mzML\t2101\t2\tAS+79.966T+79.966K\t0.002\n";

/// Full flow from a library file on disk to the LuciPHOr2 input file.
#[test]
fn test_classify_parse_emit_cycle() {
    let dir = tempdir().unwrap();
    let library_path = dir.path().join("mods_library.txt");
    fs::write(&library_path, LIBRARY).unwrap();

    let library = ModLibrary::from_path(&library_path).unwrap();
    let classifier = classify_requested(
        &library,
        &["tmt6plex".into(), "oxidation".into(), "phospho".into()],
    )
    .unwrap();
    let names = PtmNames::new(&["Phospho".into()], &["Oxidation".into()]);
    let mass_map = classifier.msgf_mass_map();

    // Write the search engine modification file and read it back.
    let modfile_path = dir.path().join("mods.txt");
    let mut modfile = fs::File::create(&modfile_path).unwrap();
    classifier.write_msgf_modfile(2, &mut modfile).unwrap();
    let modfile_text = fs::read_to_string(&modfile_path).unwrap();
    let lines: Vec<&str> = modfile_text.lines().collect();
    assert_eq!(lines[0], "NumMods=2");
    // Fixed lines first (grouped in first-seen key order), then variable.
    assert_eq!(lines[1], "229.162932,*,fix,N-term,TMT6plex");
    assert_eq!(lines[2], "229.162932,K,fix,any,TMT6plex");
    assert_eq!(lines[3], "15.994915,M,opt,any,Oxidation");
    assert_eq!(lines[4], "79.966331,STY,opt,any,Phospho");
    assert_eq!(lines.len(), 5);

    // Select labile-carrying PSMs into the LuciPHOr2 input file.
    let lucipsms_path = dir.path().join("lucipsms.txt");
    let mut reader = PsmTableReader::from_reader(std::io::Cursor::new(PSM_TABLE)).unwrap();
    let mut writer = LuciphorPsmWriter::to_path(&lucipsms_path).unwrap();
    for row in reader.rows() {
        let row = row.unwrap();
        let mut psm = Psm::new();
        psm.parse_msgf_sequence(&row.peptide, &mass_map, &names).unwrap();
        writer.write_psm(&row, &psm).unwrap();
    }
    // s2 carries only the fixed N-terminal tag: nothing to localize.
    assert_eq!(writer.rows_written(), 2);

    let lucipsms = fs::read_to_string(&lucipsms_path).unwrap();
    let rows: Vec<&str> = lucipsms.lines().collect();
    assert_eq!(rows[0], "srcFile\tscanNum\tcharge\tPSMscore\tpeptide\tmodSites");
    assert!(rows[1].starts_with("run1.mzML\t1201\t2\t0.001\tASDMK\t"));
    assert!(rows[2].starts_with("run2.mzML\t2101\t2\t0.002\tASTK\t"));

    // Render the LuciPHOr2 configuration against the same tables.
    let config = LuciphorConfig::from_classifier(
        &classifier,
        &names,
        Ms2Tolerance::new(20.0, ToleranceUnit::Ppm),
        dir.path().to_path_buf(),
        "mzML".to_string(),
        lucipsms_path.clone(),
        dir.path().join("luciphor_out.tsv"),
    );
    let config_path = dir.path().join("luciphor_config.txt");
    config.write_to_path(&config_path).unwrap();
    let config_text = fs::read_to_string(&config_path).unwrap();
    assert!(config_text.contains("MS2_TOL = 20\n"));
    assert!(config_text.contains("MS2_TOL_UNITS = 1\n"));
    assert!(config_text.contains("FIXED_MOD = [ 229.162932\n"));
    assert!(config_text.contains("VAR_MOD = M 15.994915\n"));
    assert!(config_text.contains("TARGET_MOD = S 79.966331\n"));
    assert!(config_text.contains("NL = sty -H3PO4 -97.97690\n"));
    assert!(config_text.contains("DECOY_MASS = 79.966331\n"));
}

/// Fold LuciPHOr2 results and permutation scores back into report fields.
#[test]
fn test_results_round_trip() {
    let library = ModLibrary::from_reader(std::io::Cursor::new(LIBRARY)).unwrap();
    let classifier = classify_requested(
        &library,
        &["tmt6plex".into(), "oxidation".into(), "phospho".into()],
    )
    .unwrap();
    let names = PtmNames::new(&["Phospho".into()], &["Oxidation".into()]);
    let site_map = classifier.luciphor_site_map();

    let results = "specId\tpredictedPep1\tpep1score\tglobalFLR\n\
        run1.1201.1201.2\tAS[167]DTK\t132.2\t0.008\n";
    let scores = "specId\tcurPermutation\tscore\n\
        run1.1201.1201.2\tAsDTK\t132.2\n\
        run1.1201.1201.2\tASDtK\t101.8\n\
        run1.1201.1201.2\taSDTK\t12.5\n";

    let records = read_luciphor_results(std::io::Cursor::new(results)).unwrap();
    let permutations = read_score_permutations(std::io::Cursor::new(scores)).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(permutations.len(), 3);

    let mut psm = Psm::new();
    psm.parse_luciphor_sequence(&records[0], &site_map, &names).unwrap();
    for permutation in &permutations {
        psm.record_alt_localization(&permutation.permutation, permutation.score, 50.0);
    }

    assert_eq!(psm.sequence, "ASDTK");
    assert_eq!(psm.top_ptm_output(), "Phospho:S2");
    // The canonical permutation and the low scorer are dropped; only the
    // competing T-site survives.
    assert_eq!(psm.format_alt_ptm_locs(), "T4:101.8");
    assert_eq!(psm.top_score, Some(132.2));
    assert_eq!(psm.top_flr, Some(0.008));
}
