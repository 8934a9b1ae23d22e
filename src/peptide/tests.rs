use proptest::prelude::*;

use super::*;
use crate::luciphor::LuciphorRecord;
use crate::modification::{classify_requested, ModClassifier, ModLibrary, ModificationError};

const SAMPLE_LIBRARY: &str = "229.162932,*,fix,N-term,TMT6plex\n\
229.162932,K,fix,any,TMT6plex\n\
57.021464,C,fix,any,Carbamidomethyl\n\
15.994915,M,opt,any,Oxidation\n\
79.966331,STY,opt,any,Phospho\n\
42.010565,*,opt,Prot-N-term,Acetyl\n";

fn library() -> ModLibrary {
    ModLibrary::from_reader(std::io::Cursor::new(SAMPLE_LIBRARY)).expect("library fixture")
}

fn classifier(requested: &[&str]) -> ModClassifier {
    let requested: Vec<String> = requested.iter().map(|r| r.to_string()).collect();
    classify_requested(&library(), &requested).expect("classifier fixture")
}

fn names() -> PtmNames {
    PtmNames::new(&["Phospho".into(), "Acetyl".into()], &["Oxidation".into()])
}

fn luciphor_record(predicted_pep: &str) -> LuciphorRecord {
    LuciphorRecord {
        spec_id: "run1.1201.1201.2".to_string(),
        predicted_pep: predicted_pep.to_string(),
        pep1_score: 120.5,
        global_flr: 0.01,
    }
}

#[test]
fn residue_mod_site_indices() {
    let mods = ModClassifier::from_spec_lines(["15.9949,M,opt,any,Oxidation"], "")
        .expect("classifier");
    let mut psm = Psm::new();
    psm.parse_msgf_sequence("ACDEF+15.9949GHIK", &mods.msgf_mass_map(), &names())
        .expect("parse");

    assert_eq!(psm.sequence, "ACDEFGHIK");
    assert_eq!(psm.mods.len(), 1);
    let occurrence = &psm.mods[0];
    assert_eq!(occurrence.residue, 'F');
    assert_eq!(occurrence.site_zero_based, 4);
    assert_eq!(occurrence.site_one_based, 5);
    assert_eq!(occurrence.mass, 15.9949);
    assert_eq!(occurrence.modtype, ModType::Stable);
}

#[test]
fn leading_delta_is_protein_n_terminal() {
    let mods = classifier(&["tmt6plex"]);
    let mut psm = Psm::new();
    psm.parse_msgf_sequence("+229.163PEPTIDEK", &mods.msgf_mass_map(), &names())
        .expect("parse");

    assert_eq!(psm.sequence, "PEPTIDEK");
    assert_eq!(psm.mods.len(), 1);
    let occurrence = &psm.mods[0];
    assert_eq!(occurrence.residue, PROTEIN_N_TERM);
    assert_eq!(occurrence.site_zero_based, PROTEIN_N_TERM_SITE);
    assert_eq!(occurrence.site_one_based, PROTEIN_N_TERM_SITE + 1);
    assert_eq!(occurrence.modtype, ModType::Fixed);
}

#[test]
fn stacked_deltas_each_resolve() {
    let mods = classifier(&["carbamidomethyl", "oxidation"]);
    let mut psm = Psm::new();
    psm.parse_msgf_sequence("AC+57.021+15.995DE", &mods.msgf_mass_map(), &names())
        .expect("parse");

    assert_eq!(psm.sequence, "ACDE");
    assert_eq!(psm.mods.len(), 2);
    assert_eq!(psm.mods[0].name, "Carbamidomethyl");
    assert_eq!(psm.mods[1].name, "Oxidation");
    assert!(psm.mods.iter().all(|m| m.residue == 'C' && m.site_zero_based == 1));
}

#[test]
fn unknown_inline_mass_is_fatal() {
    let mods = classifier(&["oxidation"]);
    let mut psm = Psm::new();
    let err = psm
        .parse_msgf_sequence("A+123.456CDE", &mods.msgf_mass_map(), &names())
        .unwrap_err();
    assert!(matches!(err, ModificationError::UnknownModification { .. }));
    assert!(err.to_string().contains("+123.456"));
}

#[test]
fn unannotated_sequence_parses_clean() {
    let mods = classifier(&["oxidation"]);
    let mut psm = Psm::new();
    psm.parse_msgf_sequence("PEPTIDEK", &mods.msgf_mass_map(), &names())
        .expect("parse");
    assert_eq!(psm.sequence, "PEPTIDEK");
    assert!(psm.mods.is_empty());
    assert!(!psm.has_labile());
}

proptest! {
    /// Stripping the inline deltas a parse consumed must reproduce the
    /// bare sequence, residues unchanged and in order.
    #[test]
    fn msgf_parse_round_trips_bare_sequence(
        bare in "[ACDEFGHIKLMNPQRSTVWY]{1,30}",
        mask in any::<u32>(),
        n_term in any::<bool>(),
    ) {
        let mods = classifier(&["phospho"]);
        let mass_map = mods.msgf_mass_map();
        let mut annotated = String::new();
        let mut expected_mods = 0usize;
        if n_term {
            annotated.push_str("+79.966");
            expected_mods += 1;
        }
        for (idx, residue) in bare.chars().enumerate() {
            annotated.push(residue);
            if mask & (1 << (idx % 32)) > 0 {
                annotated.push_str("+79.966");
                expected_mods += 1;
            }
        }

        let mut psm = Psm::new();
        psm.parse_msgf_sequence(&annotated, &mass_map, &names()).expect("parse");
        prop_assert_eq!(&psm.sequence, &bare);
        prop_assert_eq!(psm.mods.len(), expected_mods);
    }
}

#[test]
fn luciphor_parse_keeps_only_labile_ptms() {
    let mods = classifier(&["tmt6plex", "phospho"]);
    let site_map = mods.luciphor_site_map();
    let mut psm = Psm::new();
    psm.parse_luciphor_sequence(&luciphor_record("K[357]AS[167]DTK"), &site_map, &names())
        .expect("parse");

    // The TMT-carrying K resolves (128.094963 + 229.162932 rounds to 357)
    // but is fixed, so only the phospho-serine survives.
    assert_eq!(psm.sequence, "KASDTK");
    assert_eq!(psm.mods.len(), 1);
    let occurrence = &psm.mods[0];
    assert_eq!(occurrence.residue, 'S');
    assert_eq!(occurrence.site_zero_based, 2);
    assert_eq!(occurrence.modtype, ModType::Labile);

    assert_eq!(psm.top_score, Some(120.5));
    assert_eq!(psm.top_flr, Some(0.01));
    assert_eq!(psm.spectrum_id.as_deref(), Some("run1.1201.1201.2"));
}

#[test]
fn luciphor_parse_n_terminal_sentinel() {
    let mods = classifier(&["acetyl"]);
    let site_map = mods.luciphor_site_map();
    let mut psm = Psm::new();
    psm.parse_luciphor_sequence(&luciphor_record("[42]ASDTK"), &site_map, &names())
        .expect("parse");

    assert_eq!(psm.sequence, "ASDTK");
    assert_eq!(psm.mods.len(), 1);
    assert_eq!(psm.mods[0].residue, PROTEIN_N_TERM);
    assert_eq!(psm.mods[0].site_zero_based, PROTEIN_N_TERM_SITE);
    assert_eq!(psm.mods[0].site_one_based, -99);
}

#[test]
fn luciphor_parse_unknown_code_is_fatal() {
    let mods = classifier(&["phospho"]);
    let site_map = mods.luciphor_site_map();
    let mut psm = Psm::new();
    let err = psm
        .parse_luciphor_sequence(&luciphor_record("AS[999]DTK"), &site_map, &names())
        .unwrap_err();
    assert!(matches!(err, ModificationError::UnknownModification { .. }));
}

#[test]
fn score_permutation_rendering() {
    let mods = classifier(&["tmt6plex", "phospho"]);
    let site_map = mods.luciphor_site_map();
    let mut psm = Psm::new();
    psm.parse_luciphor_sequence(&luciphor_record("[229]AS[167]DT[181]K"), &site_map, &names())
        .expect("parse");

    // Modified residues are down-cased with their brackets stripped; the
    // residue-less leading bracket stays untouched.
    assert_eq!(psm.score_permutation(), Some("[229]AsDtK"));
}

#[test]
fn alternative_localizations_accumulate_above_threshold() {
    let mods = classifier(&["phospho"]);
    let site_map = mods.luciphor_site_map();
    let mut psm = Psm::new();
    psm.parse_luciphor_sequence(&luciphor_record("AS[167]DTK"), &site_map, &names())
        .expect("parse");
    assert_eq!(psm.score_permutation(), Some("AsDTK"));

    // Canonical permutation: never an alternative, whatever its score.
    psm.record_alt_localization("AsDTK", 0.99, 0.75);
    // Below the threshold: dropped.
    psm.record_alt_localization("ASDtK", 0.5, 0.75);
    assert_eq!(psm.format_alt_ptm_locs(), "NA");

    psm.record_alt_localization("ASDtK", 0.9, 0.75);
    assert_eq!(psm.format_alt_ptm_locs(), "T4:0.9");

    // Candidates accumulate across calls; entries within a candidate are
    // comma-joined, candidates semicolon-joined.
    psm.record_alt_localization("aSDtK", 0.8, 0.75);
    assert_eq!(psm.format_alt_ptm_locs(), "T4:0.9;A1:0.8,T4:0.8");
}

#[test]
fn no_recorded_alternatives_renders_na() {
    let psm = Psm::new();
    assert_eq!(psm.format_alt_ptm_locs(), "NA");
}

#[test]
fn merge_is_add_if_absent_and_idempotent() {
    let mods = classifier(&["phospho", "oxidation"]);
    let mass_map = mods.msgf_mass_map();
    let mut psm = Psm::new();
    psm.parse_msgf_sequence("AS+79.966M+15.995K", &mass_map, &names())
        .expect("parse");
    assert_eq!(psm.mods.len(), 2);

    // Merging a PSM's own list into itself is a no-op.
    let own = psm.mods.clone();
    psm.merge_mods(&own);
    assert_eq!(psm.mods.len(), 2);

    // A new name is added; a known one keeps its first copy.
    let mut other = Psm::new();
    other
        .parse_msgf_sequence("AS+79.966DM+15.995K", &mass_map, &names())
        .expect("parse");
    let mut extra = other.mods.clone();
    extra[0].site_zero_based = 3;
    psm.merge_mods(&extra);
    assert_eq!(psm.mods.len(), 2);
    assert_eq!(psm.mods[0].site_zero_based, 1);
}

#[test]
fn labile_and_stable_predicates_and_report() {
    let mods = classifier(&["phospho", "oxidation"]);
    let mass_map = mods.msgf_mass_map();
    let mut psm = Psm::new();
    psm.parse_msgf_sequence("AS+79.966DM+15.995K", &mass_map, &names())
        .expect("parse");

    assert!(psm.has_labile());
    assert!(psm.has_stable());
    assert_eq!(psm.top_ptm_output(), "Phospho:S2_Oxidation:M4");
}

#[test]
fn top_ptm_output_groups_sites_by_name() {
    let mods = classifier(&["phospho"]);
    let mass_map = mods.msgf_mass_map();
    let mut psm = Psm::new();
    psm.parse_msgf_sequence("S+79.966AS+79.966K", &mass_map, &names())
        .expect("parse");
    assert_eq!(psm.top_ptm_output(), "Phospho:S1,S3");
}

#[test]
fn luciphor_input_sites_skips_fixed_mods() {
    let mods = classifier(&["tmt6plex", "phospho"]);
    let mass_map = mods.msgf_mass_map();
    let mut psm = Psm::new();
    psm.parse_msgf_sequence("+229.163AS+79.966K", &mass_map, &names())
        .expect("parse");

    // The fixed N-terminal TMT is dropped; the phospho-serine renders as
    // site=residue mass + modification mass (87.032028 + 79.966331).
    assert_eq!(psm.luciphor_input_sites(), "1=166.99836");
}
