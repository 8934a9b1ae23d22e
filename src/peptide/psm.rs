use std::collections::HashMap;

use indexmap::IndexMap;
use log::warn;
use regex::{Captures, Regex};

use crate::chemistry::{format_mass, residue_monoisotopic_mass};
use crate::luciphor::LuciphorRecord;
use crate::modification::{milli_mass_key, ModificationDefinition, ModificationError};

use super::{ModOccurrence, ModType, PtmNames, PROTEIN_N_TERM, PROTEIN_N_TERM_SITE};

/// A peptide-spectrum match and its modification occurrences.
///
/// A `Psm` is created fresh per input row and populated by exactly one of
/// the two peptide-parsing calls; it may later be enriched with
/// alternative localizations from the score-permutation table and with
/// modifications merged in from an earlier parse of the same PSM. The
/// modification list is owned exclusively by its PSM.
#[derive(Debug, Clone, Default)]
pub struct Psm {
    /// Bare peptide sequence, all annotations stripped.
    pub sequence: String,
    /// Modification occurrences in parse order.
    pub mods: Vec<ModOccurrence>,
    /// Best localization permutation score, when parsed from LuciPHOr2.
    pub top_score: Option<f64>,
    /// Global false-localization-rate estimate, when parsed from LuciPHOr2.
    pub top_flr: Option<f64>,
    /// Spectrum identifier, when parsed from LuciPHOr2.
    pub spectrum_id: Option<String>,
    alt_ptm_locs: Vec<Vec<String>>,
    score_permutation: Option<String>,
}

impl Psm {
    /// Create an empty PSM.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a search-engine sequence with inline signed mass deltas.
    ///
    /// A delta follows the residue it modifies (`ACDEF+15.9949GHIK`); a
    /// sequence-leading delta is a protein N-terminal modification at the
    /// `-100` sentinel. Stacked deltas (`C+57.021+15.995`) each resolve
    /// separately. Every delta must resolve through `mass_map` - an
    /// unmatched mass is a hard [`ModificationError::UnknownModification`],
    /// never silently dropped.
    pub fn parse_msgf_sequence(
        &mut self,
        annotated: &str,
        mass_map: &HashMap<i64, ModificationDefinition>,
        names: &PtmNames,
    ) -> Result<(), ModificationError> {
        #[allow(clippy::unwrap_used)]
        let token_re = Regex::new(r"([A-Z])?([0-9.+-]+)").unwrap();
        #[allow(clippy::unwrap_used)]
        let delta_re = Regex::new(r"[+-][0-9.]+").unwrap();

        self.mods.clear();
        let mut bare = String::new();
        let mut consumed = 0;
        for cap in token_re.captures_iter(annotated) {
            let Some(whole) = cap.get(0) else { continue };
            let (residue, site) = match cap.get(1) {
                Some(letter) => {
                    // The annotation modifies the residue right before it.
                    bare.push_str(&annotated[consumed..letter.end()]);
                    let residue = bare.as_bytes()[bare.len() - 1] as char;
                    (residue, (bare.len() - 1) as i32)
                }
                None => (PROTEIN_N_TERM, PROTEIN_N_TERM_SITE),
            };
            consumed = whole.end();

            let deltas = cap.get(2).map_or("", |m| m.as_str());
            for delta in delta_re.find_iter(deltas) {
                let unknown = || ModificationError::UnknownModification {
                    mass: delta.as_str().to_string(),
                    sequence: annotated.to_string(),
                };
                let mass: f64 = delta.as_str().parse().map_err(|_| unknown())?;
                let def = mass_map.get(&milli_mass_key(mass)).ok_or_else(unknown)?;
                self.mods
                    .push(ModOccurrence::from_definition(residue, site, def, names));
            }
        }
        bare.push_str(&annotated[consumed..]);
        self.sequence = bare;
        Ok(())
    }

    /// Parse a LuciPHOr2 result row with bracketed site codes.
    ///
    /// Every `X[code]` token must resolve through `site_map`, but only
    /// tokens naming a *labile* PTM become occurrences - fixed and plain
    /// variable modifications were consumed before LuciPHOr2 ran and are
    /// not re-emitted here. Also derives the lower-cased score-permutation
    /// rendering used to align against the per-permutation score table.
    pub fn parse_luciphor_sequence(
        &mut self,
        record: &LuciphorRecord,
        site_map: &HashMap<(char, i64), ModificationDefinition>,
        names: &PtmNames,
    ) -> Result<(), ModificationError> {
        #[allow(clippy::unwrap_used)]
        let token_re = Regex::new(r"([A-Z])?\[([0-9]+)\]").unwrap();
        #[allow(clippy::unwrap_used)]
        let permutation_re = Regex::new(r"([A-Z])\[[0-9]+\]").unwrap();

        self.top_flr = Some(record.global_flr);
        self.top_score = Some(record.pep1_score);
        self.spectrum_id = Some(record.spec_id.clone());
        self.mods.clear();

        let modpep = &record.predicted_pep;
        let mut bare = String::new();
        let mut consumed = 0;
        for cap in token_re.captures_iter(modpep) {
            let Some(whole) = cap.get(0) else { continue };
            if let Some(letter) = cap.get(1) {
                bare.push_str(&modpep[consumed..letter.end()]);
            }
            consumed = whole.end();

            let unknown = || ModificationError::UnknownModification {
                mass: whole.as_str().to_string(),
                sequence: modpep.clone(),
            };
            let marker = cap
                .get(1)
                .and_then(|m| m.as_str().chars().next())
                .unwrap_or(PROTEIN_N_TERM);
            let code: i64 = cap
                .get(2)
                .map_or("", |m| m.as_str())
                .parse()
                .map_err(|_| unknown())?;
            let def = site_map.get(&(marker, code)).ok_or_else(unknown)?;

            if names.is_labile(def.name()) {
                let (residue, site) = if bare.is_empty() {
                    (PROTEIN_N_TERM, PROTEIN_N_TERM_SITE)
                } else {
                    (bare.as_bytes()[bare.len() - 1] as char, (bare.len() - 1) as i32)
                };
                self.mods
                    .push(ModOccurrence::from_definition(residue, site, def, names));
            }
        }
        self.sequence = format!("{}{}", bare, &modpep[consumed..]);
        // Down-case each modified residue and strip its brackets; a
        // residue-less leading bracket stays as-is, matching LuciPHOr2's
        // own permutation strings.
        self.score_permutation = Some(
            permutation_re
                .replace_all(modpep, |c: &Captures| c[1].to_lowercase())
                .into_owned(),
        );
        Ok(())
    }

    /// The lower-cased score-permutation rendering of the last
    /// LuciPHOr2 parse, the canonical key into the score table.
    pub fn score_permutation(&self) -> Option<&str> {
        self.score_permutation.as_deref()
    }

    /// Record an alternative localization candidate.
    ///
    /// A competing permutation contributes one candidate - one
    /// `<residue><one-based site>:<score>` entry per down-cased (=modified)
    /// letter - when it differs from the canonical permutation and its
    /// score exceeds `min_score`. Candidates accumulate across calls.
    pub fn record_alt_localization(&mut self, permutation: &str, score: f64, min_score: f64) {
        if self.score_permutation.as_deref() == Some(permutation) || score <= min_score {
            return;
        }
        let candidate: Vec<String> = permutation
            .char_indices()
            .filter(|(_, c)| c.is_ascii_lowercase())
            .map(|(idx, c)| format!("{}{}:{}", c, idx + 1, score))
            .collect();
        self.alt_ptm_locs.push(candidate);
    }

    /// Render the recorded alternative localizations: upper-cased,
    /// comma-joined within a candidate, semicolon-joined across
    /// candidates; the literal `NA` when none were recorded.
    pub fn format_alt_ptm_locs(&self) -> String {
        if self.alt_ptm_locs.is_empty() {
            return "NA".to_string();
        }
        self.alt_ptm_locs
            .iter()
            .map(|candidate| candidate.join(",").to_uppercase())
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Merge modifications from another parse of the same PSM.
    ///
    /// Add-if-absent by name: whichever copy was added first is preserved,
    /// so the merge is idempotent and never duplicate-counts a
    /// modification already known.
    pub fn merge_mods(&mut self, incoming: &[ModOccurrence]) {
        for occurrence in incoming {
            if !self.mods.iter().any(|m| m.name == occurrence.name) {
                self.mods.push(occurrence.clone());
            }
        }
    }

    /// Whether any occurrence is a labile PTM.
    pub fn has_labile(&self) -> bool {
        self.mods.iter().any(|m| m.modtype == ModType::Labile)
    }

    /// Whether any occurrence is a stable PTM.
    pub fn has_stable(&self) -> bool {
        self.mods.iter().any(|m| m.modtype == ModType::Stable)
    }

    /// Render the LuciPHOr2 `modSites` specification: every non-fixed
    /// occurrence as `site=<residue mass + modification mass>`,
    /// comma-joined in list order. Terminal markers contribute no residue
    /// mass.
    pub fn luciphor_input_sites(&self) -> String {
        self.mods
            .iter()
            .filter(|m| m.modtype != ModType::Fixed)
            .map(|m| {
                let residue_mass = residue_monoisotopic_mass(m.residue).unwrap_or_else(|| {
                    warn!("no monoisotopic mass for residue '{}'", m.residue);
                    0.0
                });
                format!("{}={}", m.site_zero_based, format_mass(m.mass + residue_mass))
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Render the reported PTM summary: labile and stable occurrences
    /// grouped by name in first-seen order, each group as
    /// `Name:AA<site>,AA<site>` with one-based sites, groups joined with
    /// underscores.
    pub fn top_ptm_output(&self) -> String {
        let mut sites: IndexMap<&str, Vec<String>> = IndexMap::new();
        for m in &self.mods {
            if !matches!(m.modtype, ModType::Labile | ModType::Stable) {
                continue;
            }
            sites
                .entry(m.name.as_str())
                .or_default()
                .push(format!("{}{}", m.residue, m.site_one_based));
        }
        sites
            .iter()
            .map(|(name, sites)| format!("{}:{}", name, sites.join(",")))
            .collect::<Vec<_>>()
            .join("_")
    }
}
