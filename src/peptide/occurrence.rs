use serde::Serialize;

use crate::modification::{ModCategory, ModificationDefinition};

/// Residue marker for a protein N-terminal modification.
pub const PROTEIN_N_TERM: char = '[';

/// Zero-based site sentinel for a protein N-terminal modification.
///
/// Terminal modifications are reported at a fixed offset that can never
/// collide with a real residue index (no residue index is negative); the
/// one-based site is the sentinel plus one, i.e. `-99`.
pub const PROTEIN_N_TERM_SITE: i32 = -100;

/// Residue marker reserved for protein C-terminal modifications.
///
/// C-terminal parsing is not implemented; the marker and sentinel exist so
/// a future parser can slot in without touching the occurrence model.
pub const PROTEIN_C_TERM: char = ']';

/// Zero-based site sentinel reserved for protein C-terminal modifications.
pub const PROTEIN_C_TERM_SITE: i32 = 100;

/// How a parsed modification occurrence behaves downstream.
///
/// Derived at parse time, not stored in the library: fixed modifications
/// keep their category; variable ones are reclassified through the
/// caller's labile/stable name sets. Variable-but-neither is structural
/// chemistry (e.g. oxidation) that only matters for mass accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModType {
    /// Applied uniformly; never localization-scored or reported as a PTM.
    Fixed,
    /// Variable chemistry outside the labile/stable sets.
    Variable,
    /// Candidate for site localization; removable before scoring.
    Labile,
    /// Retained through fragmentation; reported but not re-scored.
    Stable,
}

/// Labile and stable PTM name sets, lower-cased once at construction.
#[derive(Debug, Clone, Default)]
pub struct PtmNames {
    labile: Vec<String>,
    stable: Vec<String>,
}

impl PtmNames {
    /// Build the name sets from caller-supplied names (any case).
    pub fn new(labile: &[String], stable: &[String]) -> Self {
        Self {
            labile: labile.iter().map(|n| n.to_lowercase()).collect(),
            stable: stable.iter().map(|n| n.to_lowercase()).collect(),
        }
    }

    /// Whether the (lower-cased) name is a labile PTM.
    pub fn is_labile(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.labile.iter().any(|n| *n == lower)
    }

    /// Whether the (lower-cased) name is a stable PTM.
    pub fn is_stable(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.stable.iter().any(|n| *n == lower)
    }

    /// Derive the occurrence type for a definition.
    pub fn modtype(&self, def: &ModificationDefinition) -> ModType {
        if def.category() == ModCategory::Fixed {
            ModType::Fixed
        } else if self.is_labile(def.name()) {
            ModType::Labile
        } else if self.is_stable(def.name()) {
            ModType::Stable
        } else {
            ModType::Variable
        }
    }
}

/// One modification occurrence on a parsed peptide.
///
/// Sites are carried both zero-based (localization-tool input) and
/// one-based (PSM table reporting); `site_one_based == site_zero_based + 1`
/// including for the N-terminal sentinel (`-100`/`-99`).
#[derive(Debug, Clone, Serialize)]
pub struct ModOccurrence {
    /// Modified residue letter, or `'['` for the protein N-terminus.
    pub residue: char,
    /// Zero-based residue index, or the `-100` N-terminal sentinel.
    pub site_zero_based: i32,
    /// One-based residue index, or `-99` for the N-terminal sentinel.
    pub site_one_based: i32,
    /// Nominal modification mass.
    pub mass: f64,
    /// Effective mass after any fixed-modification adjustment.
    pub adjusted_mass: f64,
    /// Modification display name.
    pub name: String,
    /// Derived behavior class.
    pub modtype: ModType,
}

impl ModOccurrence {
    /// Build an occurrence from a resolved definition at a parsed site.
    pub fn from_definition(
        residue: char,
        site_zero_based: i32,
        def: &ModificationDefinition,
        names: &PtmNames,
    ) -> Self {
        Self {
            residue,
            site_zero_based,
            site_one_based: site_zero_based + 1,
            mass: def.mass(),
            adjusted_mass: def.adjusted_mass(),
            name: def.name().to_string(),
            modtype: names.modtype(def),
        }
    }
}
