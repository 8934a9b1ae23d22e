//! # Peptide Annotation Parsing
//!
//! Structured modification occurrences and the [`Psm`] aggregate that both
//! annotation parsers populate: the search-engine form (inline signed mass
//! deltas) and the localization-tool form (bracketed integer site codes).
//! Sites are tracked zero-based for LuciPHOr2 input and one-based for PSM
//! table reporting, with a `-100` sentinel for protein N-terminal
//! modifications.

mod occurrence;
mod psm;

#[cfg(test)]
mod tests;

pub use occurrence::{
    ModOccurrence, ModType, PtmNames, PROTEIN_C_TERM, PROTEIN_C_TERM_SITE, PROTEIN_N_TERM,
    PROTEIN_N_TERM_SITE,
};
pub use psm::Psm;
