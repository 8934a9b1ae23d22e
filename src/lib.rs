//! # ptmBridge - Peptide Modification Annotation Normalizer
//!
//! `ptmbridge` translates peptide-modification ("PTM") annotations between the
//! three incompatible textual representations met in a typical search +
//! site-localization proteomics workflow:
//!
//! - **Modification library lines**: comma-separated specifications
//!   (`mass,residues,fix|opt,position,name`) as consumed by the MSGF+ search
//!   engine's modification file.
//!
//! - **Embedded-mass peptide notation**: search-engine output sequences with
//!   inline signed mass deltas, e.g. `ACDEF+15.9949GHIK` or
//!   `+229.163PEPTIDE` for a protein N-terminal tag.
//!
//! - **Bracketed-site notation**: LuciPHOr2's predicted peptides with
//!   integer-rounded mass codes, e.g. `AS[167]DFK`, plus its per-permutation
//!   score table.
//!
//! The core of the crate is the modification model: which modifications are
//! fixed, variable, labile (candidates for localization scoring) or stable
//! (reported but not re-scored), and what the *effective* mass of a variable
//! modification is when fixed modifications already occupy the same
//! residue/position class.
//!
//! ## Quick Start
//!
//! ```rust
//! use ptmbridge::modification::{classify_requested, ModLibrary};
//! use ptmbridge::peptide::{Psm, PtmNames};
//!
//! // A two-entry library: a fixed TMT label and variable phosphorylation.
//! let library = ModLibrary::from_reader(std::io::Cursor::new(
//!     "229.162932,*,fix,N-term,TMT6plex\n\
//!      229.162932,K,fix,any,TMT6plex\n\
//!      79.966331,STY,opt,any,Phospho\n",
//! ))?;
//!
//! let mods = classify_requested(&library, &["tmt6plex".into(), "phospho".into()])?;
//! let names = PtmNames::new(&["Phospho".into()], &[]);
//!
//! // Parse a search-engine sequence carrying an inline phospho delta.
//! let mut psm = Psm::new();
//! psm.parse_msgf_sequence("AS+79.966DFK", &mods.msgf_mass_map(), &names)?;
//! assert_eq!(psm.sequence, "ASDFK");
//! assert!(psm.has_labile());
//! # Ok::<(), ptmbridge::modification::ModificationError>(())
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! library file ──> ModLibrary ──> ModClassifier ──┬──> mods.txt (NumMods=...)
//!                                                 ├──> LuciPHOr2 config
//! PSM table ─────> Psm::parse_msgf_sequence ──────┴──> LuciPHOr2 PSM input
//! LuciPHOr2 out ─> Psm::parse_luciphor_sequence ─────> PTM report rows
//! ```
//!
//! The classifier tables are built once per run and only read afterwards;
//! each PSM row is parsed and fully populated before the next one, so the
//! whole pipeline is a single synchronous pass.
//!
//! ## Modules
//!
//! - [`modification`]: library lookup, spec-line parsing, fixed/variable
//!   classification and the adjusted-mass pass
//! - [`peptide`]: modification occurrences, the [`peptide::Psm`] aggregate
//!   and both annotation parsers
//! - [`luciphor`]: LuciPHOr2 configuration rendering and results parsing
//! - [`psm_table`]: header-indexed PSM table reader and LuciPHOr2 input writer
//! - [`config`]: MS2 tolerance from the process environment
//! - [`chemistry`]: monoisotopic residue masses and mass formatting

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod chemistry;
pub mod config;
pub mod luciphor;
pub mod modification;
pub mod peptide;
pub mod psm_table;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::chemistry::residue_monoisotopic_mass;
    pub use crate::config::{ConfigError, Ms2Tolerance, ToleranceUnit};
    pub use crate::luciphor::{LuciphorConfig, LuciphorRecord, ScorePermutation};
    pub use crate::modification::{
        classify_requested, ModCategory, ModClassifier, ModLibrary, ModificationDefinition,
        ModificationError,
    };
    pub use crate::peptide::{ModOccurrence, ModType, Psm, PtmNames, PROTEIN_N_TERM_SITE};
    pub use crate::psm_table::{LuciphorPsmWriter, PsmRow, PsmTableReader, TableError};
}
