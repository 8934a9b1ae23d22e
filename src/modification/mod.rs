//! # Modification Model
//!
//! This module owns the modification bookkeeping the rest of the crate is
//! built on: the name-keyed library of specification lines, parsing of
//! individual lines into [`ModificationDefinition`]s with a closed
//! fixed/variable category, and the [`ModClassifier`] that splits a
//! request into fixed-by-site and variable tables and runs the
//! adjusted-mass pass.
//!
//! ## Adjusted masses
//!
//! A residue/position class already carrying fixed modifications cannot
//! independently carry a second full-mass variable modification - only the
//! mass difference is observable in a spectrum. The classifier therefore
//! rewrites each colliding variable modification's effective mass to
//! `nominal - sum(fixed masses at the same site key)`, rounded to five
//! decimals. The nominal mass is retained for display.

mod classifier;
mod definition;
mod error;
mod library;


pub use classifier::{classify_requested, ModClassifier};
pub(crate) use classifier::milli_mass_key;
pub use definition::{ModCategory, ModificationDefinition};
pub use error::ModificationError;
pub use library::ModLibrary;
