use std::io;

/// Errors raised while loading, classifying or resolving modifications
#[derive(Debug, thiserror::Error)]
pub enum ModificationError {
    /// I/O error reading a modification library file
    #[error("Failed to read modification library: {0}")]
    IoError(#[from] io::Error),

    /// Malformed modification specification line.
    ///
    /// Fatal: the downstream search would silently mis-score, so the run
    /// aborts with the offending input and the recognized library names.
    #[error("Could not identify modification \"{spec}\" ({reason}), use one of [{known}]")]
    Specification {
        /// The offending input, as supplied by the caller.
        spec: String,
        /// Why the line was rejected.
        reason: String,
        /// Comma-joined list of names the library recognizes.
        known: String,
    },

    /// A peptide annotation references a mass with no library entry
    #[error("No modification matching annotated mass {mass} in sequence \"{sequence}\"")]
    UnknownModification {
        /// The inline mass or bracket code that failed to resolve.
        mass: String,
        /// The annotated sequence being parsed.
        sequence: String,
    },
}
