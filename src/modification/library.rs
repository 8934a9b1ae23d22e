use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use indexmap::IndexMap;
use log::debug;

use super::ModificationError;

/// Synonym classes: a library carrying the left name also answers the
/// right one with the identical definition set. TMT 10-plex reagents are
/// isobaric with the 6-plex set, so search engines share one entry.
const NAME_SYNONYMS: &[(&str, &str)] = &[("tmt6plex", "tmt10plex")];

/// A library of named modification definitions.
///
/// The source format is comma-separated lines whose last field is the
/// modification's display name; the fields before it are tool-specific.
/// One name may own several lines (e.g. a label on both `K` and the
/// N-terminus). Names are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct ModLibrary {
    entries: IndexMap<String, Vec<String>>,
}

impl ModLibrary {
    /// Load a library from a file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModificationError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a library from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ModificationError> {
        let mut entries: IndexMap<String, Vec<String>> = IndexMap::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let name = match line.rsplit(',').next() {
                Some(name) => name.to_lowercase(),
                None => continue,
            };
            entries.entry(name).or_default().push(line);
        }

        for (canonical, alias) in NAME_SYNONYMS {
            if let Some(lines) = entries.get(*canonical).cloned() {
                entries.insert((*alias).to_string(), lines);
            }
        }

        debug!("loaded modification library with {} names", entries.len());
        Ok(Self { entries })
    }

    /// Look up the specification lines for a modification name.
    ///
    /// Case-insensitive. An unknown name is returned verbatim as a single
    /// raw specification line: power users may pass an already-formatted
    /// line instead of a library name.
    pub fn lookup(&self, name: &str) -> Vec<String> {
        match self.entries.get(&name.to_lowercase()) {
            Some(lines) => lines.clone(),
            None => vec![name.to_string()],
        }
    }

    /// All names the library recognizes, in load order.
    pub fn known_names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}
