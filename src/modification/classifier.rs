use std::collections::HashMap;
use std::io::Write;

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use crate::chemistry::residue_monoisotopic_mass;
use crate::peptide::PROTEIN_N_TERM;

use super::{ModCategory, ModLibrary, ModificationDefinition, ModificationError};

/// Key for the search engine's inline-mass lookup: MSGF+ prints inline
/// deltas rounded to three decimals, so masses are compared at
/// milli-Dalton resolution.
pub(crate) fn milli_mass_key(mass: f64) -> i64 {
    (mass * 1000.0).round() as i64
}

/// Requested modifications classified into fixed and variable tables.
///
/// Fixed modifications are grouped by their site key
/// (`residues__position`), variable modifications form a flat ordered
/// list; both preserve first-seen order, which the serialized output
/// depends on. Construction runs the adjustment pass once: a variable
/// modification colliding with fixed modifications at the same site key
/// gets its effective mass rewritten to the observable delta.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModClassifier {
    fixed: IndexMap<String, Vec<ModificationDefinition>>,
    variable: Vec<ModificationDefinition>,
}

impl ModClassifier {
    /// Classify a list of raw specification lines.
    ///
    /// `known` is the library name list echoed into `Specification`
    /// diagnostics. Duplicate identical lines are dropped; distinct lines
    /// for the same fixed site key accumulate (stacked terminal tags).
    pub fn from_spec_lines<I, S>(lines: I, known: &str) -> Result<Self, ModificationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classifier = Self::default();
        for line in lines {
            classifier.add_spec_line(line.as_ref(), known)?;
        }
        classifier.apply_fixed_adjustments();
        Ok(classifier)
    }

    fn add_spec_line(&mut self, line: &str, known: &str) -> Result<(), ModificationError> {
        let def = ModificationDefinition::parse(line, known)?;
        match def.category() {
            ModCategory::Fixed => {
                let group = self.fixed.entry(def.site_key()).or_default();
                if !group.iter().any(|existing| existing.same_spec(&def)) {
                    group.push(def);
                }
            }
            ModCategory::Variable => {
                if !self.variable.iter().any(|existing| existing.same_spec(&def)) {
                    self.variable.push(def);
                }
            }
        }
        Ok(())
    }

    /// The adjustment pass: a site already carrying fixed tags cannot
    /// independently carry a second full-mass variable modification, only
    /// the mass delta is observable.
    fn apply_fixed_adjustments(&mut self) {
        for def in &mut self.variable {
            if let Some(group) = self.fixed.get(&def.site_key()) {
                let fixed_sum: f64 = group.iter().map(ModificationDefinition::mass).sum();
                def.set_adjusted_mass(def.mass() - fixed_sum);
                debug!(
                    "adjusted variable mod {} at {}: {} -> {}",
                    def.name(),
                    def.site_key(),
                    def.mass(),
                    def.adjusted_mass()
                );
            }
        }
    }

    /// Fixed modifications, flattened in first-seen key order.
    pub fn fixed_mods(&self) -> impl Iterator<Item = &ModificationDefinition> {
        self.fixed.values().flatten()
    }

    /// Variable modifications in first-seen order.
    pub fn variable_mods(&self) -> &[ModificationDefinition] {
        &self.variable
    }

    /// True when no modification was classified at all.
    pub fn is_empty(&self) -> bool {
        self.fixed.is_empty() && self.variable.is_empty()
    }

    /// All specification lines in serialization order: fixed lines grouped
    /// by key in first-seen key order, then variable lines in first-seen
    /// order. Deterministic; order-sensitive consumers rely on it.
    pub fn serialized_lines(&self) -> Vec<String> {
        self.fixed_mods()
            .chain(self.variable.iter())
            .map(ModificationDefinition::serialized_line)
            .collect()
    }

    /// Write the search engine's modification file: `NumMods=<N>` followed
    /// by the reordered specification lines, adjusted masses substituted
    /// into variable lines.
    pub fn write_msgf_modfile<W: Write>(
        &self,
        num_mods: u32,
        writer: &mut W,
    ) -> std::io::Result<()> {
        writeln!(writer, "NumMods={}", num_mods)?;
        for line in self.serialized_lines() {
            writeln!(writer, "{}", line)?;
        }
        Ok(())
    }

    /// Lookup table from the inline mass printed by the search engine to
    /// its definition, keyed at milli-Dalton resolution.
    ///
    /// Variable modifications are keyed by their adjusted mass - that is
    /// the delta the search was configured with and therefore the one it
    /// prints; fixed modifications keep their nominal mass. The first
    /// definition for a mass wins.
    pub fn msgf_mass_map(&self) -> HashMap<i64, ModificationDefinition> {
        let mut map = HashMap::new();
        for def in self.fixed_mods() {
            map.entry(milli_mass_key(def.mass())).or_insert_with(|| def.clone());
        }
        for def in &self.variable {
            map.entry(milli_mass_key(def.adjusted_mass()))
                .or_insert_with(|| def.clone());
        }
        map
    }

    /// Lookup table from LuciPHOr2's bracketed site codes to definitions.
    ///
    /// LuciPHOr2 prints a modified residue as `X[code]` where the code is
    /// the residue monoisotopic mass plus the modification delta, rounded
    /// to the nearest integer; an N-terminal modification carries no
    /// residue mass and is keyed under the `'['` marker.
    pub fn luciphor_site_map(&self) -> HashMap<(char, i64), ModificationDefinition> {
        let mut map: HashMap<(char, i64), ModificationDefinition> = HashMap::new();
        for def in self.fixed_mods().chain(self.variable.iter()) {
            if def.is_n_terminal() {
                let code = def.adjusted_mass().round() as i64;
                map.entry((PROTEIN_N_TERM, code)).or_insert_with(|| def.clone());
                continue;
            }
            for residue in def.residues().chars() {
                let Some(residue_mass) = residue_monoisotopic_mass(residue) else {
                    continue;
                };
                let code = (residue_mass + def.adjusted_mass()).round() as i64;
                map.entry((residue, code)).or_insert_with(|| def.clone());
            }
        }
        map
    }

    /// Render a definition as LuciPHOr2 `FIXED_MOD`/`VAR_MOD`/`TARGET_MOD`
    /// line payloads: one `<residue> <mass>` entry per residue letter,
    /// `[` for N-terminal position classes, adjusted mass for variable
    /// modifications.
    pub fn luciphor_mod_lines(def: &ModificationDefinition) -> Vec<String> {
        let mass = def.effective_mass_text();
        if def.is_n_terminal() {
            return vec![format!("{} {}", PROTEIN_N_TERM, mass)];
        }
        def.residues()
            .chars()
            .map(|residue| format!("{} {}", residue, mass))
            .collect()
    }
}

/// Resolve requested modification names through the library and classify
/// the result.
///
/// Each requested entry is either a library name (case-insensitive,
/// synonym-aware) or a raw specification line. A malformed resolution is a
/// fatal [`ModificationError::Specification`] naming the requested input
/// and the library's recognized names.
pub fn classify_requested(
    library: &ModLibrary,
    requested: &[String],
) -> Result<ModClassifier, ModificationError> {
    let known = library.known_names().join(", ");
    let mut classifier = ModClassifier::default();
    for request in requested {
        for line in library.lookup(request) {
            // Attribute failures to what the user asked for, not to the
            // library line it resolved to.
            classifier.add_spec_line(&line, &known).map_err(|err| match err {
                ModificationError::Specification { reason, .. } => {
                    ModificationError::Specification {
                        spec: request.clone(),
                        reason,
                        known: known.clone(),
                    }
                }
                other => other,
            })?;
        }
    }
    classifier.apply_fixed_adjustments();
    Ok(classifier)
}
