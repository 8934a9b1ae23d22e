use serde::Serialize;

use crate::chemistry::{format_mass, round_mass};

use super::ModificationError;

/// Whether a modification is applied uniformly or per-occurrence.
///
/// The category token in a specification line must be exactly `fix` or
/// `opt`; anything else is rejected at parse time rather than at use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModCategory {
    /// Applied to every instance of the residue (`fix`).
    Fixed,
    /// May or may not be present on a given occurrence (`opt`).
    Variable,
}

impl ModCategory {
    /// The specification-line token for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            ModCategory::Fixed => "fix",
            ModCategory::Variable => "opt",
        }
    }
}

/// One parsed modification specification line.
///
/// The source format is comma-separated:
/// `mass,residues,fix|opt,position,name` - optionally with extra
/// tool-specific fields between the position and the name, which is always
/// the last field. The original mass text is retained so an unadjusted line
/// re-serializes byte-identically.
#[derive(Debug, Clone, Serialize)]
pub struct ModificationDefinition {
    mass_field: String,
    mass: f64,
    adjusted_mass: f64,
    residues: String,
    category: ModCategory,
    position: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    extra_fields: Vec<String>,
    name: String,
}

impl ModificationDefinition {
    /// Parse one comma-separated specification line.
    ///
    /// The line is echoed into the error diagnostic and `known` lists the
    /// library names a user could have meant.
    pub fn parse(line: &str, known: &str) -> Result<Self, ModificationError> {
        let specification = |reason: &str| ModificationError::Specification {
            spec: line.to_string(),
            reason: reason.to_string(),
            known: known.to_string(),
        };

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 5 {
            return Err(specification("expected at least 5 comma-separated fields"));
        }

        let mass = fields[0]
            .parse::<f64>()
            .map_err(|_| specification("need a numeric mass"))?;

        let category = match fields[2] {
            "fix" => ModCategory::Fixed,
            "opt" => ModCategory::Variable,
            _ => return Err(specification("category must be 'fix' or 'opt'")),
        };

        let last = fields.len() - 1;
        Ok(Self {
            mass_field: fields[0].to_string(),
            mass,
            adjusted_mass: mass,
            residues: fields[1].to_string(),
            category,
            position: fields[3].to_string(),
            extra_fields: fields[4..last].iter().map(|f| f.to_string()).collect(),
            name: fields[last].to_string(),
        })
    }

    /// Nominal (library) mass.
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Effective mass: the nominal mass unless a fixed-modification
    /// collision rewrote it during the classifier's adjustment pass.
    pub fn adjusted_mass(&self) -> f64 {
        self.adjusted_mass
    }

    /// True if the adjustment pass rewrote the effective mass.
    pub fn is_adjusted(&self) -> bool {
        self.adjusted_mass != self.mass
    }

    /// Residue letters this modification applies to (`*` for any).
    pub fn residues(&self) -> &str {
        &self.residues
    }

    /// Fixed/variable category.
    pub fn category(&self) -> ModCategory {
        self.category
    }

    /// Position-class token (e.g. `any`, `N-term`, `Prot-N-term`).
    pub fn position(&self) -> &str {
        &self.position
    }

    /// Display name (the last field of the specification line).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-cased display name, the form used in labile/stable name sets.
    pub fn name_lower(&self) -> String {
        self.name.to_lowercase()
    }

    /// True for N-terminal position classes (`N-term`, `Prot-N-term`, ...).
    pub fn is_n_terminal(&self) -> bool {
        self.position.to_ascii_lowercase().contains("n-term")
    }

    /// Site key for fixed-modification competition: `residues__position`.
    ///
    /// Identity is the site class, not the mass - several fixed
    /// modifications may stack on the same key (e.g. multiple N-terminal
    /// tags).
    pub fn site_key(&self) -> String {
        format!("{}__{}", self.residues, self.position)
    }

    /// Rewrite the effective mass; called once by the classifier's
    /// adjustment pass, already rounded to five decimals.
    pub(crate) fn set_adjusted_mass(&mut self, adjusted: f64) {
        self.adjusted_mass = round_mass(adjusted);
    }

    /// Whether two definitions come from the same raw specification line.
    ///
    /// Used for deduplication; compares the raw fields, not the derived
    /// masses, so an adjusted copy still matches its source line.
    pub(crate) fn same_spec(&self, other: &Self) -> bool {
        self.mass_field == other.mass_field
            && self.residues == other.residues
            && self.category == other.category
            && self.position == other.position
            && self.extra_fields == other.extra_fields
            && self.name == other.name
    }

    /// Textual form of the effective mass: the five-decimal rendering when
    /// the adjustment pass rewrote it, the untouched source text otherwise.
    pub fn effective_mass_text(&self) -> String {
        if self.is_adjusted() {
            format_mass(self.adjusted_mass)
        } else {
            self.mass_field.clone()
        }
    }

    /// Re-serialize as a comma-separated specification line.
    ///
    /// An adjusted variable modification carries its effective mass in the
    /// mass field; everything else reproduces the source text.
    pub fn serialized_line(&self) -> String {
        let mut fields = vec![
            self.effective_mass_text(),
            self.residues.clone(),
            self.category.as_str().to_string(),
            self.position.clone(),
        ];
        fields.extend(self.extra_fields.iter().cloned());
        fields.push(self.name.clone());
        fields.join(",")
    }
}
