//! Monoisotopic residue masses and mass formatting helpers.
//!
//! LuciPHOr2 site specifications and bracket codes are expressed as the sum
//! of a residue's monoisotopic mass and the modification's delta mass, so
//! both annotation parsers and the config builder share this table.

/// Monoisotopic mass of a single amino acid residue (the residue mass, i.e.
/// the in-chain mass without the water of the free acid).
///
/// The terminal markers `'['` (protein N-terminus) and `']'` (protein
/// C-terminus) map to `0.0`: a terminal modification contributes only its
/// own delta mass.
///
/// Returns `None` for characters outside the residue alphabet.
///
/// # Example
///
/// ```
/// use ptmbridge::chemistry::residue_monoisotopic_mass;
///
/// assert_eq!(residue_monoisotopic_mass('K'), Some(128.094963));
/// assert_eq!(residue_monoisotopic_mass('['), Some(0.0));
/// assert_eq!(residue_monoisotopic_mass('1'), None);
/// ```
pub fn residue_monoisotopic_mass(residue: char) -> Option<f64> {
    let mass = match residue {
        'A' => 71.037114,
        'R' => 156.101111,
        'N' => 114.042927,
        'D' => 115.026943,
        'C' => 103.009185,
        'E' => 129.042593,
        'Q' => 128.058578,
        'G' => 57.021464,
        'H' => 137.058912,
        'I' => 113.084064,
        'L' => 113.084064,
        'K' => 128.094963,
        'M' => 131.040485,
        'F' => 147.068414,
        'P' => 97.052764,
        'S' => 87.032028,
        'T' => 101.047679,
        'W' => 186.079313,
        'Y' => 163.063329,
        'V' => 99.068414,
        'U' => 168.053,
        '[' | ']' => 0.0,
        _ => return None,
    };
    Some(mass)
}

/// Round a mass to five decimal places.
///
/// Five decimals is the precision carried through the adjusted-mass
/// computation and into every serialized modification line.
pub fn round_mass(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}

/// Render a mass delta in the canonical textual form used in modification
/// files and site specifications: at most five decimals, trailing zeros
/// trimmed, `0` for a zero delta.
pub(crate) fn format_mass(value: f64) -> String {
    let text = format!("{:.5}", value);
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residue_masses() {
        assert_eq!(residue_monoisotopic_mass('G'), Some(57.021464));
        assert_eq!(residue_monoisotopic_mass('W'), Some(186.079313));
        assert_eq!(residue_monoisotopic_mass(']'), Some(0.0));
        assert_eq!(residue_monoisotopic_mass('B'), None);
        assert_eq!(residue_monoisotopic_mass('x'), None);
    }

    #[test]
    fn rounding_is_five_decimals() {
        assert_eq!(round_mass(0.000004), 0.0);
        assert_eq!(round_mass(15.9949153), 15.99492);
        assert_eq!(round_mass(-0.000004), 0.0);
    }

    #[test]
    fn mass_formatting() {
        assert_eq!(format_mass(79.966331), "79.96633");
        assert_eq!(format_mass(15.9949), "15.9949");
        assert_eq!(format_mass(0.0), "0");
        assert_eq!(format_mass(-0.0), "0");
        assert_eq!(format_mass(-97.9769), "-97.9769");
        assert_eq!(format_mass(229.0), "229");
    }
}
