//! MS2 mass-tolerance configuration.
//!
//! The surrounding pipeline exports the fragment tolerance as two
//! environment variables (`MS2TOLVALUE`, `MS2TOLTYPE`). They are read once
//! at startup and carried as an explicit [`Ms2Tolerance`] value from there
//! on; nothing else in the crate touches the process environment.

use std::env;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Environment variable holding the numeric tolerance value.
pub const MS2_TOL_VALUE_VAR: &str = "MS2TOLVALUE";

/// Environment variable holding the tolerance unit (`ppm` or `Da`).
pub const MS2_TOL_TYPE_VAR: &str = "MS2TOLTYPE";

/// Errors raised while resolving the tolerance configuration.
///
/// All variants are fatal at startup: an ambiguous tolerance would make
/// LuciPHOr2 silently mis-score every spectrum.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("environment variable {0} is not set")]
    MissingVariable(&'static str),

    /// The tolerance value is not a number.
    #[error("invalid MS2 tolerance value '{0}', expected a number")]
    InvalidValue(String),

    /// The tolerance unit is neither `ppm` nor `Da`.
    #[error("unrecognized MS2 tolerance unit '{0}', expected 'ppm' or 'Da'")]
    UnknownUnit(String),
}

/// Fragment mass tolerance unit.
///
/// LuciPHOr2 encodes the unit as a numeric code in its configuration file:
/// `0` for Daltons, `1` for parts per million.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToleranceUnit {
    /// Absolute tolerance in Daltons (code 0).
    Da,
    /// Relative tolerance in parts per million (code 1).
    Ppm,
}

impl ToleranceUnit {
    /// The numeric code LuciPHOr2 expects in `MS2_TOL_UNITS`.
    pub fn code(self) -> u8 {
        match self {
            ToleranceUnit::Da => 0,
            ToleranceUnit::Ppm => 1,
        }
    }
}

impl FromStr for ToleranceUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Da" => Ok(ToleranceUnit::Da),
            "ppm" => Ok(ToleranceUnit::Ppm),
            other => Err(ConfigError::UnknownUnit(other.to_string())),
        }
    }
}

impl fmt::Display for ToleranceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToleranceUnit::Da => write!(f, "Da"),
            ToleranceUnit::Ppm => write!(f, "ppm"),
        }
    }
}

/// Fragment (MS2) mass tolerance: a value and its unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ms2Tolerance {
    /// Numeric tolerance value.
    pub value: f64,
    /// Tolerance unit.
    pub unit: ToleranceUnit,
}

impl Ms2Tolerance {
    /// Build a tolerance from already-parsed parts.
    pub fn new(value: f64, unit: ToleranceUnit) -> Self {
        Self { value, unit }
    }

    /// Build a tolerance from textual parts, as found in the environment.
    pub fn from_parts(value: &str, unit: &str) -> Result<Self, ConfigError> {
        let parsed = value
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidValue(value.to_string()))?;
        Ok(Self::new(parsed, unit.parse()?))
    }

    /// Read the tolerance from `MS2TOLVALUE` / `MS2TOLTYPE`.
    ///
    /// Called once at startup; an unset variable or an unrecognized unit
    /// aborts the run before any PSM row is processed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let value = env::var(MS2_TOL_VALUE_VAR)
            .map_err(|_| ConfigError::MissingVariable(MS2_TOL_VALUE_VAR))?;
        let unit = env::var(MS2_TOL_TYPE_VAR)
            .map_err(|_| ConfigError::MissingVariable(MS2_TOL_TYPE_VAR))?;
        Self::from_parts(&value, &unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_codes_match_luciphor() {
        assert_eq!(ToleranceUnit::Da.code(), 0);
        assert_eq!(ToleranceUnit::Ppm.code(), 1);
    }

    #[test]
    fn parses_known_units() {
        let tol = Ms2Tolerance::from_parts("0.025", "Da").unwrap();
        assert_eq!(tol.value, 0.025);
        assert_eq!(tol.unit, ToleranceUnit::Da);

        let tol = Ms2Tolerance::from_parts("20", "ppm").unwrap();
        assert_eq!(tol.value, 20.0);
        assert_eq!(tol.unit, ToleranceUnit::Ppm);
    }

    #[test]
    fn unknown_unit_is_fatal() {
        let err = Ms2Tolerance::from_parts("10", "Kelvin").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownUnit(ref u) if u == "Kelvin"));
    }

    #[test]
    fn bad_value_is_fatal() {
        let err = Ms2Tolerance::from_parts("ten", "ppm").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }
}
