//! Measurement units and canonical conversion
//!
//! Every persisted or transmitted distance is stored in meters. Alternate
//! units only exist transiently in display code, and are always derived from
//! the canonical value:
//!
//! ```
//! use qexplore::units::{from_canonical, display_string, MeasurementUnit};
//!
//! let radius_m = 3000.0;
//! assert_eq!(from_canonical(radius_m, MeasurementUnit::Miles), 1.86);
//! assert_eq!(display_string(radius_m, MeasurementUnit::Kilometers), "3.00 km");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Distance unit supported by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementUnit {
    /// Canonical unit
    Meters,
    Kilometers,
    Feet,
    Miles,
}

/// Unit every stored radius is expressed in.
pub const CANONICAL_UNIT: MeasurementUnit = MeasurementUnit::Meters;

const METERS_PER_FOOT: f64 = 0.3048;
const METERS_PER_MILE: f64 = 1609.344;

impl MeasurementUnit {
    pub const ALL: [MeasurementUnit; 4] = [
        MeasurementUnit::Meters,
        MeasurementUnit::Kilometers,
        MeasurementUnit::Feet,
        MeasurementUnit::Miles,
    ];

    /// Meters per one of this unit
    pub fn factor(self) -> f64 {
        match self {
            Self::Meters => 1.0,
            Self::Kilometers => 1000.0,
            Self::Feet => METERS_PER_FOOT,
            Self::Miles => METERS_PER_MILE,
        }
    }

    /// Increment used by numeric input controls
    pub fn step(self) -> f64 {
        match self {
            Self::Meters => 100.0,
            Self::Kilometers => 0.5,
            Self::Feet => 500.0,
            Self::Miles => 0.5,
        }
    }

    /// Decimal places shown for this unit
    pub fn precision(self) -> u32 {
        match self {
            Self::Meters | Self::Feet => 0,
            Self::Kilometers | Self::Miles => 2,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Meters => "m",
            Self::Kilometers => "km",
            Self::Feet => "ft",
            Self::Miles => "mi",
        }
    }

    /// Largest canonical error a display round-trip may introduce.
    ///
    /// Half of the last displayed digit, expressed in meters.
    pub fn canonical_tolerance(self) -> f64 {
        0.5 * 10f64.powi(-(self.precision() as i32)) * self.factor()
    }
}

impl fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for MeasurementUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "m" | "meter" | "meters" | "metre" | "metres" => Ok(Self::Meters),
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => Ok(Self::Kilometers),
            "ft" | "foot" | "feet" => Ok(Self::Feet),
            "mi" | "mile" | "miles" => Ok(Self::Miles),
            _ => Err(Error::UnknownUnit(s.to_string())),
        }
    }
}

/// Measurement system selected in display settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    /// Unit the radius control is shown in
    pub fn radius_unit(self) -> MeasurementUnit {
        match self {
            Self::Metric => MeasurementUnit::Kilometers,
            Self::Imperial => MeasurementUnit::Miles,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitSystem {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "metric" => Ok(Self::Metric),
            "imperial" => Ok(Self::Imperial),
            _ => Err(Error::UnknownUnit(s.to_string())),
        }
    }
}

/// Round a display value to the unit's declared precision
pub fn round_to_precision(value: f64, unit: MeasurementUnit) -> f64 {
    let scale = 10f64.powi(unit.precision() as i32);
    (value * scale).round() / scale
}

/// Convert a value entered in `unit` into meters
pub fn to_canonical(value: f64, unit: MeasurementUnit) -> f64 {
    value * unit.factor()
}

/// Convert meters into `unit`, rounded for display
pub fn from_canonical(canonical: f64, unit: MeasurementUnit) -> f64 {
    round_to_precision(canonical / unit.factor(), unit)
}

/// Rounded value with unit suffix, e.g. `"1.86 mi"`
pub fn display_string(canonical: f64, unit: MeasurementUnit) -> String {
    let value = from_canonical(canonical, unit);
    format!(
        "{:.*} {}",
        unit.precision() as usize,
        value,
        unit.suffix()
    )
}

/// [`to_canonical`] keyed by unit identifier
pub fn to_canonical_str(value: f64, unit: &str) -> Result<f64> {
    Ok(to_canonical(value, unit.parse()?))
}

/// [`from_canonical`] keyed by unit identifier
pub fn from_canonical_str(canonical: f64, unit: &str) -> Result<f64> {
    Ok(from_canonical(canonical, unit.parse()?))
}

/// [`display_string`] keyed by unit identifier
pub fn display_string_str(canonical: f64, unit: &str) -> Result<String> {
    Ok(display_string(canonical, unit.parse()?))
}

/// Parse user input such as `"2 mi"`, `"3.5km"` or `"800"` into meters.
///
/// A bare number is taken as canonical.
pub fn parse_distance(input: &str) -> Result<f64> {
    let input = input.trim();
    let split = input
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid distance: {}", input)))?;
    if unit.trim().is_empty() {
        Ok(value)
    } else {
        to_canonical_str(value, unit)
    }
}
