//! Characteristics: bounded, typed value slots rendered by the host.
//!
//! The permissible range of every characteristic type is declared here and
//! enforced by [`Characteristic::set_value`]. Producers clamp before writing;
//! a rejected write means a producer forgot to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Kind of a characteristic, carrying its schema (UUID, unit, bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacteristicType {
    /// Power state of an outlet or switch.
    On,
    /// Whether something is drawing power from the outlet.
    OutletInUse,
    /// Current power consumption, in watts.
    Consumption,
    /// Electric current, in amperes.
    ElectricCurrent,
    /// Supply voltage, in volts.
    Voltage,
}

/// Declared value range of a numeric characteristic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    /// Clamp `value` into the range. `NaN` maps to `min`.
    #[must_use]
    pub fn clamp(self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    /// Whether `value` lies inside the range (inclusive).
    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

const ELECTRICAL_BOUNDS: Bounds = Bounds {
    min: 0.0,
    max: 65_535.0,
};

impl CharacteristicType {
    /// UUID the host identifies the characteristic by.
    #[must_use]
    pub fn uuid(self) -> &'static str {
        match self {
            Self::On => "00000025-0000-1000-8000-0026BB765291",
            Self::OutletInUse => "00000026-0000-1000-8000-0026BB765291",
            Self::Consumption => "E863F10D-079E-48FF-8F27-9C2605A29F52",
            Self::ElectricCurrent => "E863F126-079E-48FF-8F27-9C2605A29F52",
            Self::Voltage => "E863F10A-079E-48FF-8F27-9C2605A29F52",
        }
    }

    /// Unit of the value, if it has one.
    #[must_use]
    pub fn unit(self) -> Option<&'static str> {
        match self {
            Self::On | Self::OutletInUse => None,
            Self::Consumption => Some("W"),
            Self::ElectricCurrent => Some("A"),
            Self::Voltage => Some("V"),
        }
    }

    /// Declared range of numeric characteristics; `None` for booleans.
    #[must_use]
    pub fn bounds(self) -> Option<Bounds> {
        match self {
            Self::On | Self::OutletInUse => None,
            Self::Consumption | Self::ElectricCurrent | Self::Voltage => Some(ELECTRICAL_BOUNDS),
        }
    }

    /// Whether the host may write this characteristic.
    #[must_use]
    pub fn is_writable(self) -> bool {
        matches!(self, Self::On)
    }

    /// Check that `value` has the right type and lies within the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TypeMismatch`] or
    /// [`ValidationError::OutOfRange`].
    pub fn validate(self, value: CharacteristicValue) -> Result<(), ValidationError> {
        match (self.bounds(), value) {
            (None, CharacteristicValue::Bool(_)) => Ok(()),
            (Some(bounds), CharacteristicValue::Float(v)) if bounds.contains(v) => Ok(()),
            (Some(bounds), CharacteristicValue::Float(v)) => Err(ValidationError::OutOfRange {
                characteristic: self,
                value: v,
                min: bounds.min,
                max: bounds.max,
            }),
            (_, other) => Err(ValidationError::TypeMismatch {
                characteristic: self,
                found: other.kind(),
            }),
        }
    }
}

impl fmt::Display for CharacteristicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::On => "On",
            Self::OutletInUse => "OutletInUse",
            Self::Consumption => "Consumption",
            Self::ElectricCurrent => "ElectricCurrent",
            Self::Voltage => "Voltage",
        };
        f.write_str(name)
    }
}

/// Value held by a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CharacteristicValue {
    Bool(bool),
    Float(f64),
}

impl CharacteristicValue {
    #[must_use]
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(b),
            Self::Float(_) => None,
        }
    }

    #[must_use]
    pub fn as_f64(self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(v),
            Self::Bool(_) => None,
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn kind(self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Float(_) => "float",
        }
    }
}

impl From<bool> for CharacteristicValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for CharacteristicValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// A single characteristic inside a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Characteristic {
    kind: CharacteristicType,
    value: CharacteristicValue,
}

impl Characteristic {
    /// Create a characteristic holding `value`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if `value` does not fit the type.
    pub fn new(kind: CharacteristicType, value: CharacteristicValue) -> Result<Self, ValidationError> {
        kind.validate(value)?;
        Ok(Self { kind, value })
    }

    #[must_use]
    pub fn kind(&self) -> CharacteristicType {
        self.kind
    }

    #[must_use]
    pub fn value(&self) -> CharacteristicValue {
        self.value
    }

    /// Replace the value, returning whether it changed.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if `value` does not fit the type; the
    /// previous value is kept.
    pub fn set_value(&mut self, value: CharacteristicValue) -> Result<bool, ValidationError> {
        self.kind.validate(value)?;
        let changed = self.value != value;
        self.value = value;
        Ok(changed)
    }
}
