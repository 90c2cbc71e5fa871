//! Device properties: the typed scalar slots a device publishes.
//!
//! Shelly devices name their properties after the channel they belong to:
//! `relay0`, `power0`, `power1`, … The helpers below build those names so
//! call sites never hand-format them.

use serde::{Deserialize, Serialize};

/// Fixed property that a power meter derives its electric current channel from.
pub const CURRENT_PROPERTY: &str = "current0";

/// Fixed property that a power meter derives its voltage channel from.
pub const VOLTAGE_PROPERTY: &str = "voltage0";

/// Name of the relay state property of channel `index`.
#[must_use]
pub fn relay_property(index: u8) -> String {
    format!("relay{index}")
}

/// Name of the power consumption property of meter `index`.
#[must_use]
pub fn power_property(index: u8) -> String {
    format!("power{index}")
}

/// Name of the electric current property of meter `index`.
#[must_use]
pub fn current_property(index: u8) -> String {
    format!("current{index}")
}

/// Name of the voltage property of meter `index`.
#[must_use]
pub fn voltage_property(index: u8) -> String {
    format!("voltage{index}")
}

/// A single typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl PropertyValue {
    /// Numeric view of the value, if it has one.
    ///
    /// Booleans map to `0.0`/`1.0`; strings are parsed.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::String(s) => s.trim().parse().ok(),
        }
    }

    /// Boolean view of the value; numbers are truthy when non-zero.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            Self::Float(f) => Some(*f != 0.0),
            Self::String(s) => match s.as_str() {
                "on" | "true" | "1" => Some(true),
                "off" | "false" | "0" => Some(false),
                _ => None,
            },
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => b.fmt(f),
            Self::Int(i) => i.fmt(f),
            Self::Float(v) => v.fmt(f),
            Self::String(s) => s.fmt(f),
        }
    }
}
