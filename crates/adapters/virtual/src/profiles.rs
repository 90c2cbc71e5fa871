//! Shelly model profiles: which properties each model publishes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shellyeve_domain::property::{CURRENT_PROPERTY, VOLTAGE_PROPERTY, power_property, relay_property};

use crate::error::VirtualDeviceError;

/// A supported Shelly model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceProfile {
    /// Shelly Plug S: one relay with a power meter.
    #[serde(rename = "plug-s")]
    PlugS,
    /// Shelly 1PM: one relay with a power meter.
    #[serde(rename = "1pm")]
    OnePm,
    /// Shelly 2.5: two relays, each with a power meter.
    #[serde(rename = "2.5")]
    TwoFive,
    /// Shelly EM: two metering channels, no relay.
    #[serde(rename = "em")]
    Em,
}

/// A relay channel and the meter measuring it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutletLayout {
    pub relay: u8,
    pub power_meter: Option<u8>,
}

impl DeviceProfile {
    pub const ALL: [Self; 4] = [Self::PlugS, Self::OnePm, Self::TwoFive, Self::Em];

    /// Model code reported by the device.
    #[must_use]
    pub fn device_type(self) -> &'static str {
        match self {
            Self::PlugS => "SHPLG-S",
            Self::OnePm => "SHSW-PM",
            Self::TwoFive => "SHSW-25",
            Self::Em => "SHEM",
        }
    }

    /// Configuration key, as used in `shellyeve.toml`.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::PlugS => "plug-s",
            Self::OnePm => "1pm",
            Self::TwoFive => "2.5",
            Self::Em => "em",
        }
    }

    #[must_use]
    pub fn relay_count(self) -> u8 {
        match self {
            Self::PlugS | Self::OnePm => 1,
            Self::TwoFive => 2,
            Self::Em => 0,
        }
    }

    #[must_use]
    pub fn power_meter_count(self) -> u8 {
        match self {
            Self::PlugS | Self::OnePm => 1,
            Self::TwoFive | Self::Em => 2,
        }
    }

    /// Every property a device of this model declares.
    #[must_use]
    pub fn properties(self) -> Vec<String> {
        let mut properties: Vec<String> = (0..self.relay_count()).map(relay_property).collect();
        properties.extend((0..self.power_meter_count()).map(power_property));
        if self == Self::Em {
            properties.push(CURRENT_PROPERTY.to_string());
            properties.push(VOLTAGE_PROPERTY.to_string());
        }
        properties
    }

    /// One outlet per relay, metered by the meter of the same index.
    #[must_use]
    pub fn default_outlets(self) -> Vec<OutletLayout> {
        let meters = self.power_meter_count();
        (0..self.relay_count())
            .map(|relay| OutletLayout {
                relay,
                power_meter: (relay < meters).then_some(relay),
            })
            .collect()
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DeviceProfile {
    type Err = VirtualDeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|profile| profile.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| VirtualDeviceError::UnknownProfile(s.to_string()))
    }
}
