//! Device identity: the stable `type`/`id` pair of a physical device.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ShellyEveError, ValidationError};

/// Identity of a device, used for logging and to derive accessory ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device serial / MAC-derived id (e.g. `A4CF12F45`).
    pub id: String,
    /// Model code (e.g. `SHPLG-S`).
    pub device_type: String,
}

impl DeviceInfo {
    /// Create a builder for constructing a [`DeviceInfo`].
    #[must_use]
    pub fn builder() -> DeviceInfoBuilder {
        DeviceInfoBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ShellyEveError::Validation`] when `id` or `device_type` is empty.
    pub fn validate(&self) -> Result<(), ShellyEveError> {
        if self.id.is_empty() {
            return Err(ValidationError::EmptyDeviceId.into());
        }
        if self.device_type.is_empty() {
            return Err(ValidationError::EmptyDeviceType.into());
        }
        Ok(())
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.device_type, self.id)
    }
}

/// Step-by-step builder for [`DeviceInfo`].
#[derive(Debug, Default)]
pub struct DeviceInfoBuilder {
    id: Option<String>,
    device_type: Option<String>,
}

impl DeviceInfoBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    /// Consume the builder, validate, and return a [`DeviceInfo`].
    ///
    /// # Errors
    ///
    /// Returns [`ShellyEveError::Validation`] if `id` or `device_type` is
    /// missing or empty.
    pub fn build(self) -> Result<DeviceInfo, ShellyEveError> {
        let info = DeviceInfo {
            id: self.id.unwrap_or_default(),
            device_type: self.device_type.unwrap_or_default(),
        };
        info.validate()?;
        Ok(info)
    }
}
