//! Service: a named bundle of characteristics exposed to the host.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::characteristic::{Characteristic, CharacteristicType, CharacteristicValue};
use crate::error::ValidationError;

/// Kind of service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    /// A switchable power outlet.
    Outlet,
    /// Eve-style power meter (consumption, current, voltage).
    PowerMeter,
}

impl ServiceType {
    /// UUID the host identifies the service by.
    #[must_use]
    pub fn uuid(self) -> &'static str {
        match self {
            Self::Outlet => "00000047-0000-1000-8000-0026BB765291",
            Self::PowerMeter => "00000001-0000-1777-8000-775D67EC4377",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outlet => f.write_str("Outlet"),
            Self::PowerMeter => f.write_str("PowerMeter"),
        }
    }
}

/// Ordered set of characteristics of one service.
///
/// A characteristic type appears at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    kind: ServiceType,
    characteristics: Vec<Characteristic>,
}

impl Service {
    /// Create an empty service.
    #[must_use]
    pub fn new(kind: ServiceType) -> Self {
        Self {
            kind,
            characteristics: Vec::new(),
        }
    }

    /// Add (or overwrite) a characteristic with an initial value.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if `value` does not fit the characteristic.
    pub fn with_characteristic(
        mut self,
        kind: CharacteristicType,
        value: impl Into<CharacteristicValue>,
    ) -> Result<Self, ValidationError> {
        let value = value.into();
        match self.characteristic_mut(kind) {
            Some(existing) => {
                existing.set_value(value)?;
            }
            None => self.characteristics.push(Characteristic::new(kind, value)?),
        }
        Ok(self)
    }

    #[must_use]
    pub fn kind(&self) -> ServiceType {
        self.kind
    }

    #[must_use]
    pub fn characteristic(&self, kind: CharacteristicType) -> Option<&Characteristic> {
        self.characteristics.iter().find(|c| c.kind() == kind)
    }

    pub fn characteristic_mut(&mut self, kind: CharacteristicType) -> Option<&mut Characteristic> {
        self.characteristics.iter_mut().find(|c| c.kind() == kind)
    }

    /// Current value of a characteristic, if the service exposes it.
    #[must_use]
    pub fn value(&self, kind: CharacteristicType) -> Option<CharacteristicValue> {
        self.characteristic(kind).map(Characteristic::value)
    }

    #[must_use]
    pub fn has_characteristic(&self, kind: CharacteristicType) -> bool {
        self.characteristic(kind).is_some()
    }

    /// Characteristic types in insertion order.
    pub fn characteristic_types(&self) -> impl Iterator<Item = CharacteristicType> + '_ {
        self.characteristics.iter().map(Characteristic::kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.characteristics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.characteristics.is_empty()
    }

    /// Write a characteristic the service already exposes.
    ///
    /// Returns `Ok(None)` when the service does not expose `kind` (nothing
    /// is written), otherwise whether the value changed.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if `value` does not fit the characteristic.
    pub fn update(
        &mut self,
        kind: CharacteristicType,
        value: impl Into<CharacteristicValue>,
    ) -> Result<Option<bool>, ValidationError> {
        match self.characteristic_mut(kind) {
            Some(characteristic) => characteristic.set_value(value.into()).map(Some),
            None => Ok(None),
        }
    }
}
