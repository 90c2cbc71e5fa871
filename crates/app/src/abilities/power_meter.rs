//! Power meter ability: consumption, electric current and voltage.
//!
//! Only the consumption property is read from the device. Electric current
//! and voltage are derived from it against a fixed reference voltage:
//!
//! ```text
//! consumption = clamp(raw, 0, 65535)   W
//! current     = consumption / 240      A
//! voltage     = 240                    V
//! ```
//!
//! The optional channels are subscribed to the fixed `current0` and
//! `voltage0` properties; callers only decide whether a channel exists.

use shellyeve_domain::characteristic::{Bounds, CharacteristicType};
use shellyeve_domain::error::{NotFoundError, ShellyEveError, ValidationError};
use shellyeve_domain::property::{CURRENT_PROPERTY, PropertyValue, VOLTAGE_PROPERTY};
use shellyeve_domain::service::{Service, ServiceType};

use crate::ability::{Ability, AbilityCore, EventHandlers};
use crate::ports::Device;

/// Mains voltage every derived reading is computed against.
pub const REFERENCE_VOLTAGE: f64 = 240.0;

const CONSUMPTION_BOUNDS: Bounds = Bounds {
    min: 0.0,
    max: 65_535.0,
};

/// The three derived electrical readings of one consumption sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerReadings {
    pub consumption: f64,
    pub electric_current: f64,
    pub voltage: f64,
}

impl PowerReadings {
    /// Derive readings from a raw consumption in watts.
    #[must_use]
    pub fn from_consumption(raw: f64) -> Self {
        let consumption = CONSUMPTION_BOUNDS.clamp(raw);
        Self {
            consumption,
            electric_current: consumption / REFERENCE_VOLTAGE,
            voltage: REFERENCE_VOLTAGE,
        }
    }

    /// Derive readings from a property value; unset or non-numeric counts as 0.
    #[must_use]
    pub fn from_value(value: Option<&PropertyValue>) -> Self {
        Self::from_consumption(value.and_then(PropertyValue::as_f64).unwrap_or(0.0))
    }
}

/// Optional derived channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    ElectricCurrent,
    Voltage,
}

impl Channel {
    fn characteristic(self) -> CharacteristicType {
        match self {
            Self::ElectricCurrent => CharacteristicType::ElectricCurrent,
            Self::Voltage => CharacteristicType::Voltage,
        }
    }

    fn property(self) -> &'static str {
        match self {
            Self::ElectricCurrent => CURRENT_PROPERTY,
            Self::Voltage => VOLTAGE_PROPERTY,
        }
    }

    fn reading(self, readings: PowerReadings) -> f64 {
        match self {
            Self::ElectricCurrent => readings.electric_current,
            Self::Voltage => readings.voltage,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::ElectricCurrent => "electric current",
            Self::Voltage => "voltage",
        }
    }
}

/// Mirrors a consumption property onto a `PowerMeter` service.
pub struct PowerMeterAbility {
    core: AbilityCore,
    consumption_property: String,
    channels: Vec<Channel>,
}

impl PowerMeterAbility {
    /// Create a power meter reading `consumption_property`.
    ///
    /// `electric_current` and `voltage` only decide whether the matching
    /// channel exists; the channels always follow `current0` and `voltage0`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyPropertyName`] if any supplied name is empty.
    pub fn new(
        consumption_property: impl Into<String>,
        electric_current: Option<&str>,
        voltage: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let consumption_property = consumption_property.into();
        if consumption_property.is_empty() {
            return Err(ValidationError::EmptyPropertyName);
        }

        let mut channels = Vec::with_capacity(2);
        for (channel, requested) in [(Channel::ElectricCurrent, electric_current), (Channel::Voltage, voltage)] {
            let Some(requested) = requested else {
                continue;
            };
            if requested.is_empty() {
                return Err(ValidationError::EmptyPropertyName);
            }
            if requested != channel.property() {
                tracing::debug!(
                    requested,
                    used = channel.property(),
                    "{} channel follows its fixed property",
                    channel.label()
                );
            }
            channels.push(channel);
        }

        Ok(Self {
            core: AbilityCore::new(),
            consumption_property,
            channels,
        })
    }

    #[must_use]
    pub fn consumption_property(&self) -> &str {
        &self.consumption_property
    }

    #[must_use]
    pub fn has_electric_current(&self) -> bool {
        self.channels.contains(&Channel::ElectricCurrent)
    }

    #[must_use]
    pub fn has_voltage(&self) -> bool {
        self.channels.contains(&Channel::Voltage)
    }

    /// Readings derived from the attached device's current consumption.
    #[must_use]
    pub fn readings(&self) -> Option<PowerReadings> {
        let device = self.core.device()?;
        Some(PowerReadings::from_value(
            device.property(&self.consumption_property).as_ref(),
        ))
    }
}

impl Ability for PowerMeterAbility {
    fn name(&self) -> &'static str {
        "power-meter"
    }

    fn core(&self) -> &AbilityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AbilityCore {
        &mut self.core
    }

    fn create_service(&self, device: &dyn Device) -> Result<Service, ShellyEveError> {
        if !device.has_property(&self.consumption_property) {
            return Err(NotFoundError {
                entity: "Property",
                id: self.consumption_property.clone(),
            }
            .into());
        }

        let readings = PowerReadings::from_value(device.property(&self.consumption_property).as_ref());
        let mut service = Service::new(ServiceType::PowerMeter)
            .with_characteristic(CharacteristicType::Consumption, readings.consumption)?;
        for &channel in &self.channels {
            service = service.with_characteristic(channel.characteristic(), channel.reading(readings))?;
        }
        Ok(service)
    }

    fn setup_event_handlers(&self, handlers: &mut EventHandlers<'_>) -> Result<(), ShellyEveError> {
        handlers.on(&self.consumption_property, |ctx, change| {
            let raw = change
                .value
                .as_ref()
                .and_then(PropertyValue::as_f64)
                .unwrap_or(0.0);
            let readings = PowerReadings::from_consumption(raw);

            ctx.write(CharacteristicType::Consumption, readings.consumption);
            ctx.write(CharacteristicType::ElectricCurrent, readings.electric_current);
            ctx.write(CharacteristicType::Voltage, readings.voltage);

            tracing::info!(
                property = %change.property,
                device = %ctx.device.info(),
                raw,
                consumption = readings.consumption,
                electric_current = readings.electric_current,
                voltage = readings.voltage,
                "consumption changed"
            );
        });

        for &channel in &self.channels {
            let consumption_property = self.consumption_property.clone();
            handlers.on(channel.property(), move |ctx, change| {
                let readings = PowerReadings::from_value(ctx.device.property(&consumption_property).as_ref());
                let value = channel.reading(readings);
                ctx.write(channel.characteristic(), value);

                tracing::info!(
                    property = %change.property,
                    device = %ctx.device.info(),
                    value,
                    "{} changed",
                    channel.label()
                );
            });
        }
        Ok(())
    }
}
