//! Simulated readings for virtual devices.
//!
//! Each step derives a deterministic load per metering channel from the
//! tick counter. A channel whose relay is off draws nothing. When enabled,
//! the first relay of each device is flipped every `toggle_every` steps, as
//! if someone pressed the button on the device.

use std::rc::Rc;

use shellyeve_adapter_virtual::VirtualDevice;
use shellyeve_app::ports::Device;
use shellyeve_domain::error::ShellyEveError;
use shellyeve_domain::property::{
    CURRENT_PROPERTY, PropertyValue, VOLTAGE_PROPERTY, power_property, relay_property,
};

/// Base load of a metered channel, in watts.
const BASE_LOAD: f64 = 40.0;

/// Drives simulated readings into a set of devices.
pub struct Simulation {
    devices: Vec<Rc<VirtualDevice>>,
    tick: u32,
    toggle_every: u32,
}

impl Simulation {
    #[must_use]
    pub fn new(devices: Vec<Rc<VirtualDevice>>) -> Self {
        Self {
            devices,
            tick: 0,
            toggle_every: 0,
        }
    }

    /// Change how often relays are toggled; `0` disables toggling.
    #[must_use]
    pub fn toggle_every(mut self, steps: u32) -> Self {
        self.toggle_every = steps;
        self
    }

    /// Simulated load of `channel` at `tick`.
    #[must_use]
    pub fn load(tick: u32, channel: u8) -> f64 {
        let phase = tick.wrapping_add(u32::from(channel) * 7) % 24;
        BASE_LOAD * (1.0 + f64::from(channel)) + 5.0 * f64::from(phase)
    }

    /// Advance one step; returns how many properties changed.
    ///
    /// # Errors
    ///
    /// Propagates device errors; the virtual devices only raise those for
    /// undeclared properties.
    pub fn step(&mut self) -> Result<usize, ShellyEveError> {
        self.tick = self.tick.wrapping_add(1);
        let toggle = self.toggle_every != 0 && self.tick % self.toggle_every == 0;
        let mut changed = 0;

        for device in &self.devices {
            let Some(profile) = device.profile() else {
                continue;
            };

            if toggle && profile.relay_count() > 0 {
                let relay = relay_property(0);
                let on = device.property(&relay).as_ref().and_then(PropertyValue::as_bool).unwrap_or(false);
                device.set_relay(0, !on)?;
                changed += 1;
            }

            for channel in 0..profile.power_meter_count() {
                let powered = channel >= profile.relay_count()
                    || device
                        .property(&relay_property(channel))
                        .as_ref()
                        .and_then(PropertyValue::as_bool)
                        .unwrap_or(false);
                let watts = if powered { Self::load(self.tick, channel) } else { 0.0 };
                if device.update(&power_property(channel), watts)? {
                    changed += 1;
                }
            }

            if device.has_property(VOLTAGE_PROPERTY) {
                let volts = 228.0 + f64::from(self.tick % 5);
                if device.update(VOLTAGE_PROPERTY, volts)? {
                    changed += 1;
                }
            }
            if device.has_property(CURRENT_PROPERTY) {
                let watts = device
                    .property(&power_property(0))
                    .as_ref()
                    .and_then(PropertyValue::as_f64)
                    .unwrap_or(0.0);
                if device.update(CURRENT_PROPERTY, watts / 230.0)? {
                    changed += 1;
                }
            }
        }

        tracing::debug!(tick = self.tick, changed, "simulation step");
        Ok(changed)
    }
}
