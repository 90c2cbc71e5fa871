//! Outlet accessory: a relay channel, optionally with its power meter.

use std::rc::Rc;

use shellyeve_domain::category::Category;
use shellyeve_domain::error::{LifecycleError, ShellyEveError};
use shellyeve_domain::id::AccessoryId;
use shellyeve_domain::property::{current_property, power_property, relay_property, voltage_property};

use crate::abilities::{OutletAbility, PowerMeterAbility, PowerStateSetter};
use crate::accessory::Accessory;
use crate::ports::Device;

/// Host category every outlet accessory is announced with.
pub const OUTLET_CATEGORY: Category = Category::Outlet;

/// Assembles an outlet accessory for one relay channel.
///
/// ```text
/// relay<i>   ──▶ OutletAbility       (On, OutletInUse)
/// power<pm>  ──▶ PowerMeterAbility   (Consumption, ElectricCurrent, Voltage)
/// ```
#[derive(Debug, Clone, Default)]
pub struct OutletAccessory {
    relay: u8,
    power_meter: Option<u8>,
    name: Option<String>,
}

impl OutletAccessory {
    #[must_use]
    pub fn new(relay: u8) -> Self {
        Self {
            relay,
            ..Self::default()
        }
    }

    /// Add a power meter reading `power<index>`.
    #[must_use]
    pub fn power_meter(mut self, index: u8) -> Self {
        self.power_meter = Some(index);
        self
    }

    /// Override the default `"<type> <id> #<relay>"` name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Build the (detached) accessory for `device`.
    ///
    /// A metered outlet always gets current and voltage characteristics,
    /// even when the device never publishes `current<i>`/`voltage<i>`.
    ///
    /// # Errors
    ///
    /// Returns [`ShellyEveError::Validation`] for an empty name.
    pub fn build(self, device: Rc<dyn Device>) -> Result<Accessory, ShellyEveError> {
        let info = device.info();
        let id = AccessoryId::derive(&info.device_type, &info.id, self.relay);
        let name = self.name.unwrap_or_else(|| format!("{info} #{}", self.relay));
        let consumption = self.power_meter.map(power_property);

        let outlet = OutletAbility::new(
            relay_property(self.relay),
            relay_setter(&device, self.relay),
            consumption.as_deref(),
        )?;
        let mut accessory = Accessory::new(id, name, OUTLET_CATEGORY, Rc::clone(&device))?.with_ability(outlet);

        if let (Some(index), Some(consumption)) = (self.power_meter, consumption) {
            let meter = PowerMeterAbility::new(
                consumption,
                Some(current_property(index).as_str()),
                Some(voltage_property(index).as_str()),
            )?;
            accessory = accessory.with_ability(meter);
        }
        Ok(accessory)
    }
}

/// Setter switching relay `index`; holds the device weakly.
fn relay_setter(device: &Rc<dyn Device>, index: u8) -> PowerStateSetter {
    let device = Rc::downgrade(device);
    Box::new(move |on: bool| -> Result<(), ShellyEveError> {
        let device = device.upgrade().ok_or(LifecycleError::DeviceGone)?;
        device.set_relay(index, on)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDevice, listeners_for};
    use shellyeve_domain::characteristic::{CharacteristicType, CharacteristicValue};
    use shellyeve_domain::service::ServiceType;

    #[test]
    fn should_build_outlet_without_power_meter() {
        let device = FakeDevice::new(&["relay0"]);

        let accessory = OutletAccessory::new(0).build(device).unwrap();

        assert_eq!(accessory.category(), Category::Outlet);
        assert_eq!(accessory.name(), "SHSW-PM FAKE01 #0");
        assert_eq!(accessory.id(), AccessoryId::derive("SHSW-PM", "FAKE01", 0));
        let names: Vec<_> = accessory.abilities().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["outlet"]);
    }

    #[test]
    fn should_add_power_meter_with_both_channels() {
        let device = FakeDevice::new(&["relay0", "power0", "current0", "voltage0"]);

        let mut accessory = OutletAccessory::new(0)
            .power_meter(0)
            .name("Desk lamp")
            .build(device.clone())
            .unwrap();
        accessory.attach().unwrap();

        assert_eq!(accessory.name(), "Desk lamp");
        let meter = accessory.service(ServiceType::PowerMeter).unwrap();
        assert_eq!(meter.borrow().len(), 3);
        assert_eq!(listeners_for(&device, "current0"), 1);
        assert_eq!(listeners_for(&device, "voltage0"), 1);
    }

    #[test]
    fn should_keep_fixed_channels_for_second_meter() {
        let device = FakeDevice::new(&["relay0", "relay1", "power0", "power1"]);

        let mut accessory = OutletAccessory::new(1).power_meter(1).build(device.clone()).unwrap();
        accessory.attach().unwrap();

        assert_eq!(listeners_for(&device, "power1"), 2);
        assert_eq!(listeners_for(&device, "current0"), 1);
        assert_eq!(listeners_for(&device, "current1"), 0);
    }

    #[test]
    fn should_switch_own_relay_on_host_write() {
        let device = FakeDevice::new(&["relay0", "relay1"]);
        let mut accessory = OutletAccessory::new(1).build(device.clone()).unwrap();
        accessory.attach().unwrap();

        accessory
            .set_characteristic(ServiceType::Outlet, CharacteristicType::On, CharacteristicValue::Bool(true))
            .unwrap();

        assert_eq!(*device.relay_calls.borrow(), vec![(1, true)]);
    }

    #[test]
    fn should_derive_distinct_ids_per_relay() {
        let device = FakeDevice::new(&["relay0", "relay1"]);

        let first = OutletAccessory::new(0).build(device.clone()).unwrap();
        let second = OutletAccessory::new(1).build(device).unwrap();

        assert_ne!(first.id(), second.id());
    }
}
