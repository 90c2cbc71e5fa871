//! In-memory Shelly device.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use shellyeve_app::ports::{Device, Listener};
use shellyeve_domain::device::DeviceInfo;
use shellyeve_domain::error::ShellyEveError;
use shellyeve_domain::event::PropertyChange;
use shellyeve_domain::id::ListenerId;
use shellyeve_domain::property::{PropertyValue, relay_property};

use crate::error::VirtualDeviceError;
use crate::profiles::DeviceProfile;

struct Registration {
    event: String,
    id: ListenerId,
    listener: Listener,
}

/// A device whose properties are set programmatically.
///
/// Only declared properties can be written. A write raises
/// `change:<property>` only when the value actually changes.
pub struct VirtualDevice {
    info: DeviceInfo,
    profile: Option<DeviceProfile>,
    properties: RefCell<BTreeMap<String, Option<PropertyValue>>>,
    listeners: RefCell<Vec<Registration>>,
}

impl VirtualDevice {
    /// Create a device declaring `properties`, all unset.
    ///
    /// # Errors
    ///
    /// Returns [`ShellyEveError::Validation`] for an invalid identity.
    pub fn new<I, S>(info: DeviceInfo, properties: I) -> Result<Rc<Self>, ShellyEveError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        info.validate()?;
        Ok(Rc::new(Self {
            info,
            profile: None,
            properties: RefCell::new(properties.into_iter().map(|name| (name.into(), None)).collect()),
            listeners: RefCell::new(Vec::new()),
        }))
    }

    /// Create a device of the given model.
    ///
    /// # Errors
    ///
    /// Returns [`ShellyEveError::Validation`] for an empty id.
    pub fn from_profile(id: impl Into<String>, profile: DeviceProfile) -> Result<Rc<Self>, ShellyEveError> {
        let info = DeviceInfo::builder()
            .id(id)
            .device_type(profile.device_type())
            .build()?;
        Ok(Rc::new(Self {
            info,
            profile: Some(profile),
            properties: RefCell::new(profile.properties().into_iter().map(|name| (name, None)).collect()),
            listeners: RefCell::new(Vec::new()),
        }))
    }

    #[must_use]
    pub fn profile(&self) -> Option<DeviceProfile> {
        self.profile
    }

    /// Declared property names, sorted.
    #[must_use]
    pub fn declared_properties(&self) -> Vec<String> {
        self.properties.borrow().keys().cloned().collect()
    }

    /// Write a property, notifying listeners if the value changed.
    ///
    /// Returns whether the value changed.
    ///
    /// # Errors
    ///
    /// Returns [`VirtualDeviceError::UnknownProperty`] for an undeclared property.
    pub fn update(&self, property: &str, value: impl Into<PropertyValue>) -> Result<bool, VirtualDeviceError> {
        let value = value.into();
        {
            let mut properties = self.properties.borrow_mut();
            let slot = properties
                .get_mut(property)
                .ok_or_else(|| VirtualDeviceError::UnknownProperty(property.to_string()))?;
            if slot.as_ref() == Some(&value) {
                return Ok(false);
            }
            *slot = Some(value.clone());
        }

        tracing::debug!(device = %self.info, property, %value, "property changed");
        self.emit(&PropertyChange::new(property, Some(value)));
        Ok(true)
    }

    fn emit(&self, change: &PropertyChange) {
        let event = change.event_name();
        let snapshot: Vec<(ListenerId, Listener)> = self
            .listeners
            .borrow()
            .iter()
            .filter(|registration| registration.event == event)
            .map(|registration| (registration.id, Rc::clone(&registration.listener)))
            .collect();

        for (id, listener) in snapshot {
            // A listener removed by an earlier one in this dispatch is skipped.
            if self.is_registered(&event, id) {
                listener(change);
            }
        }
    }

    fn is_registered(&self, event: &str, id: ListenerId) -> bool {
        self.listeners
            .borrow()
            .iter()
            .any(|registration| registration.id == id && registration.event == event)
    }
}

impl Device for VirtualDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn has_property(&self, name: &str) -> bool {
        self.properties.borrow().contains_key(name)
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        self.properties.borrow().get(name).cloned().flatten()
    }

    fn on(&self, event: &str, listener: Listener) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.borrow_mut().push(Registration {
            event: event.to_string(),
            id,
            listener,
        });
        id
    }

    fn remove_listener(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|registration| !(registration.id == id && registration.event == event));
        listeners.len() != before
    }

    fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|registration| registration.event == event)
            .count()
    }

    fn set_relay(&self, index: u8, on: bool) -> Result<(), ShellyEveError> {
        let property = relay_property(index);
        if !self.has_property(&property) {
            return Err(VirtualDeviceError::UnknownRelay(index).into());
        }
        tracing::info!(device = %self.info, relay = index, on, "switching relay");
        self.update(&property, on)?;
        Ok(())
    }
}
