//! Device port: the observable property store behind every accessory.
//!
//! A device owns its properties and is the only thing allowed to change
//! them. Whenever a property changes it raises a `change:<property>` event
//! and calls every listener registered for that event, in registration
//! order, synchronously.

use std::rc::Rc;

use shellyeve_domain::device::DeviceInfo;
use shellyeve_domain::error::ShellyEveError;
use shellyeve_domain::event::PropertyChange;
use shellyeve_domain::id::ListenerId;
use shellyeve_domain::property::PropertyValue;

/// Callback invoked with every change of the property it was registered for.
pub type Listener = Rc<dyn Fn(&PropertyChange)>;

/// An observable key/value property store representing a physical device.
///
/// Implementations must tolerate listeners being added or removed while a
/// notification is being dispatched, and must not hold internal borrows
/// across listener calls (listeners read properties back).
pub trait Device {
    /// Stable identity used for logging and accessory ids.
    fn info(&self) -> &DeviceInfo;

    /// Whether the device declares `name`, whether or not it has a value yet.
    fn has_property(&self, name: &str) -> bool;

    /// Current value of `name`; `None` when undeclared or not reported yet.
    fn property(&self, name: &str) -> Option<PropertyValue>;

    /// Register `listener` for `event` (e.g. `change:power0`).
    fn on(&self, event: &str, listener: Listener) -> ListenerId;

    /// Remove a listener. Returns `false` if it was not registered, which
    /// is not an error.
    fn remove_listener(&self, event: &str, id: ListenerId) -> bool;

    /// Number of listeners currently registered for `event`.
    fn listener_count(&self, event: &str) -> usize;

    /// Switch relay `index` on or off.
    ///
    /// # Errors
    ///
    /// Returns [`ShellyEveError::Device`] when the command cannot be carried
    /// out, or [`ShellyEveError::NotFound`] for an unknown relay.
    fn set_relay(&self, index: u8, on: bool) -> Result<(), ShellyEveError>;
}
