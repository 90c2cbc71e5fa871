//! Test doubles shared by the unit tests of this crate.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use shellyeve_domain::device::DeviceInfo;
use shellyeve_domain::error::{NotFoundError, ShellyEveError};
use shellyeve_domain::event::{PropertyChange, change_event};
use shellyeve_domain::id::ListenerId;
use shellyeve_domain::property::{PropertyValue, relay_property};
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::ports::{Device, Listener};

/// In-memory device that raises a change event on every `set`, changed or not.
pub(crate) struct FakeDevice {
    info: DeviceInfo,
    properties: RefCell<HashMap<String, Option<PropertyValue>>>,
    listeners: RefCell<Vec<(String, ListenerId, Listener)>>,
    pub(crate) relay_calls: RefCell<Vec<(u8, bool)>>,
    pub(crate) fail_relay: Cell<bool>,
}

#[derive(Debug)]
pub(crate) struct RelayRejected;

impl fmt::Display for RelayRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("relay rejected the command")
    }
}

impl std::error::Error for RelayRejected {}

impl FakeDevice {
    pub(crate) fn new(properties: &[&str]) -> Rc<Self> {
        Rc::new(Self {
            info: DeviceInfo::builder()
                .id("FAKE01")
                .device_type("SHSW-PM")
                .build()
                .unwrap(),
            properties: RefCell::new(
                properties
                    .iter()
                    .map(|name| ((*name).to_string(), None))
                    .collect(),
            ),
            listeners: RefCell::new(Vec::new()),
            relay_calls: RefCell::new(Vec::new()),
            fail_relay: Cell::new(false),
        })
    }

    /// Store a value and notify listeners of `change:<name>`.
    pub(crate) fn set(&self, name: &str, value: impl Into<PropertyValue>) {
        let value = value.into();
        self.store(name, value.clone());
        self.emit(&PropertyChange::new(name, Some(value)));
    }

    /// Store a value without notifying anyone.
    pub(crate) fn store(&self, name: &str, value: impl Into<PropertyValue>) {
        self.properties
            .borrow_mut()
            .insert(name.to_string(), Some(value.into()));
    }

    /// Raise a change event without touching the stored value.
    pub(crate) fn emit(&self, change: &PropertyChange) {
        let event = change.event_name();
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(name, _, _)| *name == event)
            .map(|(_, _, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(change);
        }
    }

    pub(crate) fn total_listeners(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl Device for FakeDevice {
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
        self.listeners
            .borrow_mut()
            .push((event.to_string(), id, listener));
        id
    }

    fn remove_listener(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(name, lid, _)| !(name == event && *lid == id));
        listeners.len() != before
    }

    fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(name, _, _)| name == event)
            .count()
    }

    fn set_relay(&self, index: u8, on: bool) -> Result<(), ShellyEveError> {
        self.relay_calls.borrow_mut().push((index, on));
        if self.fail_relay.get() {
            return Err(ShellyEveError::Device(Box::new(RelayRejected)));
        }
        let property = relay_property(index);
        if !self.has_property(&property) {
            return Err(NotFoundError {
                entity: "Relay",
                id: index.to_string(),
            }
            .into());
        }
        self.set(&property, on);
        Ok(())
    }
}

/// Listener count for the change event of `property`.
pub(crate) fn listeners_for(device: &FakeDevice, property: &str) -> usize {
    device.listener_count(&change_event(property))
}

/// A log record captured by [`LogCapture`].
#[derive(Debug, Clone)]
pub(crate) struct CapturedEvent {
    pub(crate) level: tracing::Level,
    pub(crate) message: String,
    pub(crate) fields: Vec<(String, String)>,
}

impl CapturedEvent {
    pub(crate) fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// `tracing` layer that records every event emitted while it is installed.
#[derive(Clone, Default)]
pub(crate) struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCapture {
    /// Run `f` with this capture installed as the thread's default subscriber.
    pub(crate) fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }

    pub(crate) fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn with_message(&self, message: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.message == message)
            .collect()
    }
}

impl<S: tracing::Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields.push((field.name().to_string(), value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields
                .push((field.name().to_string(), format!("{value:?}")));
        }
    }
}
