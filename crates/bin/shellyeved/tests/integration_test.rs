//! End-to-end tests for the full shellyeve stack.
//!
//! Each test wires real virtual devices, real abilities and accessories and
//! a real platform, then drives the devices the way the daemon does.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use shellyeve_adapter_virtual::{DeviceProfile, VirtualDevice};
use shellyeve_app::abilities::PowerMeterAbility;
use shellyeve_app::ability::{Ability, AttachContext};
use shellyeve_app::accessories::OutletAccessory;
use shellyeve_app::platform::Platform;
use shellyeve_app::ports::Device;
use shellyeve_domain::characteristic::{CharacteristicType, CharacteristicValue};
use shellyeve_domain::device::DeviceInfo;
use shellyeve_domain::event::change_event;
use shellyeve_domain::id::AccessoryId;
use shellyeve_domain::service::ServiceType;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Counts log records carrying a given message.
#[derive(Clone)]
struct MessageCounter {
    message: &'static str,
    count: Arc<AtomicUsize>,
}

impl MessageCounter {
    fn new(message: &'static str) -> Self {
        Self {
            message,
            count: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for MessageCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        if visitor.0 == self.message {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn value(platform: &Platform, id: AccessoryId, service: ServiceType, kind: CharacteristicType) -> CharacteristicValue {
    platform
        .accessory(id)
        .expect("accessory should be registered")
        .service(service)
        .expect("service should be attached")
        .borrow()
        .value(kind)
        .expect("characteristic should exist")
}

fn total_change_listeners(device: &VirtualDevice) -> usize {
    device
        .declared_properties()
        .iter()
        .map(|property| device.listener_count(&change_event(property)))
        .sum()
}

// ---------------------------------------------------------------------------
// Power metering
// ---------------------------------------------------------------------------

#[test]
fn should_clamp_huge_reading_and_log_once() {
    let plug = VirtualDevice::from_profile("A4CF12F45", DeviceProfile::PlugS).unwrap();
    let mut platform = Platform::new();
    let counter = MessageCounter::new("consumption changed");

    let id = counter.run(|| {
        let id = platform
            .register(OutletAccessory::new(0).power_meter(0).build(plug.clone()).unwrap())
            .unwrap();
        plug.update("power0", 1_000_000_i64).unwrap();
        id
    });

    assert_eq!(
        value(&platform, id, ServiceType::PowerMeter, CharacteristicType::Consumption),
        CharacteristicValue::Float(65_535.0)
    );
    assert_eq!(
        value(&platform, id, ServiceType::PowerMeter, CharacteristicType::ElectricCurrent),
        CharacteristicValue::Float(65_535.0 / 240.0)
    );
    assert_eq!(
        value(&platform, id, ServiceType::PowerMeter, CharacteristicType::Voltage),
        CharacteristicValue::Float(240.0)
    );
    assert_eq!(
        value(&platform, id, ServiceType::Outlet, CharacteristicType::OutletInUse),
        CharacteristicValue::Bool(true)
    );
    assert_eq!(counter.count(), 1);
}

#[test]
fn should_expose_only_consumption_for_bare_meter() {
    let info = DeviceInfo::builder().id("M1").device_type("SHEM").build().unwrap();
    let device = VirtualDevice::new(info, ["power0"]).unwrap();
    let mut meter = PowerMeterAbility::new("power0", None, None).unwrap();
    let context = AttachContext::new(AccessoryId::derive("SHEM", "M1", 0), "Meter");

    meter.attach(device.clone(), &context).unwrap();

    let service = meter.service().unwrap();
    assert_eq!(service.borrow().len(), 1);
    assert_eq!(device.listener_count("change:power0"), 1);
    assert_eq!(device.listener_count("change:current0"), 0);
    assert_eq!(device.listener_count("change:voltage0"), 0);
}

#[test]
fn should_ignore_reading_after_detach() {
    let info = DeviceInfo::builder().id("M1").device_type("SHEM").build().unwrap();
    let device = VirtualDevice::new(info, ["power0"]).unwrap();
    let mut meter = PowerMeterAbility::new("power0", None, None).unwrap();
    let context = AttachContext::new(AccessoryId::derive("SHEM", "M1", 0), "Meter");
    meter.attach(device.clone(), &context).unwrap();
    let service = meter.service().unwrap();

    meter.detach();
    device.update("power0", 300.0).unwrap();

    assert_eq!(
        service.borrow().value(CharacteristicType::Consumption),
        Some(CharacteristicValue::Float(0.0))
    );
    assert_eq!(device.listener_count("change:power0"), 0);
}

#[test]
fn should_not_log_unchanged_readings() {
    let plug = VirtualDevice::from_profile("A1", DeviceProfile::OnePm).unwrap();
    let mut platform = Platform::new();
    let counter = MessageCounter::new("consumption changed");

    counter.run(|| {
        platform
            .register(OutletAccessory::new(0).power_meter(0).build(plug.clone()).unwrap())
            .unwrap();
        plug.update("power0", 60.0).unwrap();
        plug.update("power0", 60.0).unwrap();
        plug.update("power0", 61.0).unwrap();
    });

    assert_eq!(counter.count(), 2);
}

// ---------------------------------------------------------------------------
// Relays
// ---------------------------------------------------------------------------

#[test]
fn should_switch_relay_from_host_write() {
    let plug = VirtualDevice::from_profile("A1", DeviceProfile::PlugS).unwrap();
    let mut platform = Platform::new();
    let id = platform
        .register(OutletAccessory::new(0).build(plug.clone()).unwrap())
        .unwrap();

    platform
        .set_characteristic(id, ServiceType::Outlet, CharacteristicType::On, CharacteristicValue::Bool(true))
        .unwrap();

    assert_eq!(plug.property("relay0").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(
        value(&platform, id, ServiceType::Outlet, CharacteristicType::On),
        CharacteristicValue::Bool(true)
    );
    assert_eq!(
        value(&platform, id, ServiceType::Outlet, CharacteristicType::OutletInUse),
        CharacteristicValue::Bool(true)
    );
}

#[test]
fn should_keep_channels_of_two_relay_device_apart() {
    let device = VirtualDevice::from_profile("B0A7321", DeviceProfile::TwoFive).unwrap();
    let mut platform = Platform::new();
    let first = platform
        .register(OutletAccessory::new(0).power_meter(0).build(device.clone()).unwrap())
        .unwrap();
    let second = platform
        .register(OutletAccessory::new(1).power_meter(1).build(device.clone()).unwrap())
        .unwrap();

    device.set_relay(1, true).unwrap();
    device.update("power1", 480.0).unwrap();

    assert_eq!(
        value(&platform, first, ServiceType::Outlet, CharacteristicType::On),
        CharacteristicValue::Bool(false)
    );
    assert_eq!(
        value(&platform, second, ServiceType::Outlet, CharacteristicType::On),
        CharacteristicValue::Bool(true)
    );
    assert_eq!(
        value(&platform, first, ServiceType::PowerMeter, CharacteristicType::Consumption),
        CharacteristicValue::Float(0.0)
    );
    assert_eq!(
        value(&platform, second, ServiceType::PowerMeter, CharacteristicType::ElectricCurrent),
        CharacteristicValue::Float(2.0)
    );
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn should_restore_listener_counts_on_shutdown() {
    let plug = VirtualDevice::from_profile("A1", DeviceProfile::PlugS).unwrap();
    let dual = VirtualDevice::from_profile("B1", DeviceProfile::TwoFive).unwrap();
    let mut platform = Platform::new();
    platform
        .register(OutletAccessory::new(0).power_meter(0).build(plug.clone()).unwrap())
        .unwrap();
    for relay in 0..2 {
        platform
            .register(OutletAccessory::new(relay).power_meter(relay).build(dual.clone()).unwrap())
            .unwrap();
    }
    assert!(total_change_listeners(&plug) > 0);
    assert!(total_change_listeners(&dual) > 0);

    platform.shutdown();

    assert_eq!(total_change_listeners(&plug), 0);
    assert_eq!(total_change_listeners(&dual), 0);
    // Fixed channels are subscribed whether or not the device declares them.
    assert_eq!(plug.listener_count("change:current0"), 0);
    assert_eq!(dual.listener_count("change:voltage0"), 0);
}

#[test]
fn should_release_device_when_platform_is_dropped() {
    let plug = VirtualDevice::from_profile("A1", DeviceProfile::PlugS).unwrap();
    let weak = Rc::downgrade(&plug);
    {
        let mut platform = Platform::new();
        platform
            .register(OutletAccessory::new(0).power_meter(0).build(plug.clone()).unwrap())
            .unwrap();
    }

    drop(plug);

    assert!(weak.upgrade().is_none());
}
