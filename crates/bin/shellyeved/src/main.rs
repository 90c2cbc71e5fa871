//! # shellyeved
//!
//! Composition root that builds virtual devices, registers their outlet
//! accessories on the platform and feeds them simulated readings.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialise `tracing`
//! - Build one virtual device per configured entry and one outlet accessory
//!   per configured relay
//! - Tick the simulation until Ctrl-C, then detach every accessory
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod simulation;

use std::rc::Rc;

use shellyeve_adapter_virtual::VirtualDevice;
use shellyeve_app::accessories::OutletAccessory;
use shellyeve_app::platform::{PLATFORM_NAME, PLUGIN_NAME, Platform};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, DeviceConfig};
use crate::simulation::Simulation;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();
    tracing::info!(plugin = PLUGIN_NAME, platform = PLATFORM_NAME, "starting");

    let mut platform = Platform::new();
    let mut devices = Vec::with_capacity(config.devices.len());
    for device_config in &config.devices {
        devices.push(register_device(&mut platform, device_config)?);
    }
    tracing::info!(
        devices = devices.len(),
        accessories = platform.len(),
        "platform ready"
    );

    let mut simulation = Simulation::new(devices).toggle_every(config.simulation.toggle_every);
    let mut interval = tokio::time::interval(config.interval());
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(err) = simulation.step() {
                    tracing::error!(%err, "simulation step failed");
                }
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("shutdown requested");
                break;
            }
        }
    }

    platform.shutdown();
    tracing::info!("stopped");
    Ok(())
}

/// Build a device and register one outlet accessory per configured relay.
fn register_device(
    platform: &mut Platform,
    config: &DeviceConfig,
) -> Result<Rc<VirtualDevice>, Box<dyn std::error::Error>> {
    let device = VirtualDevice::from_profile(&config.id, config.profile)?;
    for outlet in config.outlets() {
        let mut accessory = OutletAccessory::new(outlet.relay);
        if let Some(meter) = outlet.power_meter {
            accessory = accessory.power_meter(meter);
        }
        if let Some(name) = config.accessory_name(outlet.relay) {
            accessory = accessory.name(name);
        }
        platform.register(accessory.build(device.clone())?)?;
    }
    Ok(device)
}
