//! # shellyeve-app
//!
//! Application layer: abilities, accessories and the **device port**.
//!
//! ## Responsibilities
//! - Define the [`Device`](ports::Device) port that adapters implement: an
//!   observable property store raising `change:<property>` events
//! - Provide the [`Ability`](ability::Ability) lifecycle: build a service
//!   from current device state, subscribe to property changes, release every
//!   subscription on detach
//! - Ship the concrete abilities (`outlet`, `power_meter`) and the outlet
//!   accessory composing them
//! - Keep a [`Platform`](platform::Platform) registry of attached accessories
//!
//! ## Threading
//! Everything here is single-threaded: devices dispatch synchronously and
//! handlers share services through `Rc<RefCell<_>>`.
//!
//! ## Dependency rule
//! Depends on `shellyeve-domain` only. Never imports adapter crates.

pub mod abilities;
pub mod ability;
pub mod accessories;
pub mod accessory;
pub mod platform;
pub mod ports;

#[cfg(test)]
mod testing;
