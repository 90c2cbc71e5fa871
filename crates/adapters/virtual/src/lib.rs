//! # shellyeve-adapter-virtual
//!
//! Virtual Shelly devices: in-memory property stores implementing the
//! [`Device`](shellyeve_app::ports::Device) port.
//!
//! ## Provided models
//!
//! | Profile | Model code | Properties |
//! |---------|------------|------------|
//! | `plug-s` | `SHPLG-S` | `relay0`, `power0` |
//! | `1pm` | `SHSW-PM` | `relay0`, `power0` |
//! | `2.5` | `SHSW-25` | `relay0`, `relay1`, `power0`, `power1` |
//! | `em` | `SHEM` | `power0`, `power1`, `current0`, `voltage0` |
//!
//! ## Dependency rule
//!
//! Depends on `shellyeve-app` (port traits) and `shellyeve-domain` only.

mod device;
pub mod error;
pub mod profiles;

pub use device::VirtualDevice;
pub use error::VirtualDeviceError;
pub use profiles::{DeviceProfile, OutletLayout};
