//! Concrete accessory assemblies.

pub mod outlet;

pub use outlet::{OutletAccessory, OUTLET_CATEGORY};
