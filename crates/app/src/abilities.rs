//! Concrete abilities.

pub mod outlet;
pub mod power_meter;

pub use outlet::{OutletAbility, PowerStateSetter};
pub use power_meter::{PowerMeterAbility, PowerReadings, REFERENCE_VOLTAGE};
