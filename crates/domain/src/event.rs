//! Property change notifications emitted by devices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::property::PropertyValue;

/// UTC instant at which a device observed a change.
pub type Timestamp = DateTime<Utc>;

const CHANGE_PREFIX: &str = "change:";

/// Name of the event a device raises when `property` changes.
#[must_use]
pub fn change_event(property: &str) -> String {
    format!("{CHANGE_PREFIX}{property}")
}

/// Property named by a `change:<property>` event, if `event` is one.
#[must_use]
pub fn changed_property(event: &str) -> Option<&str> {
    event.strip_prefix(CHANGE_PREFIX)
}

/// Snapshot of a single property change.
///
/// Handlers derive every value they write from this snapshot rather than
/// re-reading the device, so all characteristics updated from one
/// notification agree with each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChange {
    pub property: String,
    /// New value; `None` when the device cleared the property.
    pub value: Option<PropertyValue>,
    pub at: Timestamp,
}

impl PropertyChange {
    /// Create a change record stamped with the current time.
    #[must_use]
    pub fn new(property: impl Into<String>, value: Option<PropertyValue>) -> Self {
        Self {
            property: property.into(),
            value,
            at: Utc::now(),
        }
    }

    /// Name of the event this change is delivered under.
    #[must_use]
    pub fn event_name(&self) -> String {
        change_event(&self.property)
    }
}
