//! Typed identifier newtypes backed by UUIDs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Wrap an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Handle of a listener registered on a device, used to remove it again.
    ListenerId
);

define_id!(
    /// Stable identifier of an accessory exposed to the host.
    AccessoryId
);

impl Default for ListenerId {
    fn default() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl ListenerId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Namespace for accessory ids, so the same device maps to the same
/// accessory across restarts.
const ACCESSORY_NAMESPACE: uuid::Uuid = uuid::Uuid::from_u128(0x5e11_7e7e_0b1d_4c3a_9f2e_8d6b_a1c0_f00d);

impl AccessoryId {
    /// Derive the id of the accessory exposing relay `index` of a device.
    #[must_use]
    pub fn derive(device_type: &str, device_id: &str, index: u8) -> Self {
        let name = format!("{device_type}:{device_id}:{index}");
        Self(uuid::Uuid::new_v5(&ACCESSORY_NAMESPACE, name.as_bytes()))
    }
}
