//! Errors raised by virtual devices.

use shellyeve_domain::error::{NotFoundError, ShellyEveError};

/// Virtual device errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VirtualDeviceError {
    #[error("device does not declare property {0}")]
    UnknownProperty(String),

    #[error("device has no relay {0}")]
    UnknownRelay(u8),

    #[error("unknown device profile: {0}")]
    UnknownProfile(String),
}

impl From<VirtualDeviceError> for ShellyEveError {
    fn from(err: VirtualDeviceError) -> Self {
        match err {
            VirtualDeviceError::UnknownProperty(property) => NotFoundError {
                entity: "Property",
                id: property,
            }
            .into(),
            VirtualDeviceError::UnknownRelay(index) => NotFoundError {
                entity: "Relay",
                id: index.to_string(),
            }
            .into(),
            other @ VirtualDeviceError::UnknownProfile(_) => Self::Device(Box::new(other)),
        }
    }
}
