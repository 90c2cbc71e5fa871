//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`ShellyEveError`] via `#[from]`. There are no `String` variants: every
//! failure carries the data needed to explain it.

use crate::characteristic::CharacteristicType;
use crate::service::ServiceType;

/// Root error type of the workspace.
#[derive(Debug, thiserror::Error)]
pub enum ShellyEveError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// Something referenced by name or id does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// An ability or accessory was driven through an invalid lifecycle transition.
    #[error("lifecycle error")]
    Lifecycle(#[from] LifecycleError),

    /// The device collaborator failed to carry out a command.
    #[error("device error")]
    Device(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Violated domain invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("property name must not be empty")]
    EmptyPropertyName,

    #[error("device id must not be empty")]
    EmptyDeviceId,

    #[error("device type must not be empty")]
    EmptyDeviceType,

    #[error("accessory name must not be empty")]
    EmptyAccessoryName,

    #[error("{characteristic} value {value} is outside [{min}, {max}]")]
    OutOfRange {
        characteristic: CharacteristicType,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{characteristic} does not accept a {found} value")]
    TypeMismatch {
        characteristic: CharacteristicType,
        found: &'static str,
    },

    #[error("{characteristic} is read-only for the host")]
    ReadOnly { characteristic: CharacteristicType },

    #[error("accessory {id} is already registered")]
    DuplicateAccessory { id: String },
}

/// A named thing could not be found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Kind of thing that was looked up (e.g. `"Property"`).
    pub entity: &'static str,
    /// Identifier that was looked up.
    pub id: String,
}

/// Invalid lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("{ability} ability is already attached")]
    AlreadyAttached { ability: &'static str },

    #[error("{ability} ability was detached and cannot be attached again")]
    Retired { ability: &'static str },

    #[error("{ability} ability is not attached")]
    NotAttached { ability: &'static str },

    #[error("{service} service does not expose {characteristic}")]
    MissingCharacteristic {
        service: ServiceType,
        characteristic: CharacteristicType,
    },

    #[error("device is no longer available")]
    DeviceGone,
}
