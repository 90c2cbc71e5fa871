//! Platform: the registry of accessories handed to the host.

use shellyeve_domain::characteristic::{CharacteristicType, CharacteristicValue};
use shellyeve_domain::error::{NotFoundError, ShellyEveError, ValidationError};
use shellyeve_domain::id::AccessoryId;
use shellyeve_domain::service::ServiceType;

use crate::accessory::Accessory;

/// Package name the host loads the plugin under.
pub const PLUGIN_NAME: &str = "homebridge-shelly-eve";

/// Platform name used in the host configuration.
pub const PLATFORM_NAME: &str = "Shelly";

/// Registered accessories, in registration order.
///
/// Registering attaches an accessory; unregistering and [`shutdown`]
/// detach. Dropping the platform shuts it down.
///
/// [`shutdown`]: Platform::shutdown
#[derive(Debug, Default)]
pub struct Platform {
    accessories: Vec<Accessory>,
}

impl Platform {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `accessory` and add it to the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateAccessory`] if an accessory with
    /// the same id is registered (the new one is not attached), or the
    /// accessory's attach error.
    #[tracing::instrument(skip(self, accessory), fields(accessory = %accessory.name(), id = %accessory.id()))]
    pub fn register(&mut self, mut accessory: Accessory) -> Result<AccessoryId, ShellyEveError> {
        let id = accessory.id();
        if self.accessory(id).is_some() {
            return Err(ValidationError::DuplicateAccessory { id: id.to_string() }.into());
        }
        accessory.attach()?;
        tracing::info!(category = %accessory.category(), "accessory registered");
        self.accessories.push(accessory);
        Ok(id)
    }

    /// Detach and drop a registered accessory.
    ///
    /// # Errors
    ///
    /// Returns [`ShellyEveError::NotFound`] for an unknown id.
    #[tracing::instrument(skip(self))]
    pub fn unregister(&mut self, id: AccessoryId) -> Result<(), ShellyEveError> {
        let position = self
            .accessories
            .iter()
            .position(|accessory| accessory.id() == id)
            .ok_or_else(|| not_found(id))?;
        let mut accessory = self.accessories.remove(position);
        accessory.detach();
        tracing::info!(accessory = %accessory.name(), "accessory unregistered");
        Ok(())
    }

    #[must_use]
    pub fn accessory(&self, id: AccessoryId) -> Option<&Accessory> {
        self.accessories.iter().find(|accessory| accessory.id() == id)
    }

    #[must_use]
    pub fn accessories(&self) -> &[Accessory] {
        &self.accessories
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accessories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accessories.is_empty()
    }

    /// Route a host write to a registered accessory.
    ///
    /// # Errors
    ///
    /// Returns [`ShellyEveError::NotFound`] for an unknown id, otherwise
    /// whatever [`Accessory::set_characteristic`] returns.
    #[tracing::instrument(skip(self))]
    pub fn set_characteristic(
        &self,
        id: AccessoryId,
        service: ServiceType,
        characteristic: CharacteristicType,
        value: CharacteristicValue,
    ) -> Result<(), ShellyEveError> {
        self.accessory(id)
            .ok_or_else(|| not_found(id))?
            .set_characteristic(service, characteristic, value)
    }

    /// Detach every accessory, most recently registered first.
    #[tracing::instrument(skip(self), fields(count = self.accessories.len()))]
    pub fn shutdown(&mut self) {
        while let Some(mut accessory) = self.accessories.pop() {
            tracing::debug!(accessory = %accessory.name(), "detaching accessory");
            accessory.detach();
        }
    }
}

impl Drop for Platform {
    fn drop(&mut self) {
        if !self.accessories.is_empty() {
            self.shutdown();
        }
    }
}

fn not_found(id: AccessoryId) -> NotFoundError {
    NotFoundError {
        entity: "Accessory",
        id: id.to_string(),
    }
}
