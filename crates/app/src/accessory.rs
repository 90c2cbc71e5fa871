//! Accessory: one device and the ordered abilities bound to it.
//!
//! An accessory owns its abilities; dropping it detaches all of them, so
//! the accessory's lifetime bounds every subscription made on its behalf.

use std::fmt;
use std::rc::Rc;

use shellyeve_domain::category::Category;
use shellyeve_domain::characteristic::{CharacteristicType, CharacteristicValue};
use shellyeve_domain::error::{LifecycleError, NotFoundError, ShellyEveError, ValidationError};
use shellyeve_domain::id::AccessoryId;
use shellyeve_domain::service::ServiceType;

use crate::ability::{Ability, AttachContext, SharedService};
use crate::ports::Device;

/// A host-visible accessory composed of one device and its abilities.
pub struct Accessory {
    context: AttachContext,
    category: Category,
    device: Rc<dyn Device>,
    abilities: Vec<Box<dyn Ability>>,
}

impl Accessory {
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyAccessoryName`] when `name` is empty.
    pub fn new(
        id: AccessoryId,
        name: impl Into<String>,
        category: Category,
        device: Rc<dyn Device>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyAccessoryName);
        }
        Ok(Self {
            context: AttachContext::new(id, name),
            category,
            device,
            abilities: Vec::new(),
        })
    }

    /// Append an ability; abilities attach in insertion order.
    #[must_use]
    pub fn with_ability(mut self, ability: impl Ability + 'static) -> Self {
        self.abilities.push(Box::new(ability));
        self
    }

    #[must_use]
    pub fn id(&self) -> AccessoryId {
        self.context.accessory_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.context.accessory_name
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn device(&self) -> &Rc<dyn Device> {
        &self.device
    }

    #[must_use]
    pub fn abilities(&self) -> &[Box<dyn Ability>] {
        &self.abilities
    }

    /// Whether every ability is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        !self.abilities.is_empty() && self.abilities.iter().all(|ability| ability.is_attached())
    }

    /// Attach every ability to the device, in order.
    ///
    /// # Errors
    ///
    /// Returns the first ability's error. Abilities attached before it are
    /// detached again, so a failed attach leaves no listener behind.
    pub fn attach(&mut self) -> Result<(), ShellyEveError> {
        let _entered = self.context.span.enter();
        for index in 0..self.abilities.len() {
            let result = self.abilities[index].attach(Rc::clone(&self.device), &self.context);
            if let Err(err) = result {
                tracing::warn!(
                    ability = self.abilities[index].name(),
                    %err,
                    "attach failed, detaching {index} earlier abilities"
                );
                for ability in self.abilities[..index].iter_mut().rev() {
                    ability.detach();
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Detach every ability, in reverse order.
    pub fn detach(&mut self) {
        let _entered = self.context.span.enter();
        for ability in self.abilities.iter_mut().rev() {
            ability.detach();
        }
    }

    /// Services of the attached abilities, in ability order.
    #[must_use]
    pub fn services(&self) -> Vec<SharedService> {
        self.abilities
            .iter()
            .filter_map(|ability| ability.service().ok())
            .collect()
    }

    /// First attached service of the given type.
    #[must_use]
    pub fn service(&self, kind: ServiceType) -> Option<SharedService> {
        self.services()
            .into_iter()
            .find(|service| service.borrow().kind() == kind)
    }

    /// Route a host write to the ability owning `service`.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] for a service no attached ability exposes,
    /// [`LifecycleError::MissingCharacteristic`] for a characteristic the
    /// service lacks, a [`ValidationError`] for an unacceptable value, or
    /// whatever the ability's write handler returns.
    pub fn set_characteristic(
        &self,
        service: ServiceType,
        characteristic: CharacteristicType,
        value: CharacteristicValue,
    ) -> Result<(), ShellyEveError> {
        let _entered = self.context.span.enter();
        let (ability, shared) = self
            .abilities
            .iter()
            .find_map(|ability| {
                let shared = ability.service().ok()?;
                let matches = shared.borrow().kind() == service;
                matches.then_some((ability, shared))
            })
            .ok_or_else(|| NotFoundError {
                entity: "Service",
                id: service.to_string(),
            })?;

        if !shared.borrow().has_characteristic(characteristic) {
            return Err(LifecycleError::MissingCharacteristic {
                service,
                characteristic,
            }
            .into());
        }
        characteristic.validate(value)?;

        tracing::debug!(%service, %characteristic, ?value, "host write");
        ability.handle_set(characteristic, value)
    }
}

impl fmt::Debug for Accessory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessory")
            .field("id", &self.context.accessory_id)
            .field("name", &self.context.accessory_name)
            .field("category", &self.category)
            .field("device", self.device.info())
            .field(
                "abilities",
                &self.abilities.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl Drop for Accessory {
    fn drop(&mut self) {
        self.detach();
    }
}
