//! Outlet ability: relay state and "outlet in use".

use shellyeve_domain::characteristic::{CharacteristicType, CharacteristicValue};
use shellyeve_domain::error::{LifecycleError, NotFoundError, ShellyEveError, ValidationError};
use shellyeve_domain::property::PropertyValue;
use shellyeve_domain::service::{Service, ServiceType};

use crate::ability::{Ability, AbilityCore, EventHandlers};
use crate::ports::Device;

/// Callback switching the physical relay.
pub type PowerStateSetter = Box<dyn Fn(bool) -> Result<(), ShellyEveError>>;

/// Mirrors a relay onto an `Outlet` service and forwards host writes of `On`.
///
/// `OutletInUse` follows the consumption property when one is given and the
/// device declares it, and the relay state otherwise.
pub struct OutletAbility {
    core: AbilityCore,
    relay_property: String,
    consumption_property: Option<String>,
    set_power_state: PowerStateSetter,
}

impl OutletAbility {
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyPropertyName`] if any supplied name is empty.
    pub fn new(
        relay_property: impl Into<String>,
        set_power_state: PowerStateSetter,
        consumption_property: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let relay_property = relay_property.into();
        if relay_property.is_empty() || consumption_property.is_some_and(str::is_empty) {
            return Err(ValidationError::EmptyPropertyName);
        }
        Ok(Self {
            core: AbilityCore::new(),
            relay_property,
            consumption_property: consumption_property.map(str::to_string),
            set_power_state,
        })
    }

    #[must_use]
    pub fn relay_property(&self) -> &str {
        &self.relay_property
    }

    #[must_use]
    pub fn consumption_property(&self) -> Option<&str> {
        self.consumption_property.as_deref()
    }

    /// Consumption property to follow on `device`, if any.
    fn tracked_consumption(&self, device: &dyn Device) -> Option<&str> {
        self.consumption_property
            .as_deref()
            .filter(|property| device.has_property(property))
    }
}

fn relay_state(value: Option<&PropertyValue>) -> bool {
    value.and_then(PropertyValue::as_bool).unwrap_or(false)
}

fn in_use(value: Option<&PropertyValue>) -> bool {
    value.and_then(PropertyValue::as_f64).is_some_and(|watts| watts > 0.0)
}

impl Ability for OutletAbility {
    fn name(&self) -> &'static str {
        "outlet"
    }

    fn core(&self) -> &AbilityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AbilityCore {
        &mut self.core
    }

    fn create_service(&self, device: &dyn Device) -> Result<Service, ShellyEveError> {
        if !device.has_property(&self.relay_property) {
            return Err(NotFoundError {
                entity: "Property",
                id: self.relay_property.clone(),
            }
            .into());
        }

        let on = relay_state(device.property(&self.relay_property).as_ref());
        let outlet_in_use = match self.tracked_consumption(device) {
            Some(property) => in_use(device.property(property).as_ref()),
            None => {
                if let Some(property) = &self.consumption_property {
                    tracing::warn!(%property, "device has no such consumption property, outlet in use follows the relay");
                }
                on
            }
        };

        Ok(Service::new(ServiceType::Outlet)
            .with_characteristic(CharacteristicType::On, on)?
            .with_characteristic(CharacteristicType::OutletInUse, outlet_in_use)?)
    }

    fn setup_event_handlers(&self, handlers: &mut EventHandlers<'_>) -> Result<(), ShellyEveError> {
        let consumption = self.tracked_consumption(handlers.device()).map(str::to_string);
        let follows_relay = consumption.is_none();

        handlers.on(&self.relay_property, move |ctx, change| {
            let on = relay_state(change.value.as_ref());
            ctx.write(CharacteristicType::On, on);
            if follows_relay {
                ctx.write(CharacteristicType::OutletInUse, on);
            }
            tracing::info!(
                property = %change.property,
                device = %ctx.device.info(),
                on,
                "relay changed"
            );
        });

        if let Some(consumption) = consumption {
            handlers.on(&consumption, |ctx, change| {
                let outlet_in_use = in_use(change.value.as_ref());
                ctx.write(CharacteristicType::OutletInUse, outlet_in_use);
                tracing::debug!(property = %change.property, outlet_in_use, "outlet usage changed");
            });
        }
        Ok(())
    }

    fn handle_set(
        &self,
        characteristic: CharacteristicType,
        value: CharacteristicValue,
    ) -> Result<(), ShellyEveError> {
        if characteristic != CharacteristicType::On {
            return Err(ValidationError::ReadOnly { characteristic }.into());
        }
        let Some(on) = value.as_bool() else {
            return Err(ValidationError::TypeMismatch {
                characteristic,
                found: value.kind(),
            }
            .into());
        };
        let device = self
            .core
            .device()
            .ok_or(LifecycleError::NotAttached { ability: self.name() })?;

        if relay_state(device.property(&self.relay_property).as_ref()) == on {
            tracing::debug!(property = %self.relay_property, on, "relay already in requested state");
            return Ok(());
        }

        tracing::info!(property = %self.relay_property, on, "switching relay");
        (self.set_power_state)(on).inspect_err(|err| {
            tracing::error!(property = %self.relay_property, on, %err, "failed to switch relay");
        })
    }
}
