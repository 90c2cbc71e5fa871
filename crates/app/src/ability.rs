//! Ability: a reusable unit of behavior binding device properties to the
//! characteristics of one service.
//!
//! ## Lifecycle
//!
//! ```text
//! new ──attach──▶ attached ──detach──▶ retired
//!  │                 │
//!  └──detach (no-op) └──attach ✗ AlreadyAttached
//! ```
//!
//! [`Ability::attach`] builds the service through the
//! [`create_service`](Ability::create_service) hook and installs change
//! listeners through the [`setup_event_handlers`](Ability::setup_event_handlers)
//! hook. Every listener installed there is recorded in the ability's
//! [`AbilityCore`]; [`Ability::detach`] removes exactly those. The recorded
//! subscriptions are also released when setup fails half-way and when the
//! ability is dropped, so no path leaves a listener behind on the device.

use std::cell::RefCell;
use std::rc::Rc;

use shellyeve_domain::characteristic::{CharacteristicType, CharacteristicValue};
use shellyeve_domain::error::{LifecycleError, ShellyEveError, ValidationError};
use shellyeve_domain::event::{PropertyChange, change_event};
use shellyeve_domain::id::{AccessoryId, ListenerId};
use shellyeve_domain::service::Service;
use tracing::Span;

use crate::ports::{Device, Listener};

/// Service shared between the ability that writes it and the host that reads it.
pub type SharedService = Rc<RefCell<Service>>;

/// Owning context an ability is attached under.
///
/// The span is the log handle: every record an ability emits, including
/// those from change handlers, is emitted inside it.
#[derive(Debug, Clone)]
pub struct AttachContext {
    pub accessory_id: AccessoryId,
    pub accessory_name: String,
    pub span: Span,
}

impl AttachContext {
    /// Create a context with a fresh `accessory` span.
    #[must_use]
    pub fn new(accessory_id: AccessoryId, accessory_name: impl Into<String>) -> Self {
        let accessory_name = accessory_name.into();
        let span = tracing::info_span!("accessory", id = %accessory_id, name = %accessory_name);
        Self {
            accessory_id,
            accessory_name,
            span,
        }
    }
}

/// What a change handler gets to work with.
pub struct HandlerContext<'a> {
    pub service: &'a mut Service,
    pub device: &'a dyn Device,
}

impl HandlerContext<'_> {
    /// Write a characteristic if the service exposes it.
    ///
    /// Rejected writes are logged, not propagated: there is no caller to
    /// return them to inside a notification.
    pub fn write(&mut self, characteristic: CharacteristicType, value: impl Into<CharacteristicValue>) {
        if let Err(err) = self.service.update(characteristic, value) {
            tracing::warn!(%err, %characteristic, "rejected characteristic write");
        }
    }
}

/// A listener installed on a device, identified by event name and handle.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Subscription {
    event: String,
    id: ListenerId,
}

/// Registrar handed to [`Ability::setup_event_handlers`].
pub struct EventHandlers<'a> {
    device: &'a Rc<dyn Device>,
    service: &'a SharedService,
    span: &'a Span,
    subscriptions: Vec<Subscription>,
}

impl<'a> EventHandlers<'a> {
    fn new(device: &'a Rc<dyn Device>, service: &'a SharedService, span: &'a Span) -> Self {
        Self {
            device,
            service,
            span,
            subscriptions: Vec::new(),
        }
    }

    /// Device the ability is being attached to.
    #[must_use]
    pub fn device(&self) -> &dyn Device {
        self.device.as_ref()
    }

    /// Subscribe `handler` to changes of `property`.
    ///
    /// The installed listener keeps only a weak reference to the device and
    /// becomes inert once the device is gone.
    pub fn on<F>(&mut self, property: &str, handler: F)
    where
        F: Fn(&mut HandlerContext<'_>, &PropertyChange) + 'static,
    {
        let event = change_event(property);
        let service = Rc::clone(self.service);
        let device = Rc::downgrade(self.device);
        let span = self.span.clone();

        let listener: Listener = Rc::new(move |change: &PropertyChange| {
            let _entered = span.enter();
            let Some(device) = device.upgrade() else {
                return;
            };
            let Ok(mut service) = service.try_borrow_mut() else {
                tracing::warn!(property = %change.property, "service busy, dropping re-entrant change");
                return;
            };
            handler(
                &mut HandlerContext {
                    service: &mut *service,
                    device: device.as_ref(),
                },
                change,
            );
        });

        let id = self.device.on(&event, listener);
        tracing::debug!(%event, listener = %id, "subscribed");
        self.subscriptions.push(Subscription { event, id });
    }

    fn into_subscriptions(self) -> Vec<Subscription> {
        self.subscriptions
    }
}

/// Everything an attached ability holds on to.
struct Attachment {
    device: Rc<dyn Device>,
    service: SharedService,
    subscriptions: Vec<Subscription>,
    span: Span,
}

impl Attachment {
    /// Remove every recorded listener. Safe to call more than once.
    fn release(&mut self) -> usize {
        let _entered = self.span.enter();
        let mut removed = 0;
        for subscription in self.subscriptions.drain(..) {
            if self.device.remove_listener(&subscription.event, subscription.id) {
                removed += 1;
            } else {
                tracing::debug!(event = %subscription.event, "listener was already removed");
            }
        }
        removed
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        self.release();
    }
}

#[derive(Default)]
enum State {
    #[default]
    New,
    Attached(Attachment),
    Retired,
}

/// Lifecycle state shared by every ability implementation.
#[derive(Default)]
pub struct AbilityCore {
    state: State,
}

impl AbilityCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        matches!(self.state, State::Attached(_))
    }

    /// Service built on attach.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotAttached`] before attach and after detach.
    pub fn service(&self, ability: &'static str) -> Result<SharedService, LifecycleError> {
        match &self.state {
            State::Attached(attachment) => Ok(Rc::clone(&attachment.service)),
            State::New | State::Retired => Err(LifecycleError::NotAttached { ability }),
        }
    }

    /// Device the ability is attached to, if any.
    #[must_use]
    pub fn device(&self) -> Option<&Rc<dyn Device>> {
        match &self.state {
            State::Attached(attachment) => Some(&attachment.device),
            State::New | State::Retired => None,
        }
    }

    /// Number of listeners currently installed on the device.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        match &self.state {
            State::Attached(attachment) => attachment.subscriptions.len(),
            State::New | State::Retired => 0,
        }
    }

    fn ensure_attachable(&self, ability: &'static str) -> Result<(), LifecycleError> {
        match self.state {
            State::New => Ok(()),
            State::Attached(_) => Err(LifecycleError::AlreadyAttached { ability }),
            State::Retired => Err(LifecycleError::Retired { ability }),
        }
    }

    fn bind(&mut self, attachment: Attachment) {
        self.state = State::Attached(attachment);
    }

    /// Release all listeners; a no-op unless attached.
    fn detach(&mut self, ability: &'static str) {
        match std::mem::take(&mut self.state) {
            State::Attached(mut attachment) => {
                let removed = attachment.release();
                let _entered = attachment.span.enter();
                tracing::info!(ability, removed, "detached");
                self.state = State::Retired;
            }
            // A never-attached ability stays attachable.
            previous => self.state = previous,
        }
    }
}

/// A unit of behavior mirroring device properties onto one service.
///
/// Implementors provide the two hooks and access to their [`AbilityCore`];
/// the lifecycle methods have default implementations that must not be
/// overridden casually, since they carry the subscription bookkeeping.
pub trait Ability {
    /// Short name used in logs and errors (e.g. `"power-meter"`).
    fn name(&self) -> &'static str;

    fn core(&self) -> &AbilityCore;

    fn core_mut(&mut self) -> &mut AbilityCore;

    /// Build the service, baking in values derived from the current device
    /// state.
    ///
    /// # Errors
    ///
    /// Returns an error when the device lacks a required property.
    fn create_service(&self, device: &dyn Device) -> Result<Service, ShellyEveError>;

    /// Install change listeners through `handlers`.
    ///
    /// # Errors
    ///
    /// Any error aborts the attach; listeners installed so far are removed.
    fn setup_event_handlers(&self, handlers: &mut EventHandlers<'_>) -> Result<(), ShellyEveError>;

    /// Handle a host write to one of the service's characteristics.
    ///
    /// # Errors
    ///
    /// The default rejects every write with [`ValidationError::ReadOnly`].
    fn handle_set(
        &self,
        characteristic: CharacteristicType,
        _value: CharacteristicValue,
    ) -> Result<(), ShellyEveError> {
        Err(ValidationError::ReadOnly { characteristic }.into())
    }

    /// The service built on attach.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotAttached`] before attach and after detach.
    fn service(&self) -> Result<SharedService, ShellyEveError> {
        Ok(self.core().service(self.name())?)
    }

    fn is_attached(&self) -> bool {
        self.core().is_attached()
    }

    /// Bind to `device`: build the service and subscribe the handlers.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyAttached`] on a second attach,
    /// [`LifecycleError::Retired`] after detach, or whatever the hooks
    /// return. On error nothing stays subscribed.
    fn attach(&mut self, device: Rc<dyn Device>, context: &AttachContext) -> Result<(), ShellyEveError> {
        let name = self.name();
        self.core().ensure_attachable(name)?;

        let span = context.span.clone();
        let _entered = span.enter();

        let service = Rc::new(RefCell::new(self.create_service(device.as_ref())?));
        let mut handlers = EventHandlers::new(&device, &service, &span);
        let result = self.setup_event_handlers(&mut handlers);
        let subscriptions = handlers.into_subscriptions();

        let attachment = Attachment {
            device: Rc::clone(&device),
            service,
            subscriptions,
            span: span.clone(),
        };
        if let Err(err) = result {
            tracing::warn!(ability = name, %err, "event handler setup failed, rolling back");
            drop(attachment);
            return Err(err);
        }

        tracing::info!(
            ability = name,
            device = %device.info(),
            subscriptions = attachment.subscriptions.len(),
            "attached"
        );
        self.core_mut().bind(attachment);
        Ok(())
    }

    /// Remove every listener installed on attach and release the service.
    ///
    /// Never fails: detaching an ability that is not attached does nothing.
    fn detach(&mut self) {
        let name = self.name();
        self.core_mut().detach(name);
    }
}
