//! # shellyeve-domain
//!
//! Pure domain model for bridging Shelly relays and power meters into a
//! home-automation host.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers and error conventions
//! - Define **device properties** and the change notifications devices raise
//! - Define **characteristics** (bounded value slots) and **services**
//!   (bundles of characteristics) together with their declared ranges
//! - Define accessory **categories**
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod category;
pub mod characteristic;
pub mod device;
pub mod event;
pub mod property;
pub mod service;
