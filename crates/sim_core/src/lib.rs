//! # Sim Core
//!
//! Deterministic entity/action simulation core for the gameplay layer.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! Game objects ("entities") are composed of eight capability modules
//! (hull, energy generator, detector, weapon, move engine, plus three
//! generic slots). Each module binds one action instance; actions share a
//! common init/run/stop state machine and advance once per simulation tick.
//!
//! ## Crate Structure
//!
//! - [`action`] - Action state machine and per-tick context
//! - [`motion`] - Move and follow behaviors
//! - [`combat`] - Attack behaviors and hit routing
//! - [`hull`] / [`energy`] - Passive protection and energy production
//! - [`module`] - Capability slots and module sets
//! - [`entity`] - Entity state and per-tick action execution
//! - [`registry`] - Canonical entity table with world-sentinel lookup
//! - [`simulation`] - Per-frame driver and listener dispatch
//! - [`los`] - Line-of-sight event translation
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action;
pub mod combat;
pub mod data;
pub mod energy;
pub mod entity;
pub mod error;
pub mod hull;
pub mod los;
pub mod math;
pub mod module;
pub mod motion;
pub mod registry;
pub mod simulation;
pub mod state;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::{Action, ActionKind, TargetInfo, TargetLookup, TickContext};
    pub use crate::combat::{AttackDamage, AttackHitResult, AttackRange, HitRequest};
    pub use crate::data::{ActionId, EntityId, EntityType, EntityTypeRegistry, PlayerId};
    pub use crate::entity::{Entity, EntityDescriptor};
    pub use crate::error::{Result, SimError};
    pub use crate::los::{CollisionPair, LosListener, LosManager};
    pub use crate::math::{Fixed, Vec3Fixed};
    pub use crate::module::{Module, ModuleCaps, ModuleGroup, ModuleSet, ModuleSlot};
    pub use crate::registry::EntityRegistry;
    pub use crate::simulation::{
        ActionListener, DestructionListener, ListenerId, Simulation, TickEvents, TICK_RATE,
    };
    pub use crate::state::{BoundedValue, EntityState, StateSet};
}
