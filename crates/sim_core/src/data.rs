//! Identifier newtypes and the entity type registry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Unique identifier for entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Id of the world sentinel entity.
    pub const WORLD: Self = Self(0);
}

/// Identifier for a player owning entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// Owner of the world sentinel entity.
    pub const WORLD: Self = Self(0);
}

/// Identifier for a module role and its bound action.
///
/// The id names the capability ("this weapon", "this move engine"), not an
/// action instance: an entity runs at most one action per id at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionId(pub u32);

/// Category of an entity (ship class, building kind, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityType(pub u32);

impl EntityType {
    /// Type of the world sentinel entity.
    pub const WORLD: Self = Self(0);
}

/// Explicit registry of entity types, constructed once at startup and passed
/// by reference where needed.
///
/// Duplicate registration is reported as an error rather than asserted, so
/// the registry is testable without process-wide state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityTypeRegistry {
    types: HashMap<EntityType, String>,
}

impl EntityTypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type with its display name.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DuplicateEntityType`] if the type is already known.
    pub fn register(&mut self, kind: EntityType, name: impl Into<String>) -> Result<()> {
        if self.types.contains_key(&kind) {
            return Err(SimError::DuplicateEntityType(kind));
        }
        self.types.insert(kind, name.into());
        Ok(())
    }

    /// Get the display name of a registered type.
    #[must_use]
    pub fn name(&self, kind: EntityType) -> Option<&str> {
        self.types.get(&kind).map(String::as_str)
    }

    /// Check if a type is registered.
    #[must_use]
    pub fn contains(&self, kind: EntityType) -> bool {
        self.types.contains_key(&kind)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
