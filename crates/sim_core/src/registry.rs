//! Entity registry with a world sentinel fallback.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{EntityId, EntityType, PlayerId};
use crate::entity::Entity;
use crate::error::{Result, SimError};

/// Owns every live entity, indexed by id and by owning player.
///
/// Lookups for ids that are absent (never added, or already removed) fall
/// back to the world sentinel instead of failing, so callers holding a
/// stale id get a harmless inert entity rather than an error path in the
/// middle of a tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRegistry {
    entities: HashMap<EntityId, Entity>,
    by_owner: HashMap<PlayerId, BTreeSet<EntityId>>,
    world: Entity,
}

impl EntityRegistry {
    /// Create a registry around its world sentinel.
    ///
    /// The sentinel is injected rather than built here so the caller
    /// controls its module ids; it is never listed among the live entities.
    #[must_use]
    pub fn new(world: Entity) -> Self {
        Self {
            entities: HashMap::new(),
            by_owner: HashMap::new(),
            world,
        }
    }

    /// Add an entity, replacing any previous entity with the same id.
    pub fn add(&mut self, entity: Entity) {
        let id = entity.id();
        let owner = entity.owner();
        debug!(id = id.0, owner = owner.0, "entity added");
        if let Some(previous) = self.entities.insert(id, entity) {
            if let Some(ids) = self.by_owner.get_mut(&previous.owner()) {
                ids.remove(&previous.id());
            }
        }
        self.by_owner.entry(owner).or_default().insert(id);
    }

    /// Remove an entity, returning it if it was present.
    ///
    /// # Panics
    ///
    /// Panics if the owner index has lost track of the entity; the two
    /// maps are only ever mutated together, so a mismatch is a bug.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        let indexed = self
            .by_owner
            .get_mut(&entity.owner())
            .is_some_and(|ids| ids.remove(&id));
        assert!(indexed, "owner index out of sync for entity {id:?}");
        debug!(id = id.0, "entity removed");
        Some(entity)
    }

    /// Find an entity by id, falling back to the world sentinel.
    #[must_use]
    pub fn find_by_id(&self, id: EntityId) -> &Entity {
        self.entities.get(&id).unwrap_or(&self.world)
    }

    /// Find an entity by id mutably, falling back to the world sentinel.
    pub fn find_by_id_mut(&mut self, id: EntityId) -> &mut Entity {
        self.entities.get_mut(&id).unwrap_or(&mut self.world)
    }

    /// Get an entity by id without the world fallback.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get an entity mutably by id without the world fallback.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// True if a live entity (not the sentinel) has this id.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Transfer an entity to a new owner, keeping the owner index in sync.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EntityNotFound`] if no live entity has the id;
    /// ownership of the world sentinel cannot change.
    pub fn set_owner(&mut self, id: EntityId, owner: PlayerId) -> Result<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(SimError::EntityNotFound(id))?;
        let previous = entity.owner();
        if previous == owner {
            return Ok(());
        }
        entity.set_owner(owner);
        if let Some(ids) = self.by_owner.get_mut(&previous) {
            ids.remove(&id);
        }
        self.by_owner.entry(owner).or_default().insert(id);
        debug!(id = id.0, from = previous.0, to = owner.0, "owner changed");
        Ok(())
    }

    /// Ids of every entity owned by a player, in id order.
    #[must_use]
    pub fn entities_of(&self, owner: PlayerId) -> Vec<EntityId> {
        self.by_owner
            .get(&owner)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of entities of one type owned by a player.
    #[must_use]
    pub fn count_of(&self, owner: PlayerId, kind: EntityType) -> usize {
        self.entities
            .values()
            .filter(|e| e.owner() == owner && e.kind() == kind)
            .count()
    }

    /// All live entity ids in ascending order, for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of live entities. The world sentinel is not counted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True if no live entity is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The world sentinel.
    #[must_use]
    pub const fn world(&self) -> &Entity {
        &self.world
    }

    /// The world sentinel, mutable.
    pub fn world_mut(&mut self) -> &mut Entity {
        &mut self.world
    }
}
