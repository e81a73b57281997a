//! Entities and their per-tick action loop.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::action::{TargetLookup, TickContext};
use crate::combat::{AttackHitResult, HitRequest};
use crate::data::{ActionId, EntityId, EntityType, PlayerId};
use crate::error::Result;
use crate::math::{Fixed, Vec3Fixed};
use crate::module::ModuleSet;
use crate::state::{BoundedValue, EntityState, DESTROYED};

/// Everything needed to materialize an entity.
///
/// `hp` and `energy` default to the module set maxima when absent, so
/// freshly built entities spawn at full strength while deserialized ones
/// keep their stored values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Entity type.
    pub kind: EntityType,
    /// Unique id.
    pub id: EntityId,
    /// Owning player.
    pub owner: PlayerId,
    /// Display name.
    pub name: String,
    /// Spawn position.
    pub position: Vec3Fixed,
    /// Initial facing, unit length.
    pub direction: Vec3Fixed,
    /// Starting hit points; `None` spawns at full.
    pub hp: Option<u32>,
    /// Starting energy; `None` spawns at full.
    pub energy: Option<u32>,
}

/// A construction order in progress on a builder entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConstructionStatus {
    kind: EntityType,
    slot: u32,
    #[serde(with = "crate::math::fixed_serde")]
    time_left: Fixed,
}

impl EntityConstructionStatus {
    /// Start building `kind` in a build slot, completing after `build_time`
    /// seconds.
    #[must_use]
    pub fn new(kind: EntityType, slot: u32, build_time: Fixed) -> Self {
        Self {
            kind,
            slot,
            time_left: build_time,
        }
    }

    /// Type under construction.
    #[must_use]
    pub const fn kind(&self) -> EntityType {
        self.kind
    }

    /// Build slot occupied on the builder.
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Remaining build time in seconds.
    #[must_use]
    pub const fn time_left(&self) -> Fixed {
        self.time_left
    }

    /// Advance construction by one tick.
    pub fn reduce_time(&mut self, dt: Fixed) {
        self.time_left = (self.time_left - dt).max(Fixed::ZERO);
    }

    /// True once construction has finished.
    #[must_use]
    pub fn is_elapsed(&self) -> bool {
        self.time_left == Fixed::ZERO
    }
}

/// A simulated entity: identity, mutable state, eight modules, and the
/// bookkeeping of which module actions are running this tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    owner: PlayerId,
    kind: EntityType,
    name: String,
    state: EntityState,
    modules: ModuleSet,
    running: Vec<ActionId>,
    completed: Vec<ActionId>,
    prepared: Option<ActionId>,
    visible: BTreeSet<EntityId>,
    seen_by: BTreeSet<PlayerId>,
}

impl Entity {
    /// Build an entity from a descriptor and its module set.
    ///
    /// Passive module actions (hull, energy generator) enter the running
    /// list immediately; they are driven by their prerequisites from the
    /// first tick on.
    #[must_use]
    pub fn new(descriptor: EntityDescriptor, modules: ModuleSet) -> Self {
        let hp = match descriptor.hp {
            Some(current) => BoundedValue::new(current, modules.max_hp()),
            None => BoundedValue::full(modules.max_hp()),
        };
        let energy = match descriptor.energy {
            Some(current) => BoundedValue::new(current, modules.max_energy()),
            None => BoundedValue::full(modules.max_energy()),
        };
        let state = EntityState::new(descriptor.position, descriptor.direction, hp, energy);

        let mut running = Vec::new();
        let group = modules.group();
        for id in group.all() {
            if modules
                .action(id)
                .is_ok_and(|a| a.is_passive())
            {
                running.push(id);
            }
        }

        Self {
            id: descriptor.id,
            owner: descriptor.owner,
            kind: descriptor.kind,
            name: descriptor.name,
            state,
            modules,
            running,
            completed: Vec::new(),
            prepared: None,
            visible: BTreeSet::new(),
            seen_by: BTreeSet::new(),
        }
    }

    /// Unique id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Owning player.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Change ownership. The registry keeps its owner index in sync.
    pub(crate) fn set_owner(&mut self, owner: PlayerId) {
        self.owner = owner;
    }

    /// Entity type.
    #[must_use]
    pub const fn kind(&self) -> EntityType {
        self.kind
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the entity.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Mutable simulation state.
    #[must_use]
    pub const fn state(&self) -> &EntityState {
        &self.state
    }

    /// Mutable simulation state, mutable.
    pub fn state_mut(&mut self) -> &mut EntityState {
        &mut self.state
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec3Fixed {
        self.state.position
    }

    /// The module set.
    #[must_use]
    pub const fn modules(&self) -> &ModuleSet {
        &self.modules
    }

    /// The module set, mutable.
    pub fn modules_mut(&mut self) -> &mut ModuleSet {
        &mut self.modules
    }

    /// Ids of actions currently in the running list.
    #[must_use]
    pub fn running(&self) -> &[ActionId] {
        &self.running
    }

    /// Ids of actions that completed on the last tick.
    #[must_use]
    pub fn completed(&self) -> &[ActionId] {
        &self.completed
    }

    /// Running actions worth reporting to listeners: passives excluded.
    #[must_use]
    pub fn notifiable_running(&self) -> Vec<ActionId> {
        self.running
            .iter()
            .copied()
            .filter(|&id| self.modules.action(id).is_ok_and(|a| !a.is_passive()))
            .collect()
    }

    /// Completed actions worth reporting to listeners: passives excluded.
    #[must_use]
    pub fn notifiable_completed(&self) -> Vec<ActionId> {
        self.completed
            .iter()
            .copied()
            .filter(|&id| self.modules.action(id).is_ok_and(|a| !a.is_passive()))
            .collect()
    }

    /// Run every listed action for one tick.
    ///
    /// Completed ids from the previous tick are dropped first. A non-passive
    /// action leaves the running list the tick its `run` returns false; a
    /// passive action stays listed and is re-checked every tick.
    pub fn do_actions(&mut self, dt: Fixed, targets: &TargetLookup, hits: &mut Vec<HitRequest>) {
        self.completed.clear();

        let ids: Vec<ActionId> = self.running.clone();
        let mut retired = Vec::new();
        for id in ids {
            let Ok(action) = self.modules.action_mut(id) else {
                retired.push(id);
                continue;
            };
            let mut ctx = TickContext {
                targets,
                hits: &mut *hits,
            };
            let keep = action.run(dt, &mut self.state, &mut ctx);
            if !keep && !action.is_passive() {
                retired.push(id);
            }
        }

        for id in retired {
            self.running.retain(|&r| r != id);
            self.completed.push(id);
        }
    }

    /// Arm an action by id and add it to the running list.
    ///
    /// Starting an action that is already listed re-initializes it without
    /// duplicating the entry, so one role never runs twice.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownAction`](crate::error::SimError::UnknownAction)
    /// if no module carries the id.
    pub fn start_action(&mut self, id: ActionId) -> Result<()> {
        let action = self.modules.action_mut(id)?;
        action.init(&mut self.state);
        if !self.running.contains(&id) {
            self.running.push(id);
        }
        Ok(())
    }

    /// Stop an action by id and drop it from the running list.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownAction`](crate::error::SimError::UnknownAction)
    /// if no module carries the id.
    pub fn stop_action(&mut self, id: ActionId) -> Result<()> {
        let action = self.modules.action_mut(id)?;
        action.stop(&mut self.state);
        if !action.is_passive() {
            self.running.retain(|&r| r != id);
        }
        Ok(())
    }

    /// Order the entity to move to a destination with its move engine.
    ///
    /// # Errors
    ///
    /// Propagates the module lookup error if the move engine id is stale.
    pub fn move_to(&mut self, destination: Vec3Fixed) -> Result<()> {
        self.state.destination = Some(destination);
        self.start_action(self.modules.move_engine().id())
    }

    /// Order the entity to attack a target with its base weapon.
    ///
    /// # Errors
    ///
    /// Propagates the module lookup error if the weapon id is stale.
    pub fn attack(&mut self, target: EntityId) -> Result<()> {
        self.state.target = Some(target);
        self.start_action(self.modules.weapon().id())
    }

    /// Queue incoming damage on the hull.
    pub fn hit(&mut self, result: AttackHitResult) {
        self.modules.hull_mut().action_mut().add_hit_result(result);
    }

    /// Remember an action to start later with [`start_prepared_action`].
    ///
    /// [`start_prepared_action`]: Self::start_prepared_action
    pub fn prepare_action(&mut self, id: ActionId) {
        self.prepared = Some(id);
    }

    /// The prepared action id, defaulting to the move engine.
    #[must_use]
    pub fn prepared_action(&self) -> ActionId {
        self.prepared.unwrap_or_else(|| self.modules.move_engine().id())
    }

    /// Start the prepared action and clear the preparation.
    ///
    /// # Errors
    ///
    /// Propagates the module lookup error for a stale prepared id.
    pub fn start_prepared_action(&mut self) -> Result<()> {
        let id = self.prepared_action();
        self.prepared = None;
        self.start_action(id)
    }

    /// Current target, if any.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.state.target
    }

    /// Set the target used by follow and attack actions.
    pub fn set_target(&mut self, target: EntityId) {
        self.state.target = Some(target);
    }

    /// Current destination, if any.
    #[must_use]
    pub const fn destination(&self) -> Option<Vec3Fixed> {
        self.state.destination
    }

    /// Set the destination used by move and zone actions.
    pub fn set_destination(&mut self, destination: Vec3Fixed) {
        self.state.destination = Some(destination);
    }

    /// Record that this entity sees `other`.
    ///
    /// Returns `true` only on the first sighting; repeated collisions with
    /// an already-visible entity report `false`.
    pub fn see(&mut self, other: EntityId) -> bool {
        self.visible.insert(other)
    }

    /// Record that this entity no longer sees `other`.
    pub fn no_longer_see(&mut self, other: EntityId) {
        self.visible.remove(&other);
    }

    /// True if `other` is in this entity's visible set.
    #[must_use]
    pub fn is_seeing(&self, other: EntityId) -> bool {
        self.visible.contains(&other)
    }

    /// Entities currently visible, in id order.
    #[must_use]
    pub fn visible(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.visible.iter().copied()
    }

    /// Record that `player` has seen this entity at least once.
    pub fn add_seer(&mut self, player: PlayerId) {
        self.seen_by.insert(player);
    }

    /// True if `player` has ever seen this entity.
    #[must_use]
    pub fn is_seen_by(&self, player: PlayerId) -> bool {
        self.seen_by.contains(&player)
    }

    /// True while hit points are zero.
    #[must_use]
    pub fn is_zero_hp(&self) -> bool {
        self.state.hp.is_zero()
    }

    /// True once the hull has tagged the entity destroyed.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.state.states.has(DESTROYED)
    }

    /// True if both entities belong to the same player.
    #[must_use]
    pub fn has_same_owner_as(&self, other: &Entity) -> bool {
        self.owner == other.owner
    }

    /// Tear the entity down: stop every module, drop queued hits and
    /// visibility. Safe to call more than once.
    pub fn delete(&mut self) {
        self.modules.delete();
        self.running.clear();
        self.completed.clear();
        self.prepared = None;
        self.visible.clear();
        self.state.states.add(DESTROYED);
    }
}
