//! Per-tick simulation driver and listener dispatch.
//!
//! The simulation runs at a fixed tick rate and processes all gameplay
//! logic deterministically. Each tick it snapshots every live entity,
//! runs every entity's listed actions in sorted id order, reports action
//! lifecycle transitions to listeners, sweeps destroyed entities out of
//! the registry, and finally routes the tick's damage to target hulls.
//!
//! # Determinism
//!
//! All operations in this module are fully deterministic:
//! - No floating-point math (uses fixed-point via [`Fixed`])
//! - No system randomness
//! - Consistent iteration order (sorted entity ids)
//! - Same inputs always produce same outputs

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::action::{TargetInfo, TargetLookup};
use crate::combat::HitRequest;
use crate::data::{ActionId, EntityId, EntityType, PlayerId};
use crate::entity::Entity;
use crate::error::{Result, SimError};
use crate::math::Fixed;
use crate::registry::EntityRegistry;

/// Ticks per second for the simulation.
pub const TICK_RATE: u32 = 20;

/// Duration of one tick in milliseconds.
pub const TICK_DURATION_MS: u32 = 1000 / TICK_RATE;

/// Receives action lifecycle transitions for non-passive actions.
///
/// `execute` fires every tick an action runs; `complete` fires once on
/// the tick it leaves the running list. Passive actions are internal
/// machinery and are never reported.
pub trait ActionListener {
    /// An action ran this tick.
    fn execute(&mut self, entity: EntityId, owner: PlayerId, action: ActionId);

    /// An action finished this tick.
    fn complete(&mut self, entity: EntityId, owner: PlayerId, action: ActionId);
}

/// Receives destruction events during the post-tick sweep.
pub trait DestructionListener {
    /// An entity was destroyed and removed from the registry.
    fn entity_destroyed(&mut self, entity: EntityId, owner: PlayerId, kind: EntityType);
}

/// Handle identifying a registered action listener for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Events that occurred during a single tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickEvents {
    /// Damage routed to target hulls at the end of the tick.
    pub hits: Vec<HitRequest>,
    /// Entities destroyed and removed this tick.
    pub destroyed: Vec<EntityId>,
}

/// The core simulation: tick counter, entity registry, and listeners.
///
/// Listener registrations are runtime wiring, not simulation state; they
/// are excluded from snapshots and must be re-registered after
/// [`Simulation::deserialize`].
pub struct Simulation {
    tick: u64,
    registry: EntityRegistry,
    action_listeners: Vec<(ListenerId, Box<dyn ActionListener>)>,
    listeners_to_remove: Vec<ListenerId>,
    next_listener: u64,
    destruction_listeners: Vec<Box<dyn DestructionListener>>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    tick: u64,
    registry: &'a EntityRegistry,
}

#[derive(Deserialize)]
struct Snapshot {
    tick: u64,
    registry: EntityRegistry,
}

struct EntityTickReport {
    entity: EntityId,
    owner: PlayerId,
    kind: EntityType,
    executed: Vec<ActionId>,
    completed: Vec<ActionId>,
    destroyed: bool,
}

impl Simulation {
    /// Create a simulation around a world sentinel entity.
    #[must_use]
    pub fn new(world: Entity) -> Self {
        Self {
            tick: 0,
            registry: EntityRegistry::new(world),
            action_listeners: Vec::new(),
            listeners_to_remove: Vec::new(),
            next_listener: 0,
            destruction_listeners: Vec::new(),
        }
    }

    /// Number of completed ticks.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Seconds advanced per tick.
    #[must_use]
    pub fn tick_dt() -> Fixed {
        Fixed::from_num(1) / Fixed::from_num(TICK_RATE)
    }

    /// The entity registry.
    #[must_use]
    pub const fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// The entity registry, mutable.
    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    /// Register an action listener; the handle removes it later.
    pub fn add_listener(&mut self, listener: Box<dyn ActionListener>) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.action_listeners.push((id, listener));
        id
    }

    /// Schedule a listener for removal.
    ///
    /// The removal takes effect at the start of the next tick, so a
    /// listener may safely request its own removal while being notified.
    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners_to_remove.push(id);
    }

    /// Register a destruction listener.
    pub fn add_destruction_listener(&mut self, listener: Box<dyn DestructionListener>) {
        self.destruction_listeners.push(listener);
    }

    /// Advance the simulation by one tick.
    ///
    /// Damage produced by weapons this tick is queued on target hulls at
    /// the end of the tick and applied by their hull action on the next
    /// one, so the outcome never depends on entity iteration order.
    pub fn tick(&mut self) -> TickEvents {
        let dt = Self::tick_dt();
        let mut events = TickEvents::default();

        self.drain_listener_removals();

        let targets = self.snapshot_targets();
        let mut hits: Vec<HitRequest> = Vec::new();
        let mut reports: Vec<EntityTickReport> = Vec::new();

        for id in self.registry.sorted_ids() {
            let Some(entity) = self.registry.get_mut(id) else {
                continue;
            };
            entity.do_actions(dt, &targets, &mut hits);
            reports.push(EntityTickReport {
                entity: id,
                owner: entity.owner(),
                kind: entity.kind(),
                executed: entity.notifiable_running(),
                completed: entity.notifiable_completed(),
                destroyed: entity.is_destroyed(),
            });
        }

        for report in &reports {
            for &action in &report.executed {
                for (_, listener) in &mut self.action_listeners {
                    listener.execute(report.entity, report.owner, action);
                }
            }
            for &action in &report.completed {
                for (_, listener) in &mut self.action_listeners {
                    listener.complete(report.entity, report.owner, action);
                }
            }
        }

        for report in &reports {
            if !report.destroyed {
                continue;
            }
            if let Some(mut entity) = self.registry.remove(report.entity) {
                entity.delete();
                for listener in &mut self.destruction_listeners {
                    listener.entity_destroyed(report.entity, report.owner, report.kind);
                }
                events.destroyed.push(report.entity);
            }
        }

        for hit in hits {
            // Hits against removed entities land on the inert world hull.
            self.registry.find_by_id_mut(hit.target).hit(hit.result);
            events.hits.push(hit);
        }

        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "simulation state hash");
        }

        events
    }

    fn drain_listener_removals(&mut self) {
        if self.listeners_to_remove.is_empty() {
            return;
        }
        let removals = std::mem::take(&mut self.listeners_to_remove);
        self.action_listeners
            .retain(|(id, _)| !removals.contains(id));
    }

    fn snapshot_targets(&self) -> TargetLookup {
        let mut targets = TargetLookup::new();
        for id in self.registry.sorted_ids() {
            if let Some(entity) = self.registry.get(id) {
                targets.insert(
                    id,
                    TargetInfo {
                        position: entity.position(),
                        owner: entity.owner(),
                        alive: !entity.is_destroyed() && !entity.is_zero_hp(),
                    },
                );
            }
        }
        targets
    }

    /// Calculate a hash of the current simulation state.
    ///
    /// Used for desync detection. Two simulations with identical state
    /// produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);

        let ids = self.registry.sorted_ids();
        ids.len().hash(&mut hasher);

        for id in ids {
            if let Some(entity) = self.registry.get(id) {
                id.hash(&mut hasher);
                entity.owner().hash(&mut hasher);

                let state = entity.state();
                state.position.x.to_bits().hash(&mut hasher);
                state.position.y.to_bits().hash(&mut hasher);
                state.position.z.to_bits().hash(&mut hasher);
                state.hp.current().hash(&mut hasher);
                state.hp.max().hash(&mut hasher);
                state.energy.current().hash(&mut hasher);
                state.energy.max().hash(&mut hasher);
                state.target.hash(&mut hasher);

                entity.running().hash(&mut hasher);
                entity.completed().hash(&mut hasher);
            }
        }

        hasher.finish()
    }

    /// Serialize the simulation state for replay or persistence.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(&SnapshotRef {
            tick: self.tick,
            registry: &self.registry,
        })
        .map_err(|e| SimError::InvalidState(format!("failed to serialize simulation: {e}")))
    }

    /// Deserialize simulation state from bytes.
    ///
    /// Listeners are not part of the snapshot and start out empty.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let snapshot: Snapshot = bincode::deserialize(data)
            .map_err(|e| SimError::InvalidState(format!("failed to deserialize simulation: {e}")))?;
        Ok(Self {
            tick: snapshot.tick,
            registry: snapshot.registry,
            action_listeners: Vec::new(),
            listeners_to_remove: Vec::new(),
            next_listener: 0,
            destruction_listeners: Vec::new(),
        })
    }
}
