//! Action state machine.
//!
//! An entity can run at most one action per module role at a time. An
//! action moves through states defined by the combination of two flags:
//!
//! - Armed (`init()`): `to_run` is true, `running` is false.
//! - Running (`run(dt)`): `to_run` is true, `running` is true.
//! - Stopped (`stop()`): `to_run` is false, `running` is false.
//!
//! A passive action bypasses the `to_run` gate entirely: it runs whenever
//! its prerequisite holds, ignores `stop()` for future runs, and is never
//! reported to lifecycle listeners.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::combat::{AttackAction, AttackZoneAction, HitRequest};
use crate::data::{ActionId, EntityId, PlayerId};
use crate::energy::ProduceEnergyAction;
use crate::hull::ProtectAction;
use crate::math::{Fixed, Vec3Fixed};
use crate::motion::{FollowAction, MoveAction};
use crate::state::EntityState;

/// Per-entity snapshot used by actions to observe other entities.
///
/// Built by the driver at the start of each tick; actions never touch
/// other entities directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetInfo {
    /// Position of the entity at the start of the tick.
    pub position: Vec3Fixed,
    /// Owner of the entity.
    pub owner: PlayerId,
    /// Whether the entity is alive (non-zero hp, not destroyed).
    pub alive: bool,
}

/// Read-only lookup of all live entities for one tick.
///
/// Doubles as the target retrieval strategy for area attacks via
/// [`TargetLookup::within`].
#[derive(Debug, Clone, Default)]
pub struct TargetLookup {
    targets: HashMap<EntityId, TargetInfo>,
}

impl TargetLookup {
    /// Create an empty lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entity snapshot.
    pub fn insert(&mut self, id: EntityId, info: TargetInfo) {
        self.targets.insert(id, info);
    }

    /// Get the snapshot for an entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&TargetInfo> {
        self.targets.get(&id)
    }

    /// Check if an entity is alive this tick.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.targets.get(&id).is_some_and(|t| t.alive)
    }

    /// Position of an entity, if known.
    #[must_use]
    pub fn position_of(&self, id: EntityId) -> Option<Vec3Fixed> {
        self.targets.get(&id).map(|t| t.position)
    }

    /// All live entities within `radius` of `center`, in id order.
    #[must_use]
    pub fn within(&self, center: Vec3Fixed, radius: Fixed) -> Vec<EntityId> {
        let radius_sq = radius * radius;
        let mut found: Vec<EntityId> = self
            .targets
            .iter()
            .filter(|(_, info)| info.alive && info.position.distance_squared(center) <= radius_sq)
            .map(|(id, _)| *id)
            .collect();
        found.sort_unstable();
        found
    }
}

/// Per-tick context handed to running actions.
pub struct TickContext<'a> {
    /// Snapshot of all entities at the start of the tick.
    pub targets: &'a TargetLookup,
    /// Outbox for cross-entity damage; the driver routes requests to the
    /// target's hull after the entity sweep.
    pub hits: &'a mut Vec<HitRequest>,
}

/// Behavior of an action, dispatched by kind.
///
/// A single tagged union replaces the original inheritance chain while
/// keeping the shared init/run/stop contract in [`Action`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Advance toward the entity destination.
    Move(MoveAction),
    /// Keep moving toward a target's current position.
    Follow(FollowAction),
    /// Pursue and fire at a target entity.
    Attack(AttackAction),
    /// Fire at every entity within a radius of a position.
    AttackZone(AttackZoneAction),
    /// Replenish energy while below maximum.
    ProduceEnergy(ProduceEnergyAction),
    /// Apply queued hits, detect destruction, regenerate hull.
    Protect(ProtectAction),
    /// Null-object hull: ignores hits, never destroyed.
    ProtectInvincible,
    /// Inert placeholder for empty slots; never runs.
    Idle,
}

impl ActionKind {
    fn check_prerequisite(&self, state: &EntityState, targets: &TargetLookup) -> bool {
        match self {
            ActionKind::Move(m) => m.check_prerequisite(state),
            ActionKind::Follow(f) => f.check_prerequisite(state, targets),
            ActionKind::Attack(a) => a.check_prerequisite(state, targets),
            ActionKind::AttackZone(z) => z.check_prerequisite(state),
            ActionKind::ProduceEnergy(p) => p.check_prerequisite(state),
            ActionKind::Protect(_) | ActionKind::ProtectInvincible => true,
            ActionKind::Idle => false,
        }
    }

    fn setup(&mut self, state: &mut EntityState) {
        match self {
            ActionKind::Move(m) => m.setup(),
            ActionKind::Follow(f) => f.setup(),
            ActionKind::Attack(a) => a.setup(),
            ActionKind::AttackZone(z) => z.setup(),
            ActionKind::ProduceEnergy(_)
            | ActionKind::Protect(_)
            | ActionKind::ProtectInvincible
            | ActionKind::Idle => {
                let _ = state;
            }
        }
    }

    fn step(&mut self, dt: Fixed, entity: EntityId, state: &mut EntityState, ctx: &mut TickContext<'_>) {
        match self {
            ActionKind::Move(m) => m.step(dt, state),
            ActionKind::Follow(f) => f.step(dt, state, ctx.targets),
            ActionKind::Attack(a) => a.step(dt, state, ctx),
            ActionKind::AttackZone(z) => z.step(dt, entity, state, ctx),
            ActionKind::ProduceEnergy(p) => p.step(dt, state),
            ActionKind::Protect(p) => p.step(dt, state),
            ActionKind::ProtectInvincible | ActionKind::Idle => {}
        }
    }

    fn teardown(&mut self, state: &mut EntityState) {
        match self {
            ActionKind::Follow(f) => f.teardown(),
            ActionKind::Attack(a) => a.teardown(),
            ActionKind::AttackZone(z) => z.teardown(),
            ActionKind::Move(_)
            | ActionKind::ProduceEnergy(_)
            | ActionKind::Protect(_)
            | ActionKind::ProtectInvincible
            | ActionKind::Idle => {
                let _ = state;
            }
        }
    }
}

/// One stateful behavior bound to an entity and a module role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    id: ActionId,
    entity: EntityId,
    passive: bool,
    self_only: bool,
    to_run: bool,
    running: bool,
    kind: ActionKind,
}

impl Action {
    /// Create an action from its parts. Concrete constructors below set the
    /// passive flag correctly for each kind.
    #[must_use]
    pub fn new(id: ActionId, entity: EntityId, passive: bool, self_only: bool, kind: ActionKind) -> Self {
        Self {
            id,
            entity,
            passive,
            self_only,
            to_run: false,
            running: false,
            kind,
        }
    }

    /// A move engine action.
    #[must_use]
    pub fn movement(id: ActionId, entity: EntityId, movement: MoveAction) -> Self {
        Self::new(id, entity, false, false, ActionKind::Move(movement))
    }

    /// A follow action wrapping a move behavior.
    #[must_use]
    pub fn follow(id: ActionId, entity: EntityId, follow: FollowAction) -> Self {
        Self::new(id, entity, false, false, ActionKind::Follow(follow))
    }

    /// A weapon action pursuing and firing at a target entity.
    #[must_use]
    pub fn attack(id: ActionId, entity: EntityId, attack: AttackAction) -> Self {
        Self::new(id, entity, false, false, ActionKind::Attack(attack))
    }

    /// An area weapon action targeting a position.
    #[must_use]
    pub fn attack_zone(id: ActionId, entity: EntityId, zone: AttackZoneAction) -> Self {
        Self::new(id, entity, false, false, ActionKind::AttackZone(zone))
    }

    /// A passive energy production action.
    #[must_use]
    pub fn produce_energy(id: ActionId, entity: EntityId, produce: ProduceEnergyAction) -> Self {
        Self::new(id, entity, true, true, ActionKind::ProduceEnergy(produce))
    }

    /// A passive hull protection action.
    #[must_use]
    pub fn protect(id: ActionId, entity: EntityId, protect: ProtectAction) -> Self {
        Self::new(id, entity, true, true, ActionKind::Protect(protect))
    }

    /// The indestructible hull variant, used by the world sentinel.
    #[must_use]
    pub fn protect_invincible(id: ActionId, entity: EntityId) -> Self {
        Self::new(id, entity, true, true, ActionKind::ProtectInvincible)
    }

    /// An inert action for empty module slots.
    #[must_use]
    pub fn idle(id: ActionId, entity: EntityId) -> Self {
        Self::new(id, entity, false, true, ActionKind::Idle)
    }

    /// Module role id of this action.
    #[must_use]
    pub const fn id(&self) -> ActionId {
        self.id
    }

    /// Owning entity.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Passive actions run whenever their prerequisite holds and are not
    /// reported to lifecycle listeners.
    #[must_use]
    pub const fn is_passive(&self) -> bool {
        self.passive
    }

    /// True if the action only affects the owning entity.
    #[must_use]
    pub const fn is_self_only(&self) -> bool {
        self.self_only
    }

    /// True if the action is currently in running state.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Behavior payload.
    #[must_use]
    pub const fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// Mutable behavior payload.
    pub fn kind_mut(&mut self) -> &mut ActionKind {
        &mut self.kind
    }

    /// Check if the prerequisite to start or continue the action holds.
    #[must_use]
    pub fn check_prerequisite(&self, state: &EntityState, targets: &TargetLookup) -> bool {
        self.kind.check_prerequisite(state, targets)
    }

    /// Initialize the action before running it.
    pub fn init(&mut self, state: &mut EntityState) {
        self.to_run = true;
        self.kind.setup(state);
    }

    /// Run the action for one tick.
    ///
    /// Returns `true` if the action must continue. A passive action keeps
    /// returning `true` while its prerequisite holds, no matter how often
    /// [`stop`](Self::stop) was called.
    pub fn run(&mut self, dt: Fixed, state: &mut EntityState, ctx: &mut TickContext<'_>) -> bool {
        if self.passive && self.kind.check_prerequisite(state, ctx.targets) {
            self.running = true;
            self.kind.step(dt, self.entity, state, ctx);
            true
        } else if !self.to_run || !self.kind.check_prerequisite(state, ctx.targets) {
            self.running = false;
            false
        } else {
            self.running = true;
            self.kind.step(dt, self.entity, state, ctx);
            true
        }
    }

    /// Stop the action.
    ///
    /// For passive actions this is a no-op with respect to future runs; the
    /// only way to halt one is for its prerequisite to become false.
    pub fn stop(&mut self, state: &mut EntityState) {
        self.to_run = false;
        self.running = false;
        self.kind.teardown(state);
    }

    /// Clear the running flag without tearing the action down.
    ///
    /// Used by the entity loop when it retires an action whose prerequisite
    /// failed before `run` was called, so an action is never observed both
    /// running and completed.
    pub fn halt(&mut self) {
        self.running = false;
    }

    /// Queue damage on a hull action; ignored by every other kind.
    pub fn add_hit_result(&mut self, result: crate::combat::AttackHitResult) {
        if let ActionKind::Protect(p) = &mut self.kind {
            p.add_hit_result(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::AttackHitResult;
    use crate::state::{BoundedValue, EntityState};

    fn state() -> EntityState {
        EntityState::new(
            Vec3Fixed::ZERO,
            Vec3Fixed::new(Fixed::from_num(1), Fixed::ZERO, Fixed::ZERO),
            BoundedValue::full(100),
            BoundedValue::new(50, 100),
        )
    }

    fn ctx_parts() -> (TargetLookup, Vec<HitRequest>) {
        (TargetLookup::new(), Vec::new())
    }

    #[test]
    fn test_idle_action_never_runs() {
        let mut action = Action::idle(ActionId(7), EntityId(1));
        let mut s = state();
        let (targets, mut hits) = ctx_parts();
        action.init(&mut s);
        let mut ctx = TickContext {
            targets: &targets,
            hits: &mut hits,
        };
        assert!(!action.run(Fixed::from_num(1), &mut s, &mut ctx));
        assert!(!action.is_running());
    }

    #[test]
    fn test_run_without_init_does_not_start() {
        let mut action = Action::movement(ActionId(1), EntityId(1), MoveAction::new(Fixed::from_num(5)));
        let mut s = state();
        s.destination = Some(Vec3Fixed::new(Fixed::from_num(10), Fixed::ZERO, Fixed::ZERO));
        let (targets, mut hits) = ctx_parts();
        let mut ctx = TickContext {
            targets: &targets,
            hits: &mut hits,
        };
        // to_run is false until init.
        assert!(!action.run(Fixed::from_num(1), &mut s, &mut ctx));
        assert!(!action.is_running());
    }

    #[test]
    fn test_init_then_failed_prerequisite_is_not_running() {
        let mut action = Action::movement(ActionId(1), EntityId(1), MoveAction::new(Fixed::from_num(5)));
        let mut s = state();
        // No destination: prerequisite fails.
        let (targets, mut hits) = ctx_parts();
        action.init(&mut s);
        let mut ctx = TickContext {
            targets: &targets,
            hits: &mut hits,
        };
        assert!(!action.run(Fixed::from_num(1), &mut s, &mut ctx));
        assert!(!action.is_running());
    }

    #[test]
    fn test_stop_does_not_halt_passive_action() {
        let mut action = Action::produce_energy(
            ActionId(2),
            EntityId(1),
            ProduceEnergyAction::new(Fixed::from_num(10)),
        );
        let mut s = state();
        let (targets, mut hits) = ctx_parts();
        action.init(&mut s);
        action.stop(&mut s);
        let mut ctx = TickContext {
            targets: &targets,
            hits: &mut hits,
        };
        // Stopped, but passive with a holding prerequisite: still runs.
        assert!(action.run(Fixed::from_num(1), &mut s, &mut ctx));
        assert!(action.is_running());
    }

    #[test]
    fn test_passive_action_halts_only_on_prerequisite() {
        let mut action = Action::produce_energy(
            ActionId(2),
            EntityId(1),
            ProduceEnergyAction::new(Fixed::from_num(10)),
        );
        let mut s = state();
        s.energy.set(100);
        let (targets, mut hits) = ctx_parts();
        action.init(&mut s);
        let mut ctx = TickContext {
            targets: &targets,
            hits: &mut hits,
        };
        assert!(!action.run(Fixed::from_num(1), &mut s, &mut ctx));
        assert!(!action.is_running());
    }

    #[test]
    fn test_stop_halts_active_action() {
        let mut action = Action::movement(ActionId(1), EntityId(1), MoveAction::new(Fixed::from_num(5)));
        let mut s = state();
        s.destination = Some(Vec3Fixed::new(Fixed::from_num(100), Fixed::ZERO, Fixed::ZERO));
        let (targets, mut hits) = ctx_parts();
        action.init(&mut s);
        let mut ctx = TickContext {
            targets: &targets,
            hits: &mut hits,
        };
        assert!(action.run(Fixed::from_num(1), &mut s, &mut ctx));
        action.stop(&mut s);
        assert!(!action.is_running());
        let mut ctx = TickContext {
            targets: &targets,
            hits: &mut hits,
        };
        assert!(!action.run(Fixed::from_num(1), &mut s, &mut ctx));
    }

    #[test]
    fn test_hit_result_only_reaches_hull() {
        let mut weapon = Action::idle(ActionId(3), EntityId(1));
        weapon.add_hit_result(AttackHitResult::new(10));

        let mut hull = Action::protect(ActionId(4), EntityId(1), ProtectAction::new(Fixed::ZERO));
        hull.add_hit_result(AttackHitResult::new(10));
        let mut s = state();
        let (targets, mut hits) = ctx_parts();
        hull.init(&mut s);
        let mut ctx = TickContext {
            targets: &targets,
            hits: &mut hits,
        };
        assert!(hull.run(Fixed::from_num(1), &mut s, &mut ctx));
        assert_eq!(s.hp.current(), 90);
    }

    #[test]
    fn test_target_lookup_within() {
        let mut lookup = TargetLookup::new();
        lookup.insert(
            EntityId(1),
            TargetInfo {
                position: Vec3Fixed::ZERO,
                owner: PlayerId(1),
                alive: true,
            },
        );
        lookup.insert(
            EntityId(2),
            TargetInfo {
                position: Vec3Fixed::new(Fixed::from_num(3), Fixed::ZERO, Fixed::ZERO),
                owner: PlayerId(2),
                alive: true,
            },
        );
        lookup.insert(
            EntityId(3),
            TargetInfo {
                position: Vec3Fixed::new(Fixed::from_num(50), Fixed::ZERO, Fixed::ZERO),
                owner: PlayerId(2),
                alive: true,
            },
        );
        lookup.insert(
            EntityId(4),
            TargetInfo {
                position: Vec3Fixed::ZERO,
                owner: PlayerId(2),
                alive: false,
            },
        );

        let found = lookup.within(Vec3Fixed::ZERO, Fixed::from_num(5));
        assert_eq!(found, vec![EntityId(1), EntityId(2)]);
    }
}
