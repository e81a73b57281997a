//! Test fixtures and helpers.
//!
//! Pre-built entities, module sets, and recording listener probes for
//! consistent testing across crates.

use std::cell::RefCell;
use std::rc::Rc;

use fixed::types::I32F32;

use sim_core::energy::ProduceEnergyAction;
use sim_core::hull::ProtectAction;
use sim_core::motion::MoveAction;
use sim_core::prelude::*;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Action id slot offsets within an entity's id block.
pub mod slots {
    /// Hull slot offset.
    pub const HULL: u32 = 1;
    /// Energy generator slot offset.
    pub const ENERGY: u32 = 2;
    /// Detector slot offset.
    pub const DETECTOR: u32 = 3;
    /// Weapon slot offset.
    pub const WEAPON: u32 = 4;
    /// Move engine slot offset.
    pub const MOVE: u32 = 5;
}

/// Eight action ids for an entity, carved from a block of ten per entity.
///
/// The offsets in [`slots`] index into the same block, so tests can name
/// an entity's move engine as `ActionId(id * 10 + slots::MOVE)`.
///
/// # Panics
///
/// Panics if the entity id block does not fit in an action id.
#[must_use]
pub fn action_ids(entity: EntityId) -> [ActionId; 8] {
    let base = u32::try_from(entity.0 * 10).unwrap();
    [
        ActionId(base + slots::HULL),
        ActionId(base + slots::ENERGY),
        ActionId(base + slots::DETECTOR),
        ActionId(base + slots::WEAPON),
        ActionId(base + slots::MOVE),
        ActionId(base + 6),
        ActionId(base + 7),
        ActionId(base + 8),
    ]
}

/// The move engine action id of a fixture entity.
#[must_use]
pub fn move_id(entity: EntityId) -> ActionId {
    action_ids(entity)[4]
}

/// The weapon action id of a fixture entity.
#[must_use]
pub fn weapon_id(entity: EntityId) -> ActionId {
    action_ids(entity)[3]
}

/// A descriptor at a position, spawning at full strength.
#[must_use]
pub fn descriptor(id: EntityId, owner: PlayerId, position: Vec3Fixed) -> EntityDescriptor {
    EntityDescriptor {
        kind: EntityType(1),
        id,
        owner,
        name: format!("fixture{}", id.0),
        position,
        direction: Vec3Fixed::new(fixed(1), I32F32::ZERO, I32F32::ZERO),
        hp: None,
        energy: None,
    }
}

/// The world sentinel entity: inert modules, owner zero.
#[must_use]
pub fn world_entity() -> Entity {
    let mut desc = descriptor(EntityId::WORLD, PlayerId::WORLD, Vec3Fixed::ZERO);
    desc.kind = EntityType::WORLD;
    desc.name = "world".to_owned();
    Entity::new(
        desc,
        ModuleSet::inert(EntityId::WORLD, action_ids(EntityId::WORLD)),
    )
}

/// A simulation built around the standard world sentinel.
#[must_use]
pub fn simulation() -> Simulation {
    Simulation::new(world_entity())
}

/// Module set with a fragile hull, energy production, and a move engine.
#[must_use]
pub fn basic_modules(entity: EntityId) -> ModuleSet {
    let ids = action_ids(entity);
    ModuleSet::new(
        Module::new(
            ModuleSlot::Hull,
            Action::protect(ids[0], entity, ProtectAction::new(I32F32::ZERO)),
        ),
        Module::new(
            ModuleSlot::EnergyGenerator,
            Action::produce_energy(ids[1], entity, ProduceEnergyAction::new(fixed(20))),
        ),
        Module::new(ModuleSlot::Detector, Action::idle(ids[2], entity)),
        Module::new(ModuleSlot::Weapon, Action::idle(ids[3], entity)),
        Module::new(
            ModuleSlot::MoveEngine,
            Action::movement(ids[4], entity, MoveAction::new(fixed(10))),
        ),
        [
            Module::new(ModuleSlot::Additional1, Action::idle(ids[5], entity)),
            Module::new(ModuleSlot::Additional2, Action::idle(ids[6], entity)),
            Module::new(ModuleSlot::Additional3, Action::idle(ids[7], entity)),
        ],
        ModuleCaps {
            max_hp: 100,
            max_energy: 100,
            line_of_sight: fixed(50),
        },
    )
}

/// Module set like [`basic_modules`] plus an armed weapon.
///
/// The weapon deals 10 damage per shot at range 10, one shot per second.
#[must_use]
pub fn combat_modules(entity: EntityId) -> ModuleSet {
    use sim_core::combat::AttackAction;

    let ids = action_ids(entity);
    let mut modules = basic_modules(entity);
    *modules.weapon_mut() = Module::new(
        ModuleSlot::Weapon,
        Action::attack(
            ids[3],
            entity,
            AttackAction::new(
                MoveAction::new(fixed(10)),
                AttackDamage(10),
                AttackRange(fixed(10)),
                fixed(1),
            ),
        ),
    );
    modules
}

/// A full-strength entity with [`basic_modules`].
#[must_use]
pub fn basic_entity(id: EntityId, owner: PlayerId, position: Vec3Fixed) -> Entity {
    Entity::new(descriptor(id, owner, position), basic_modules(id))
}

/// A full-strength entity with [`combat_modules`].
#[must_use]
pub fn combat_entity(id: EntityId, owner: PlayerId, position: Vec3Fixed) -> Entity {
    Entity::new(descriptor(id, owner, position), combat_modules(id))
}

/// Everything the recording probes captured.
#[derive(Debug, Default)]
pub struct Recorded {
    /// `(entity, action)` pairs reported as executing, in order.
    pub executed: Vec<(EntityId, ActionId)>,
    /// `(entity, action)` pairs reported as completed, in order.
    pub completed: Vec<(EntityId, ActionId)>,
    /// Entities reported destroyed, in order.
    pub destroyed: Vec<EntityId>,
    /// `(viewer, seen)` sighting pairs, in order.
    pub seen: Vec<(EntityId, EntityId)>,
    /// `(viewer, seen)` lost-sight pairs, in order.
    pub lost: Vec<(EntityId, EntityId)>,
}

/// Listener probe recording every notification into a shared [`Recorded`].
pub struct Probe(Rc<RefCell<Recorded>>);

impl Probe {
    /// A probe and the shared record it writes to.
    #[must_use]
    pub fn recording() -> (Self, Rc<RefCell<Recorded>>) {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        (Self(Rc::clone(&recorded)), recorded)
    }

    /// Another probe writing to the same record.
    #[must_use]
    pub fn sharing(recorded: &Rc<RefCell<Recorded>>) -> Self {
        Self(Rc::clone(recorded))
    }
}

impl ActionListener for Probe {
    fn execute(&mut self, entity: EntityId, _owner: PlayerId, action: ActionId) {
        self.0.borrow_mut().executed.push((entity, action));
    }

    fn complete(&mut self, entity: EntityId, _owner: PlayerId, action: ActionId) {
        self.0.borrow_mut().completed.push((entity, action));
    }
}

impl DestructionListener for Probe {
    fn entity_destroyed(&mut self, entity: EntityId, _owner: PlayerId, _kind: EntityType) {
        self.0.borrow_mut().destroyed.push(entity);
    }
}

impl LosListener for Probe {
    fn see(&mut self, viewer: EntityId, seen: EntityId) {
        self.0.borrow_mut().seen.push((viewer, seen));
    }

    fn no_longer_see(&mut self, viewer: EntityId, seen: EntityId) {
        self.0.borrow_mut().lost.push((viewer, seen));
    }
}
