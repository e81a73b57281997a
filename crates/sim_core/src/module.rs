//! Capability slots and module sets.
//!
//! A module pairs one action instance with a stable role id. Every entity
//! carries exactly eight modules: hull, energy generator, detector, weapon,
//! move engine, and three generic additional slots.

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::data::{ActionId, EntityId};
use crate::error::{Result, SimError};
use crate::math::{fixed_serde, Fixed};

/// The eight capability slots of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleSlot {
    /// Hit point manipulation.
    Hull,
    /// Energy generation.
    EnergyGenerator,
    /// Detection / line of sight.
    Detector,
    /// Base weapon.
    Weapon,
    /// Base move action.
    MoveEngine,
    /// First generic slot.
    Additional1,
    /// Second generic slot.
    Additional2,
    /// Third generic slot.
    Additional3,
}

/// One capability slot binding a role id to an action instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    slot: ModuleSlot,
    action: Action,
}

impl Module {
    /// Bind an action to a slot.
    #[must_use]
    pub fn new(slot: ModuleSlot, action: Action) -> Self {
        Self { slot, action }
    }

    /// The slot this module occupies.
    #[must_use]
    pub const fn slot(&self) -> ModuleSlot {
        self.slot
    }

    /// The module's role id, defined by its action.
    #[must_use]
    pub const fn id(&self) -> ActionId {
        self.action.id()
    }

    /// The bound action.
    #[must_use]
    pub const fn action(&self) -> &Action {
        &self.action
    }

    /// The bound action, mutable.
    pub fn action_mut(&mut self) -> &mut Action {
        &mut self.action
    }
}

/// Capability data carried by a module set beyond its actions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModuleCaps {
    /// Maximum hit points granted by the hull.
    pub max_hp: u32,
    /// Maximum energy granted by the generator.
    pub max_energy: u32,
    /// Detection distance granted by the detector.
    #[serde(with = "fixed_serde")]
    pub line_of_sight: Fixed,
}

/// The full set of eight modules of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSet {
    hull: Module,
    energy_generator: Module,
    detector: Module,
    weapon: Module,
    move_engine: Module,
    additional: [Module; 3],
    caps: ModuleCaps,
}

impl ModuleSet {
    /// Assemble a module set from its eight modules and capability data.
    #[must_use]
    pub fn new(
        hull: Module,
        energy_generator: Module,
        detector: Module,
        weapon: Module,
        move_engine: Module,
        additional: [Module; 3],
        caps: ModuleCaps,
    ) -> Self {
        Self {
            hull,
            energy_generator,
            detector,
            weapon,
            move_engine,
            additional,
            caps,
        }
    }

    /// A fully inert set: invincible hull, idle everything else.
    ///
    /// Used for the world sentinel and other indestructible scenery.
    #[must_use]
    pub fn inert(entity: EntityId, ids: [ActionId; 8]) -> Self {
        Self::new(
            Module::new(ModuleSlot::Hull, Action::protect_invincible(ids[0], entity)),
            Module::new(ModuleSlot::EnergyGenerator, Action::idle(ids[1], entity)),
            Module::new(ModuleSlot::Detector, Action::idle(ids[2], entity)),
            Module::new(ModuleSlot::Weapon, Action::idle(ids[3], entity)),
            Module::new(ModuleSlot::MoveEngine, Action::idle(ids[4], entity)),
            [
                Module::new(ModuleSlot::Additional1, Action::idle(ids[5], entity)),
                Module::new(ModuleSlot::Additional2, Action::idle(ids[6], entity)),
                Module::new(ModuleSlot::Additional3, Action::idle(ids[7], entity)),
            ],
            ModuleCaps {
                max_hp: 0,
                max_energy: 0,
                line_of_sight: Fixed::ZERO,
            },
        )
    }

    fn all(&self) -> [&Module; 8] {
        [
            &self.hull,
            &self.energy_generator,
            &self.detector,
            &self.weapon,
            &self.move_engine,
            &self.additional[0],
            &self.additional[1],
            &self.additional[2],
        ]
    }

    fn all_mut(&mut self) -> [&mut Module; 8] {
        let [a1, a2, a3] = &mut self.additional;
        [
            &mut self.hull,
            &mut self.energy_generator,
            &mut self.detector,
            &mut self.weapon,
            &mut self.move_engine,
            a1,
            a2,
            a3,
        ]
    }

    /// Look up an action by role id.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownAction`] if no module carries the id;
    /// passing an unknown id is a modeling bug, not a gameplay condition.
    pub fn action(&self, id: ActionId) -> Result<&Action> {
        self.all()
            .into_iter()
            .map(Module::action)
            .find(|a| a.id() == id)
            .ok_or(SimError::UnknownAction(id))
    }

    /// Look up an action by role id, mutable.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownAction`] if no module carries the id.
    pub fn action_mut(&mut self, id: ActionId) -> Result<&mut Action> {
        self.all_mut()
            .into_iter()
            .map(Module::action_mut)
            .find(|a| a.id() == id)
            .ok_or(SimError::UnknownAction(id))
    }

    /// The hull module.
    #[must_use]
    pub const fn hull(&self) -> &Module {
        &self.hull
    }

    /// The hull module, mutable.
    pub fn hull_mut(&mut self) -> &mut Module {
        &mut self.hull
    }

    /// The energy generator module.
    #[must_use]
    pub const fn energy_generator(&self) -> &Module {
        &self.energy_generator
    }

    /// The detector module.
    #[must_use]
    pub const fn detector(&self) -> &Module {
        &self.detector
    }

    /// The weapon module.
    #[must_use]
    pub const fn weapon(&self) -> &Module {
        &self.weapon
    }

    /// The weapon module, mutable.
    pub fn weapon_mut(&mut self) -> &mut Module {
        &mut self.weapon
    }

    /// The move engine module.
    #[must_use]
    pub const fn move_engine(&self) -> &Module {
        &self.move_engine
    }

    /// The three generic additional modules.
    #[must_use]
    pub const fn additional(&self) -> &[Module; 3] {
        &self.additional
    }

    /// Maximum hit points granted by the hull.
    #[must_use]
    pub const fn max_hp(&self) -> u32 {
        self.caps.max_hp
    }

    /// Maximum energy granted by the generator.
    #[must_use]
    pub const fn max_energy(&self) -> u32 {
        self.caps.max_energy
    }

    /// Detection distance granted by the detector.
    #[must_use]
    pub const fn line_of_sight(&self) -> Fixed {
        self.caps.line_of_sight
    }

    /// The eight role ids as a value object.
    #[must_use]
    pub fn group(&self) -> ModuleGroup {
        ModuleGroup {
            hull: self.hull.id(),
            energy: self.energy_generator.id(),
            detector: self.detector.id(),
            weapon: self.weapon.id(),
            move_engine: self.move_engine.id(),
            additional: [
                self.additional[0].id(),
                self.additional[1].id(),
                self.additional[2].id(),
            ],
        }
    }

    /// Tear down every module's action. Safe to call more than once.
    pub fn delete(&mut self) {
        use crate::action::ActionKind;
        for module in self.all_mut() {
            let action = module.action_mut();
            action.halt();
            if let ActionKind::Protect(p) = action.kind_mut() {
                p.clear();
            }
        }
    }
}

/// The eight role ids of a module set, comparable and hashable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleGroup {
    /// Hull role id.
    pub hull: ActionId,
    /// Energy generator role id.
    pub energy: ActionId,
    /// Detector role id.
    pub detector: ActionId,
    /// Weapon role id.
    pub weapon: ActionId,
    /// Move engine role id.
    pub move_engine: ActionId,
    /// The three additional role ids.
    pub additional: [ActionId; 3],
}

impl ModuleGroup {
    /// All eight ids in slot order.
    #[must_use]
    pub fn all(&self) -> [ActionId; 8] {
        [
            self.hull,
            self.energy,
            self.detector,
            self.weapon,
            self.move_engine,
            self.additional[0],
            self.additional[1],
            self.additional[2],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inert_set() -> ModuleSet {
        ModuleSet::inert(
            EntityId(1),
            [
                ActionId(10),
                ActionId(11),
                ActionId(12),
                ActionId(13),
                ActionId(14),
                ActionId(15),
                ActionId(16),
                ActionId(17),
            ],
        )
    }

    #[test]
    fn test_action_lookup_by_id() {
        let set = inert_set();
        assert_eq!(set.action(ActionId(13)).unwrap().id(), ActionId(13));
        assert_eq!(set.weapon().id(), ActionId(13));
    }

    #[test]
    fn test_unknown_action_id_is_error() {
        let set = inert_set();
        let err = set.action(ActionId(99)).unwrap_err();
        assert!(matches!(err, SimError::UnknownAction(ActionId(99))));
    }

    #[test]
    fn test_group_round_trip() {
        let set = inert_set();
        let group = set.group();
        assert_eq!(group.hull, ActionId(10));
        assert_eq!(group.move_engine, ActionId(14));
        assert_eq!(group.all().len(), 8);
        assert_eq!(group, set.group());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut set = inert_set();
        set.delete();
        set.delete();
        assert!(!set.hull().action().is_running());
    }
}
