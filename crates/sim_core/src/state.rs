//! Canonical per-entity mutable state.
//!
//! The entity owns one [`EntityState`]; actions receive it by `&mut`
//! during the owning entity's tick only. There are no shared aliases:
//! exactly one writer context exists per simulation step.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::data::EntityId;
use crate::math::{Fixed, Vec3Fixed};

/// A value clamped between zero and a maximum (hit points, energy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundedValue {
    /// Current value.
    current: u32,
    /// Maximum value.
    max: u32,
}

impl BoundedValue {
    /// Create a bounded value, clamping `current` to `max`.
    #[must_use]
    pub fn new(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    /// Create a bounded value at its maximum.
    #[must_use]
    pub const fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Current value.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Maximum value.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Set the current value, clamped to the maximum.
    pub fn set(&mut self, value: u32) {
        self.current = value.min(self.max);
    }

    /// Set a new maximum, re-clamping the current value.
    pub fn set_max(&mut self, max: u32) {
        self.max = max;
        self.current = self.current.min(max);
    }

    /// Add to the value, returning the amount actually added.
    pub fn add(&mut self, amount: u32) -> u32 {
        let headroom = self.max.saturating_sub(self.current);
        let actual = amount.min(headroom);
        self.current = self.current.saturating_add(actual);
        actual
    }

    /// Subtract from the value, returning the amount actually removed.
    pub fn remove(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current = self.current.saturating_sub(actual);
        actual
    }

    /// Check if the value is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.current == 0
    }

    /// Check if the value is at its maximum.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Ratio of current to maximum in `[0, 1]`.
    #[must_use]
    pub fn ratio(&self) -> Fixed {
        if self.max == 0 {
            Fixed::ZERO
        } else {
            Fixed::from_num(self.current) / Fixed::from_num(self.max)
        }
    }
}

/// Set of arbitrary state tags carried by an entity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateSet {
    tags: BTreeSet<String>,
}

/// Tag marking an entity as destroyed; the per-frame sweep removes tagged
/// entities from the registry.
pub const DESTROYED: &str = "destroyed";

impl StateSet {
    /// Create an empty state set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state tag.
    pub fn add(&mut self, tag: &str) {
        self.tags.insert(tag.to_owned());
    }

    /// Remove a state tag.
    pub fn remove(&mut self, tag: &str) {
        self.tags.remove(tag);
    }

    /// Check for a state tag.
    #[must_use]
    pub fn has(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Mutable state shared between an entity and its actions within one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityState {
    /// World position.
    pub position: Vec3Fixed,
    /// Facing direction, kept as a unit vector.
    pub direction: Vec3Fixed,
    /// Bounded hit points.
    pub hp: BoundedValue,
    /// Bounded energy.
    pub energy: BoundedValue,
    /// Arbitrary state tags.
    pub states: StateSet,
    /// Current target entity, read by follow/attack actions.
    pub target: Option<EntityId>,
    /// Current destination, read by the move action.
    pub destination: Option<Vec3Fixed>,
}

impl EntityState {
    /// Create entity state at a position, facing a direction.
    #[must_use]
    pub fn new(position: Vec3Fixed, direction: Vec3Fixed, hp: BoundedValue, energy: BoundedValue) -> Self {
        Self {
            position,
            direction,
            hp,
            energy,
            states: StateSet::new(),
            target: None,
            destination: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_value_clamps_on_new() {
        let v = BoundedValue::new(150, 100);
        assert_eq!(v.current(), 100);
    }

    #[test]
    fn test_bounded_value_remove_clamps_to_zero() {
        let mut v = BoundedValue::new(10, 100);
        let removed = v.remove(15);
        assert_eq!(removed, 10);
        assert_eq!(v.current(), 0);
        assert!(v.is_zero());
    }

    #[test]
    fn test_bounded_value_add_clamps_to_max() {
        let mut v = BoundedValue::new(95, 100);
        let added = v.add(10);
        assert_eq!(added, 5);
        assert!(v.is_full());
    }

    #[test]
    fn test_bounded_value_ratio() {
        let v = BoundedValue::new(50, 100);
        assert_eq!(v.ratio(), Fixed::from_num(1) / Fixed::from_num(2));
        let empty = BoundedValue::new(0, 0);
        assert_eq!(empty.ratio(), Fixed::ZERO);
    }

    #[test]
    fn test_set_max_reclamps() {
        let mut v = BoundedValue::new(80, 100);
        v.set_max(50);
        assert_eq!(v.current(), 50);
        assert_eq!(v.max(), 50);
    }

    #[test]
    fn test_state_set() {
        let mut states = StateSet::new();
        assert!(!states.has(DESTROYED));
        states.add(DESTROYED);
        assert!(states.has(DESTROYED));
        states.remove(DESTROYED);
        assert!(!states.has(DESTROYED));
    }
}
