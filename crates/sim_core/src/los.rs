//! Line of sight event dispatch.
//!
//! Collision detection itself lives outside the core; a physics or grid
//! layer reports begin/end collision pairs between a detector and another
//! entity, and the manager turns them into visibility state and listener
//! notifications. Same-owner pairs are ignored entirely, and duplicate
//! collision reports for an already-visible pair notify nothing.

use tracing::trace;

use crate::data::EntityId;
use crate::registry::EntityRegistry;

/// A detection collision: `viewer` is the detecting entity, `seen` the
/// entity entering or leaving its detection volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionPair {
    /// The detecting entity.
    pub viewer: EntityId,
    /// The detected entity.
    pub seen: EntityId,
}

impl CollisionPair {
    /// Pair a viewer with a seen entity.
    #[must_use]
    pub const fn new(viewer: EntityId, seen: EntityId) -> Self {
        Self { viewer, seen }
    }
}

/// Receives visibility transitions between enemy entities.
pub trait LosListener {
    /// `viewer` sees `seen` for the first time since losing it.
    fn see(&mut self, viewer: EntityId, seen: EntityId);

    /// `viewer` no longer sees `seen`.
    fn no_longer_see(&mut self, viewer: EntityId, seen: EntityId);
}

/// Turns raw collision reports into visibility state and notifications.
#[derive(Default)]
pub struct LosManager {
    listeners: Vec<Box<dyn LosListener>>,
}

impl LosManager {
    /// Create a manager with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for visibility transitions.
    pub fn will_notify(&mut self, listener: Box<dyn LosListener>) {
        self.listeners.push(listener);
    }

    /// Handle a collision beginning between a detector and another entity.
    ///
    /// No-op when both entities share an owner or the pair is already
    /// visible. Otherwise the viewer's visible set gains the seen entity,
    /// the seen entity records the viewer's owner as a seer, and every
    /// listener is notified once.
    pub fn new_collision(&mut self, registry: &mut EntityRegistry, pair: CollisionPair) {
        let viewer_owner = registry.find_by_id(pair.viewer).owner();
        let seen_owner = registry.find_by_id(pair.seen).owner();
        if viewer_owner == seen_owner {
            return;
        }
        if !registry.find_by_id_mut(pair.viewer).see(pair.seen) {
            return;
        }
        registry.find_by_id_mut(pair.seen).add_seer(viewer_owner);
        trace!(viewer = pair.viewer.0, seen = pair.seen.0, "sighted");
        for listener in &mut self.listeners {
            listener.see(pair.viewer, pair.seen);
        }
    }

    /// Handle a collision ending between a detector and another entity.
    ///
    /// Notifies only when the pair was actually visible, so stale or
    /// duplicate end reports dispatch nothing.
    pub fn lost_collision(&mut self, registry: &mut EntityRegistry, pair: CollisionPair) {
        let viewer_owner = registry.find_by_id(pair.viewer).owner();
        let seen_owner = registry.find_by_id(pair.seen).owner();
        if viewer_owner == seen_owner {
            return;
        }
        if !registry.find_by_id(pair.viewer).is_seeing(pair.seen) {
            return;
        }
        registry.find_by_id_mut(pair.viewer).no_longer_see(pair.seen);
        trace!(viewer = pair.viewer.0, seen = pair.seen.0, "lost sight");
        for listener in &mut self.listeners {
            listener.no_longer_see(pair.viewer, pair.seen);
        }
    }
}
