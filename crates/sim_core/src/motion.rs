//! Move and follow behaviors.

use serde::{Deserialize, Serialize};

use crate::action::TargetLookup;
use crate::math::{fixed_serde, Fixed, Vec3Fixed};
use crate::state::EntityState;

/// Advances the entity position toward its destination.
///
/// Speed builds up with a configured acceleration and is capped at a
/// maximum. The move completes once the remaining distance drops to the
/// arrive distance; `setup` resets it so a previous move's threshold never
/// carries over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveAction {
    /// Current speed, units per second.
    #[serde(with = "fixed_serde")]
    speed: Fixed,
    /// Acceleration, units per second squared.
    #[serde(with = "fixed_serde")]
    acceleration: Fixed,
    /// Maximum speed, units per second.
    #[serde(with = "fixed_serde")]
    max_speed: Fixed,
    /// Remaining distance at which the move counts as arrived.
    #[serde(with = "fixed_serde")]
    arrive_distance: Fixed,
}

impl MoveAction {
    /// Create a move behavior reaching `max_speed` after one second.
    #[must_use]
    pub fn new(max_speed: Fixed) -> Self {
        Self {
            speed: Fixed::ZERO,
            acceleration: max_speed,
            max_speed,
            arrive_distance: Fixed::ZERO,
        }
    }

    /// Override the acceleration.
    #[must_use]
    pub fn with_acceleration(mut self, acceleration: Fixed) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// Distance at which the move counts as arrived.
    pub fn set_arrive_distance(&mut self, distance: Fixed) {
        self.arrive_distance = distance;
    }

    /// Current speed.
    #[must_use]
    pub const fn speed(&self) -> Fixed {
        self.speed
    }

    /// The move continues while a destination is set and out of arrive range.
    #[must_use]
    pub fn check_prerequisite(&self, state: &EntityState) -> bool {
        state.destination.is_some_and(|d| {
            state.position.distance_squared(d) > self.arrive_distance * self.arrive_distance
        })
    }

    /// Reset per-run state before a fresh move.
    pub fn setup(&mut self) {
        self.speed = Fixed::ZERO;
        self.arrive_distance = Fixed::ZERO;
    }

    /// Advance toward the destination by one tick.
    pub fn step(&mut self, dt: Fixed, state: &mut EntityState) {
        let Some(destination) = state.destination else {
            return;
        };

        self.speed = (self.speed + self.acceleration * dt).min(self.max_speed);

        let diff = destination - state.position;
        let distance = diff.length();
        let travel = self.speed * dt;

        if distance <= travel {
            if distance > Fixed::ZERO {
                state.direction = diff.normalize();
            }
            state.position = destination;
        } else {
            let direction = diff.normalize();
            state.direction = direction;
            state.position = state.position + direction.scale(travel);
        }
    }
}

/// Keeps moving toward a target's current position.
///
/// Wraps a [`MoveAction`] and re-aims it every tick; the configured follow
/// distance becomes the move's arrive distance so the follower keeps
/// station instead of colliding with its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FollowAction {
    movement: MoveAction,
    #[serde(with = "fixed_serde")]
    follow_distance: Fixed,
}

impl FollowAction {
    /// Create a follow behavior keeping `follow_distance` from the target.
    #[must_use]
    pub fn new(movement: MoveAction, follow_distance: Fixed) -> Self {
        Self {
            movement,
            follow_distance,
        }
    }

    /// Continues while the entity has a live target.
    #[must_use]
    pub fn check_prerequisite(&self, state: &EntityState, targets: &TargetLookup) -> bool {
        state.target.is_some_and(|t| targets.is_alive(t))
    }

    /// Reset the inner move and propagate the follow distance into it.
    pub fn setup(&mut self) {
        self.movement.setup();
        self.movement.set_arrive_distance(self.follow_distance);
    }

    /// Re-aim at the target's current position and advance.
    pub fn step(&mut self, dt: Fixed, state: &mut EntityState, targets: &TargetLookup) {
        let Some(target) = state.target else {
            return;
        };
        let Some(position) = targets.position_of(target) else {
            return;
        };
        state.destination = Some(position);
        if self.movement.check_prerequisite(state) {
            self.movement.step(dt, state);
        }
    }

    /// Nothing transient to release.
    pub fn teardown(&mut self) {}
}

/// Face a point from a position; returns a unit vector.
#[must_use]
pub fn direction_to(from: Vec3Fixed, to: Vec3Fixed) -> Vec3Fixed {
    (to - from).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{TargetInfo, TargetLookup};
    use crate::data::{EntityId, PlayerId};
    use crate::state::BoundedValue;

    fn state_at(x: i32) -> EntityState {
        EntityState::new(
            Vec3Fixed::new(Fixed::from_num(x), Fixed::ZERO, Fixed::ZERO),
            Vec3Fixed::new(Fixed::from_num(1), Fixed::ZERO, Fixed::ZERO),
            BoundedValue::full(100),
            BoundedValue::full(100),
        )
    }

    #[test]
    fn test_move_advances_monotonically() {
        let mut movement = MoveAction::new(Fixed::from_num(2));
        let mut state = state_at(0);
        state.destination = Some(Vec3Fixed::new(Fixed::from_num(20), Fixed::ZERO, Fixed::ZERO));
        movement.setup();

        let dt = Fixed::from_num(1) / Fixed::from_num(2);
        let mut last = state
            .position
            .distance_squared(state.destination.unwrap());
        for _ in 0..30 {
            if !movement.check_prerequisite(&state) {
                break;
            }
            movement.step(dt, &mut state);
            let now = state.position.distance_squared(state.destination.unwrap());
            assert!(now <= last, "distance must not increase");
            last = now;
        }
        assert_eq!(
            state.position,
            Vec3Fixed::new(Fixed::from_num(20), Fixed::ZERO, Fixed::ZERO)
        );
        assert!(!movement.check_prerequisite(&state));
    }

    #[test]
    fn test_move_does_not_overshoot() {
        let mut movement = MoveAction::new(Fixed::from_num(100));
        let mut state = state_at(0);
        state.destination = Some(Vec3Fixed::new(Fixed::from_num(3), Fixed::ZERO, Fixed::ZERO));
        movement.setup();
        movement.step(Fixed::from_num(1), &mut state);
        assert_eq!(
            state.position,
            Vec3Fixed::new(Fixed::from_num(3), Fixed::ZERO, Fixed::ZERO)
        );
    }

    #[test]
    fn test_move_sets_direction_of_travel() {
        let mut movement = MoveAction::new(Fixed::from_num(1));
        let mut state = state_at(0);
        state.destination = Some(Vec3Fixed::new(Fixed::ZERO, Fixed::from_num(10), Fixed::ZERO));
        movement.setup();
        movement.step(Fixed::from_num(1), &mut state);
        assert!(state.direction.y > Fixed::from_num(0.9));
    }

    #[test]
    fn test_setup_resets_arrive_distance() {
        let mut movement = MoveAction::new(Fixed::from_num(2));
        movement.set_arrive_distance(Fixed::from_num(50));
        movement.setup();
        let mut state = state_at(0);
        state.destination = Some(Vec3Fixed::new(Fixed::from_num(10), Fixed::ZERO, Fixed::ZERO));
        // A stale 50-unit threshold would have reported arrival immediately.
        assert!(movement.check_prerequisite(&state));
    }

    #[test]
    fn test_follow_tracks_target_position() {
        let target = EntityId(9);
        let mut lookup = TargetLookup::new();
        lookup.insert(
            target,
            TargetInfo {
                position: Vec3Fixed::new(Fixed::from_num(10), Fixed::ZERO, Fixed::ZERO),
                owner: PlayerId(2),
                alive: true,
            },
        );

        let mut follow = FollowAction::new(MoveAction::new(Fixed::from_num(4)), Fixed::from_num(1));
        let mut state = state_at(0);
        state.target = Some(target);
        follow.setup();

        assert!(follow.check_prerequisite(&state, &lookup));
        follow.step(Fixed::from_num(1), &mut state, &lookup);
        assert!(state.position.x > Fixed::ZERO);
        assert_eq!(
            state.destination,
            Some(Vec3Fixed::new(Fixed::from_num(10), Fixed::ZERO, Fixed::ZERO))
        );
    }

    #[test]
    fn test_follow_stops_at_follow_distance() {
        let target = EntityId(9);
        let mut lookup = TargetLookup::new();
        lookup.insert(
            target,
            TargetInfo {
                position: Vec3Fixed::new(Fixed::from_num(2), Fixed::ZERO, Fixed::ZERO),
                owner: PlayerId(2),
                alive: true,
            },
        );

        let mut follow = FollowAction::new(MoveAction::new(Fixed::from_num(4)), Fixed::from_num(3));
        let mut state = state_at(0);
        state.target = Some(target);
        follow.setup();

        // Already within follow distance: position must not change.
        follow.step(Fixed::from_num(1), &mut state, &lookup);
        assert_eq!(state.position.x, Fixed::ZERO);
    }

    #[test]
    fn test_follow_prerequisite_fails_without_live_target() {
        let lookup = TargetLookup::new();
        let follow = FollowAction::new(MoveAction::new(Fixed::from_num(4)), Fixed::from_num(1));
        let mut state = state_at(0);
        assert!(!follow.check_prerequisite(&state, &lookup));
        state.target = Some(EntityId(9));
        // Target unknown to the lookup counts as dead.
        assert!(!follow.check_prerequisite(&state, &lookup));
    }
}
