//! Attack behaviors and hit routing.
//!
//! Attacks never mutate their target directly: they emit [`HitRequest`]s
//! into the tick outbox and the driver queues the damage on the target's
//! hull, which applies it on the target's own tick.

use serde::{Deserialize, Serialize};

use crate::action::TickContext;
use crate::data::EntityId;
use crate::math::{fixed_serde, Fixed};
use crate::motion::FollowAction;
use crate::state::EntityState;

/// Damage dealt per shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackDamage(pub u32);

/// Maximum firing distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackRange(#[serde(with = "fixed_serde")] pub Fixed);

/// Result of a successful shot, queued on the target's hull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackHitResult {
    /// Hit points to remove.
    pub damage: u32,
}

impl AttackHitResult {
    /// Create a hit result.
    #[must_use]
    pub const fn new(damage: u32) -> Self {
        Self { damage }
    }
}

/// Cross-entity damage request routed by the driver after the entity sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitRequest {
    /// Entity to damage.
    pub target: EntityId,
    /// Damage to queue on its hull.
    pub result: AttackHitResult,
}

/// Accumulates elapsed time and fires once per interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackTimer {
    #[serde(with = "fixed_serde")]
    interval: Fixed,
    #[serde(with = "fixed_serde")]
    elapsed: Fixed,
}

impl AttackTimer {
    /// Create a timer firing every `interval` seconds.
    #[must_use]
    pub fn new(interval: Fixed) -> Self {
        Self {
            interval,
            elapsed: Fixed::ZERO,
        }
    }

    /// Advance by `dt`; returns true when a full interval has elapsed.
    pub fn advance(&mut self, dt: Fixed) -> bool {
        self.elapsed += dt;
        if self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            true
        } else {
            false
        }
    }
}

/// Distance at which an attacker's follow keeps station from its target.
fn pursue_distance() -> Fixed {
    Fixed::from_num(200)
}

/// Minimum alignment between facing and the target bearing to open fire.
fn facing_tolerance() -> Fixed {
    Fixed::from_num(99) / Fixed::from_num(100)
}

/// Pursues a target entity and fires while in range and facing it.
///
/// Range comparison uses squared distance to avoid a square root. Firing
/// and hitting are separate: the weapon fires whenever aligned, but damage
/// is only emitted when the attack timer elapses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackAction {
    follow: FollowAction,
    damage: AttackDamage,
    range: AttackRange,
    timer: AttackTimer,
    firing: bool,
}

impl AttackAction {
    /// Create an attack behavior.
    ///
    /// `movement` drives the pursue; its arrive distance is pinned to the
    /// standard pursue distance.
    #[must_use]
    pub fn new(
        movement: crate::motion::MoveAction,
        damage: AttackDamage,
        range: AttackRange,
        interval: Fixed,
    ) -> Self {
        Self {
            follow: FollowAction::new(movement, pursue_distance()),
            damage,
            range,
            timer: AttackTimer::new(interval),
            firing: false,
        }
    }

    /// True while the weapon is firing (aligned and in range).
    #[must_use]
    pub const fn is_firing(&self) -> bool {
        self.firing
    }

    /// Continues while the entity has a live target.
    #[must_use]
    pub fn check_prerequisite(
        &self,
        state: &EntityState,
        targets: &crate::action::TargetLookup,
    ) -> bool {
        state.target.is_some_and(|t| targets.is_alive(t))
    }

    /// Arm the pursue and reset the firing state.
    pub fn setup(&mut self) {
        self.follow.setup();
        self.firing = false;
    }

    /// Pursue, then fire if in range and facing the target.
    pub fn step(&mut self, dt: Fixed, state: &mut EntityState, ctx: &mut TickContext<'_>) {
        self.follow.step(dt, state, ctx.targets);

        let Some(target) = state.target else {
            self.firing = false;
            return;
        };
        let Some(info) = ctx.targets.get(target) else {
            self.firing = false;
            return;
        };

        let dist_sq = state.position.distance_squared(info.position);
        let range_sq = self.range.0 * self.range.0;
        let bearing = (info.position - state.position).normalize();
        let aligned = state.direction.dot(bearing) >= facing_tolerance();

        if dist_sq <= range_sq && aligned {
            self.firing = true;
            if self.timer.advance(dt) {
                ctx.hits.push(HitRequest {
                    target,
                    result: AttackHitResult::new(self.damage.0),
                });
            }
        } else {
            self.firing = false;
        }
    }

    /// Cease fire and release the pursue.
    pub fn teardown(&mut self) {
        self.follow.teardown();
        self.firing = false;
    }
}

/// Fires at every live entity within a radius of a target position.
///
/// Targets a position (the action destination) rather than an entity; the
/// per-tick target lookup acts as the retrieval strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackZoneAction {
    damage: AttackDamage,
    #[serde(with = "fixed_serde")]
    radius: Fixed,
    timer: AttackTimer,
    firing: bool,
}

impl AttackZoneAction {
    /// Create an area attack behavior.
    #[must_use]
    pub fn new(damage: AttackDamage, radius: Fixed, interval: Fixed) -> Self {
        Self {
            damage,
            radius,
            timer: AttackTimer::new(interval),
            firing: false,
        }
    }

    /// True while the zone weapon is firing.
    #[must_use]
    pub const fn is_firing(&self) -> bool {
        self.firing
    }

    /// Continues while a target position is set.
    #[must_use]
    pub fn check_prerequisite(&self, state: &EntityState) -> bool {
        state.destination.is_some()
    }

    /// Reset the firing state.
    pub fn setup(&mut self) {
        self.firing = false;
    }

    /// Damage everything in the zone on each timer elapse.
    pub fn step(
        &mut self,
        dt: Fixed,
        entity: EntityId,
        state: &mut EntityState,
        ctx: &mut TickContext<'_>,
    ) {
        let Some(center) = state.destination else {
            self.firing = false;
            return;
        };
        self.firing = true;
        if self.timer.advance(dt) {
            for target in ctx.targets.within(center, self.radius) {
                if target == entity {
                    continue;
                }
                ctx.hits.push(HitRequest {
                    target,
                    result: AttackHitResult::new(self.damage.0),
                });
            }
        }
    }

    /// Cease fire.
    pub fn teardown(&mut self) {
        self.firing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{TargetInfo, TargetLookup};
    use crate::data::PlayerId;
    use crate::math::Vec3Fixed;
    use crate::motion::MoveAction;
    use crate::state::BoundedValue;

    fn attacker_state() -> EntityState {
        EntityState::new(
            Vec3Fixed::ZERO,
            Vec3Fixed::new(Fixed::from_num(1), Fixed::ZERO, Fixed::ZERO),
            BoundedValue::full(100),
            BoundedValue::full(100),
        )
    }

    fn lookup_with(target: EntityId, x: i32, alive: bool) -> TargetLookup {
        let mut lookup = TargetLookup::new();
        lookup.insert(
            target,
            TargetInfo {
                position: Vec3Fixed::new(Fixed::from_num(x), Fixed::ZERO, Fixed::ZERO),
                owner: PlayerId(2),
                alive,
            },
        );
        lookup
    }

    #[test]
    fn test_attack_timer_fires_on_interval() {
        let mut timer = AttackTimer::new(Fixed::from_num(1));
        let half = Fixed::from_num(1) / Fixed::from_num(2);
        assert!(!timer.advance(half));
        assert!(timer.advance(half));
        assert!(!timer.advance(half));
    }

    #[test]
    fn test_attack_fires_in_range_and_facing() {
        let target = EntityId(9);
        let lookup = lookup_with(target, 5, true);
        let mut state = attacker_state();
        state.target = Some(target);

        let mut attack = AttackAction::new(
            MoveAction::new(Fixed::from_num(2)),
            AttackDamage(10),
            AttackRange(Fixed::from_num(10)),
            Fixed::from_num(1),
        );
        attack.setup();

        let mut hits = Vec::new();
        let mut ctx = TickContext {
            targets: &lookup,
            hits: &mut hits,
        };
        attack.step(Fixed::from_num(1), &mut state, &mut ctx);
        assert!(attack.is_firing());
        assert_eq!(
            hits,
            vec![HitRequest {
                target,
                result: AttackHitResult::new(10),
            }]
        );
    }

    #[test]
    fn test_attack_holds_fire_out_of_range() {
        let target = EntityId(9);
        let lookup = lookup_with(target, 500, true);
        let mut state = attacker_state();
        state.target = Some(target);

        let mut attack = AttackAction::new(
            MoveAction::new(Fixed::from_num(2)),
            AttackDamage(10),
            AttackRange(Fixed::from_num(10)),
            Fixed::from_num(1),
        );
        attack.setup();

        let mut hits = Vec::new();
        let mut ctx = TickContext {
            targets: &lookup,
            hits: &mut hits,
        };
        attack.step(Fixed::from_num(1), &mut state, &mut ctx);
        assert!(!attack.is_firing());
        assert!(hits.is_empty());
        // Out of pursue range: the follow closed some distance.
        assert!(state.position.x > Fixed::ZERO);
    }

    #[test]
    fn test_attack_holds_fire_when_not_facing() {
        let target = EntityId(9);
        let lookup = lookup_with(target, 5, true);
        let mut state = attacker_state();
        state.target = Some(target);
        // Facing away from the target.
        state.direction = Vec3Fixed::new(Fixed::from_num(-1), Fixed::ZERO, Fixed::ZERO);

        let mut attack = AttackAction::new(
            MoveAction::new(Fixed::ZERO),
            AttackDamage(10),
            AttackRange(Fixed::from_num(10)),
            Fixed::from_num(1),
        );
        attack.setup();

        let mut hits = Vec::new();
        let mut ctx = TickContext {
            targets: &lookup,
            hits: &mut hits,
        };
        attack.step(Fixed::from_num(1), &mut state, &mut ctx);
        assert!(!attack.is_firing());
        assert!(hits.is_empty());
    }

    #[test]
    fn test_attack_prerequisite_fails_on_dead_target() {
        let target = EntityId(9);
        let lookup = lookup_with(target, 5, false);
        let mut state = attacker_state();
        state.target = Some(target);

        let attack = AttackAction::new(
            MoveAction::new(Fixed::from_num(2)),
            AttackDamage(10),
            AttackRange(Fixed::from_num(10)),
            Fixed::from_num(1),
        );
        assert!(!attack.check_prerequisite(&state, &lookup));
    }

    #[test]
    fn test_attack_zone_hits_everything_in_radius() {
        let mut lookup = TargetLookup::new();
        for (id, x) in [(2u64, 1), (3, 4), (4, 50)] {
            lookup.insert(
                EntityId(id),
                TargetInfo {
                    position: Vec3Fixed::new(Fixed::from_num(x), Fixed::ZERO, Fixed::ZERO),
                    owner: PlayerId(2),
                    alive: true,
                },
            );
        }

        let mut state = attacker_state();
        state.destination = Some(Vec3Fixed::ZERO);

        let mut zone = AttackZoneAction::new(
            AttackDamage(7),
            Fixed::from_num(5),
            Fixed::from_num(1),
        );
        zone.setup();

        let mut hits = Vec::new();
        let mut ctx = TickContext {
            targets: &lookup,
            hits: &mut hits,
        };
        zone.step(Fixed::from_num(1), EntityId(1), &mut state, &mut ctx);
        let hit_ids: Vec<EntityId> = hits.iter().map(|h| h.target).collect();
        assert_eq!(hit_ids, vec![EntityId(2), EntityId(3)]);
    }

    #[test]
    fn test_attack_zone_excludes_attacker() {
        let attacker = EntityId(1);
        let mut lookup = TargetLookup::new();
        lookup.insert(
            attacker,
            TargetInfo {
                position: Vec3Fixed::ZERO,
                owner: PlayerId(1),
                alive: true,
            },
        );

        let mut state = attacker_state();
        state.destination = Some(Vec3Fixed::ZERO);

        let mut zone = AttackZoneAction::new(
            AttackDamage(7),
            Fixed::from_num(5),
            Fixed::from_num(1),
        );
        zone.setup();

        let mut hits = Vec::new();
        let mut ctx = TickContext {
            targets: &lookup,
            hits: &mut hits,
        };
        zone.step(Fixed::from_num(1), attacker, &mut state, &mut ctx);
        assert!(hits.is_empty());
    }
}
