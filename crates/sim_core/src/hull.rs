//! Passive hull protection.

use serde::{Deserialize, Serialize};

use crate::combat::AttackHitResult;
use crate::math::{fixed_serde, Fixed};
use crate::state::{EntityState, DESTROYED};

/// Applies queued hits to hit points, tags destruction, regenerates.
///
/// Passive with an always-true prerequisite: the hull is checked every
/// tick for as long as the entity lives. Damage arrives asynchronously
/// through [`ProtectAction::add_hit_result`] and is applied on the owning
/// entity's next tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectAction {
    /// Hits queued since the last tick.
    pending: Vec<AttackHitResult>,
    /// Hit points regenerated per second.
    #[serde(with = "fixed_serde")]
    regen_rate: Fixed,
    /// Fractional regeneration carried to the next tick.
    #[serde(with = "fixed_serde")]
    accumulated: Fixed,
}

impl ProtectAction {
    /// Create a hull behavior with the given regeneration rate per second.
    #[must_use]
    pub fn new(regen_rate: Fixed) -> Self {
        Self {
            pending: Vec::new(),
            regen_rate,
            accumulated: Fixed::ZERO,
        }
    }

    /// Queue damage for the next tick.
    pub fn add_hit_result(&mut self, result: AttackHitResult) {
        self.pending.push(result);
    }

    /// Number of hits waiting to be applied.
    #[must_use]
    pub fn pending_hits(&self) -> usize {
        self.pending.len()
    }

    /// Apply queued hits, tag destruction at zero hp, then regenerate.
    pub fn step(&mut self, dt: Fixed, state: &mut EntityState) {
        for hit in self.pending.drain(..) {
            state.hp.remove(hit.damage);
        }

        if state.hp.is_zero() {
            state.states.add(DESTROYED);
            return;
        }

        if self.regen_rate > Fixed::ZERO && !state.hp.is_full() {
            self.accumulated += self.regen_rate * dt;
            let whole = self.accumulated.int();
            if whole > Fixed::ZERO {
                self.accumulated -= whole;
                state.hp.add(whole.to_num::<u32>());
            }
        }
    }

    /// Drop any queued hits; used when the entity is torn down.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
