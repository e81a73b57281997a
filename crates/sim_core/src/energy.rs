//! Passive energy production.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};
use crate::state::EntityState;

/// Replenishes energy at a fixed rate while below maximum.
///
/// Passive: the entity never starts or stops it explicitly; it runs
/// whenever energy is not full. Fractional production carries over between
/// ticks through an accumulator so slow rates still add up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProduceEnergyAction {
    /// Energy produced per second.
    #[serde(with = "fixed_serde")]
    rate: Fixed,
    /// Fractional production carried to the next tick.
    #[serde(with = "fixed_serde")]
    accumulated: Fixed,
}

impl ProduceEnergyAction {
    /// Create a production behavior with the given rate per second.
    #[must_use]
    pub fn new(rate: Fixed) -> Self {
        Self {
            rate,
            accumulated: Fixed::ZERO,
        }
    }

    /// Only runs while energy is below maximum.
    #[must_use]
    pub fn check_prerequisite(&self, state: &EntityState) -> bool {
        state.energy.current() < state.energy.max()
    }

    /// Accumulate production and transfer whole points into the store.
    pub fn step(&mut self, dt: Fixed, state: &mut EntityState) {
        self.accumulated += self.rate * dt;
        let whole = self.accumulated.int();
        if whole > Fixed::ZERO {
            self.accumulated -= whole;
            state.energy.add(whole.to_num::<u32>());
        }
    }
}
