//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces
//! identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! The simulation core must be 100% deterministic so that replays and
//! lockstep peers stay in sync. Sources of non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`sim_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   We always iterate in sorted entity id order.
//!
//! - **System randomness**: No calls to `rand()` without explicit seeds.

use sim_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Final state hash from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated per run.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Build a scenario `runs` times, advance each copy by `ticks`, and
/// compare the final state hashes.
///
/// `scenario` must construct the simulation from scratch on every call;
/// any shared mutable setup would defeat the comparison.
pub fn run_scenario<F>(scenario: F, runs: usize, ticks: u64) -> DeterminismResult
where
    F: Fn() -> Simulation,
{
    let mut hashes = Vec::with_capacity(runs);
    for _ in 0..runs {
        let mut sim = scenario();
        for _ in 0..ticks {
            sim.tick();
        }
        hashes.push(sim.state_hash());
    }
    let is_deterministic = hashes.windows(2).all(|pair| pair[0] == pair[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_empty_simulation_is_deterministic() {
        let result = run_scenario(fixtures::simulation, 3, 10);
        result.assert_deterministic();
        assert_eq!(result.unique_hashes().len(), 1);
    }
}
