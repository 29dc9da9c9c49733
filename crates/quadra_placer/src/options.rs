//! Placement session options.
//!
//! All knobs of the solve/legalize loop, deserializable from a configuration
//! table. Every field has a default, so a partial table (or
//! `PlacerOptions::default()`) yields a working configuration.

use crate::error::{PlaceResult, PlacerError};
use serde::{Deserialize, Serialize};

/// Tuning options for an analytical placement session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacerOptions {
    /// Per-cycle increment of the pseudo-net anchor strength.
    pub anchor_step_alpha: f64,
    /// Number of anchor-free solves before the first legalization.
    pub initial_solves: usize,
    /// Number of solve + legalize cycles in the main loop.
    pub main_iterations: usize,
    /// Conjugate-gradient convergence tolerance on `‖r‖/‖b‖`.
    pub cg_epsilon: f64,
    /// Conjugate-gradient iteration cap; hitting it returns the best iterate.
    pub cg_max_iterations: usize,
    /// Minimum effective coordinate gap in spring weights, preventing
    /// singularities when two pins coincide.
    pub delta_floor: f64,
    /// Weight net springs by the timing oracle on non-initial solves.
    pub timing_driven: bool,
    /// Redistribute I/O pads over the perimeter on the first legalization.
    pub legalize_io: bool,
    /// Per-pass tile capacity, each entry `>= 1.0`; passes beyond the end of
    /// the schedule (and the final pass) run at 1.0.
    pub tile_capacity_schedule: Vec<f64>,
    /// Seed for the session RNG; identical seeds give identical placements.
    pub seed: u64,
}

impl Default for PlacerOptions {
    fn default() -> Self {
        Self {
            anchor_step_alpha: 0.3,
            initial_solves: 7,
            main_iterations: 30,
            cg_epsilon: 1e-4,
            cg_max_iterations: 1500,
            delta_floor: 0.005,
            timing_driven: false,
            legalize_io: true,
            tile_capacity_schedule: vec![1.0],
            seed: 1,
        }
    }
}

impl PlacerOptions {
    /// Checks the options for structural validity.
    ///
    /// # Errors
    ///
    /// Returns [`PlacerError::Configuration`] for non-positive tolerances,
    /// a zero iteration count, or a tile capacity below 1.0.
    pub fn validate(&self) -> PlaceResult<()> {
        if self.initial_solves == 0 {
            return Err(PlacerError::Configuration(
                "initial_solves must be at least 1".into(),
            ));
        }
        if self.main_iterations == 0 {
            return Err(PlacerError::Configuration(
                "main_iterations must be at least 1".into(),
            ));
        }
        if !(self.cg_epsilon > 0.0) {
            return Err(PlacerError::Configuration(
                "cg_epsilon must be positive".into(),
            ));
        }
        if self.cg_max_iterations == 0 {
            return Err(PlacerError::Configuration(
                "cg_max_iterations must be at least 1".into(),
            ));
        }
        if !(self.delta_floor > 0.0) {
            return Err(PlacerError::Configuration(
                "delta_floor must be positive".into(),
            ));
        }
        if self.anchor_step_alpha < 0.0 {
            return Err(PlacerError::Configuration(
                "anchor_step_alpha must not be negative".into(),
            ));
        }
        if let Some(cap) = self
            .tile_capacity_schedule
            .iter()
            .find(|c| !(**c >= 1.0) || !c.is_finite())
        {
            return Err(PlacerError::Configuration(format!(
                "tile capacity {cap} is below 1.0"
            )));
        }
        Ok(())
    }

    /// Returns the tile capacity of the legalization pass with the given
    /// index (pass 0 is the initial legalization).
    ///
    /// Passes past the end of the schedule run at 1.0; the final main pass is
    /// always floored to 1.0 so a best legal solution exists on commit.
    pub fn tile_capacity(&self, pass: usize) -> f64 {
        if pass >= self.main_iterations {
            return 1.0;
        }
        self.tile_capacity_schedule.get(pass).copied().unwrap_or(1.0)
    }
}
