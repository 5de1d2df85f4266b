//! # Localisation module
//!
//! Histogram filter over the robot's (intersection, heading) state. After every street traversal
//! the belief is pushed through the motion model (predict) and then weighted by the building
//! colours scanned at the new intersection (correct). The robot is localised once a single state
//! holds more than the convergence threshold of the probability mass.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod belief;
pub mod motion;
pub mod sensor;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use ndarray_stats::errors::MinMaxError;
use serde::{Deserialize, Serialize};

use super::map::{Coord, Map};

pub use belief::{Belief, State};
pub use motion::{MotionCommand, MotionParams};
pub use sensor::{Observation, SensorParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the localisation filter.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct LocParams {
    pub motion: MotionParams,

    pub sensor: SensorParams,

    /// The robot is localised once a state's probability is strictly above this value
    pub convergence_threshold: f64,
}

/// Localisation engine, owns the map and the belief over the robot's state on it.
#[derive(Debug, Clone)]
pub struct LocEngine {
    map: Map,

    params: LocParams,

    belief: Belief,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LocError {
    #[error("No probability mass left in the belief after the update (total was {0})")]
    BeliefCollapsed(f64),

    #[error("Cannot find the belief's peak: {0}")]
    PeakError(MinMaxError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for LocParams {
    fn default() -> Self {
        Self {
            motion: MotionParams::default(),
            sensor: SensorParams::default(),
            convergence_threshold: 0.8,
        }
    }
}

impl LocEngine {
    /// Create a new engine with a uniform belief over the map.
    pub fn new(map: Map, params: LocParams) -> Self {
        let belief = Belief::uniform(map.num_intersections());

        Self {
            map,
            params,
            belief,
        }
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn belief(&self) -> &Belief {
        &self.belief
    }

    /// Apply the motion model for a turn of `turn` clockwise quarter turns followed by one street
    /// traversal.
    pub fn predict(&mut self, turn: i32) -> Result<(), LocError> {
        self.belief = motion::predict(&self.map, &self.params.motion, &self.belief, turn)?;
        Ok(())
    }

    /// Apply the sensor model for an observation, returning the localised state if the belief
    /// has converged.
    pub fn correct(&mut self, obs: &Observation) -> Result<Option<State>, LocError> {
        self.belief = sensor::correct(&self.map, &self.params.sensor, &self.belief, obs)?;
        self.winning_state()
    }

    /// Run a full filter cycle for an observation and the motion that led to it.
    ///
    /// Predict is skipped for motions that can't be modelled. The belief is only replaced once
    /// the whole cycle succeeds.
    pub fn update(
        &mut self,
        cmd: MotionCommand,
        obs: &Observation,
    ) -> Result<Option<State>, LocError> {
        let predicted = match cmd.turn() {
            Some(turn) => motion::predict(&self.map, &self.params.motion, &self.belief, turn)?,
            None => self.belief.clone(),
        };
        let corrected = sensor::correct(&self.map, &self.params.sensor, &predicted, obs)?;

        self.belief = corrected;

        let (peak, p) = self.belief.peak()?;
        debug!(
            "Filter update ({:?}, obs {}): peak {} at {} with p = {:.4}",
            cmd,
            obs,
            peak,
            self.map.coord(peak.index),
            p
        );

        self.winning_state()
    }

    /// True if some state's probability is above the convergence threshold.
    pub fn is_converged(&self) -> bool {
        matches!(self.winning_state(), Ok(Some(_)))
    }

    /// The state whose probability is above the convergence threshold, if any.
    pub fn winning_state(&self) -> Result<Option<State>, LocError> {
        let (state, p) = self.belief.peak()?;

        if p > self.params.convergence_threshold {
            Ok(Some(state))
        } else {
            Ok(None)
        }
    }

    /// The most likely state and its probability, whether or not it has converged.
    pub fn peak(&self) -> Result<(State, f64), LocError> {
        self.belief.peak()
    }

    /// Grid position of a state.
    pub fn coord(&self, state: State) -> Coord {
        self.map.coord(state.index)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{auto::map::Heading, colour::Colour::*};

    /// Two top intersections look the same, so one scan can't tell them apart.
    fn twin_map() -> Map {
        Map::new(
            2,
            2,
            &[
                [Green, Blue, White, White],
                [Green, Blue, White, White],
                [Blue, Blue, Green, White],
                [Green, Green, Blue, White],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_two_observations_converge() -> Result<(), LocError> {
        let map = twin_map();
        let mut engine = LocEngine::new(map.clone(), LocParams::default());

        // Start at (0, 0) facing right, both top intersections match
        let first = Observation::expected(&map, 0, Heading::Right);
        assert_eq!(engine.update(MotionCommand::Start, &first)?, None);
        assert!(!engine.is_converged());

        // Turn right and drive down to (0, 1), which only matches one state
        let second = Observation::expected(&map, 2, Heading::Down);
        let localised = engine.update(MotionCommand::Advance { turn: 1 }, &second)?;

        assert_eq!(localised, Some(State::new(2, Heading::Down)));
        assert!(engine.is_converged());
        assert!((engine.belief().sum() - 1.0).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn test_corner_and_neighbour_converge() -> Result<(), LocError> {
        // 3x3 map where only the top-left corner and its right hand neighbour are distinctive
        let mut cells = vec![[White; 4]; 9];
        cells[0] = [Green, Blue, Blue, White];
        cells[1] = [Blue, Green, White, White];
        let map = Map::new(3, 3, &cells).unwrap();

        let mut engine = LocEngine::new(map.clone(), LocParams::default());

        let obs = Observation::expected(&map, 0, Heading::Right);
        assert_eq!(engine.update(MotionCommand::Start, &obs)?, None);

        let obs = Observation::expected(&map, 1, Heading::Right);
        assert_eq!(
            engine.update(MotionCommand::Advance { turn: 0 }, &obs)?,
            Some(State::new(1, Heading::Right))
        );

        Ok(())
    }

    #[test]
    fn test_invalid_motion_skips_predict() -> Result<(), LocError> {
        let map = twin_map();
        let mut engine = LocEngine::new(map.clone(), LocParams::default());

        let obs = Observation::expected(&map, 0, Heading::Right);
        engine.update(MotionCommand::Start, &obs)?;
        let before = engine.belief().clone();

        // Without a predict the twins stay equally likely, the mass has not moved down
        engine.update(MotionCommand::Invalid, &obs)?;
        let after = engine.belief();

        let twin_a = State::new(0, Heading::Right);
        let twin_b = State::new(1, Heading::Right);
        assert!((after.get(twin_a) - after.get(twin_b)).abs() < 1e-12);
        assert!(after.get(twin_a) > before.get(twin_a));

        Ok(())
    }

    #[test]
    fn test_failed_update_keeps_belief() {
        // A single intersection can never be left, so every prediction collapses
        let map = Map::new(1, 1, &[[Green, Blue, White, White]]).unwrap();
        let mut engine = LocEngine::new(map.clone(), LocParams::default());
        let before = engine.belief().clone();

        let obs = Observation::expected(&map, 0, Heading::Up);
        assert!(engine
            .update(MotionCommand::Advance { turn: 0 }, &obs)
            .is_err());
        assert_eq!(engine.belief(), &before);
    }

    #[test]
    fn test_predict_then_correct_keep_unit_mass() -> Result<(), LocError> {
        let map = twin_map();
        let mut engine = LocEngine::new(map.clone(), LocParams::default());

        engine.predict(1)?;
        assert!((engine.belief().sum() - 1.0).abs() < 1e-9);
        assert!(engine.belief().iter().all(|(_, p)| p >= 0.0));

        engine.correct(&Observation::expected(&map, 3, Heading::Left))?;
        assert!((engine.belief().sum() - 1.0).abs() < 1e-9);
        assert!(engine.belief().iter().all(|(_, p)| p >= 0.0));

        Ok(())
    }
}
