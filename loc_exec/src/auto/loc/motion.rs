//! Motion model
//!
//! Moving between intersections is noisy: the robot may drift onto a neighbouring street or miss
//! an intersection entirely. The model turns the robot on the spot and then spreads its mass over
//! the intersection ahead, the two diagonally ahead, and the one two steps ahead.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{belief::Belief, LocError, State};
use crate::auto::map::Map;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Probabilities of where a single street traversal ends up.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct MotionParams {
    /// Arriving at the intersection directly ahead
    pub p_ahead: f64,

    /// Arriving one intersection to either side of the one ahead (applies to each side)
    pub p_slip: f64,

    /// Missing the intersection ahead and stopping at the one after it
    pub p_overshoot: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The motion that took the robot to the intersection it has just observed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionCommand {
    /// No motion yet, this is the first observation
    Start,

    /// Turned by the given number of clockwise quarter turns then followed one street
    Advance { turn: i32 },

    /// The motion was not a clean street traversal (for example the robot left the map and had
    /// to recover), it can't be predicted.
    Invalid,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            p_ahead: 0.85,
            p_slip: 0.05,
            p_overshoot: 0.05,
        }
    }
}

impl MotionCommand {
    /// The turn to predict with, if the motion can be predicted at all.
    pub fn turn(&self) -> Option<i32> {
        match self {
            MotionCommand::Advance { turn } => Some(*turn),
            MotionCommand::Start | MotionCommand::Invalid => None,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Predict the belief after turning by `turn` quarter turns and following one street.
///
/// Mass landing off the map is dropped, the result is renormalised over what remains.
pub fn predict(
    map: &Map,
    params: &MotionParams,
    prior: &Belief,
    turn: i32,
) -> Result<Belief, LocError> {
    let mut post = Belief::zeros(prior.num_intersections());

    for (state, mass) in prior.iter() {
        if mass <= 0.0 {
            continue;
        }

        let heading = state.heading.turned(turn);
        let (fx, fy) = heading.step();

        // Lateral step, perpendicular to the direction of travel
        let (lx, ly) = (-fy, fx);

        let dests = [
            (fx, fy, params.p_ahead),
            (fx + lx, fy + ly, params.p_slip),
            (fx - lx, fy - ly, params.p_slip),
            (2 * fx, 2 * fy, params.p_overshoot),
        ];

        let origin = map.coord(state.index);

        for &(dx, dy, p) in dests.iter() {
            if let Some(dest) = map.offset(origin, dx, dy) {
                post.add(State::new(map.index(dest), heading), mass * p);
            }
        }
    }

    post.normalise()?;

    Ok(post)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        auto::map::{Coord, Heading},
        colour::Colour,
    };

    fn blank_map(sx: usize, sy: usize) -> Map {
        Map::new(sx, sy, &vec![[Colour::White; 4]; sx * sy]).unwrap()
    }

    fn point_belief(map: &Map, state: State) -> Belief {
        let mut b = Belief::zeros(map.num_intersections());
        b.add(state, 1.0);
        b
    }

    #[test]
    fn test_predict_interior() -> Result<(), LocError> {
        let map = blank_map(5, 5);
        let at = |x, y| map.index(Coord::new(x, y));
        let prior = point_belief(&map, State::new(at(2, 2), Heading::Up));

        let post = predict(&map, &MotionParams::default(), &prior, 0)?;

        // Nothing falls off the map, so all outgoing weight is kept as is
        assert!((post.sum() - 1.0).abs() < 1e-12);
        assert!((post.get(State::new(at(2, 1), Heading::Up)) - 0.85).abs() < 1e-12);
        assert!((post.get(State::new(at(1, 1), Heading::Up)) - 0.05).abs() < 1e-12);
        assert!((post.get(State::new(at(3, 1), Heading::Up)) - 0.05).abs() < 1e-12);
        assert!((post.get(State::new(at(2, 0), Heading::Up)) - 0.05).abs() < 1e-12);

        Ok(())
    }

    #[test]
    fn test_predict_turn() -> Result<(), LocError> {
        let map = blank_map(5, 5);
        let at = |x, y| map.index(Coord::new(x, y));
        let prior = point_belief(&map, State::new(at(2, 2), Heading::Up));

        // Turning anticlockwise then advancing heads left
        let post = predict(&map, &MotionParams::default(), &prior, -1)?;

        assert!((post.get(State::new(at(1, 2), Heading::Left)) - 0.85).abs() < 1e-12);
        assert!((post.get(State::new(at(1, 1), Heading::Left)) - 0.05).abs() < 1e-12);
        assert!((post.get(State::new(at(1, 3), Heading::Left)) - 0.05).abs() < 1e-12);
        assert!((post.get(State::new(at(0, 2), Heading::Left)) - 0.05).abs() < 1e-12);

        // No mass is left facing any other way
        assert!(post
            .iter()
            .filter(|(s, _)| s.heading != Heading::Left)
            .all(|(_, p)| p == 0.0));

        Ok(())
    }

    #[test]
    fn test_predict_edge_renormalises() -> Result<(), LocError> {
        let map = blank_map(3, 3);
        let at = |x, y| map.index(Coord::new(x, y));
        let prior = point_belief(&map, State::new(at(0, 1), Heading::Up));

        let post = predict(&map, &MotionParams::default(), &prior, 0)?;

        // The left slip and the overshoot fall off the map
        assert!((post.get(State::new(at(0, 0), Heading::Up)) - 0.85 / 0.9).abs() < 1e-12);
        assert!((post.get(State::new(at(1, 0), Heading::Up)) - 0.05 / 0.9).abs() < 1e-12);
        assert!((post.sum() - 1.0).abs() < 1e-12);

        Ok(())
    }

    #[test]
    fn test_predict_everything_off_map() {
        let map = blank_map(2, 2);
        let prior = point_belief(&map, State::new(0, Heading::Left));

        assert!(matches!(
            predict(&map, &MotionParams::default(), &prior, 0),
            Err(LocError::BeliefCollapsed(_))
        ));
    }
}
