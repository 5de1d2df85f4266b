//! Belief over the robot's state
//!
//! The belief is a histogram over every (intersection, heading) pair on the map, stored as an
//! `intersections x 4` array.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ndarray::Array2;
use ndarray_stats::QuantileExt;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::LocError;
use crate::auto::map::Heading;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A state of the robot on the map.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct State {
    /// Raster index of the intersection the robot is at
    pub index: usize,

    pub heading: Heading,
}

/// Probability distribution over all states.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Belief(pub(super) Array2<f64>);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl State {
    pub fn new(index: usize, heading: Heading) -> Self {
        Self { index, heading }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} facing {}", self.index, self.heading)
    }
}

impl Belief {
    /// Equal probability for every state.
    pub fn uniform(num_intersections: usize) -> Self {
        let p = 1.0 / (num_intersections * 4) as f64;
        Self(Array2::from_elem((num_intersections, 4), p))
    }

    /// All zeros, used as the target of an update before normalisation.
    pub(super) fn zeros(num_intersections: usize) -> Self {
        Self(Array2::zeros((num_intersections, 4)))
    }

    pub fn num_intersections(&self) -> usize {
        self.0.nrows()
    }

    pub fn get(&self, state: State) -> f64 {
        self.0[[state.index, state.heading.index()]]
    }

    pub(super) fn add(&mut self, state: State, mass: f64) {
        self.0[[state.index, state.heading.index()]] += mass;
    }

    pub fn sum(&self) -> f64 {
        self.0.sum()
    }

    /// Iterate over every state with its probability.
    pub fn iter(&self) -> impl Iterator<Item = (State, f64)> + '_ {
        self.0
            .indexed_iter()
            .map(|((i, h), &p)| (State::new(i, Heading::from_index(h)), p))
    }

    /// Scale the belief so it sums to one.
    ///
    /// Fails, leaving the belief unchanged, if there is no mass to scale.
    pub(super) fn normalise(&mut self) -> Result<(), LocError> {
        let total = self.sum();

        if !total.is_finite() || total <= 0.0 {
            return Err(LocError::BeliefCollapsed(total));
        }

        self.0 /= total;
        Ok(())
    }

    /// The most likely state and its probability.
    pub fn peak(&self) -> Result<(State, f64), LocError> {
        let (i, h) = self.0.argmax().map_err(LocError::PeakError)?;
        Ok((State::new(i, Heading::from_index(h)), self.0[[i, h]]))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_uniform() {
        let b = Belief::uniform(6);

        assert_eq!(b.num_intersections(), 6);
        assert!((b.sum() - 1.0).abs() < 1e-12);
        assert!((b.get(State::new(5, Heading::Left)) - 1.0 / 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalise_and_peak() -> Result<(), LocError> {
        let mut b = Belief::zeros(2);
        b.add(State::new(1, Heading::Down), 3.0);
        b.add(State::new(0, Heading::Up), 1.0);

        b.normalise()?;

        assert_eq!(b.peak()?, (State::new(1, Heading::Down), 0.75));
        assert!((b.sum() - 1.0).abs() < 1e-12);

        // An empty belief can't be normalised and is left alone
        let mut empty = Belief::zeros(2);
        assert!(matches!(
            empty.normalise(),
            Err(LocError::BeliefCollapsed(_))
        ));
        assert_eq!(empty, Belief::zeros(2));

        Ok(())
    }
}
