//! Sensor model
//!
//! An observation is the four building colours scanned at an intersection. It is compared against
//! the map's buildings at every intersection under each of the four headings the robot could have.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{belief::Belief, LocError, State};
use crate::{
    auto::map::{Heading, Map, NUM_BUILDINGS},
    colour::Colour,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Building colours seen at an intersection, relative to the robot: front-left, front-right,
/// back-right, back-left.
///
/// For a robot facing up this is the same order the map stores buildings in. For a robot with
/// heading `h` position `k` of the observation corresponds to map slot `(k + h) mod 4`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation(pub [Colour; NUM_BUILDINGS]);

/// Likelihood of an observation at an intersection.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SensorParams {
    /// Headings under which the observation exactly matches the map
    pub p_match: f64,

    /// Other headings at an intersection that matched under some heading (the mismatch mass is
    /// split between all three)
    pub p_mismatch: f64,

    /// Every heading of an intersection where the observation matches under no heading
    pub p_no_match: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Observation {
    /// Build an observation from the building votes of a clockwise scan that started on the
    /// street ahead, so the first vote is the front-right building.
    pub fn from_sweep(sweep: [Colour; NUM_BUILDINGS]) -> Self {
        Self([sweep[3], sweep[0], sweep[1], sweep[2]])
    }

    /// The observation a robot at `index` facing `heading` would make on a noise free map.
    pub fn expected(map: &Map, index: usize, heading: Heading) -> Self {
        let b = map.buildings(index);
        let mut obs = [Colour::Unknown; NUM_BUILDINGS];
        for (k, o) in obs.iter_mut().enumerate() {
            *o = b[(k + heading.index()) % NUM_BUILDINGS];
        }
        Self(obs)
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.iter() {
            write!(f, "{}", c.letter())?;
        }
        Ok(())
    }
}

impl Default for SensorParams {
    fn default() -> Self {
        Self {
            p_match: 0.95,
            p_mismatch: 0.05,
            p_no_match: 0.01,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Headings under which the observation matches the buildings at `index`.
pub fn matching_headings(map: &Map, index: usize, obs: &Observation) -> Vec<Heading> {
    Heading::ALL
        .iter()
        .copied()
        .filter(|&h| Observation::expected(map, index, h) == *obs)
        .collect()
}

/// Likelihood of the observation for each heading at an intersection.
pub fn likelihood(
    map: &Map,
    params: &SensorParams,
    index: usize,
    obs: &Observation,
) -> [f64; 4] {
    let matches = matching_headings(map, index, obs);

    if matches.is_empty() {
        return [params.p_no_match; 4];
    }

    let mut lik = [params.p_mismatch / 3.0; 4];
    for h in matches {
        lik[h.index()] = params.p_match;
    }
    lik
}

/// Weight the belief by the likelihood of the observation and renormalise.
pub fn correct(
    map: &Map,
    params: &SensorParams,
    prior: &Belief,
    obs: &Observation,
) -> Result<Belief, LocError> {
    let mut post = Belief::zeros(prior.num_intersections());

    for index in 0..prior.num_intersections() {
        let lik = likelihood(map, params, index, obs);

        for &heading in Heading::ALL.iter() {
            let state = State::new(index, heading);
            post.add(state, prior.get(state) * lik[heading.index()]);
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
    use Colour::*;

    #[test]
    fn test_from_sweep() {
        // Facing up the sweep sees top-right first
        let map = Map::new(1, 1, &[[Green, Blue, White, White]]).unwrap();
        let obs = Observation::from_sweep([Blue, White, White, Green]);

        assert_eq!(obs, Observation::expected(&map, 0, Heading::Up));
        assert_eq!(obs.to_string(), "GBWW");
    }

    #[test]
    fn test_matching_asymmetric() {
        let map = Map::new(1, 1, &[[Green, Blue, White, White]]).unwrap();

        for &h in Heading::ALL.iter() {
            let obs = Observation::expected(&map, 0, h);
            assert_eq!(matching_headings(&map, 0, &obs), vec![h]);
        }

        assert!(matching_headings(&map, 0, &Observation([Blue, Blue, Blue, Blue])).is_empty());
    }

    #[test]
    fn test_matching_all_white() {
        let map = Map::new(2, 1, &[[White; 4], [Green, Blue, White, White]]).unwrap();
        let params = SensorParams::default();
        let obs = Observation([White; 4]);

        assert_eq!(matching_headings(&map, 0, &obs), Heading::ALL.to_vec());

        // Every heading is equally likely at both intersections
        assert_eq!(likelihood(&map, &params, 0, &obs), [0.95; 4]);
        assert_eq!(likelihood(&map, &params, 1, &obs), [0.01; 4]);

        let post = correct(&map, &params, &Belief::uniform(2), &obs).unwrap();
        for i in 0..2 {
            let p0 = post.get(State::new(i, Heading::Up));
            assert!(Heading::ALL
                .iter()
                .all(|&h| (post.get(State::new(i, h)) - p0).abs() < 1e-12));
        }
    }

    #[test]
    fn test_correct_raises_matching_state() -> Result<(), LocError> {
        let map = Map::new(
            2,
            2,
            &[
                [Green, Blue, White, White],
                [Blue, Blue, Green, White],
                [White; 4],
                [Green, Green, Blue, White],
            ],
        )
        .unwrap();
        let params = SensorParams::default();
        let prior = Belief::uniform(4);
        let target = State::new(1, Heading::Down);

        let obs = Observation::expected(&map, target.index, target.heading);
        let post = correct(&map, &params, &prior, &obs)?;

        assert!(post.get(target) > prior.get(target));
        assert_eq!(post.peak()?.0, target);
        assert!(post
            .iter()
            .filter(|(s, _)| *s != target)
            .all(|(_, p)| p < post.get(target)));
        assert!((post.sum() - 1.0).abs() < 1e-12);

        Ok(())
    }
}
