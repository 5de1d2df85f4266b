//! # Localisation manager
//!
//! Runs the localisation loop: follow a street, scan the intersection at its end, feed the scan and
//! the motion that led there to the [`LocEngine`], and explore further until the belief converges.
//! Boundaries hit on the way are recovered from without touching the belief, the next scan is
//! applied with no prediction.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};
use serde::{Deserialize, Serialize};
use util::{archive::Archiver, session};

use super::{
    loc::{LocEngine, LocError, MotionCommand, Observation, State},
    map::Coord,
    nav::{ExplorePolicy, NavError, Navigator, StreetEnd},
    notify::{Notifier, NotifyEvent},
};
use crate::robot::RobotError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LocMgrParams {
    /// Number of intersections scanned before giving up
    pub max_cycles: usize,

    pub explore: ExplorePolicy,
}

pub struct LocMgr {
    engine: LocEngine,

    params: LocMgrParams,

    explore: ExplorePolicy,

    /// Total number of filter cycles run, across every localisation
    cycles: usize,

    archiver: Option<Archiver>,
}

/// The result of a successful localisation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Localised {
    pub state: State,

    pub coord: Coord,

    pub probability: f64,

    /// Number of intersections scanned to get there
    pub cycles: usize,
}

/// One filter cycle, as archived.
#[derive(Serialize, Debug)]
struct CycleRecord {
    time_s: f64,
    cycle: usize,
    motion: String,
    observation: String,
    peak_x: usize,
    peak_y: usize,
    peak_heading: String,
    peak_p: f64,
    converged: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Where the robot is when localisation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// Anywhere on a street
    Start,

    /// At an intersection whose scan has already been applied to the belief
    Intersection,

    /// On the map boundary
    Boundary,
}

#[derive(Debug, thiserror::Error)]
pub enum LocMgrError {
    #[error("Navigation error: {0}")]
    Nav(#[from] NavError),

    #[error("Localisation filter error: {0}")]
    Loc(#[from] LocError),

    #[error("Could not notify the operator: {0}")]
    Notify(RobotError),

    #[error("The belief did not converge after {0} intersections")]
    NotConverged(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for LocMgrParams {
    fn default() -> Self {
        Self {
            max_cycles: 50,
            explore: ExplorePolicy::default(),
        }
    }
}

impl LocMgrError {
    pub fn is_shutdown(&self) -> bool {
        match self {
            LocMgrError::Nav(e) => e.is_shutdown(),
            LocMgrError::Notify(e) => e.is_shutdown(),
            _ => false,
        }
    }
}

impl LocMgr {
    pub fn new(engine: LocEngine, params: LocMgrParams) -> Self {
        let explore = params.explore.clone();

        Self {
            engine,
            params,
            explore,
            cycles: 0,
            archiver: None,
        }
    }

    /// Archive every filter cycle.
    pub fn with_archiver(mut self, archiver: Archiver) -> Self {
        self.archiver = Some(archiver);
        self
    }

    pub fn engine(&self) -> &LocEngine {
        &self.engine
    }

    /// Apply a scan made away from the localisation loop, such as while following a path.
    pub fn update(
        &mut self,
        cmd: MotionCommand,
        obs: &Observation,
    ) -> Result<Option<State>, LocMgrError> {
        self.cycles += 1;
        let winner = self.engine.update(cmd, obs)?;
        self.archive(cmd, obs, winner.is_some());
        Ok(winner)
    }

    /// Localise the robot, driving it around until the belief converges.
    ///
    /// The belief is kept from any previous localisation, so re-localising after getting lost
    /// carries on from what is already known.
    pub fn localise<N: Navigator>(
        &mut self,
        nav: &mut N,
        notifier: &mut dyn Notifier,
        entry: Entry,
    ) -> Result<Localised, LocMgrError> {
        info!("Localising from {:?}", entry);
        self.explore.reset();

        let mut cycles = 0;
        let mut line_up = true;

        let mut last = match entry {
            Entry::Start => MotionCommand::Start,
            Entry::Boundary => {
                nav.recover_boundary()?;
                MotionCommand::Invalid
            }
            Entry::Intersection => {
                if let Some(state) = self.engine.winning_state()? {
                    return self.finish(nav, notifier, state, cycles);
                }

                line_up = false;
                self.explore_on(nav)?
            }
        };

        loop {
            match nav.follow_street(line_up)? {
                StreetEnd::Intersection => {
                    let obs = nav.scan_intersection()?;
                    for colour in obs.0.iter() {
                        notifier
                            .notify(&NotifyEvent::BuildingScanned(*colour), nav)
                            .map_err(LocMgrError::Notify)?;
                    }

                    cycles += 1;
                    if let Some(state) = self.update(last, &obs)? {
                        return self.finish(nav, notifier, state, cycles);
                    }

                    if cycles >= self.params.max_cycles {
                        return Err(LocMgrError::NotConverged(cycles));
                    }

                    last = self.explore_on(nav)?;
                    line_up = false;
                }
                StreetEnd::Boundary => {
                    warn!("Hit the map boundary while localising");
                    nav.recover_boundary()?;
                    last = MotionCommand::Invalid;
                    line_up = true;
                }
            }
        }
    }

    /// Make the next exploration turn and leave the intersection, returning the motion the next
    /// scan will have been reached by.
    fn explore_on<N: Navigator>(&mut self, nav: &mut N) -> Result<MotionCommand, LocMgrError> {
        let turn = self.explore.next_turn();
        if turn != 0 {
            nav.turn(turn)?;
        }
        nav.leave_intersection()?;

        Ok(MotionCommand::Advance { turn })
    }

    fn finish<N: Navigator>(
        &mut self,
        nav: &mut N,
        notifier: &mut dyn Notifier,
        state: State,
        cycles: usize,
    ) -> Result<Localised, LocMgrError> {
        nav.localised()?;

        let coord = self.engine.coord(state);
        let probability = self.engine.belief().get(state);

        notifier
            .notify(
                &NotifyEvent::Localised {
                    coord,
                    heading: state.heading,
                },
                nav,
            )
            .map_err(LocMgrError::Notify)?;

        Ok(Localised {
            state,
            coord,
            probability,
            cycles,
        })
    }

    fn archive(&mut self, cmd: MotionCommand, obs: &Observation, converged: bool) {
        let archiver = match self.archiver {
            Some(ref mut a) => a,
            None => return,
        };

        let (peak, peak_p) = match self.engine.peak() {
            Ok(p) => p,
            Err(e) => {
                warn!("Cannot archive the filter cycle: {}", e);
                return;
            }
        };
        let coord = self.engine.coord(peak);

        let record = CycleRecord {
            time_s: session::get_elapsed_seconds(),
            cycle: self.cycles,
            motion: format!("{:?}", cmd),
            observation: obs.to_string(),
            peak_x: coord.x,
            peak_y: coord.y,
            peak_heading: peak.heading.to_string(),
            peak_p,
            converged,
        };

        if let Err(e) = archiver.serialise(&record) {
            warn!("Cannot archive the filter cycle: {}", e);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        auto::{
            loc::LocParams,
            map::{Heading, Map},
            nav::grid_sim::GridNavigator,
            notify::test::RecordingNotifier,
        },
        colour::Colour::{self, *},
    };

    /// 3x3 map where only the top-left corner and its right hand neighbour are distinctive.
    fn corner_map() -> Map {
        let mut cells = vec![[White; 4]; 9];
        cells[0] = [Green, Blue, Blue, White];
        cells[1] = [Blue, Green, White, White];
        Map::new(3, 3, &cells).unwrap()
    }

    fn loc_mgr(map: &Map, max_cycles: usize) -> LocMgr {
        LocMgr::new(
            LocEngine::new(map.clone(), LocParams::default()),
            LocMgrParams {
                max_cycles,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_localise_from_street() -> Result<(), LocMgrError> {
        let map = corner_map();
        let mut mgr = loc_mgr(&map, 10);
        let mut nav = GridNavigator::new(map.clone(), Coord::new(0, 0), Heading::Right);
        let mut notifier = RecordingNotifier::default();

        let loc = mgr.localise(&mut nav, &mut notifier, Entry::Start)?;

        assert_eq!(loc.state, State::new(1, Heading::Right));
        assert_eq!(loc.coord, Coord::new(1, 0));
        assert_eq!(loc.cycles, 2);
        assert!(loc.probability > 0.8);

        // Went straight on between the two scans
        assert_eq!(nav.state(), loc.state);
        assert!(nav.turns.is_empty());
        assert!(nav.localised);

        let scanned: Vec<Colour> = notifier
            .events
            .iter()
            .filter_map(|e| match e {
                NotifyEvent::BuildingScanned(c) => Some(*c),
                _ => None,
            })
            .collect();
        assert_eq!(scanned.len(), 8);
        assert_eq!(
            notifier.events.last(),
            Some(&NotifyEvent::Localised {
                coord: Coord::new(1, 0),
                heading: Heading::Right
            })
        );

        Ok(())
    }

    #[test]
    fn test_boundary_is_not_predicted() {
        let map = corner_map();
        let mut mgr = loc_mgr(&map, 2);

        // Facing off the top of the map after the first intersection
        let mut nav = GridNavigator::new(map.clone(), Coord::new(0, 0), Heading::Up);
        let mut notifier = RecordingNotifier::default();

        match mgr.localise(&mut nav, &mut notifier, Entry::Start) {
            Err(LocMgrError::NotConverged(2)) => (),
            r => panic!("Expected no convergence, got {:?}", r),
        }

        assert_eq!(nav.boundaries, 1);
        assert_eq!(nav.coord, Coord::new(0, 1));

        // With no prediction the corner's mass stays put and is scaled down by the white scan
        let belief = mgr.engine().belief();
        assert!(belief.get(State::new(0, Heading::Up)) < 0.05);
        assert!(!nav.localised);
    }

    #[test]
    fn test_already_localised_at_intersection() -> Result<(), LocMgrError> {
        let map = corner_map();
        let mut mgr = loc_mgr(&map, 10);

        mgr.update(
            MotionCommand::Start,
            &Observation::expected(&map, 0, Heading::Right),
        )?;
        let winner = mgr.update(
            MotionCommand::Advance { turn: 0 },
            &Observation::expected(&map, 1, Heading::Right),
        )?;
        assert!(winner.is_some());

        let mut nav = GridNavigator::new(map.clone(), Coord::new(1, 0), Heading::Right);
        let mut notifier = RecordingNotifier::default();

        // Nothing needs to move
        let loc = mgr.localise(&mut nav, &mut notifier, Entry::Intersection)?;
        assert_eq!(loc.state, State::new(1, Heading::Right));
        assert_eq!(loc.cycles, 0);
        assert_eq!(nav.streets_followed, 0);

        Ok(())
    }
}
