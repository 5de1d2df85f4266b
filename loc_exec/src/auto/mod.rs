//! # Autonomy module
//!
//! Localisation and navigation on the street grid. The robot localises itself with [`loc_mgr`]
//! and then drives to its target with [`path_exec`], localising again whenever it gets lost on
//! the way.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Localisation filter - the histogram belief and the motion and sensor models acting on it
pub mod loc;

/// Localisation manager - drives the robot around until the filter converges
pub mod loc_mgr;

/// Map module - the street grid and its building colours
pub mod map;

/// Navigation controller - street following, scanning and turning
pub mod nav;

pub mod notify;

/// Path executor - takes a localised robot to a target intersection
pub mod path_exec;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};
use util::session::Session;

use self::{
    loc::State,
    loc_mgr::{Entry, LocMgr, LocMgrError},
    map::Coord,
    nav::Navigator,
    notify::Notifier,
    path_exec::{LostAt, Outcome, PathExec, PathExecError},
};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("Localisation failed: {0}")]
    LocMgr(#[from] LocMgrError),

    #[error("Path execution failed: {0}")]
    PathExec(#[from] PathExecError),

    #[error("Still lost after localising {0} more times")]
    Lost(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MissionError {
    /// True if the mission stopped because shutdown was requested.
    pub fn is_shutdown(&self) -> bool {
        match self {
            MissionError::LocMgr(e) => e.is_shutdown(),
            MissionError::PathExec(e) => e.is_shutdown(),
            MissionError::Lost(_) => false,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Localise, then drive to `target`, localising again each time the robot gets lost.
///
/// The belief is saved into the session each time the robot localises.
pub fn run_mission<N: Navigator>(
    nav: &mut N,
    loc_mgr: &mut LocMgr,
    path_exec: &PathExec,
    notifier: &mut dyn Notifier,
    target: Coord,
    session: Option<&Session>,
) -> Result<State, MissionError> {
    let mut entry = Entry::Start;
    let mut relocalisations = 0;

    loop {
        let loc = loc_mgr.localise(nav, notifier, entry)?;
        info!(
            "Localised at {} facing {} (p = {:.3}) after {} intersections",
            loc.coord, loc.state.heading, loc.probability, loc.cycles
        );

        if let Some(session) = session {
            session.save(
                format!("belief_{}.json", relocalisations),
                loc_mgr.engine().belief().clone(),
            );
        }

        match path_exec.navigate(nav, loc_mgr, notifier, loc.state, target)? {
            Outcome::Reached(state) => return Ok(state),
            Outcome::Lost(at) => {
                if relocalisations >= path_exec.params().max_relocalisations {
                    return Err(MissionError::Lost(relocalisations));
                }

                relocalisations += 1;
                warn!(
                    "Lost at the {:?}, localising again ({} of {})",
                    at,
                    relocalisations,
                    path_exec.params().max_relocalisations
                );

                entry = match at {
                    LostAt::Intersection => Entry::Intersection,
                    LostAt::Boundary => Entry::Boundary,
                };
            }
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
            loc::{LocEngine, LocParams, Observation},
            loc_mgr::LocMgrParams,
            map::{Heading, Map},
            nav::grid_sim::GridNavigator,
            notify::{test::RecordingNotifier, NotifyEvent},
            path_exec::PathExecParams,
        },
        colour::Colour::*,
    };

    fn corner_map() -> Map {
        let mut cells = vec![[White; 4]; 9];
        cells[0] = [Green, Blue, Blue, White];
        cells[1] = [Blue, Green, White, White];
        Map::new(3, 3, &cells).unwrap()
    }

    fn loc_mgr(map: &Map) -> LocMgr {
        LocMgr::new(
            LocEngine::new(map.clone(), LocParams::default()),
            LocMgrParams::default(),
        )
    }

    #[test]
    fn test_mission() -> Result<(), MissionError> {
        let map = corner_map();
        let mut mgr = loc_mgr(&map);
        let mut nav = GridNavigator::new(map.clone(), Coord::new(0, 0), Heading::Right);
        let mut notifier = RecordingNotifier::default();
        let exec = PathExec::new(PathExecParams::default());

        let state = run_mission(
            &mut nav,
            &mut mgr,
            &exec,
            &mut notifier,
            Coord::new(2, 2),
            None,
        )?;

        assert_eq!(state, State::new(8, Heading::Down));
        assert_eq!(nav.coord, Coord::new(2, 2));
        assert_eq!(nav.turns, vec![1]);
        assert!(notifier
            .events
            .contains(&NotifyEvent::TargetReached(Coord::new(2, 2))));

        Ok(())
    }

    #[test]
    fn test_gives_up_when_lost() {
        let map = corner_map();
        let mut mgr = loc_mgr(&map);

        // Glitched scans make the robot believe it is at (1, 0) when it is really at (2, 1)
        let mut nav = GridNavigator::new(map.clone(), Coord::new(1, 1), Heading::Right);
        nav.fake_scans.push_back(Observation::expected(&map, 0, Heading::Right));
        nav.fake_scans.push_back(Observation::expected(&map, 1, Heading::Right));
        let mut notifier = RecordingNotifier::default();

        let exec = PathExec::new(PathExecParams {
            max_relocalisations: 0,
            ..Default::default()
        });

        match run_mission(
            &mut nav,
            &mut mgr,
            &exec,
            &mut notifier,
            Coord::new(0, 0),
            None,
        ) {
            Err(MissionError::Lost(0)) => (),
            r => panic!("Expected the mission to give up, got {:?}", r),
        }

        assert!(notifier.events.contains(&NotifyEvent::Lost));
    }
}
