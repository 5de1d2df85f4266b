//! # Path executor
//!
//! Takes a localised robot to a target intersection. The path fixes the x coordinate first, then
//! the y coordinate, each as a single straight leg along the grid.
//!
//! With the watchdog enabled every intersection reached on the way is scanned and fed to the
//! filter, and the robot is declared lost as soon as the belief's peak is not where the robot
//! should be.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::{
    loc::{LocError, MotionCommand, State},
    loc_mgr::{LocMgr, LocMgrError},
    map::{Coord, Heading},
    nav::{NavError, Navigator, StreetEnd},
    notify::{Notifier, NotifyEvent},
};
use crate::robot::RobotError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PathExecParams {
    /// Scan every intersection on the way and check the belief still agrees
    pub watchdog: bool,

    /// Number of times the robot may localise again after getting lost
    pub max_relocalisations: usize,
}

/// A straight run of `count` streets facing `heading`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leg {
    pub heading: Heading,
    pub count: usize,
}

pub struct PathExec {
    params: PathExecParams,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// At the target, facing along the last leg
    Reached(State),

    Lost(LostAt),
}

/// Where the robot was when it got lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LostAt {
    /// At an intersection whose scan disagreed with the belief
    Intersection,

    /// On the map boundary
    Boundary,
}

#[derive(Debug, thiserror::Error)]
pub enum PathExecError {
    #[error("Navigation error: {0}")]
    Nav(#[from] NavError),

    #[error("Localisation error: {0}")]
    LocMgr(#[from] LocMgrError),

    #[error("Localisation filter error: {0}")]
    Loc(#[from] LocError),

    #[error("Could not notify the operator: {0}")]
    Notify(RobotError),

    #[error("The target {0} is not on the map")]
    TargetOffMap(Coord),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for PathExecParams {
    fn default() -> Self {
        Self {
            watchdog: true,
            max_relocalisations: 3,
        }
    }
}

impl PathExecError {
    pub fn is_shutdown(&self) -> bool {
        match self {
            PathExecError::Nav(e) => e.is_shutdown(),
            PathExecError::LocMgr(e) => e.is_shutdown(),
            PathExecError::Notify(e) => e.is_shutdown(),
            _ => false,
        }
    }
}

impl PathExec {
    pub fn new(params: PathExecParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PathExecParams {
        &self.params
    }

    /// Drive from the localised `start` state to `target`.
    pub fn navigate<N: Navigator>(
        &self,
        nav: &mut N,
        loc_mgr: &mut LocMgr,
        notifier: &mut dyn Notifier,
        start: State,
        target: Coord,
    ) -> Result<Outcome, PathExecError> {
        let map = loc_mgr.engine().map().clone();
        if !map.contains(target) {
            return Err(PathExecError::TargetOffMap(target));
        }

        let mut coord = map.coord(start.index);
        let mut heading = start.heading;
        info!("Navigating from {} facing {} to {}", coord, heading, target);

        for leg in plan(coord, target) {
            let turn = heading.turns_to(leg.heading);
            if turn != 0 {
                nav.turn(turn)?;
                heading = leg.heading;
            }

            for i in 0..leg.count {
                nav.leave_intersection()?;

                if nav.follow_street(false)? == StreetEnd::Boundary {
                    warn!("Hit the map boundary on the way to {}", target);
                    return self.lost(nav, notifier, LostAt::Boundary);
                }

                let (dx, dy) = heading.step();
                coord = match map.offset(coord, dx, dy) {
                    Some(c) => c,
                    None => return self.lost(nav, notifier, LostAt::Boundary),
                };
                info!("Reached {}", coord);

                if self.params.watchdog {
                    let obs = nav.scan_intersection()?;
                    let cmd = MotionCommand::Advance {
                        turn: if i == 0 { turn } else { 0 },
                    };
                    loc_mgr.update(cmd, &obs)?;

                    let expected = State::new(map.index(coord), heading);
                    let (peak, p) = loc_mgr.engine().peak()?;
                    if peak != expected {
                        warn!(
                            "Expected to be at {} facing {} but the belief peaks at {} facing {} \
                             (p = {:.3})",
                            coord,
                            heading,
                            map.coord(peak.index),
                            peak.heading,
                            p
                        );
                        return self.lost(nav, notifier, LostAt::Intersection);
                    }
                }
            }
        }

        nav.localised()?;
        notifier
            .notify(&NotifyEvent::TargetReached(target), nav)
            .map_err(PathExecError::Notify)?;

        Ok(Outcome::Reached(State::new(map.index(target), heading)))
    }

    fn lost<N: Navigator>(
        &self,
        nav: &mut N,
        notifier: &mut dyn Notifier,
        at: LostAt,
    ) -> Result<Outcome, PathExecError> {
        notifier
            .notify(&NotifyEvent::Lost, nav)
            .map_err(PathExecError::Notify)?;
        Ok(Outcome::Lost(at))
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Legs taking the robot from `from` to `to`, x first.
pub fn plan(from: Coord, to: Coord) -> Vec<Leg> {
    let mut legs = Vec::new();

    if to.x != from.x {
        legs.push(Leg {
            heading: if to.x > from.x {
                Heading::Right
            } else {
                Heading::Left
            },
            count: (to.x as i64 - from.x as i64).abs() as usize,
        });
    }

    if to.y != from.y {
        legs.push(Leg {
            heading: if to.y > from.y {
                Heading::Down
            } else {
                Heading::Up
            },
            count: (to.y as i64 - from.y as i64).abs() as usize,
        });
    }

    legs
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
