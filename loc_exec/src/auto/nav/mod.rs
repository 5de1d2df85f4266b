//! # Navigation module
//!
//! The navigation controller drives the robot around the street grid. It finds and follows
//! streets, scans the buildings around intersections, turns onto other streets and recovers from
//! drifting off a street, from being skewed at an intersection and from leaving the map.
//!
//! Higher level logic ([`crate::auto::loc_mgr`] and [`crate::auto::path_exec`]) only sees the
//! controller through the [`Navigator`] trait.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod align;
mod boundary;
mod explore;
mod params;
mod scan;
mod street;

#[cfg(test)]
pub mod grid_sim;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::robot::Tone;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::loc::Observation;
use crate::{
    colour::Colour,
    robot::{ArmEnd, Rig, Robot, RobotError, TonePlayer},
};

pub use align::{AlignMode, Edge, Search};
pub use explore::ExplorePolicy;
pub use params::{NavParams, Pulse};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Navigation primitives used by the localisation and path execution logic.
///
/// Every primitive other than `follow_street` and `recover_boundary` expects the robot to be at
/// an intersection.
pub trait Navigator: TonePlayer {
    /// Follow the street ahead until it ends, first finding and aligning onto the street if
    /// `line_up` is set.
    fn follow_street(&mut self, line_up: bool) -> Result<StreetEnd, NavError>;

    /// Scan the four buildings around the intersection, leaving the robot facing the way it
    /// started.
    fn scan_intersection(&mut self) -> Result<Observation, NavError>;

    /// Turn onto another street by the given number of clockwise quarter turns.
    fn turn(&mut self, quarter_turns: i32) -> Result<(), NavError>;

    /// Line up with the street ahead and push off the intersection onto it.
    fn leave_intersection(&mut self) -> Result<(), NavError>;

    /// Get back onto the map after reaching its boundary.
    fn recover_boundary(&mut self) -> Result<(), NavError>;

    /// Stop the robot, it knows where it is.
    fn localised(&mut self) -> Result<(), NavError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Navigation controller driving a robot through a [`Rig`].
pub struct NavCtrl<R> {
    rig: Rig<R>,

    params: NavParams,

    state: NavState,

    /// Direction of the last rotation onto a street, which tells which edge of the street the
    /// robot stopped on. Cleared once the robot has moved off that edge.
    last_rotation: Option<Rotation>,

    /// The very first street is searched for in one direction only
    first_street: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// What stopped the robot while following a street.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreetEnd {
    Intersection,
    Boundary,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Idle,
    FindingStreet,
    Aligning,
    OnStreet,
    AtIntersection,
    Scanning,
    Turning,
    LeavingIntersection,
    SkewRecovery,
    OutOfBounds,
    Localised,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    Anticlockwise,
}

#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("Robot error: {0}")]
    Robot(#[from] RobotError),

    #[error("Gave up {0} after {1} steps")]
    Stalled(&'static str, usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Rotation {
    /// Sign of the turn power for this rotation.
    pub fn sign(self) -> i32 {
        match self {
            Rotation::Clockwise => 1,
            Rotation::Anticlockwise => -1,
        }
    }

    pub fn from_sign(sign: i32) -> Self {
        if sign < 0 {
            Rotation::Anticlockwise
        } else {
            Rotation::Clockwise
        }
    }
}

impl fmt::Display for NavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl NavError {
    pub fn is_shutdown(&self) -> bool {
        matches!(self, NavError::Robot(e) if e.is_shutdown())
    }
}

impl<R: Robot> NavCtrl<R> {
    pub fn new(rig: Rig<R>, params: NavParams) -> Self {
        Self {
            rig,
            params,
            state: NavState::Idle,
            last_rotation: None,
            first_street: true,
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn rig(&self) -> &Rig<R> {
        &self.rig
    }

    /// Stop the motors regardless of any pending shutdown.
    pub fn halt(&mut self) -> Result<(), RobotError> {
        self.rig.halt()
    }

    fn set_state(&mut self, state: NavState) {
        if self.state != state {
            info!("NavState change to: {}", state);
            self.state = state;
        }
    }

    /// Count one iteration of a polling loop, failing once the ceiling is passed.
    fn count_step(&mut self, steps: &mut usize, what: &'static str) -> Result<(), NavError> {
        *steps += 1;

        let max = self.rig.params().max_steps;
        if *steps > max {
            warn!("Giving up {} after {} steps", what, max);
            self.rig.stop()?;
            return Err(NavError::Stalled(what, max));
        }

        Ok(())
    }

    /// True if the next `confirm_reads - 1` readings agree with a first reading of `colour`.
    fn confirm(&mut self, colour: Colour) -> Result<bool, NavError> {
        for _ in 1..self.params.confirm_reads {
            if self.rig.read_colour()? != colour {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<R: Robot> Navigator for NavCtrl<R> {
    fn follow_street(&mut self, line_up: bool) -> Result<StreetEnd, NavError> {
        if line_up {
            self.find_street()?;

            let search = if self.first_street {
                Search::Clockwise
            } else {
                Search::BothWays
            };
            self.align(AlignMode::centred(search))?;
            self.first_street = false;
        }

        self.drive_to_street_end()
    }

    fn scan_intersection(&mut self) -> Result<Observation, NavError> {
        self.scan()
    }

    fn turn(&mut self, quarter_turns: i32) -> Result<(), NavError> {
        self.turn_streets(quarter_turns)
    }

    fn leave_intersection(&mut self) -> Result<(), NavError> {
        self.set_state(NavState::LeavingIntersection);
        self.rig.shift_arm(ArmEnd::Retracted)?;

        if self.rig.read_colour()? == Colour::Yellow {
            // A rotation stops as soon as the street comes under the arm, so the robot is on the
            // street's edge on the side it came from
            let mode = match self.last_rotation {
                Some(rotation) => AlignMode {
                    search: Search::OnLine,
                    edge: Some(match rotation {
                        Rotation::Clockwise => Edge::Anticlockwise,
                        Rotation::Anticlockwise => Edge::Clockwise,
                    }),
                    centre: true,
                },
                None => AlignMode::centred(Search::BothWays),
            };
            self.align(mode)?;
        } else {
            warn!("Robot skewed off the intersection, creeping back onto it");
            self.set_state(NavState::SkewRecovery);
            self.push_back()?;
            self.align(AlignMode::centred(Search::BothWays))?;
        }

        self.push_off()
    }

    fn recover_boundary(&mut self) -> Result<(), NavError> {
        self.leave_boundary()
    }

    fn localised(&mut self) -> Result<(), NavError> {
        self.rig.stop()?;
        self.set_state(NavState::Localised);
        Ok(())
    }
}

impl<R: Robot> TonePlayer for NavCtrl<R> {
    fn play(&mut self, tones: &[Tone]) -> Result<(), RobotError> {
        self.rig.play(tones)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
