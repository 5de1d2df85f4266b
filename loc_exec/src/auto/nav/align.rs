//! Alignment onto a street
//!
//! Alignment works with the sensor arm extended, reaching over the street ahead. The robot turns
//! until the street is under the arm, then optionally centres itself on the street by finding the
//! gyro angles of both edges of the street and turning to the angle half way between them.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use serde::{Deserialize, Serialize};

use super::{NavCtrl, NavError, NavState};
use crate::{
    colour::Colour,
    robot::{ArmEnd, Robot},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignMode {
    pub search: Search,

    /// Edge of the street the robot is known to be on, saving a measurement while centring
    pub edge: Option<Edge>,

    pub centre: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// How to look for the street.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Search {
    /// Turn clockwise until the street is found
    Clockwise,

    /// Turn clockwise, reversing once the gyro has moved far enough without finding the street
    BothWays,

    /// The robot is already on the street
    OnLine,
}

/// Extreme angle of a street the robot is at.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Turning any further anticlockwise would lose the street
    Anticlockwise,

    /// Turning any further clockwise would lose the street
    Clockwise,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AlignMode {
    /// Search for the street and centre on it.
    pub fn centred(search: Search) -> Self {
        Self {
            search,
            edge: None,
            centre: true,
        }
    }

    /// Search for the street without centring, the robot is about to turn anyway.
    pub fn uncentred(search: Search) -> Self {
        Self {
            search,
            edge: None,
            centre: false,
        }
    }
}

impl<R: Robot> NavCtrl<R> {
    pub(super) fn align(&mut self, mode: AlignMode) -> Result<(), NavError> {
        self.set_state(NavState::Aligning);
        self.rig.shift_arm(ArmEnd::Extended)?;

        let found = match mode.search {
            Search::Clockwise => self.search_street(false)?,
            Search::BothWays => self.search_street(true)?,
            Search::OnLine => None,
        };

        if !mode.centre {
            return Ok(());
        }

        // The search may have left the arm retracted
        self.rig.shift_arm(ArmEnd::Extended)?;

        let edge = found.or(mode.edge);
        let current = self.rig.gyro()?;

        let left = match edge {
            Some(Edge::Anticlockwise) => current,
            _ => self.edge_angle(-1)?,
        };
        let right = match edge {
            Some(Edge::Clockwise) => current,
            _ => self.edge_angle(1)?,
        };

        let wanted = (left + right) / 2;
        debug!(
            "Street edges at {} and {} deg, centring on {} deg",
            left, right, wanted
        );

        let mut steps = 0;
        loop {
            let current = self.rig.gyro()?;
            if (current - wanted).abs() <= self.params.centre_tolerance_deg {
                break;
            }

            self.count_step(&mut steps, "centring on the street")?;
            self.rig.turn_pulse((wanted - current).signum())?;
        }

        self.last_rotation = None;
        Ok(())
    }

    /// Turn until the street is under the arm. Returns the edge of the street the robot stopped
    /// at, or `None` if it was on the street already.
    fn search_street(&mut self, both_ways: bool) -> Result<Option<Edge>, NavError> {
        if self.street_under_arm()? {
            return Ok(None);
        }

        let initial = self.rig.gyro()?;
        let mut reversed = !both_ways;
        let mut dir = 1;

        let mut steps = 0;
        loop {
            self.count_step(&mut steps, "searching for the street")?;
            self.rig.turn_pulse(dir)?;

            if self.street_under_arm()? {
                self.rig.sleep_ms(self.params.align_settle_ms)?;

                // Turning onto the street stops at the first edge reached
                return Ok(Some(if dir > 0 {
                    Edge::Anticlockwise
                } else {
                    Edge::Clockwise
                }));
            }

            if !reversed && (self.rig.gyro()? - initial).abs() > self.params.flip_after_deg {
                debug!("Street not found, reversing the search");
                reversed = true;
                dir = -dir;
            }

            self.rig.sleep_ms(self.params.align_search_pause_ms)?;
        }
    }

    /// True if the extended sensor is on the street and the street runs under the whole arm.
    ///
    /// On success the arm is left retracted, otherwise it is extended again.
    fn street_under_arm(&mut self) -> Result<bool, NavError> {
        if !self.rig.read_colour()?.is_road() {
            return Ok(false);
        }

        if self.street_along_arm()? {
            return Ok(true);
        }

        self.rig.shift_arm(ArmEnd::Extended)?;
        Ok(false)
    }

    /// Retract the arm step by step, requiring the street under every step. A street crossing the
    /// arm's path diagonally, as seen across an intersection, fails this.
    fn street_along_arm(&mut self) -> Result<bool, NavError> {
        let pulse = self.params.line_check_pulse;

        let mut steps = 0;
        while !self.rig.touch_pressed(ArmEnd::Retracted.touch())? {
            self.count_step(&mut steps, "checking the street under the arm")?;
            self.rig
                .nudge_arm(ArmEnd::Retracted, pulse.on_ms, pulse.off_ms)?;

            if !self.rig.read_colour()?.is_road() {
                debug!("Street does not run under the whole arm");
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Gyro angle of the street edge reached by turning in direction `dir`.
    fn edge_angle(&mut self, dir: i32) -> Result<i32, NavError> {
        let mut steps = 0;

        let mut colour = self.rig.read_colour()?;
        while colour == Colour::Black {
            self.count_step(&mut steps, "finding the street edge")?;
            self.rig.turn_pulse(dir)?;
            colour = self.rig.read_colour()?;
        }

        while colour != Colour::Black {
            self.count_step(&mut steps, "finding the street edge")?;
            self.rig.turn_pulse(-dir)?;
            colour = self.rig.read_colour()?;
        }

        Ok(self.rig.gyro()?)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        auto::nav::test::nav_ctrl,
        robot::mock::{MockRobot, Pose},
    };

    /// A street running from -10 to 10 degrees, offset by `at`.
    fn street_at(at: i32) -> impl Fn(&Pose) -> Colour {
        move |p: &Pose| {
            if (p.angle - at).abs() <= 10 {
                Colour::Black
            } else {
                Colour::White
            }
        }
    }

    #[test]
    fn test_align_clockwise_and_centre() -> Result<(), NavError> {
        let mut nav = nav_ctrl(MockRobot::new(street_at(40)));

        nav.align(AlignMode::centred(Search::Clockwise))?;

        let pose = nav.rig().robot().pose();
        assert!((pose.angle - 40).abs() <= 1, "angle {}", pose.angle);
        assert_eq!(pose.arm, MockRobot::ARM_STEPS);

        Ok(())
    }

    #[test]
    fn test_align_both_ways() -> Result<(), NavError> {
        // Behind the first 30 degrees of the clockwise search
        let mut nav = nav_ctrl(MockRobot::new(street_at(-45)));

        nav.align(AlignMode::uncentred(Search::BothWays))?;

        // Found while turning back, so stopped on its clockwise edge with no centring
        assert_eq!(nav.rig().robot().pose().angle, -35);

        Ok(())
    }

    #[test]
    fn test_diagonal_street_rejected() -> Result<(), NavError> {
        // At 20 degrees only the tip of the arm is over the street, it's a diagonal seen across an
        // intersection. The real street is at 60.
        let mut nav = nav_ctrl(MockRobot::new(|p: &Pose| {
            let street = (p.angle - 60).abs() <= 10;
            let diagonal = (18..=22).contains(&p.angle) && p.arm == MockRobot::ARM_STEPS;
            if street || diagonal {
                Colour::Black
            } else {
                Colour::White
            }
        }));

        nav.align(AlignMode::uncentred(Search::Clockwise))?;
        assert_eq!(nav.rig().robot().pose().angle, 50);

        Ok(())
    }

    #[test]
    fn test_centre_from_known_edge() -> Result<(), NavError> {
        let robot = MockRobot::new(street_at(0)).with_pose(Pose {
            pos: 0,
            angle: 10,
            arm: 0,
        });
        let mut nav = nav_ctrl(robot);

        nav.align(AlignMode {
            search: Search::OnLine,
            edge: Some(Edge::Clockwise),
            centre: true,
        })?;

        assert!(nav.rig().robot().pose().angle.abs() <= 1);

        Ok(())
    }
}
