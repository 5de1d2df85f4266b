//! Street following
//!
//! All of these work with the sensor arm retracted, so the sensor sits just ahead of the wheels
//! over the street the robot is on.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};

use super::{AlignMode, NavCtrl, NavError, NavState, Search, StreetEnd};
use crate::{
    colour::Colour,
    robot::{ArmEnd, Robot},
};

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<R: Robot> NavCtrl<R> {
    /// Back up until the sensor is over a street or intersection.
    pub(super) fn find_street(&mut self) -> Result<(), NavError> {
        self.set_state(NavState::FindingStreet);
        self.rig.shift_arm(ArmEnd::Retracted)?;

        if !self.rig.read_colour()?.is_road() {
            let power = self.rig.params().forward_power;
            self.rig.drive(-power)?;

            let mut steps = 0;
            while !self.rig.read_colour()?.is_road() {
                self.count_step(&mut steps, "finding the street")?;
            }
        }

        self.rig.stop()?;
        info!("Found the street");

        Ok(())
    }

    /// Drive along the street until something other than street is confirmed under the sensor.
    ///
    /// Drifting off the street onto a building is recovered from here, the street is found and
    /// aligned onto again and driving carries on.
    pub(super) fn drive_to_street_end(&mut self) -> Result<StreetEnd, NavError> {
        self.rig.shift_arm(ArmEnd::Retracted)?;
        self.set_state(NavState::OnStreet);
        self.last_rotation = None;

        let power = self.rig.params().forward_power;
        self.rig.drive(power)?;

        let mut steps = 0;
        loop {
            self.count_step(&mut steps, "following the street")?;

            let colour = self.rig.read_colour()?;
            if colour == Colour::Black || colour == Colour::Unknown {
                continue;
            }

            self.rig.stop()?;

            if !self.confirm(colour)? {
                debug!("Saw {} but could not confirm it, driving on", colour);
                self.rig.sleep_ms(self.params.unconfirmed_wait_ms)?;
                self.rig.drive(power)?;
                continue;
            }

            match colour {
                Colour::Yellow => {
                    self.set_state(NavState::AtIntersection);
                    return Ok(StreetEnd::Intersection);
                }
                Colour::Red => {
                    warn!("Reached the map boundary");
                    self.set_state(NavState::OutOfBounds);
                    return Ok(StreetEnd::Boundary);
                }
                _ => {
                    warn!("Drifted off the street onto {}, finding it again", colour);
                    self.find_street()?;
                    self.align(AlignMode::centred(Search::BothWays))?;

                    self.rig.shift_arm(ArmEnd::Retracted)?;
                    self.set_state(NavState::OnStreet);
                    self.rig.drive(power)?;
                }
            }
        }
    }

    /// Pulse forward until the intersection is confirmed to be behind the sensor.
    pub(super) fn push_off(&mut self) -> Result<(), NavError> {
        self.set_state(NavState::LeavingIntersection);
        self.push_until("pushing off the intersection", |c| {
            c != Colour::Yellow && c != Colour::Unknown
        })
    }

    /// Pulse forward until the sensor is confirmed to be on the intersection.
    pub(super) fn push_back(&mut self) -> Result<(), NavError> {
        self.push_until("pushing back onto the intersection", |c| {
            c == Colour::Yellow
        })
    }

    fn push_until<F: Fn(Colour) -> bool>(
        &mut self,
        what: &'static str,
        done: F,
    ) -> Result<(), NavError> {
        self.rig.shift_arm(ArmEnd::Retracted)?;

        let power = self.rig.params().forward_power;
        let pulse = self.params.push_pulse;

        let mut steps = 0;
        loop {
            self.count_step(&mut steps, what)?;
            self.rig.drive_pulse(power, pulse.on_ms, pulse.off_ms)?;

            let mut passed = 0;
            for _ in 0..self.params.confirm_reads {
                if done(self.rig.read_colour()?) {
                    passed += 1;
                }
            }

            if passed == self.params.confirm_reads {
                break;
            }
        }

        self.rig.stop()?;
        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        auto::nav::{test::nav_ctrl, Navigator},
        robot::mock::{MockRobot, Pose},
    };
    use std::cell::Cell;

    #[test]
    fn test_find_street() -> Result<(), NavError> {
        let mut nav = nav_ctrl(MockRobot::new(|p: &Pose| {
            if p.pos <= -2 {
                Colour::Black
            } else {
                Colour::White
            }
        }));

        nav.find_street()?;

        assert_eq!(nav.rig().robot().pose().pos, -2);
        assert!(nav.rig().robot().is_stopped());

        Ok(())
    }

    #[test]
    fn test_follow_to_intersection() -> Result<(), NavError> {
        let mut nav = nav_ctrl(MockRobot::new(|p: &Pose| match p.pos {
            2..=3 => Colour::Unknown,
            4..=5 => Colour::Yellow,
            _ => Colour::Black,
        }));

        assert_eq!(nav.follow_street(false)?, StreetEnd::Intersection);
        assert_eq!(nav.state(), NavState::AtIntersection);
        assert_eq!(nav.rig().robot().pose().pos, 4);

        Ok(())
    }

    #[test]
    fn test_follow_ignores_unconfirmed_colour() -> Result<(), NavError> {
        // The second reading is a glitch, the intersection really starts at 6
        let reads = Cell::new(0);
        let mut robot = MockRobot::new(move |p: &Pose| {
            reads.set(reads.get() + 1);
            if reads.get() == 2 || p.pos >= 6 {
                Colour::Yellow
            } else {
                Colour::Black
            }
        });
        robot.set_builtin(|_| Colour::Black);
        let mut nav = nav_ctrl(robot);

        assert_eq!(nav.follow_street(false)?, StreetEnd::Intersection);
        assert_eq!(nav.rig().robot().pose().pos, 6);

        Ok(())
    }

    #[test]
    fn test_follow_to_boundary() -> Result<(), NavError> {
        let mut nav = nav_ctrl(MockRobot::new(|p: &Pose| {
            if p.pos >= 4 {
                Colour::Red
            } else {
                Colour::Black
            }
        }));

        assert_eq!(nav.follow_street(false)?, StreetEnd::Boundary);
        assert_eq!(nav.state(), NavState::OutOfBounds);

        Ok(())
    }

    #[test]
    fn test_push_off() -> Result<(), NavError> {
        let mut nav = nav_ctrl(MockRobot::new(|p: &Pose| match p.pos {
            0..=2 => Colour::Yellow,
            3 => Colour::Unknown,
            _ => Colour::Black,
        }));

        nav.push_off()?;
        assert_eq!(nav.rig().robot().pose().pos, 4);

        Ok(())
    }
}
