//! Map boundary recovery
//!
//! The map is bordered with red. Once the robot has driven onto the border it backs away until the
//! fully extended sensor no longer reaches the red, creeps back up until it just does, and then
//! turns onto the nearest street.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;

use super::{AlignMode, NavCtrl, NavError, NavState, Search};
use crate::{
    colour::Colour,
    robot::{ArmEnd, Robot},
};

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<R: Robot> NavCtrl<R> {
    pub(super) fn leave_boundary(&mut self) -> Result<(), NavError> {
        self.set_state(NavState::OutOfBounds);
        self.rig.stop()?;
        self.rig.shift_arm(ArmEnd::Retracted)?;

        let power = self.rig.params().forward_power;

        info!("Backing away from the boundary");
        let pulse = self.params.back_up_pulse;
        let mut steps = 0;
        while !self.rig.touch_pressed(ArmEnd::Extended.touch())? {
            self.count_step(&mut steps, "backing away from the boundary")?;
            self.rig.shift_arm_until(ArmEnd::Extended, Colour::Red)?;
            self.rig.drive_pulse(-power, pulse.on_ms, pulse.off_ms)?;
        }

        info!("Creeping back up to the boundary");
        self.rig.shift_arm(ArmEnd::Extended)?;
        let pulse = self.params.creep_pulse;
        let mut steps = 0;
        while self.rig.read_colour()? != Colour::Red {
            self.count_step(&mut steps, "creeping up to the boundary")?;
            self.rig.drive_pulse(power / 2, pulse.on_ms, pulse.off_ms)?;
        }

        let pulse = self.params.nudge_pulse;
        self.rig.drive_pulse(power / 3, pulse.on_ms, pulse.off_ms)?;

        info!("Turning onto a street");
        self.align(AlignMode::centred(Search::Clockwise))
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

    #[test]
    fn test_recover_boundary() -> Result<(), NavError> {
        // Red starts two steps ahead of the retracted sensor, a street leaves at 45 degrees
        let mut nav = nav_ctrl(MockRobot::new(|p: &Pose| {
            if (35..=55).contains(&p.angle) {
                Colour::Black
            } else if p.pos + p.arm >= 2 {
                Colour::Red
            } else {
                Colour::White
            }
        }));

        nav.recover_boundary()?;

        let pose = nav.rig().robot().pose();

        // Backed off three, crept forward one and nudged one more
        assert_eq!(pose.pos, -1);

        // Centred on the street with the sensor over it
        assert_eq!(pose.angle, 45);
        assert_eq!(pose.arm, MockRobot::ARM_STEPS);
        assert_eq!(nav.state(), NavState::Aligning);

        Ok(())
    }
}
