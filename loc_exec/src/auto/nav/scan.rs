//! Intersection scanning and turning
//!
//! With the arm extended over the street ahead the robot turns on the spot in short steps. The
//! sensor sweeps off the street, over a building and onto the next street, so each street to
//! street sweep is a quarter turn which also reads one building. Building colours are decided by
//! a vote over every reading taken while over the building.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info};

use super::{AlignMode, NavCtrl, NavError, NavState, Rotation, Search};
use crate::{
    auto::{loc::Observation, map::NUM_BUILDINGS},
    colour::Colour,
    robot::{ArmEnd, Robot},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Building colour votes from a single sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Votes {
    green: usize,
    blue: usize,
    white: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Votes {
    fn add(&mut self, colour: Colour) {
        match colour {
            Colour::Green => self.green += 1,
            Colour::Blue => self.blue += 1,
            Colour::White => self.white += 1,
            _ => (),
        }
    }

    fn any(&self) -> bool {
        self.green + self.blue + self.white > 0
    }

    /// The colour with the most votes, ties go to white, then blue, then green.
    fn winner(&self) -> Colour {
        [
            (Colour::Green, self.green),
            (Colour::Blue, self.blue),
            (Colour::White, self.white),
        ]
        .iter()
        .max_by_key(|(_, n)| *n)
        .map_or(Colour::White, |(c, _)| *c)
    }
}

impl<R: Robot> NavCtrl<R> {
    /// Scan the four buildings, starting centred on the street ahead and turning clockwise all
    /// the way round.
    pub(super) fn scan(&mut self) -> Result<Observation, NavError> {
        self.align(AlignMode::centred(Search::BothWays))?;

        self.set_state(NavState::Scanning);
        self.rig.shift_arm(ArmEnd::Extended)?;

        let mut sweep = [Colour::Unknown; NUM_BUILDINGS];
        for (i, building) in sweep.iter_mut().enumerate() {
            *building = self.sweep(Rotation::Clockwise)?;
            info!("Building {} of the scan is {}", i, building);
        }

        self.last_rotation = Some(Rotation::Clockwise);

        let obs = Observation::from_sweep(sweep);
        info!("Intersection scanned: {}", obs);

        Ok(obs)
    }

    /// Turn onto another street, `quarter_turns` is reduced to the shortest rotation.
    pub(super) fn turn_streets(&mut self, quarter_turns: i32) -> Result<(), NavError> {
        let turns = match quarter_turns.rem_euclid(4) {
            3 => -1,
            t => t,
        };

        if turns == 0 {
            return Ok(());
        }

        self.set_state(NavState::Turning);
        self.rig.shift_arm(ArmEnd::Extended)?;

        let rotation = Rotation::from_sign(turns);
        for _ in 0..turns.abs() {
            let building = self.sweep(rotation)?;
            debug!("Turned {:?} past a {} building", rotation, building);
        }

        self.last_rotation = Some(rotation);

        Ok(())
    }

    /// Turn from one street to the next, returning the colour of the building in between.
    fn sweep(&mut self, rotation: Rotation) -> Result<Colour, NavError> {
        let power = rotation.sign() * self.rig.params().turn_power;
        let mut votes = Votes::default();

        let mut steps = 0;
        loop {
            self.count_step(&mut steps, "sweeping to the next street")?;

            self.rig.brake()?;
            self.rig.sleep_ms(self.params.scan_settle_ms)?;

            let colour = self.rig.read_colour_stable()?;
            if colour.is_building() {
                votes.add(colour);
            } else if colour == Colour::Black && votes.any() {
                debug!("Sweep votes: {:?}", votes);
                return Ok(votes.winner());
            }

            self.rig.turn(power)?;
            self.rig.sleep_ms(self.params.scan_turn_ms)?;
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
        auto::nav::{
            test::{crossing, nav_ctrl},
            Navigator,
        },
        robot::mock::{MockRobot, Pose},
    };
    use comms_if::eqpt::robot::MotorId;
    use Colour::*;

    #[test]
    fn test_votes() {
        let mut v = Votes::default();
        assert!(!v.any());

        v.add(Green);
        v.add(Green);
        v.add(Blue);
        v.add(Black);
        assert_eq!(v.winner(), Green);

        // Ties prefer white, then blue
        v.add(Blue);
        assert_eq!(v.winner(), Blue);
        v.add(White);
        v.add(White);
        assert_eq!(v.winner(), White);
    }

    #[test]
    fn test_scan_intersection() -> Result<(), NavError> {
        // Clockwise from front-right
        let mut nav = nav_ctrl(MockRobot::new(crossing([Blue, Green, White, Green])));

        let obs = nav.scan_intersection()?;

        // Reported front-left first
        assert_eq!(obs, Observation([Green, Blue, Green, White]));

        // Stopped on the anticlockwise edge of the street ahead
        assert_eq!(nav.rig().robot().pose().angle, 340);

        Ok(())
    }

    #[test]
    fn test_scan_starts_centred() -> Result<(), NavError> {
        // On the street ahead, which runs from -20 to 19 degrees, but well off its centre
        let robot = MockRobot::new(crossing([Blue, Green, White, Green])).with_pose(Pose {
            pos: 0,
            angle: -15,
            arm: 0,
        });
        let mut nav = nav_ctrl(robot);

        nav.scan_intersection()?;

        // The last arm movement extends the sensor for the scan, the first wheel start after it
        // begins the first sweep
        let starts = nav.rig().robot().motor_starts();
        let arm_out = starts
            .iter()
            .rposition(|(m, _, _)| *m == MotorId::SensorArm)
            .unwrap();
        let (_, power, pose) = starts[arm_out..]
            .iter()
            .find(|(m, _, _)| *m == MotorId::LeftWheel)
            .unwrap();

        assert!(*power > 0);
        assert!(
            pose.angle.abs() <= nav.params.centre_tolerance_deg,
            "first sweep started at {} deg",
            pose.angle
        );

        Ok(())
    }

    #[test]
    fn test_scan_outvotes_noise() -> Result<(), NavError> {
        // A few green readings at the start of the blue front-right building
        let world = crossing([Blue, White, White, White]);
        let mut nav = nav_ctrl(MockRobot::new(move |p: &Pose| {
            if p.arm == MockRobot::ARM_STEPS && (20..25).contains(&p.angle) {
                Green
            } else {
                world(p)
            }
        }));

        let obs = nav.scan_intersection()?;
        assert_eq!(obs, Observation([White, Blue, White, White]));

        Ok(())
    }

    #[test]
    fn test_turn_streets() -> Result<(), NavError> {
        let robot = MockRobot::new(crossing([Blue, Green, White, Green])).with_pose(Pose {
            pos: 0,
            angle: 340,
            arm: MockRobot::ARM_STEPS,
        });
        let mut nav = nav_ctrl(robot);

        // A quarter turn anticlockwise ends up on the left street
        nav.turn(-1)?;
        assert_eq!(nav.rig().robot().pose().angle, 289);
        assert_eq!(nav.state(), NavState::Turning);

        // Three clockwise quarter turns are one anticlockwise
        nav.turn(3)?;
        assert_eq!(nav.rig().robot().pose().angle, 199);

        // Whole turns do nothing
        nav.turn(4)?;
        assert_eq!(nav.rig().robot().pose().angle, 199);

        Ok(())
    }
}
