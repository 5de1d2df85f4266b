//! Kinematic robot simulator for tests
//!
//! The simulated robot has a one dimensional position along its axis, a gyro angle and a sensor
//! arm position, all in whole steps. What the colour sensor sees is a function of that pose
//! supplied by the test.
//!
//! Motion happens in steps: while motors run, every RGB or touch read advances each running motor
//! by one step, and stopping motors which have not moved since they were started advances them by
//! one step (a pulse always moves the robot). Both wheels at the same sign move `pos` by one,
//! wheels at opposite signs turn `angle` by one degree (clockwise for a positive left wheel). The
//! arm moves towards `ARM_STEPS` for negative powers and towards zero for positive ones.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::robot::{MotorId, StopMode, Tone, TouchId};
use std::collections::VecDeque;

use super::{RigParams, Robot, RobotError, Timings};
use crate::colour::{Colour, Rgb};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pose {
    pub pos: i32,

    pub angle: i32,

    /// 0 is fully retracted, `MockRobot::ARM_STEPS` fully extended
    pub arm: i32,
}

type World = Box<dyn Fn(&Pose) -> Colour>;

pub struct MockRobot {
    pose: Pose,

    left: i32,
    right: i32,
    arm: i32,

    /// True once the running motors have moved since they were last started
    stepped: bool,

    world: World,

    builtin: Option<World>,

    touch_queue: VecDeque<bool>,

    /// Every motor start with the pose it was made from
    motor_starts: Vec<(MotorId, i32, Pose)>,

    tones: Vec<Tone>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MockRobot {
    pub const ARM_STEPS: i32 = 4;

    pub fn new<F: Fn(&Pose) -> Colour + 'static>(world: F) -> Self {
        Self {
            pose: Pose::default(),
            left: 0,
            right: 0,
            arm: 0,
            stepped: false,
            world: Box::new(world),
            builtin: None,
            touch_queue: VecDeque::new(),
            motor_starts: Vec::new(),
            tones: Vec::new(),
        }
    }

    /// Rig parameters suited to the simulator: no sleeping and no white level scaling.
    pub fn rig_params() -> RigParams {
        RigParams {
            white_max: 256,
            timings: Timings {
                turn_pulse_on: 0,
                turn_pulse_off: 0,
                arm_pulse_on: 0,
                arm_pulse_off: 0,
                sleep_slice: 1,
            },
            ..Default::default()
        }
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    /// Override what the built-in colour classifier reports, by default it agrees with the RGB.
    pub fn set_builtin<F: Fn(&Pose) -> Colour + 'static>(&mut self, f: F) {
        self.builtin = Some(Box::new(f));
    }

    /// Touch reads returned before the simulated switches are consulted.
    pub fn queue_touch(&mut self, reads: &[bool]) {
        self.touch_queue.extend(reads.iter().copied());
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn motor_starts(&self) -> &[(MotorId, i32, Pose)] {
        &self.motor_starts
    }

    pub fn tones(&self) -> &[Tone] {
        &self.tones
    }

    pub fn is_stopped(&self) -> bool {
        !self.running()
    }

    /// Raw reading that classifies as the given colour with the default threshold table.
    pub fn rgb_of(colour: Colour) -> Rgb {
        match colour {
            Colour::Black => Rgb::new(12, 14, 10),
            Colour::Blue => Rgb::new(30, 45, 120),
            Colour::Green => Rgb::new(25, 90, 30),
            Colour::Yellow => Rgb::new(180, 160, 30),
            Colour::Red => Rgb::new(230, 40, 35),
            Colour::White => Rgb::new(200, 210, 190),
            Colour::Unknown => Rgb::new(120, 60, 60),
        }
    }

    fn running(&self) -> bool {
        self.left != 0 || self.right != 0 || self.arm != 0
    }

    fn step(&mut self) {
        if self.left != 0 && self.right != 0 {
            if self.left.signum() == self.right.signum() {
                self.pose.pos += self.left.signum();
            } else {
                self.pose.angle += self.left.signum();
            }
        }

        if self.arm != 0 {
            self.pose.arm = (self.pose.arm - self.arm.signum()).max(0).min(Self::ARM_STEPS);
        }
    }

    /// Time passes while reading.
    fn tick(&mut self) {
        if self.running() {
            self.step();
            self.stepped = true;
        }
    }
}

impl Robot for MockRobot {
    fn motor_start(&mut self, motor: MotorId, power: i32) -> Result<(), RobotError> {
        self.motor_starts.push((motor, power, self.pose));

        match motor {
            MotorId::LeftWheel => self.left = power,
            MotorId::RightWheel => self.right = power,
            MotorId::SensorArm => self.arm = power,
        }
        self.stepped = false;
        Ok(())
    }

    fn stop_all(&mut self, _mode: StopMode) -> Result<(), RobotError> {
        if self.running() && !self.stepped {
            self.step();
        }

        self.left = 0;
        self.right = 0;
        self.arm = 0;
        self.stepped = false;

        Ok(())
    }

    fn read_touch(&mut self, touch: TouchId) -> Result<bool, RobotError> {
        self.tick();

        if let Some(t) = self.touch_queue.pop_front() {
            return Ok(t);
        }

        Ok(match touch {
            TouchId::Back => self.pose.arm == 0,
            TouchId::Top => self.pose.arm == Self::ARM_STEPS,
        })
    }

    fn read_rgb(&mut self) -> Result<Rgb, RobotError> {
        self.tick();
        Ok(Self::rgb_of((self.world)(&self.pose)))
    }

    fn read_colour_index(&mut self) -> Result<i32, RobotError> {
        let colour = match self.builtin {
            Some(ref f) => f(&self.pose),
            None => (self.world)(&self.pose),
        };
        Ok(colour.index())
    }

    fn read_gyro(&mut self) -> Result<i32, RobotError> {
        Ok(self.pose.angle)
    }

    fn play_tones(&mut self, tones: &[Tone]) -> Result<(), RobotError> {
        self.tones.extend_from_slice(tones);
        Ok(())
    }
}
