//! # Robot rig
//!
//! [`Rig`] wraps a [`Robot`] with the sensing and actuation helpers built on top of the raw
//! operations: normalised colour classification, debounced touch reads, sensor arm shifting and
//! timed motor pulses.
//!
//! Every hardware call and every slice of every sleep checks the shutdown flag, so an operator
//! interrupt unwinds out of any loop as a [`RobotError::Shutdown`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::robot::{MotorId, StopMode, Tone, TouchId};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use super::{Robot, RobotError};
use crate::colour::{Classifier, Colour, Rgb, DEFAULT_WHITE_MAX};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Anything able to play tones to the operator.
pub trait TonePlayer {
    fn play(&mut self, tones: &[Tone]) -> Result<(), RobotError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the rig.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RigParams {
    /// Wheel power when driving along a street
    pub forward_power: i32,

    /// Wheel power when turning on the spot
    pub turn_power: i32,

    /// Power of the sensor arm motor
    pub arm_power: i32,

    /// Raw channel value of a white surface, readings are scaled so this becomes 256
    pub white_max: i32,

    /// Number of consecutive pressed reads needed before a touch sensor counts as pressed
    pub touch_reads: usize,

    /// Ask the sensor's built-in classifier whether dark readings are actually green
    pub dark_check_builtin: bool,

    /// Iteration ceiling for every polling loop
    pub max_steps: usize,

    pub timings: Timings,
}

/// Durations used by the rig, all in milliseconds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Timings {
    pub turn_pulse_on: u64,
    pub turn_pulse_off: u64,

    pub arm_pulse_on: u64,
    pub arm_pulse_off: u64,

    /// Granularity with which sleeps check for shutdown
    pub sleep_slice: u64,
}

/// A [`Robot`] with shutdown handling and the sensing helpers built on top of it.
pub struct Rig<R> {
    robot: R,

    params: RigParams,

    classifier: Classifier,

    shutdown: Arc<AtomicBool>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Ends of the colour sensor arm's travel.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmEnd {
    /// Sensor just ahead of the wheels, over the street the robot stands on
    Retracted,

    /// Sensor reaching over the buildings and streets around the robot
    Extended,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for RigParams {
    fn default() -> Self {
        Self {
            forward_power: 15,
            turn_power: 10,
            arm_power: 50,
            white_max: DEFAULT_WHITE_MAX,
            touch_reads: 3,
            dark_check_builtin: true,
            max_steps: 5_000,
            timings: Timings::default(),
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            turn_pulse_on: 125,
            turn_pulse_off: 125,
            arm_pulse_on: 25,
            arm_pulse_off: 100,
            sleep_slice: 10,
        }
    }
}

impl ArmEnd {
    /// Limit switch pressed at this end of the travel.
    pub fn touch(self) -> TouchId {
        match self {
            ArmEnd::Retracted => TouchId::Back,
            ArmEnd::Extended => TouchId::Top,
        }
    }

    /// Sign of the arm motor power moving towards this end.
    fn direction(self) -> i32 {
        match self {
            ArmEnd::Retracted => 1,
            ArmEnd::Extended => -1,
        }
    }
}

impl<R: Robot> Rig<R> {
    pub fn new(
        robot: R,
        params: RigParams,
        classifier: Classifier,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            robot,
            params,
            classifier,
            shutdown,
        }
    }

    pub fn params(&self) -> &RigParams {
        &self.params
    }

    pub fn robot(&self) -> &R {
        &self.robot
    }

    /// Fail if shutdown has been requested.
    pub fn check(&self) -> Result<(), RobotError> {
        if self.shutdown.load(Ordering::SeqCst) {
            Err(RobotError::Shutdown)
        } else {
            Ok(())
        }
    }

    /// Access the robot, refusing once shutdown has been requested.
    fn hw(&mut self) -> Result<&mut R, RobotError> {
        self.check()?;
        Ok(&mut self.robot)
    }

    /// Stop every motor, ignoring the shutdown flag. Used on the way out of the executable.
    pub fn halt(&mut self) -> Result<(), RobotError> {
        self.robot.stop_all(StopMode::Coast)
    }

    /// Sleep in slices, checking for shutdown between them.
    pub fn sleep_ms(&self, ms: u64) -> Result<(), RobotError> {
        self.check()?;

        let slice = self.params.timings.sleep_slice.max(1);
        let mut remaining = ms;

        while remaining > 0 {
            let dt = remaining.min(slice);
            thread::sleep(Duration::from_millis(dt));
            remaining -= dt;
            self.check()?;
        }

        Ok(())
    }

    // ---- MOTORS ----

    /// Run both wheels at the same power, negative drives backwards.
    pub fn drive(&mut self, power: i32) -> Result<(), RobotError> {
        let robot = self.hw()?;
        robot.motor_start(MotorId::LeftWheel, power)?;
        robot.motor_start(MotorId::RightWheel, power)
    }

    /// Turn on the spot, positive powers turn clockwise.
    pub fn turn(&mut self, power: i32) -> Result<(), RobotError> {
        let robot = self.hw()?;
        robot.motor_start(MotorId::LeftWheel, power)?;
        robot.motor_start(MotorId::RightWheel, -power)
    }

    pub fn stop(&mut self) -> Result<(), RobotError> {
        self.hw()?.stop_all(StopMode::Coast)
    }

    pub fn brake(&mut self) -> Result<(), RobotError> {
        self.hw()?.stop_all(StopMode::Brake)
    }

    /// Drive for `on_ms` then stop and wait for `off_ms`.
    pub fn drive_pulse(&mut self, power: i32, on_ms: u64, off_ms: u64) -> Result<(), RobotError> {
        self.drive(power)?;
        self.sleep_ms(on_ms)?;
        self.stop()?;
        self.sleep_ms(off_ms)
    }

    /// Small turn on the spot, `dir` of 1 is clockwise and -1 anticlockwise.
    pub fn turn_pulse(&mut self, dir: i32) -> Result<(), RobotError> {
        let t = &self.params.timings;
        let (on, off) = (t.turn_pulse_on, t.turn_pulse_off);

        self.turn(dir * self.params.turn_power)?;
        self.sleep_ms(on)?;
        self.stop()?;
        self.sleep_ms(off)
    }

    // ---- SENSORS ----

    pub fn gyro(&mut self) -> Result<i32, RobotError> {
        self.hw()?.read_gyro()
    }

    /// Colour sensor reading scaled by the white level.
    pub fn read_rgb(&mut self) -> Result<Rgb, RobotError> {
        let white_max = self.params.white_max;
        Ok(self.hw()?.read_rgb()?.normalised(white_max))
    }

    /// Classify what the colour sensor currently sees.
    ///
    /// Dark readings are hard to tell apart from green, so if enabled the sensor's own
    /// classifier gets the final say on them.
    pub fn read_colour(&mut self) -> Result<Colour, RobotError> {
        let rgb = self.read_rgb()?;
        let colour = self.classifier.classify(rgb);

        if colour == Colour::Black && self.params.dark_check_builtin {
            let builtin = Colour::from_index(self.hw()?.read_colour_index()?);
            if builtin == Colour::Green {
                debug!("Dark reading {:?} reclassified as green", rgb);
                return Ok(Colour::Green);
            }
        }

        Ok(colour)
    }

    /// Read until two consecutive readings agree.
    pub fn read_colour_stable(&mut self) -> Result<Colour, RobotError> {
        let mut last = self.read_colour()?;

        for _ in 0..self.params.max_steps {
            let colour = self.read_colour()?;
            if colour == last {
                return Ok(colour);
            }
            last = colour;
        }

        warn!("Colour readings never settled, using the last one ({})", last);
        Ok(last)
    }

    /// Debounced touch read, pressed only if every one of `touch_reads` reads is pressed.
    pub fn touch_pressed(&mut self, touch: TouchId) -> Result<bool, RobotError> {
        for _ in 0..self.params.touch_reads.max(1) {
            if !self.hw()?.read_touch(touch)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // ---- SENSOR ARM ----

    /// Drive the sensor arm until it reaches the given end of its travel.
    pub fn shift_arm(&mut self, end: ArmEnd) -> Result<(), RobotError> {
        let power = end.direction() * self.params.arm_power;
        self.hw()?.motor_start(MotorId::SensorArm, power)?;

        let mut reached = false;
        for _ in 0..self.params.max_steps {
            if self.touch_pressed(end.touch())? {
                reached = true;
                break;
            }
        }

        self.stop()?;

        if reached {
            Ok(())
        } else {
            Err(RobotError::ArmStuck(end))
        }
    }

    /// Move the arm one small step towards the given end.
    pub fn nudge_arm(&mut self, end: ArmEnd, on_ms: u64, off_ms: u64) -> Result<(), RobotError> {
        let power = end.direction() * self.params.arm_power;

        self.hw()?.motor_start(MotorId::SensorArm, power)?;
        self.sleep_ms(on_ms)?;
        self.stop()?;
        self.sleep_ms(off_ms)
    }

    /// Step the arm towards `end` until the sensor sees `colour` or the arm reaches the end of
    /// its travel. Returns true if the colour was seen.
    pub fn shift_arm_until(&mut self, end: ArmEnd, colour: Colour) -> Result<bool, RobotError> {
        let t = &self.params.timings;
        let (on, off) = (t.arm_pulse_on, t.arm_pulse_off);

        for _ in 0..self.params.max_steps {
            if self.read_colour()? == colour {
                return Ok(true);
            }
            if self.touch_pressed(end.touch())? {
                return Ok(false);
            }
            self.nudge_arm(end, on, off)?;
        }

        Err(RobotError::ArmStuck(end))
    }
}

impl<R: Robot> TonePlayer for Rig<R> {
    fn play(&mut self, tones: &[Tone]) -> Result<(), RobotError> {
        self.hw()?.play_tones(tones)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
