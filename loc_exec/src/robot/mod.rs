//! # Robot module
//!
//! Hardware access for the robot. The [`Robot`] trait is the set of blocking operations the robot
//! bridge provides, [`RobotClient`] implements it over the network and [`Rig`] wraps any robot
//! with the sensing and actuation helpers the navigation controller is built from.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod client;
mod rig;

#[cfg(test)]
pub mod mock;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::robot::{MotorId, StopMode, Tone, TouchId},
    net::NetError,
};

use crate::colour::Rgb;

pub use client::RobotClient;
pub use rig::{ArmEnd, Rig, RigParams, Timings, TonePlayer};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Blocking operations provided by the robot.
pub trait Robot {
    /// Start a motor at a signed power, it keeps running until all motors are stopped.
    fn motor_start(&mut self, motor: MotorId, power: i32) -> Result<(), RobotError>;

    fn stop_all(&mut self, mode: StopMode) -> Result<(), RobotError>;

    /// Single, unfiltered, read of a touch sensor.
    fn read_touch(&mut self, touch: TouchId) -> Result<bool, RobotError>;

    /// Raw reading of the colour sensor.
    fn read_rgb(&mut self) -> Result<Rgb, RobotError>;

    /// The colour sensor's own classification of what it sees.
    fn read_colour_index(&mut self) -> Result<i32, RobotError>;

    /// Gyro angle in degrees, increasing clockwise.
    fn read_gyro(&mut self) -> Result<i32, RobotError>;

    fn play_tones(&mut self, tones: &[Tone]) -> Result<(), RobotError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RobotError {
    #[error("Shutdown requested")]
    Shutdown,

    #[error("Network error talking to the robot bridge: {0}")]
    Net(NetError),

    #[error("The robot bridge reported an error: {0}")]
    Bridge(String),

    #[error("Unexpected response to {0}: {1}")]
    UnexpectedResponse(&'static str, String),

    #[error("The sensor arm never reached the {0:?} position")]
    ArmStuck(ArmEnd),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RobotError {
    pub fn is_shutdown(&self) -> bool {
        matches!(self, RobotError::Shutdown)
    }
}
