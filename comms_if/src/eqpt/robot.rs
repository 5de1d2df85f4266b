//! # Robot Equipment Commands
//!
//! Messages exchanged between the localisation executable and the robot bridge, which owns the
//! physical motors and sensors. Every command is answered by exactly one response.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single tone played by the robot's speaker.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub freq_hz: u32,

    pub duration_ms: u32,

    /// Speaker volume, 0 (mute) to 100.
    pub volume: u8,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of the motors on the robot
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum MotorId {
    LeftWheel,
    RightWheel,

    /// Moves the colour sensor between its retracted and extended positions.
    SensorArm,
}

/// IDs of the touch sensors on the robot
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum TouchId {
    /// Pressed when the sensor arm is fully retracted.
    Back,

    /// Pressed when the sensor arm is fully extended.
    Top,
}

/// How the motors should behave once power is removed.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum StopMode {
    Coast,
    Brake,
}

/// Commands sent to the robot bridge
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum RobotCmd {
    /// Check the bridge is alive, answered by `RobotResponse::Ok`.
    Ping,

    /// Start a motor at a signed power (-100 to 100), it runs until stopped.
    MotorStart { motor: MotorId, power: i32 },

    /// Stop every motor.
    StopAll(StopMode),

    ReadTouch(TouchId),

    /// Read the raw red, green, blue channels of the colour sensor.
    ReadRgb,

    /// Read the colour sensor's built-in colour classification.
    ReadColourIndex,

    /// Read the gyro's accumulated angle in degrees.
    ReadGyro,

    PlayTones(Vec<Tone>),
}

/// Responses from the robot bridge
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum RobotResponse {
    /// The command was executed.
    Ok,

    Touch(bool),

    Rgb([i32; 3]),

    ColourIndex(i32),

    Gyro(i32),

    /// The bridge could not execute the command.
    Error(String),
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cmd_wire_format() {
        let cmd = RobotCmd::MotorStart {
            motor: MotorId::SensorArm,
            power: -50,
        };

        assert_eq!(
            serde_json::to_string(&cmd).unwrap(),
            r#"{"MotorStart":{"motor":"SensorArm","power":-50}}"#
        );
        assert_eq!(
            serde_json::to_string(&RobotCmd::StopAll(StopMode::Brake)).unwrap(),
            r#"{"StopAll":"Brake"}"#
        );
    }

    #[test]
    fn test_response_from_bridge() {
        let rsp: RobotResponse = serde_json::from_str(r#"{"Rgb":[120,40,33]}"#).unwrap();
        assert_eq!(rsp, RobotResponse::Rgb([120, 40, 33]));

        let rsp: RobotResponse = serde_json::from_str(r#""Ok""#).unwrap();
        assert_eq!(rsp, RobotResponse::Ok);
    }
}
