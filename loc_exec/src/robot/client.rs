//! # Robot Client
//!
//! Network implementation of [`Robot`], each operation is one JSON request/reply with the robot
//! bridge.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::robot::{MotorId, RobotCmd, RobotResponse, StopMode, Tone, TouchId},
    net::{zmq, JsonReqSocket, SocketOptions},
};
use log::{debug, info};

use super::{Robot, RobotError};
use crate::colour::Rgb;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct RobotClient {
    socket: JsonReqSocket,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RobotClient {
    /// Connect to the robot bridge and check it answers.
    pub fn connect(
        ctx: &zmq::Context,
        socket_options: &SocketOptions,
        endpoint: &str,
    ) -> Result<Self, RobotError> {
        let socket =
            JsonReqSocket::connect(ctx, socket_options, endpoint).map_err(RobotError::Net)?;

        let mut client = Self { socket };
        client.ping()?;

        info!("Connected to the robot bridge at {}", client.socket.endpoint());

        Ok(client)
    }

    pub fn ping(&mut self) -> Result<(), RobotError> {
        self.expect_ok("Ping", &RobotCmd::Ping)
    }

    fn request(&mut self, cmd: &RobotCmd) -> Result<RobotResponse, RobotError> {
        debug!("Robot request: {:?}", cmd);

        match self.socket.request(cmd).map_err(RobotError::Net)? {
            RobotResponse::Error(e) => Err(RobotError::Bridge(e)),
            r => Ok(r),
        }
    }

    fn expect_ok(&mut self, name: &'static str, cmd: &RobotCmd) -> Result<(), RobotError> {
        match self.request(cmd)? {
            RobotResponse::Ok => Ok(()),
            r => Err(RobotError::UnexpectedResponse(name, format!("{:?}", r))),
        }
    }
}

impl Robot for RobotClient {
    fn motor_start(&mut self, motor: MotorId, power: i32) -> Result<(), RobotError> {
        self.expect_ok("MotorStart", &RobotCmd::MotorStart { motor, power })
    }

    fn stop_all(&mut self, mode: StopMode) -> Result<(), RobotError> {
        self.expect_ok("StopAll", &RobotCmd::StopAll(mode))
    }

    fn read_touch(&mut self, touch: TouchId) -> Result<bool, RobotError> {
        match self.request(&RobotCmd::ReadTouch(touch))? {
            RobotResponse::Touch(pressed) => Ok(pressed),
            r => Err(RobotError::UnexpectedResponse("ReadTouch", format!("{:?}", r))),
        }
    }

    fn read_rgb(&mut self) -> Result<Rgb, RobotError> {
        match self.request(&RobotCmd::ReadRgb)? {
            RobotResponse::Rgb([r, g, b]) => Ok(Rgb::new(r, g, b)),
            r => Err(RobotError::UnexpectedResponse("ReadRgb", format!("{:?}", r))),
        }
    }

    fn read_colour_index(&mut self) -> Result<i32, RobotError> {
        match self.request(&RobotCmd::ReadColourIndex)? {
            RobotResponse::ColourIndex(i) => Ok(i),
            r => Err(RobotError::UnexpectedResponse(
                "ReadColourIndex",
                format!("{:?}", r),
            )),
        }
    }

    fn read_gyro(&mut self) -> Result<i32, RobotError> {
        match self.request(&RobotCmd::ReadGyro)? {
            RobotResponse::Gyro(a) => Ok(a),
            r => Err(RobotError::UnexpectedResponse("ReadGyro", format!("{:?}", r))),
        }
    }

    fn play_tones(&mut self, tones: &[Tone]) -> Result<(), RobotError> {
        self.expect_ok("PlayTones", &RobotCmd::PlayTones(tones.to_vec()))
    }
}
