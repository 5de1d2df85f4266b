//! # Colour calibration
//!
//! Records colour sensor readings over surfaces of known colour, producing the [`ColourTable`]
//! used for nearest neighbour classification. The operator places the sensor over a spot of the
//! requested colour and presses the top touch sensor, the readings are taken and the operator moves
//! on to the next spot.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{
    colour::{CalibSample, Colour, ColourTable, ColourTableError, Rgb},
    robot::{ArmEnd, Rig, Robot, RobotError},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Colours calibrated, in the order they are asked for.
pub const CALIB_COLOURS: [Colour; 6] = [
    Colour::Black,
    Colour::Blue,
    Colour::Green,
    Colour::Yellow,
    Colour::Red,
    Colour::White,
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CalibParams {
    pub spots_per_colour: usize,

    pub samples_per_spot: usize,

    /// Normalised readings with any channel above this are discarded
    pub max_channel: i32,

    pub sample_period_ms: u64,

    /// Period at which the touch sensor is polled while waiting for the operator
    pub press_poll_ms: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CalibError {
    #[error("Robot error: {0}")]
    Robot(RobotError),

    #[error("Could only take {1} usable readings of {0}, every other one was saturated")]
    Saturated(Colour, usize),

    #[error("Could not save the calibration table: {0}")]
    Table(ColourTableError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CalibParams {
    fn default() -> Self {
        Self {
            spots_per_colour: 3,
            samples_per_spot: 10,
            max_channel: 500,
            sample_period_ms: 100,
            press_poll_ms: 20,
        }
    }
}

impl CalibError {
    pub fn is_shutdown(&self) -> bool {
        matches!(self, CalibError::Robot(e) if e.is_shutdown())
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Collect calibration samples for every colour in [`CALIB_COLOURS`].
pub fn collect<R: Robot>(rig: &mut Rig<R>, params: &CalibParams) -> Result<ColourTable, CalibError> {
    let mut samples = Vec::new();

    for &colour in CALIB_COLOURS.iter() {
        info!("Calibrating {}", colour);

        for spot in 0..params.spots_per_colour {
            info!(
                "Place the sensor over {} spot {} of {} and press the top button",
                colour,
                spot + 1,
                params.spots_per_colour
            );
            wait_for_press(rig, params).map_err(CalibError::Robot)?;

            sample_spot(rig, params, colour, &mut samples)?;

            wait_for_release(rig, params).map_err(CalibError::Robot)?;
        }
    }

    info!("Collected {} calibration samples", samples.len());
    Ok(ColourTable::new(samples))
}

/// Collect calibration samples and save them to `path`.
pub fn run<R: Robot, P: AsRef<Path>>(
    rig: &mut Rig<R>,
    params: &CalibParams,
    path: P,
) -> Result<ColourTable, CalibError> {
    let table = collect(rig, params)?;
    table.save(&path).map_err(CalibError::Table)?;
    info!("Calibration saved to {:?}", path.as_ref());
    Ok(table)
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn usable(rgb: Rgb, max_channel: i32) -> bool {
    rgb.max_channel() <= max_channel
}

fn sample_spot<R: Robot>(
    rig: &mut Rig<R>,
    params: &CalibParams,
    colour: Colour,
    samples: &mut Vec<CalibSample>,
) -> Result<(), CalibError> {
    let mut taken = 0;

    for _ in 0..rig.params().max_steps {
        if taken == params.samples_per_spot {
            return Ok(());
        }

        let rgb = rig.read_rgb().map_err(CalibError::Robot)?;
        if !usable(rgb, params.max_channel) {
            continue;
        }

        debug!("{} sample: {:?}", colour, rgb);
        samples.push(CalibSample { rgb, colour });
        taken += 1;

        rig.sleep_ms(params.sample_period_ms)
            .map_err(CalibError::Robot)?;
    }

    if taken == params.samples_per_spot {
        Ok(())
    } else {
        Err(CalibError::Saturated(colour, taken))
    }
}

fn wait_for_press<R: Robot>(rig: &mut Rig<R>, params: &CalibParams) -> Result<(), RobotError> {
    while !rig.touch_pressed(ArmEnd::Extended.touch())? {
        rig.sleep_ms(params.press_poll_ms)?;
    }
    Ok(())
}

fn wait_for_release<R: Robot>(rig: &mut Rig<R>, params: &CalibParams) -> Result<(), RobotError> {
    while rig.touch_pressed(ArmEnd::Extended.touch())? {
        rig.sleep_ms(params.press_poll_ms)?;
    }
    Ok(())
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
