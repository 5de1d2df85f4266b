//! Navigation controller parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A motor pulse, on for `on_ms` then stopped for `off_ms`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub on_ms: u64,
    pub off_ms: u64,
}

/// Parameters for the navigation controller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NavParams {
    /// Number of consecutive identical readings needed to act on a colour
    pub confirm_reads: usize,

    /// Pulse used to push off or back onto an intersection
    pub push_pulse: Pulse,

    /// Pulse used to back away from the map boundary
    pub back_up_pulse: Pulse,

    /// Half power pulse used to creep back up to the boundary
    pub creep_pulse: Pulse,

    /// Third power pulse nudging the robot onto the boundary
    pub nudge_pulse: Pulse,

    /// Sensor arm pulse used while checking a line runs under the whole arm
    pub line_check_pulse: Pulse,

    /// Wait after stopping before each scan reading
    pub scan_settle_ms: u64,

    /// Turning time between scan readings
    pub scan_turn_ms: u64,

    /// Wait after finding the line while aligning
    pub align_settle_ms: u64,

    /// Wait between turns while searching for the line
    pub align_search_pause_ms: u64,

    /// Gyro travel after which a search in both directions reverses
    pub flip_after_deg: i32,

    /// Tolerance when turning to the centre of the line
    pub centre_tolerance_deg: i32,

    /// Wait before driving on after a colour could not be confirmed
    pub unconfirmed_wait_ms: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pulse {
    pub const fn new(on_ms: u64, off_ms: u64) -> Self {
        Self { on_ms, off_ms }
    }
}

impl Default for NavParams {
    fn default() -> Self {
        Self {
            confirm_reads: 3,
            push_pulse: Pulse::new(100, 50),
            back_up_pulse: Pulse::new(150, 150),
            creep_pulse: Pulse::new(150, 150),
            nudge_pulse: Pulse::new(20, 0),
            line_check_pulse: Pulse::new(50, 100),
            scan_settle_ms: 150,
            scan_turn_ms: 350,
            align_settle_ms: 125,
            align_search_pause_ms: 25,
            flip_after_deg: 30,
            centre_tolerance_deg: 1,
            unconfirmed_wait_ms: 100,
        }
    }
}
