//! # Localisation Executable Parameters
//!
//! This module provides the parameters of the localisation executable, loaded from `net.toml` and
//! `loc_exec.toml` in the params directory.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::net::SocketOptions;
use serde::{Deserialize, Serialize};

use crate::{
    auto::{
        loc::LocParams, loc_mgr::LocMgrParams, nav::NavParams, notify::ToneParams,
        path_exec::PathExecParams,
    },
    calib::CalibParams,
    robot::RigParams,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network parameters.
#[derive(Deserialize, Debug, Clone)]
pub struct NetParams {
    /// Network endpoint of the robot bridge
    pub robot_endpoint: String,

    #[serde(default)]
    pub robot_socket: SocketOptions,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct LocExecParams {
    pub loc: LocParams,

    pub rig: RigParams,

    pub nav: NavParams,

    pub loc_mgr: LocMgrParams,

    pub path_exec: PathExecParams,

    pub calib: CalibParams,

    /// Calibration table file, relative to the software root. Colours are classified with fixed
    /// thresholds if this is not given or the file does not exist.
    pub calibration_file: Option<String>,

    pub tones: ToneParams,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
