//! # Localisation library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to access items defined
//! inside the localisation executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Autonomy - the street grid map, localisation filter, navigation and path execution
pub mod auto;

/// Calibration - records the colour table used for nearest neighbour classification
pub mod calib;

/// Colour classification of the sensor's readings
pub mod colour;

/// Executable parameters
pub mod params;

/// Robot access - the robot bridge client and the rig built on top of it
pub mod robot;
