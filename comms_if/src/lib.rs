//! # Communications interface crate.
//!
//! Provides the messages exchanged with the robot bridge and the networking layer they travel
//! over.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command and response definitions for equipment (the robot's motors and sensors)
pub mod eqpt;

/// Network module
pub mod net;
