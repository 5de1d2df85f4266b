//! Exploration policy
//!
//! Only ever driving straight on would scan the same row of intersections over and over, so
//! every `period`th intersection the robot turns before leaving it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ExplorePolicy {
    /// Number of intersections per turn
    pub period: u32,

    /// Clockwise quarter turns made on turning intersections
    pub turn: i32,

    #[serde(skip)]
    counter: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ExplorePolicy {
    fn default() -> Self {
        Self {
            period: 2,
            turn: -1,
            counter: 0,
        }
    }
}

impl ExplorePolicy {
    /// Quarter turns to make before leaving the current intersection.
    pub fn next_turn(&mut self) -> i32 {
        self.counter = (self.counter + 1) % self.period.max(1);

        if self.counter == 0 {
            self.turn
        } else {
            0
        }
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
