//! # Colour module
//!
//! Colours seen by the robot's colour sensor and the classifiers turning raw RGB readings into
//! them. Classification is pure, the sensing layer in [`crate::robot::Rig`] is responsible for
//! taking readings and normalising them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod table;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

pub use table::{CalibSample, ColourTable, ColourTableError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Largest plausible value of a normalised channel, anything above is a bad reading.
pub const MAX_CHANNEL: i32 = 1020;

/// Raw channel value read off a pure white surface.
pub const DEFAULT_WHITE_MAX: i32 = 305;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A reading from the colour sensor.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

/// Open interval on a single channel, either end may be unbounded.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Band {
    /// The channel must be strictly greater than this value
    pub above: Option<i32>,

    /// The channel must be strictly less than this value
    pub below: Option<i32>,
}

/// A single row of the [`ThresholdTable`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdRule {
    pub colour: Colour,

    #[serde(default)]
    pub r: Band,

    #[serde(default)]
    pub g: Band,

    #[serde(default)]
    pub b: Band,
}

/// Ordered list of threshold rules, the first rule matching a reading gives its colour.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    pub rules: Vec<ThresholdRule>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Colours found on the map.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Colour {
    Black,
    Blue,
    Green,
    Yellow,
    Red,
    White,
    Unknown,
}

/// Ways of turning a normalised reading into a colour.
#[derive(Debug, Clone)]
pub enum Classifier {
    Thresholds(ThresholdTable),

    /// Nearest neighbour against recorded calibration samples.
    Calibrated(ColourTable),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Colour {
    /// The only colours a building may have.
    pub const BUILDINGS: [Colour; 3] = [Colour::Green, Colour::Blue, Colour::White];

    /// Colour from the sensor's built-in colour index.
    pub fn from_index(index: i32) -> Self {
        match index {
            1 => Colour::Black,
            2 => Colour::Blue,
            3 => Colour::Green,
            4 => Colour::Yellow,
            5 => Colour::Red,
            6 => Colour::White,
            _ => Colour::Unknown,
        }
    }

    /// The built-in colour index of this colour, also used in calibration files.
    pub fn index(self) -> i32 {
        match self {
            Colour::Black => 1,
            Colour::Blue => 2,
            Colour::Green => 3,
            Colour::Yellow => 4,
            Colour::Red => 5,
            Colour::White => 6,
            Colour::Unknown => 7,
        }
    }

    pub fn is_building(self) -> bool {
        Self::BUILDINGS.contains(&self)
    }

    /// Black street or yellow intersection.
    pub fn is_road(self) -> bool {
        matches!(self, Colour::Black | Colour::Yellow)
    }

    /// Single letter code used in logs and archives.
    pub fn letter(self) -> char {
        match self {
            Colour::Black => 'K',
            Colour::Blue => 'B',
            Colour::Green => 'G',
            Colour::Yellow => 'Y',
            Colour::Red => 'R',
            Colour::White => 'W',
            Colour::Unknown => '?',
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Colour::Black => "black",
            Colour::Blue => "blue",
            Colour::Green => "green",
            Colour::Yellow => "yellow",
            Colour::Red => "red",
            Colour::White => "white",
            Colour::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

impl Rgb {
    pub fn new(r: i32, g: i32, b: i32) -> Self {
        Self { r, g, b }
    }

    /// Scale a raw reading so that a reading of `white_max` maps to 256.
    ///
    /// Garbage readings saturate rather than overflow, they stay out of range after scaling.
    pub fn normalised(self, white_max: i32) -> Self {
        if white_max <= 0 {
            return self;
        }

        Self {
            r: self.r.saturating_mul(256) / white_max,
            g: self.g.saturating_mul(256) / white_max,
            b: self.b.saturating_mul(256) / white_max,
        }
    }

    pub fn sq_dist(&self, other: &Rgb) -> i64 {
        let dr = self.r as i64 - other.r as i64;
        let dg = self.g as i64 - other.g as i64;
        let db = self.b as i64 - other.b as i64;
        dr.saturating_mul(dr)
            .saturating_add(dg.saturating_mul(dg))
            .saturating_add(db.saturating_mul(db))
    }

    pub fn max_channel(&self) -> i32 {
        self.r.max(self.g).max(self.b)
    }

    /// True if every channel is within `0..=MAX_CHANNEL`.
    pub fn in_range(&self) -> bool {
        [self.r, self.g, self.b]
            .iter()
            .all(|c| (0..=MAX_CHANNEL).contains(c))
    }
}

impl Band {
    pub fn above(min: i32) -> Self {
        Self {
            above: Some(min),
            below: None,
        }
    }

    pub fn below(max: i32) -> Self {
        Self {
            above: None,
            below: Some(max),
        }
    }

    fn contains(&self, value: i32) -> bool {
        self.above.map_or(true, |a| value > a) && self.below.map_or(true, |b| value < b)
    }
}

impl ThresholdRule {
    fn matches(&self, rgb: &Rgb) -> bool {
        self.r.contains(rgb.r) && self.g.contains(rgb.g) && self.b.contains(rgb.b)
    }
}

impl ThresholdTable {
    /// Classify a normalised reading.
    ///
    /// Readings with any channel outside `0..=MAX_CHANNEL`, or matching no rule, are `Unknown`.
    pub fn classify(&self, rgb: Rgb) -> Colour {
        if !rgb.in_range() {
            return Colour::Unknown;
        }

        self.rules
            .iter()
            .find(|rule| rule.matches(&rgb))
            .map_or(Colour::Unknown, |rule| rule.colour)
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        let rule = |colour, r, g, b| ThresholdRule { colour, r, g, b };

        Self {
            rules: vec![
                rule(Colour::White, Band::above(150), Band::above(150), Band::above(150)),
                rule(Colour::Red, Band::above(200), Band::below(100), Band::below(100)),
                rule(Colour::Yellow, Band::above(100), Band::above(100), Band::below(100)),
                rule(Colour::Green, Band::below(50), Band::above(40), Band::below(60)),
                rule(Colour::Blue, Band::default(), Band::default(), Band::above(75)),
                rule(Colour::Black, Band::below(50), Band::below(50), Band::below(50)),
            ],
        }
    }
}

impl Classifier {
    pub fn classify(&self, rgb: Rgb) -> Colour {
        match self {
            Classifier::Thresholds(t) => t.classify(rgb),
            Classifier::Calibrated(t) => t.classify(rgb),
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::Thresholds(ThresholdTable::default())
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Classify a normalised reading against the default threshold table.
pub fn classify(rgb: Rgb) -> Colour {
    ThresholdTable::default().classify(rgb)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
