//! # Street map
//!
//! The map is a grid of `size_x * size_y` intersections. Each intersection is surrounded by four
//! buildings, stored clockwise from the top-left. Intersections are indexed in raster order,
//! `index = x + y * size_x`, with `(0, 0)` at the top-left of the map.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod parse;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path};

use crate::colour::Colour;

pub use parse::parse_map_image;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Maximum number of intersections along either axis of the map.
pub const MAX_MAP_DIM: usize = 20;

/// Number of buildings around each intersection.
pub const NUM_BUILDINGS: usize = 4;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Position of an intersection on the grid.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

/// A loaded street map.
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    size_x: usize,
    size_y: usize,

    /// Building colours, one row per intersection, columns clockwise from top-left
    buildings: Array2<Colour>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Direction the robot faces on the grid. Turning by +1 is a quarter turn clockwise.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heading {
    Up,
    Right,
    Down,
    Left,
}

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Map must be between 1x1 and 20x20 intersections, found {0}x{1}")]
    InvalidSize(usize, usize),

    #[error("Expected building colours for {0} intersections but found {1}")]
    BuildingCountMismatch(usize, usize),

    #[error("Could not open the map image: {0}")]
    ImageError(image::ImageError),

    #[error("No yellow intersection marker found in the map image")]
    NoIntersections,

    #[error("Could not measure the intersection {0} in the map image")]
    BadGeometry(&'static str),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Heading {
    pub const ALL: [Heading; 4] = [Heading::Up, Heading::Right, Heading::Down, Heading::Left];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    pub fn index(self) -> usize {
        match self {
            Heading::Up => 0,
            Heading::Right => 1,
            Heading::Down => 2,
            Heading::Left => 3,
        }
    }

    /// The heading after turning by the given number of clockwise quarter turns (negative for
    /// anticlockwise).
    pub fn turned(self, quarter_turns: i32) -> Self {
        let idx = (self.index() as i32 + quarter_turns).rem_euclid(4);
        Self::from_index(idx as usize)
    }

    /// Smallest signed number of quarter turns taking this heading to `other`, in `-1..=2`.
    pub fn turns_to(self, other: Heading) -> i32 {
        match (other.index() as i32 - self.index() as i32).rem_euclid(4) {
            3 => -1,
            t => t,
        }
    }

    /// Grid step `(dx, dy)` of one intersection in this direction.
    pub fn step(self) -> (i64, i64) {
        match self {
            Heading::Up => (0, -1),
            Heading::Right => (1, 0),
            Heading::Down => (0, 1),
            Heading::Left => (-1, 0),
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Heading::Up => "up",
            Heading::Right => "right",
            Heading::Down => "down",
            Heading::Left => "left",
        };
        write!(f, "{}", name)
    }
}

impl Coord {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Map {
    /// Create a new map from the building colours of each intersection, given in raster order.
    pub fn new(
        size_x: usize,
        size_y: usize,
        buildings: &[[Colour; NUM_BUILDINGS]],
    ) -> Result<Self, MapError> {
        if !(1..=MAX_MAP_DIM).contains(&size_x) || !(1..=MAX_MAP_DIM).contains(&size_y) {
            return Err(MapError::InvalidSize(size_x, size_y));
        }
        if buildings.len() != size_x * size_y {
            return Err(MapError::BuildingCountMismatch(
                size_x * size_y,
                buildings.len(),
            ));
        }

        let data = Array2::from_shape_fn((buildings.len(), NUM_BUILDINGS), |(i, j)| {
            buildings[i][j]
        });

        Ok(Self {
            size_x,
            size_y,
            buildings: data,
        })
    }

    /// Load a map from an image file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let img = image::open(path).map_err(MapError::ImageError)?;
        parse_map_image(&img.to_rgb8())
    }

    pub fn size_x(&self) -> usize {
        self.size_x
    }

    pub fn size_y(&self) -> usize {
        self.size_y
    }

    pub fn num_intersections(&self) -> usize {
        self.size_x * self.size_y
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.x < self.size_x && coord.y < self.size_y
    }

    pub fn index(&self, coord: Coord) -> usize {
        coord.x + coord.y * self.size_x
    }

    pub fn coord(&self, index: usize) -> Coord {
        Coord::new(index % self.size_x, index / self.size_x)
    }

    /// The intersection reached by moving `(dx, dy)` from `coord`, or `None` if off the map.
    pub fn offset(&self, coord: Coord, dx: i64, dy: i64) -> Option<Coord> {
        let x = coord.x as i64 + dx;
        let y = coord.y as i64 + dy;

        if x < 0 || y < 0 || x >= self.size_x as i64 || y >= self.size_y as i64 {
            None
        } else {
            Some(Coord::new(x as usize, y as usize))
        }
    }

    /// Building colours around an intersection, clockwise from top-left.
    pub fn buildings(&self, index: usize) -> ArrayView1<Colour> {
        self.buildings.row(index)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
