//! Map image parsing
//!
//! Map images have a white background and a red border, black streets, yellow intersection
//! markers, and buildings in pure green, pure blue or white. Other colours are ignored so maps may
//! carry extra markings. The scale of the image does not matter, the intersection geometry is
//! measured from the image itself.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use log::{debug, info, warn};

use super::{Map, MapError, NUM_BUILDINGS};
use crate::colour::Colour;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Pixel geometry of the intersection grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Geometry {
    /// Top-left pixel of the first intersection
    base_x: u32,
    base_y: u32,

    /// Size of an intersection marker
    width: u32,
    height: u32,

    /// Distance between neighbouring intersections
    pitch_x: u32,
    pitch_y: u32,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Parse a map out of an image.
///
/// Building pixels which are not one of the valid building colours are reported and stored as
/// [`Colour::Unknown`], an intersection with such a building will never fully match an
/// observation.
pub fn parse_map_image(img: &RgbImage) -> Result<Map, MapError> {
    let geom = measure_geometry(img)?;

    info!(
        "Intersection geometry: base ({}, {}), size {}x{} px, pitch {}x{} px",
        geom.base_x, geom.base_y, geom.width, geom.height, geom.pitch_x, geom.pitch_y
    );

    // Count the intersections along the first row and column
    let size_x = (geom.base_x + geom.width / 2..img.width())
        .step_by(geom.pitch_x as usize)
        .filter(|&x| *img.get_pixel(x, geom.base_y) == YELLOW)
        .count();
    let size_y = (geom.base_y + geom.height / 2..img.height())
        .step_by(geom.pitch_y as usize)
        .filter(|&y| *img.get_pixel(geom.base_x, y) == YELLOW)
        .count();

    info!("Map size: {}x{} intersections", size_x, size_y);

    let mut buildings = Vec::with_capacity(size_x * size_y);

    for j in 0..size_y {
        for i in 0..size_x {
            let cx = (geom.base_x + i as u32 * geom.pitch_x + geom.width / 2) as i64;
            let cy = (geom.base_y + j as u32 * geom.pitch_y + geom.height / 2) as i64;
            let (w, h) = (geom.width as i64, geom.height as i64);

            // Clockwise from top-left
            let corners = [(-w, -h), (w, -h), (w, h), (-w, h)];
            let mut colours = [Colour::Unknown; NUM_BUILDINGS];

            for (slot, (ox, oy)) in corners.iter().enumerate() {
                colours[slot] = match pixel_at(img, cx + ox, cy + oy) {
                    Some(px) => match building_colour(px) {
                        Some(c) => c,
                        None => {
                            warn!(
                                "Colour is not valid for intersection ({}, {}) building {}: {:?}",
                                i, j, slot, px.0
                            );
                            Colour::Unknown
                        }
                    },
                    None => {
                        warn!(
                            "Building {} of intersection ({}, {}) lies outside the image",
                            slot, i, j
                        );
                        Colour::Unknown
                    }
                };
            }

            debug!("Intersection ({}, {}) buildings: {:?}", i, j, colours);
            buildings.push(colours);
        }
    }

    Map::new(size_x, size_y, &buildings)
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Find the first intersection marker (scanning column by column) and measure the size and
/// spacing of markers from it.
fn measure_geometry(img: &RgbImage) -> Result<Geometry, MapError> {
    let (base_x, base_y) = (0..img.width())
        .flat_map(|x| (0..img.height()).map(move |y| (x, y)))
        .find(|&(x, y)| *img.get_pixel(x, y) == YELLOW)
        .ok_or(MapError::NoIntersections)?;

    let (width, pitch_x) = measure_run((base_x..img.width()).map(|x| *img.get_pixel(x, base_y)))
        .ok_or(MapError::BadGeometry("spacing along x"))?;
    let (height, pitch_y) =
        measure_run((base_y..img.height()).map(|y| *img.get_pixel(base_x, y)))
            .ok_or(MapError::BadGeometry("spacing along y"))?;

    Ok(Geometry {
        base_x,
        base_y,
        width: width as u32,
        height: height as u32,
        pitch_x: pitch_x as u32,
        pitch_y: pitch_y as u32,
    })
}

/// Given pixels starting on a marker, return the marker length and the distance to the start of
/// the next marker.
fn measure_run<I: Iterator<Item = Rgb<u8>>>(pixels: I) -> Option<(usize, usize)> {
    let mut width = None;

    for (k, px) in pixels.enumerate() {
        match width {
            None if px != YELLOW => width = Some(k),
            Some(w) if px == YELLOW => return Some((w, k)),
            _ => (),
        }
    }

    None
}

fn pixel_at(img: &RgbImage, x: i64, y: i64) -> Option<Rgb<u8>> {
    if x < 0 || y < 0 {
        return None;
    }
    img.get_pixel_checked(x as u32, y as u32).copied()
}

fn building_colour(px: Rgb<u8>) -> Option<Colour> {
    match px.0 {
        [0, 255, 0] => Some(Colour::Green),
        [0, 0, 255] => Some(Colour::Blue),
        [255, 255, 255] => Some(Colour::White),
        _ => None,
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
