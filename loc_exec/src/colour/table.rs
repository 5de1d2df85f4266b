//! Calibration sample tables
//!
//! A calibration file is a flat sequence of records, each four little endian `i32`s: the
//! normalised red, green and blue channels followed by the colour index of the sample.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use super::{Colour, Rgb};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Size of one record in bytes.
const RECORD_SIZE: usize = 4 * 4;

/// Squared distance below which the nearest sample is accepted.
pub const DEFAULT_MAX_SQ_DIST: i64 = 100;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A reading recorded on a surface of known colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibSample {
    pub rgb: Rgb,
    pub colour: Colour,
}

/// Set of calibration samples used for nearest neighbour classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ColourTable {
    samples: Vec<CalibSample>,

    max_sq_dist: i64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ColourTableError {
    #[error("Could not open the calibration file: {0}")]
    OpenError(std::io::Error),

    #[error("Could not read the calibration file: {0}")]
    ReadError(std::io::Error),

    #[error("Could not write the calibration file: {0}")]
    WriteError(std::io::Error),

    #[error("Calibration file is {0} bytes long, which is not a whole number of records")]
    TruncatedRecord(usize),

    #[error("Calibration file contains no samples")]
    Empty,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ColourTable {
    pub fn new(samples: Vec<CalibSample>) -> Self {
        Self {
            samples,
            max_sq_dist: DEFAULT_MAX_SQ_DIST,
        }
    }

    /// Set the squared distance below which the nearest sample is accepted.
    pub fn with_max_sq_dist(mut self, max_sq_dist: i64) -> Self {
        self.max_sq_dist = max_sq_dist;
        self
    }

    pub fn samples(&self) -> &[CalibSample] {
        &self.samples
    }

    /// Load a table from a calibration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ColourTableError> {
        let file = File::open(path).map_err(ColourTableError::OpenError)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read a table from a stream of records.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, ColourTableError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(ColourTableError::ReadError)?;

        if bytes.len() % RECORD_SIZE != 0 {
            return Err(ColourTableError::TruncatedRecord(bytes.len()));
        }
        if bytes.is_empty() {
            return Err(ColourTableError::Empty);
        }

        let mut samples = Vec::with_capacity(bytes.len() / RECORD_SIZE);
        let mut cursor = bytes.as_slice();

        while !cursor.is_empty() {
            let mut field = || {
                cursor
                    .read_i32::<LittleEndian>()
                    .map_err(ColourTableError::ReadError)
            };

            let rgb = Rgb::new(field()?, field()?, field()?);
            let colour = Colour::from_index(field()?);

            samples.push(CalibSample { rgb, colour });
        }

        Ok(Self::new(samples))
    }

    /// Save the table to a calibration file, overwriting any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ColourTableError> {
        let file = File::create(path).map_err(ColourTableError::WriteError)?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer)?;
        writer.flush().map_err(ColourTableError::WriteError)
    }

    pub fn to_writer<W: Write>(&self, writer: &mut W) -> Result<(), ColourTableError> {
        for s in &self.samples {
            for v in &[s.rgb.r, s.rgb.g, s.rgb.b, s.colour.index()] {
                writer
                    .write_i32::<LittleEndian>(*v)
                    .map_err(ColourTableError::WriteError)?;
            }
        }

        Ok(())
    }

    /// Classify a normalised reading as the colour of the nearest sample.
    ///
    /// If even the nearest sample is not closer than the maximum distance, or the reading is out
    /// of range, the reading is `Unknown`.
    pub fn classify(&self, rgb: Rgb) -> Colour {
        if !rgb.in_range() {
            return Colour::Unknown;
        }

        self.samples
            .iter()
            .map(|s| (s.rgb.sq_dist(&rgb), s.colour))
            .filter(|(d, _)| *d < self.max_sq_dist)
            .min_by_key(|(d, _)| *d)
            .map_or(Colour::Unknown, |(_, c)| c)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::colour::DEFAULT_WHITE_MAX;

    fn sample(r: i32, g: i32, b: i32, colour: Colour) -> CalibSample {
        CalibSample {
            rgb: Rgb::new(r, g, b),
            colour,
        }
    }

    #[test]
    fn test_nearest_neighbour() {
        let table = ColourTable::new(vec![
            sample(10, 10, 10, Colour::Black),
            sample(20, 90, 30, Colour::Green),
            sample(30, 40, 140, Colour::Blue),
        ]);

        assert_eq!(table.classify(Rgb::new(12, 11, 9)), Colour::Black);
        assert_eq!(table.classify(Rgb::new(24, 88, 33)), Colour::Green);

        // Squared distance of exactly 100 is rejected
        assert_eq!(table.classify(Rgb::new(40, 40, 140)), Colour::Unknown);

        // Far from everything
        assert_eq!(table.classify(Rgb::new(250, 250, 250)), Colour::Unknown);

        // Garbage from the bridge
        let garbage = Rgb::new(i32::MAX, i32::MIN, 10).normalised(DEFAULT_WHITE_MAX);
        assert_eq!(table.classify(garbage), Colour::Unknown);
    }

    #[test]
    fn test_file_layout() -> Result<(), ColourTableError> {
        let table = ColourTable::new(vec![
            sample(1, 2, 3, Colour::Yellow),
            sample(-4, 500, 6, Colour::White),
        ]);

        let mut bytes = Vec::new();
        table.to_writer(&mut bytes)?;

        assert_eq!(bytes.len(), 2 * RECORD_SIZE);
        assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[4, 0, 0, 0]);

        assert_eq!(ColourTable::from_reader(bytes.as_slice())?, table);

        Ok(())
    }

    #[test]
    fn test_bad_files() {
        assert!(matches!(
            ColourTable::from_reader(&[0u8; 17][..]),
            Err(ColourTableError::TruncatedRecord(17))
        ));
        assert!(matches!(
            ColourTable::from_reader(&[0u8; 0][..]),
            Err(ColourTableError::Empty)
        ));
    }
}
