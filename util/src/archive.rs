//! CSV archiving of serialisable records
//!
//! Each archive is a CSV file under the session's `arch` directory, one row per record. Records
//! that want a timestamp should carry a field filled from `session::get_elapsed_seconds`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
pub struct Archiver {
    writer: Writer<File>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Cannot create the archive file: {0}")]
    CreateError(std::io::Error),

    #[error("Cannot write a record to the archive: {0}")]
    WriteError(csv::Error),

    #[error("Cannot flush the archive: {0}")]
    FlushError(std::io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    ///
    /// Any existing file at that path is truncated.
    pub fn from_path<P: AsRef<Path>>(session: &Session, path: P) -> Result<Self, ArchiveError> {
        let file = File::create(session.arch_root.join(path)).map_err(ArchiveError::CreateError)?;

        Ok(Self {
            writer: WriterBuilder::new().has_headers(true).from_writer(file),
        })
    }

    /// Serialise a record into the archive.
    ///
    /// The record must serialise to a flat structure (no nested maps or sequences), as required
    /// by CSV.
    pub fn serialise<T: Serialize>(&mut self, record: &T) -> Result<(), ArchiveError> {
        self.writer
            .serialize(record)
            .map_err(ArchiveError::WriteError)?;

        self.writer.flush().map_err(ArchiveError::FlushError)
    }
}
