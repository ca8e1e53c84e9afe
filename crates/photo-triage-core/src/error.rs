use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the photo-triage library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding error
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// EXIF parsing error
    #[error("Metadata error: {0}")]
    Exif(#[from] exif::Error),

    /// Rating catalog error
    #[error("Rating store error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File not found error
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// No capture timestamp could be read for a file
    #[error("No timestamp available for {}", .0.display())]
    NoTimestamp(PathBuf),

    /// Metadata was present but could not be interpreted
    #[error("Metadata unreadable for {}: {reason}", .path.display())]
    MetadataUnreadable { path: PathBuf, reason: String },

    /// A single-item filesystem operation failed
    #[error("{operation} failed for {}: {source}", .path.display())]
    Filesystem {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Navigation attempted on a set without live items
    #[error("No live items left in the working set")]
    EmptyWorkingSet,

    /// External tool could not be launched
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Rating lookup for a file that is not in the catalog
    #[error("No catalog entry for {0}")]
    NotCataloged(String),

    /// Rating outside the 0..=5 star range
    #[error("Invalid rating {0}, expected 0 to 5")]
    InvalidRating(i32),

    /// Unsupported media format
    #[error("Unsupported media format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    /// Wrap an I/O failure on a single file with the operation that caused it
    pub fn filesystem(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            operation,
            path: path.into(),
            source,
        }
    }
}
