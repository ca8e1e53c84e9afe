use std::path::PathBuf;
use thiserror::Error;

use crate::discovery::RejectedSource;

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Why a single file could not be archived
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Neither metadata nor any fallback yielded a capture time
    #[error("{}: can't find file's date{}", .path.display(), reason_suffix(.reason))]
    NoTimestamp {
        path: PathBuf,
        reason: Option<String>,
    },

    /// Source vanished before it could be processed
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A named source could not be read
    #[error("Cannot read {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    /// Name resolution failed (the namespace could not be probed)
    #[error("Cannot resolve name for {}: {source}", .path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: crate::Error,
    },

    /// Renaming into the canonical name failed
    #[error("Rename {} -> {} failed: {source}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NoTimestamp { path, .. }
            | Self::NotFound(path)
            | Self::Unreadable { path, .. }
            | Self::Resolve { path, .. } => path,
            Self::Rename { from, .. } => from,
        }
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|r| format!(" ({})", r))
        .unwrap_or_default()
}

impl From<RejectedSource> for ArchiveError {
    fn from(rejected: RejectedSource) -> Self {
        if rejected.missing {
            Self::NotFound(rejected.path)
        } else {
            Self::Unreadable {
                path: rejected.path,
                reason: rejected.reason,
            }
        }
    }
}

// Implement conversion from ArchiveError to the main Error type
impl From<ArchiveError> for crate::Error {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::NoTimestamp { path, .. } => crate::Error::NoTimestamp(path),
            ArchiveError::NotFound(path) => crate::Error::FileNotFound(path),
            ArchiveError::Unreadable { path, reason } => crate::Error::filesystem(
                "read",
                path,
                std::io::Error::new(std::io::ErrorKind::Other, reason),
            ),
            ArchiveError::Resolve { source, .. } => source,
            ArchiveError::Rename { from, source, .. } => {
                crate::Error::filesystem("rename", from, source)
            }
        }
    }
}
