//! Canonical, collision-free names for archived pictures.
//!
//! A picture taken at `2020-11-06 22:58:14` is named
//! `2020-11-06T22.58.14.jpg` next to its source and linked as
//! `<archive_root>/2020/11/2020-11-06T22.58.14.jpg`. ISO 8601 with the
//! colons replaced, so the name is valid on every filesystem.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::Timestamp;

/// strftime format of the base name
pub const NAME_FORMAT: &str = "%Y-%m-%dT%H.%M.%S";

/// Highest `_NN` suffix tried before giving up
const MAX_SUFFIX: u32 = 9_999;

/// Identity of the underlying file, shared by all its hard links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    pub dev: u64,
    pub ino: u64,
}

/// Answers "which file, if any, lives at this path"
pub trait FileProbe {
    fn identity(&self, path: &Path) -> io::Result<Option<FileId>>;
}

/// Probes the real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsProbe;

impl FileProbe for FsProbe {
    #[cfg(unix)]
    fn identity(&self, path: &Path) -> io::Result<Option<FileId>> {
        use std::os::unix::fs::MetadataExt;

        match std::fs::metadata(path) {
            Ok(meta) => Ok(Some(FileId {
                dev: meta.dev(),
                ino: meta.ino(),
            })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    // Without inode numbers the canonical path is the best identity we have
    #[cfg(not(unix))]
    fn identity(&self, path: &Path) -> io::Result<Option<FileId>> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        match std::fs::canonicalize(path) {
            Ok(canonical) => {
                let mut hasher = DefaultHasher::new();
                canonical.hash(&mut hasher);
                Ok(Some(FileId {
                    dev: 0,
                    ino: hasher.finish(),
                }))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Where a source file should end up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Working copy, in the source's directory
    pub primary: PathBuf,

    /// Date-indexed hard link
    pub archive: PathBuf,

    /// Collision counter used, 0 for the bare name
    pub suffix: u32,

    /// The source already is `primary`
    pub in_place: bool,
}

/// Maps (source, timestamp) to a [`Resolution`]
#[derive(Debug, Clone)]
pub struct PathResolver<P = FsProbe> {
    archive_root: PathBuf,
    probe: P,
}

impl PathResolver<FsProbe> {
    pub fn new(archive_root: impl Into<PathBuf>) -> Self {
        Self::with_probe(archive_root, FsProbe)
    }
}

impl<P: FileProbe> PathResolver<P> {
    pub fn with_probe(archive_root: impl Into<PathBuf>, probe: P) -> Self {
        Self {
            archive_root: archive_root.into(),
            probe,
        }
    }

    pub fn archive_root(&self) -> &Path {
        &self.archive_root
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Year/month bucket for a timestamp
    pub fn bucket(&self, timestamp: &Timestamp) -> PathBuf {
        self.archive_root
            .join(timestamp.format("%Y").to_string())
            .join(timestamp.format("%m").to_string())
    }

    pub fn resolve(&self, source: &Path, timestamp: Option<Timestamp>) -> Result<Resolution> {
        self.resolve_excluding(source, timestamp, &HashSet::new())
    }

    /// Like [`resolve`](Self::resolve), additionally treating every path in
    /// `reserved` as taken by another file. Dry runs use this to account for
    /// names earlier files of the batch would have claimed.
    pub fn resolve_excluding(
        &self,
        source: &Path,
        timestamp: Option<Timestamp>,
        reserved: &HashSet<PathBuf>,
    ) -> Result<Resolution> {
        let timestamp = timestamp.ok_or_else(|| Error::NoTimestamp(source.to_path_buf()))?;

        let source_id = self
            .probe
            .identity(source)
            .map_err(|e| Error::filesystem("stat", source, e))?
            .ok_or_else(|| Error::FileNotFound(source.to_path_buf()))?;

        let dir = source.parent().unwrap_or_else(|| Path::new(""));
        let bucket = self.bucket(&timestamp);
        let base = timestamp.format(NAME_FORMAT).to_string();
        let ext = source
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        for suffix in 0..=MAX_SUFFIX {
            let name = if suffix == 0 {
                format!("{}{}", base, ext)
            } else {
                format!("{}_{:02}{}", base, suffix, ext)
            };
            let primary = dir.join(&name);
            let archive = bucket.join(&name);

            let resolution = |in_place| Resolution {
                primary: primary.clone(),
                archive: archive.clone(),
                suffix,
                in_place,
            };

            if reserved.contains(&primary) || reserved.contains(&archive) {
                continue;
            }

            match self.identity(&primary)? {
                // Already renamed on an earlier run
                Some(id) if id == source_id => return Ok(resolution(true)),
                Some(_) => {
                    log::debug!("{}: {} exists", source.display(), primary.display());
                    continue;
                }
                None => {}
            }

            match self.identity(&archive)? {
                Some(id) if id != source_id => {
                    log::debug!("{}: {} exists", source.display(), archive.display());
                }
                _ => return Ok(resolution(false)),
            }
        }

        Err(Error::filesystem(
            "resolve",
            source,
            io::Error::new(io::ErrorKind::AlreadyExists, "no free name left"),
        ))
    }

    fn identity(&self, path: &Path) -> Result<Option<FileId>> {
        self.probe
            .identity(path)
            .map_err(|e| Error::filesystem("stat", path, e))
    }
}
