//! Capture metadata: timestamp, orientation and exposure.
//!
//! The workflow only talks to [`MetadataProvider`]; the adapters here read
//! EXIF ([`ExifMetadata`]), video containers through an external probe
//! ([`ContainerProbe`]) and, on explicit request, the file's mtime
//! ([`FileTimeMetadata`]).

mod exif_reader;
mod probe;
pub mod segments;

pub use exif_reader::ExifMetadata;
pub use probe::{parse_creation_time, ContainerProbe};

use chrono::{DateTime, Local};
use std::path::Path;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{ExposureFields, Rotation, Timestamp};

/// Reads capture metadata for a file
pub trait MetadataProvider {
    /// Capture time, `Ok(None)` when the file carries none
    fn read_timestamp(&self, path: &Path) -> Result<Option<Timestamp>>;

    /// Display rotation, `Ok(None)` when unknown
    fn read_orientation(&self, path: &Path) -> Result<Option<Rotation>>;

    /// Informational shooting parameters
    fn read_exposure(&self, path: &Path) -> Result<ExposureFields> {
        let _ = path;
        Ok(ExposureFields::default())
    }
}

impl<M: MetadataProvider + ?Sized> MetadataProvider for Box<M> {
    fn read_timestamp(&self, path: &Path) -> Result<Option<Timestamp>> {
        (**self).read_timestamp(path)
    }

    fn read_orientation(&self, path: &Path) -> Result<Option<Rotation>> {
        (**self).read_orientation(path)
    }

    fn read_exposure(&self, path: &Path) -> Result<ExposureFields> {
        (**self).read_exposure(path)
    }
}

/// Uses the file's modification time as capture time
#[derive(Debug, Default, Clone, Copy)]
pub struct FileTimeMetadata;

impl MetadataProvider for FileTimeMetadata {
    fn read_timestamp(&self, path: &Path) -> Result<Option<Timestamp>> {
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| Error::filesystem("stat", path, e))?;
        let local: DateTime<Local> = modified.into();
        Ok(Some(local.naive_local()))
    }

    fn read_orientation(&self, _path: &Path) -> Result<Option<Rotation>> {
        Ok(None)
    }
}

/// Tries each provider in order until one yields a value
pub struct MetadataChain {
    providers: Vec<Box<dyn MetadataProvider>>,
}

impl MetadataChain {
    pub fn new(primary: impl MetadataProvider + 'static) -> Self {
        Self {
            providers: vec![Box::new(primary)],
        }
    }

    /// Append a provider consulted after every earlier one failed
    pub fn with_fallback(mut self, provider: impl MetadataProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// EXIF first, then the configured video probe and mtime fallbacks
    pub fn from_config(config: &Config) -> Self {
        let mut chain = Self::new(ExifMetadata);
        if let Some(program) = &config.video_probe {
            chain = chain.with_fallback(ContainerProbe::new(program.clone()));
        }
        if config.use_mtime_fallback {
            chain = chain.with_fallback(FileTimeMetadata);
        }
        chain
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl MetadataProvider for MetadataChain {
    fn read_timestamp(&self, path: &Path) -> Result<Option<Timestamp>> {
        let mut last_error = None;
        let mut answered = false;
        for provider in &self.providers {
            match provider.read_timestamp(path) {
                Ok(Some(ts)) => return Ok(Some(ts)),
                Ok(None) => answered = true,
                Err(e) => {
                    log::debug!("Timestamp source failed for {}: {}", path.display(), e);
                    last_error = Some(e);
                }
            }
        }
        // Only surface an error when no source could even read the file
        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(None),
        }
    }

    fn read_orientation(&self, path: &Path) -> Result<Option<Rotation>> {
        let mut last_error = None;
        for provider in &self.providers {
            match provider.read_orientation(path) {
                Ok(Some(rotation)) => return Ok(Some(rotation)),
                Ok(None) => {}
                Err(e) => last_error = Some(e),
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    fn read_exposure(&self, path: &Path) -> Result<ExposureFields> {
        for provider in &self.providers {
            if let Ok(fields) = provider.read_exposure(path) {
                if !fields.is_empty() {
                    return Ok(fields);
                }
            }
        }
        Ok(ExposureFields::default())
    }
}
