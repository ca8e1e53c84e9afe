use chrono::{DateTime, Local, NaiveDateTime};
use std::path::Path;
use std::process::{Command, Stdio};

use super::MetadataProvider;
use crate::error::{Error, Result};
use crate::types::{MediaFormat, Rotation, Timestamp};

const CREATION_TAG: &str = "TAG:creation_time=";

/// Reads the container creation time of video clips through `ffprobe`
/// (or the compatible `avprobe`)
#[derive(Debug, Clone)]
pub struct ContainerProbe {
    program: String,
}

impl ContainerProbe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ContainerProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl MetadataProvider for ContainerProbe {
    fn read_timestamp(&self, path: &Path) -> Result<Option<Timestamp>> {
        // Stills are left to EXIF
        if MediaFormat::from_path(path) != Some(MediaFormat::Video) {
            return Ok(None);
        }

        let output = Command::new(&self.program)
            .args(["-loglevel", "quiet", "-show_format"])
            .arg(path)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|source| Error::Launch {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .find_map(|line| line.strip_prefix(CREATION_TAG))
            .and_then(parse_creation_time))
    }

    fn read_orientation(&self, _path: &Path) -> Result<Option<Rotation>> {
        Ok(None)
    }
}

/// Parse a container `creation_time` value.
///
/// Zoned values (`2016-04-30T12:59:40.000000Z`) are converted to local time
/// so they line up with EXIF dates; bare values are taken as-is.
pub fn parse_creation_time(value: &str) -> Option<Timestamp> {
    let value = value.trim();
    if let Ok(zoned) = DateTime::parse_from_rfc3339(value) {
        return Some(zoned.with_timezone(&Local).naive_local());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}
