#![allow(dead_code)]

use chrono::NaiveDateTime;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::commit::ToolLauncher;
use crate::config::ToolCommand;
use crate::error::{Error, Result};
use crate::metadata::MetadataProvider;
use crate::types::{Rotation, Timestamp};

/// Metadata provider that reads the capture time from the file body.
///
/// Fixtures are plain text files whose content is `YYYY-MM-DD HH:MM:SS`;
/// anything else means "no timestamp".
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentStamp;

impl MetadataProvider for ContentStamp {
    fn read_timestamp(&self, path: &Path) -> Result<Option<Timestamp>> {
        let text = fs::read_to_string(path).map_err(|e| Error::filesystem("read", path, e))?;
        Ok(NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%d %H:%M:%S").ok())
    }

    fn read_orientation(&self, _path: &Path) -> Result<Option<Rotation>> {
        Ok(None)
    }
}

/// Create a fixture file stamped with `timestamp`
pub fn create_stamped_file(dir: &Path, name: &str, timestamp: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let file_path = dir.join(name);
    let mut file = File::create(&file_path).unwrap();
    file.write_all(timestamp.as_bytes()).unwrap();
    file_path
}

/// Create a small real JPEG with a gradient so it survives re-encoding
pub fn create_test_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let file_path = dir.join(name);
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    img.save_with_format(&file_path, image::ImageFormat::Jpeg)
        .unwrap();
    file_path
}

/// Enable log output in tests; safe to call more than once
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Records launches instead of spawning processes
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    pub launches: Vec<(String, Vec<PathBuf>)>,
    pub fail: bool,
}

impl ToolLauncher for RecordingLauncher {
    fn launch(&mut self, tool: &ToolCommand, files: &[PathBuf]) -> Result<()> {
        if self.fail {
            return Err(Error::Launch {
                program: tool.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            });
        }
        self.launches.push((tool.program.clone(), files.to_vec()));
        Ok(())
    }
}
