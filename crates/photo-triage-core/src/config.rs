use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// An external program plus fixed leading arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }
}

/// Configuration for the import, archive and review workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether to run without making changes
    pub dry_run: bool,

    /// Staging directory pictures are imported into and reviewed from
    pub mid_dir: PathBuf,

    /// Root of the date-indexed archive (`<root>/<year>/<month>/<name>`)
    pub archive_root: PathBuf,

    /// Where pictures tagged for stitching are moved
    pub stitch_dir: PathBuf,

    /// Where pictures tagged for comparison are moved
    pub compare_dir: PathBuf,

    /// Panorama stitcher launched once after a commit with stitch items
    pub stitcher: Option<ToolCommand>,

    /// Editor launched in place for each crop item
    pub crop_editor: Option<ToolCommand>,

    /// Longest edge, in pixels, of pictures committed as Take
    pub take_max_dimension: u32,

    /// JPEG quality used when re-encoding Take pictures
    pub take_jpeg_quality: u8,

    /// Program used to read container timestamps of video clips
    pub video_probe: Option<String>,

    /// Fall back to the file's modification time when no metadata has a date
    pub use_mtime_fallback: bool,

    /// digiKam catalog holding ratings
    pub rating_database: Option<PathBuf>,

    /// Maximum directory depth for scanning
    pub max_depth: Option<usize>,

    /// Directory for rotated log files; console logging when unset
    pub log_dir: Option<PathBuf>,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        let pictures = dirs::picture_dir().unwrap_or_else(|| PathBuf::from("Pictures"));
        let incoming = pictures.join("incoming");
        Self {
            dry_run: false,
            mid_dir: incoming.join("01-tmp"),
            archive_root: pictures.join("ByDate"),
            stitch_dir: incoming.join("02-new").join("stitch"),
            compare_dir: incoming.join("03-cur"),
            stitcher: Some(ToolCommand::new("hugin")),
            crop_editor: Some(ToolCommand::new("gwenview")),
            take_max_dimension: 2048,
            take_jpeg_quality: 90,
            video_probe: Some("ffprobe".to_string()),
            use_mtime_fallback: false,
            rating_database: Some(pictures.join("ByDate").join("digikam4.db")),
            max_depth: None,
            log_dir: None,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let config: Config = serde_json::from_reader(file)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| Error::Configuration(format!("Failed to create config file: {}", e)))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| Error::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.take_max_dimension == 0 {
            return Err(Error::Configuration(
                "Take max dimension must be greater than zero".to_string(),
            ));
        }

        if self.take_jpeg_quality == 0 || self.take_jpeg_quality > 100 {
            return Err(Error::Configuration(
                "JPEG quality must be between 1 and 100".to_string(),
            ));
        }

        // Staging directories must not alias each other or the working dir
        let staging = [&self.mid_dir, &self.stitch_dir, &self.compare_dir];
        for (i, a) in staging.iter().enumerate() {
            if staging[i + 1..].contains(a) {
                return Err(Error::Configuration(format!(
                    "Staging directory used twice: {}",
                    a.display()
                )));
            }
        }

        for tool in [&self.stitcher, &self.crop_editor].into_iter().flatten() {
            if tool.program.trim().is_empty() {
                return Err(Error::Configuration(
                    "External tool program must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}
