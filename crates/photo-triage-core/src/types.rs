use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Capture time of a picture or clip, in camera local time
pub type Timestamp = NaiveDateTime;

/// Media formats recognised by the workflow
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaFormat {
    Jpeg,
    Png,
    Tiff,
    Heic,
    /// Camera raw files (NEF, CR2, ARW, DNG...)
    Raw,
    /// Video clips (MOV, MP4, AVI...)
    Video,
    Other(String),
}

impl MediaFormat {
    /// Determine format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            "tif" | "tiff" => Self::Tiff,
            "heic" | "heif" => Self::Heic,
            "nef" | "cr2" | "cr3" | "arw" | "dng" | "orf" | "raf" | "rw2" => Self::Raw,
            "mov" | "mp4" | "avi" | "mts" | "m4v" => Self::Video,
            other => Self::Other(other.to_string()),
        }
    }

    /// Determine format from a path's extension, if it has one
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
    }

    /// Whether the archiver should try to rename files of this format
    pub fn is_archivable(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Whether the format can be shown in the review workflow
    pub fn is_reviewable(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png)
    }
}

/// The single terminal action assigned to a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Disposition {
    #[default]
    None,
    /// Move into the destination as-is
    Keep,
    /// Downscale into the destination, then remove the source
    Take,
    /// Stage for the panorama stitcher
    Stitch,
    /// Stage for side-by-side comparison
    Compare,
    /// Hand to the external crop editor
    Crop,
    /// Unlink
    Delete,
}

impl Disposition {
    /// Every disposition that maps to a commit action
    pub const ACTIONS: [Disposition; 6] = [
        Disposition::Keep,
        Disposition::Take,
        Disposition::Stitch,
        Disposition::Compare,
        Disposition::Crop,
        Disposition::Delete,
    ];

    /// One-letter tag shown next to an item
    pub fn tag(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Keep => "K",
            Self::Take => "T",
            Self::Stitch => "S",
            Self::Compare => "C",
            Self::Crop => "P",
            Self::Delete => "D",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Keep => "keep",
            Self::Take => "take",
            Self::Stitch => "stitch",
            Self::Compare => "compare",
            Self::Crop => "crop",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Clockwise rotation needed to display an image upright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Map an EXIF orientation tag value; mirroring is ignored
    pub fn from_exif_orientation(value: u32) -> Option<Self> {
        match value {
            1 | 2 => Some(Self::Deg0),
            3 | 4 => Some(Self::Deg180),
            5 | 6 => Some(Self::Deg90),
            7 | 8 => Some(Self::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }
}

/// Pan position an image was last left at
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

/// Optional shooting parameters, informational only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExposureFields {
    /// Exposure time in seconds
    pub exposure_time: Option<f64>,
    pub f_number: Option<f64>,
    pub iso: Option<u32>,
    /// Focal length in millimetres
    pub focal_length: Option<f64>,
    pub lens_model: Option<String>,
}

impl ExposureFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for ExposureFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(t) = self.exposure_time {
            if t > 0.0 && t < 1.0 {
                parts.push(format!("1/{:.0}s", 1.0 / t));
            } else {
                parts.push(format!("{}s", t));
            }
        }
        if let Some(n) = self.f_number {
            parts.push(format!("f/{:.1}", n));
        }
        if let Some(iso) = self.iso {
            parts.push(format!("ISO {}", iso));
        }
        if let Some(fl) = self.focal_length {
            parts.push(format!("{:.0}mm", fl));
        }
        if let Some(lens) = &self.lens_model {
            parts.push(lens.clone());
        }
        f.write_str(&parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(MediaFormat::from_extension("JPG"), MediaFormat::Jpeg);
        assert_eq!(MediaFormat::from_extension("nef"), MediaFormat::Raw);
        assert_eq!(MediaFormat::from_extension("MOV"), MediaFormat::Video);
        assert!(!MediaFormat::from_extension("txt").is_archivable());
        assert!(MediaFormat::from_extension("png").is_reviewable());
        assert!(!MediaFormat::from_extension("mov").is_reviewable());
    }

    #[test]
    fn test_rotation_from_orientation() {
        assert_eq!(Rotation::from_exif_orientation(1), Some(Rotation::Deg0));
        assert_eq!(Rotation::from_exif_orientation(6), Some(Rotation::Deg90));
        assert_eq!(Rotation::from_exif_orientation(3), Some(Rotation::Deg180));
        assert_eq!(Rotation::from_exif_orientation(8), Some(Rotation::Deg270));
        assert_eq!(Rotation::from_exif_orientation(0), None);
        assert_eq!(Rotation::from_exif_orientation(9), None);
    }

    #[test]
    fn test_exposure_display() {
        let fields = ExposureFields {
            exposure_time: Some(0.004),
            f_number: Some(5.6),
            iso: Some(200),
            focal_length: Some(35.0),
            lens_model: None,
        };
        assert_eq!(fields.to_string(), "1/250s f/5.6 ISO 200 35mm");
        assert!(ExposureFields::default().is_empty());
    }
}
