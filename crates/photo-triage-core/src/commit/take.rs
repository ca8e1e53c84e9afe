use image::imageops::FilterType;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageOutputFormat};
use std::io::Cursor;
use std::path::Path;

use crate::error::{Error, Result};
use crate::metadata::segments;
use crate::safety::write_new;
use crate::types::MediaFormat;

/// How Take pictures are reduced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TakeOptions {
    /// Longest edge after downscaling
    pub max_dimension: u32,
    /// JPEG quality, 1..=100
    pub jpeg_quality: u8,
}

impl Default for TakeOptions {
    fn default() -> Self {
        Self {
            max_dimension: 2048,
            jpeg_quality: 90,
        }
    }
}

/// Downscale `img` so its longest edge is at most `max_dimension`
pub fn fit_within(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    if img.width() <= max_dimension && img.height() <= max_dimension {
        return img;
    }
    img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
}

/// Write a reduced copy of `source` to `target`.
///
/// JPEG sources keep their EXIF, XMP and IPTC segments. The source is left
/// untouched.
pub fn write_reduced(source: &Path, target: &Path, options: TakeOptions) -> Result<()> {
    let data = std::fs::read(source).map_err(|e| Error::filesystem("read", source, e))?;
    let img = image::load_from_memory(&data)?;
    let img = fit_within(img, options.max_dimension);

    let encoded = match MediaFormat::from_path(source) {
        Some(MediaFormat::Jpeg) => {
            let rgb = img.to_rgb8();
            let mut buf = Vec::new();
            JpegEncoder::new_with_quality(&mut buf, options.jpeg_quality).encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ColorType::Rgb8,
            )?;

            let carried = segments::transferable_segments(&data);
            if carried.is_empty() {
                buf
            } else {
                match segments::splice_segments(&buf, &carried) {
                    Some(spliced) => spliced,
                    None => {
                        log::warn!("Could not carry metadata over to {}", target.display());
                        buf
                    }
                }
            }
        }
        Some(MediaFormat::Png) => {
            let mut buf = Cursor::new(Vec::new());
            img.write_to(&mut buf, ImageOutputFormat::Png)?;
            buf.into_inner()
        }
        other => {
            return Err(Error::UnsupportedFormat(format!(
                "{}: cannot reduce {:?}",
                source.display(),
                other
            )))
        }
    };

    write_new(target, &encoded)
}
