use chrono::NaiveDateTime;
use exif::{Exif, Field, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::MetadataProvider;
use crate::error::{Error, Result};
use crate::types::{ExposureFields, Rotation, Timestamp};

const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Reads EXIF from JPEG, TIFF, HEIF, PNG and TIFF-based raw files
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifMetadata;

impl ExifMetadata {
    /// Parsed EXIF, `Ok(None)` when the container has no EXIF block
    fn read(&self, path: &Path) -> Result<Option<Exif>> {
        let file = File::open(path).map_err(|e| Error::filesystem("open", path, e))?;
        let mut reader = BufReader::new(file);
        match Reader::new().read_from_container(&mut reader) {
            Ok(exif) => Ok(Some(exif)),
            Err(exif::Error::NotFound(_)) => Ok(None),
            Err(e) => Err(Error::MetadataUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }
}

impl MetadataProvider for ExifMetadata {
    fn read_timestamp(&self, path: &Path) -> Result<Option<Timestamp>> {
        let Some(exif) = self.read(path)? else {
            return Ok(None);
        };

        let field = exif
            .get_field(Tag::DateTimeOriginal, In::PRIMARY)
            .or_else(|| exif.get_field(Tag::DateTime, In::PRIMARY));

        let Some(text) = field.and_then(ascii) else {
            return Ok(None);
        };

        parse_exif_datetime(&text)
            .map(Some)
            .ok_or_else(|| Error::MetadataUnreadable {
                path: path.to_path_buf(),
                reason: format!("bad date field format ({:?})", text),
            })
    }

    fn read_orientation(&self, path: &Path) -> Result<Option<Rotation>> {
        let Some(exif) = self.read(path)? else {
            return Ok(None);
        };
        Ok(exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|f| f.value.get_uint(0))
            .and_then(Rotation::from_exif_orientation))
    }

    fn read_exposure(&self, path: &Path) -> Result<ExposureFields> {
        let Some(exif) = self.read(path)? else {
            return Ok(ExposureFields::default());
        };
        let field = |tag| exif.get_field(tag, In::PRIMARY);

        Ok(ExposureFields {
            exposure_time: field(Tag::ExposureTime).and_then(rational),
            f_number: field(Tag::FNumber).and_then(rational),
            iso: field(Tag::PhotographicSensitivity).and_then(|f| f.value.get_uint(0)),
            focal_length: field(Tag::FocalLength).and_then(rational),
            lens_model: field(Tag::LensModel).and_then(ascii),
        })
    }
}

/// Parse `YYYY:MM:DD HH:MM:SS`, tolerating trailing NULs and blanks
pub(crate) fn parse_exif_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim_end_matches('\0').trim();
    NaiveDateTime::parse_from_str(text, EXIF_DATE_FORMAT).ok()
}

fn ascii(field: &Field) -> Option<String> {
    match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn rational(field: &Field) -> Option<f64> {
    match &field.value {
        Value::Rational(values) => values
            .first()
            .filter(|r| r.denom != 0)
            .map(|r| r.to_f64()),
        _ => None,
    }
}
