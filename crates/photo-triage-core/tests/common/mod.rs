#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use photo_triage_core::metadata::segments;
use photo_triage_core::Config;

/// Capture data written into a fixture's EXIF block
pub struct Shot<'a> {
    /// `YYYY:MM:DD HH:MM:SS`
    pub taken: &'a str,
    pub orientation: u16,
    pub iso: u16,
}

impl Default for Shot<'_> {
    fn default() -> Self {
        Self {
            taken: "2020:11:06 22:58:14",
            orientation: 1,
            iso: 200,
        }
    }
}

fn ifd_entry(out: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: [u8; 4]) {
    out.extend_from_slice(&tag.to_be_bytes());
    out.extend_from_slice(&kind.to_be_bytes());
    out.extend_from_slice(&count.to_be_bytes());
    out.extend_from_slice(&value);
}

fn short(value: u16) -> [u8; 4] {
    let [hi, lo] = value.to_be_bytes();
    [hi, lo, 0, 0]
}

/// Big-endian TIFF block: IFD0 with Orientation and the Exif IFD pointer,
/// Exif IFD with ISO and DateTimeOriginal
pub fn exif_payload(shot: &Shot) -> Vec<u8> {
    const SHORT: u16 = 3;
    const LONG: u16 = 4;
    const ASCII: u16 = 2;
    const IFD_SIZE: u32 = 2 + 2 * 12 + 4;
    assert_eq!(shot.taken.len(), 19, "EXIF dates are 19 characters");

    let exif_ifd = 8 + IFD_SIZE;
    let date = exif_ifd + IFD_SIZE;

    let mut tiff = b"MM\0\x2a".to_vec();
    tiff.extend_from_slice(&8u32.to_be_bytes());

    tiff.extend_from_slice(&2u16.to_be_bytes());
    ifd_entry(&mut tiff, 0x0112, SHORT, 1, short(shot.orientation));
    ifd_entry(&mut tiff, 0x8769, LONG, 1, exif_ifd.to_be_bytes());
    tiff.extend_from_slice(&0u32.to_be_bytes());

    tiff.extend_from_slice(&2u16.to_be_bytes());
    ifd_entry(&mut tiff, 0x8827, SHORT, 1, short(shot.iso));
    ifd_entry(&mut tiff, 0x9003, ASCII, 20, date.to_be_bytes());
    tiff.extend_from_slice(&0u32.to_be_bytes());

    tiff.extend_from_slice(shot.taken.as_bytes());
    tiff.push(0);

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);
    payload
}

/// Encode a gradient JPEG of the given size
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 4 % 256) as u8, (y * 4 % 256) as u8, 90])
    });
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 90)
        .encode(img.as_raw(), width, height, ColorType::Rgb8)
        .unwrap();
    buf
}

/// Write a 64x48 camera JPEG carrying `shot` as EXIF
pub fn create_camera_jpeg(dir: &Path, name: &str, shot: &Shot) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let jpeg = jpeg_bytes(64, 48);

    let mut data = jpeg[..2].to_vec();
    data.extend_from_slice(&segments::app1(&exif_payload(shot)));
    data.extend_from_slice(&jpeg[2..]);

    let path = dir.join(name);
    fs::write(&path, data).unwrap();
    path
}

/// Every directory of the workflow under one scratch root
pub struct Layout {
    pub card: PathBuf,
    pub mid: PathBuf,
    pub archive: PathBuf,
    pub dst: PathBuf,
    pub stitch: PathBuf,
    pub compare: PathBuf,
}

impl Layout {
    pub fn new(root: &Path) -> Self {
        Self {
            card: root.join("card/DCIM/100CAMERA"),
            mid: root.join("incoming/01-tmp"),
            archive: root.join("ByDate"),
            dst: root.join("gallery"),
            stitch: root.join("incoming/02-new/stitch"),
            compare: root.join("incoming/03-cur"),
        }
    }

    /// Configuration pointing at this layout, no external tools
    pub fn config(&self) -> Config {
        Config {
            mid_dir: self.mid.clone(),
            archive_root: self.archive.clone(),
            stitch_dir: self.stitch.clone(),
            compare_dir: self.compare.clone(),
            stitcher: None,
            crop_editor: None,
            video_probe: None,
            rating_database: None,
            take_max_dimension: 32,
            ..Config::default()
        }
    }
}

pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
