//! JPEG marker segments carrying metadata.
//!
//! Re-encoding through `image` drops everything but pixels. The segments
//! that hold EXIF, XMP and IPTC are lifted out of the source file and
//! spliced into the encoded output right after its SOI marker.

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP1: u8 = 0xE1;
const APP13: u8 = 0xED;
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;

const EXIF_ID: &[u8] = b"Exif\0\0";
const XMP_ID: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const IPTC_ID: &[u8] = b"Photoshop 3.0\0";

/// One marker segment, header included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub marker: u8,
    /// Position of the leading 0xFF in the file
    pub offset: usize,
    pub bytes: &'a [u8],
}

impl Segment<'_> {
    /// Payload after the marker and length bytes
    pub fn payload(&self) -> &[u8] {
        &self.bytes[4..]
    }

    /// Whether the segment holds EXIF, XMP or IPTC data
    pub fn is_transferable(&self) -> bool {
        let payload = self.payload();
        match self.marker {
            APP1 => payload.starts_with(EXIF_ID) || payload.starts_with(XMP_ID),
            APP13 => payload.starts_with(IPTC_ID),
            _ => false,
        }
    }
}

pub fn is_jpeg(data: &[u8]) -> bool {
    data.starts_with(&SOI)
}

/// Header segments up to (not including) the first scan.
///
/// Returns `None` when the data isn't a well-formed JPEG header.
pub fn header_segments(data: &[u8]) -> Option<Vec<Segment<'_>>> {
    if !is_jpeg(data) {
        return None;
    }

    let mut segments = Vec::new();
    let mut pos = SOI.len();
    loop {
        if pos >= data.len() || data[pos] != 0xFF {
            return None;
        }
        // Fill bytes
        while pos < data.len() && data[pos] == 0xFF {
            pos += 1;
        }
        let marker = *data.get(pos)?;
        let start = pos - 1;
        pos += 1;

        match marker {
            SOS | EOI => return Some(segments),
            // Standalone markers carry no length
            0x01 | 0xD0..=0xD7 => continue,
            _ => {}
        }

        let len = u16::from_be_bytes([*data.get(pos)?, *data.get(pos + 1)?]) as usize;
        if len < 2 || pos + len > data.len() {
            return None;
        }
        pos += len;
        segments.push(Segment {
            marker,
            offset: start,
            bytes: &data[start..pos],
        });
    }
}

/// The EXIF/XMP/IPTC segments of a JPEG, in file order
pub fn transferable_segments(data: &[u8]) -> Vec<Segment<'_>> {
    header_segments(data)
        .unwrap_or_default()
        .into_iter()
        .filter(Segment::is_transferable)
        .collect()
}

/// Insert segments right after the SOI of an encoded JPEG.
///
/// Any transferable segments already present in `encoded` are dropped so
/// the source's copies win.
pub fn splice_segments(encoded: &[u8], segments: &[Segment<'_>]) -> Option<Vec<u8>> {
    let existing = header_segments(encoded)?;
    let extra: usize = segments.iter().map(|s| s.bytes.len()).sum();

    let mut out = Vec::with_capacity(encoded.len() + extra);
    out.extend_from_slice(&SOI);
    for segment in segments {
        out.extend_from_slice(segment.bytes);
    }

    let mut pos = SOI.len();
    for segment in &existing {
        out.extend_from_slice(&encoded[pos..segment.offset]);
        if !segment.is_transferable() {
            out.extend_from_slice(segment.bytes);
        }
        pos = segment.offset + segment.bytes.len();
    }
    out.extend_from_slice(&encoded[pos..]);
    Some(out)
}

/// Build an APP1 segment around a payload (used to tag test fixtures)
pub fn app1(payload: &[u8]) -> Vec<u8> {
    let len = (payload.len() + 2) as u16;
    let mut out = vec![0xFF, APP1];
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
    out
}
