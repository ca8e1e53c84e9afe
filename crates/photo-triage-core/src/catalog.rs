use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{Disposition, Offset, Rotation};

/// Stable handle of an item inside a working set's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub(crate) usize);

impl ItemId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One media file under review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    path: PathBuf,

    /// Rotation needed to show the picture upright
    pub rotation: Rotation,

    disposition: Disposition,

    alive: bool,

    /// Where the operator last left the picture panned
    pub last_viewed_offset: Option<Offset>,
}

impl CatalogItem {
    pub fn new(path: impl Into<PathBuf>, rotation: Rotation) -> Self {
        Self {
            path: path.into(),
            rotation,
            disposition: Disposition::None,
            alive: true,
            last_viewed_offset: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used as key by the rating store
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Decode the picture header; width and height as displayed, after rotation
    pub fn load_dimensions(&self) -> Result<(u32, u32)> {
        let (width, height) = image::image_dimensions(&self.path)?;
        Ok(match self.rotation {
            Rotation::Deg90 | Rotation::Deg270 => (height, width),
            Rotation::Deg0 | Rotation::Deg180 => (width, height),
        })
    }

    // Disposition and liveness only change through the working set so the
    // compare sequence stays in sync.
    pub(crate) fn set_disposition(&mut self, disposition: Disposition) {
        self.disposition = disposition;
    }

    pub(crate) fn kill(&mut self) {
        self.alive = false;
    }
}
