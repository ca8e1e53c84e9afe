//! Star ratings kept beside the pictures, keyed by file name.
//!
//! Ratings are informational only; they never affect navigation or commit.

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

pub const MAX_RATING: i32 = 5;

pub trait RatingStore {
    /// Rating of the picture named `name`, `None` when unrated or unknown
    fn lookup_rating(&self, name: &str) -> Result<Option<i32>>;

    fn set_rating(&mut self, name: &str, rating: i32) -> Result<()>;
}

fn check_rating(rating: i32) -> Result<()> {
    if (0..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(Error::InvalidRating(rating))
    }
}

/// Ratings in a digiKam catalog (`digikam4.db`).
///
/// Pictures are matched on `Images.name`, the bare file name, which is
/// unique in an archive of timestamp-named files.
pub struct DigikamRatingStore {
    conn: Connection,
}

impl DigikamRatingStore {
    /// Open an existing catalog; digiKam owns the schema so it is never created
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        log::debug!("Opened rating catalog {}", path.display());
        Ok(Self { conn })
    }

    /// Wrap an open connection
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    fn image_id(&self, name: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM Images WHERE name = ?1 ORDER BY id LIMIT 1",
                params![name],
                |row| row.get(0),
            )
            .optional()?)
    }
}

impl RatingStore for DigikamRatingStore {
    fn lookup_rating(&self, name: &str) -> Result<Option<i32>> {
        let rating: Option<Option<i32>> = self
            .conn
            .query_row(
                "SELECT info.rating FROM Images AS img \
                 JOIN ImageInformation AS info ON info.imageid = img.id \
                 WHERE img.name = ?1 ORDER BY img.id LIMIT 1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        // digiKam stores -1 for "no rating"
        Ok(rating.flatten().filter(|r| *r >= 0))
    }

    fn set_rating(&mut self, name: &str, rating: i32) -> Result<()> {
        check_rating(rating)?;
        let id = self
            .image_id(name)?
            .ok_or_else(|| Error::NotCataloged(name.to_string()))?;

        self.conn.execute(
            "INSERT INTO ImageInformation (imageid, rating) VALUES (?1, ?2) \
             ON CONFLICT(imageid) DO UPDATE SET rating = excluded.rating",
            params![id, rating],
        )?;
        log::info!("Rated {} {} stars", name, rating);
        Ok(())
    }
}

/// Ratings held in memory, for runs without a catalog
#[derive(Debug, Default, Clone)]
pub struct MemoryRatingStore {
    ratings: HashMap<String, i32>,
}

impl MemoryRatingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RatingStore for MemoryRatingStore {
    fn lookup_rating(&self, name: &str) -> Result<Option<i32>> {
        Ok(self.ratings.get(name).copied())
    }

    fn set_rating(&mut self, name: &str, rating: i32) -> Result<()> {
        check_rating(rating)?;
        self.ratings.insert(name.to_string(), rating);
        Ok(())
    }
}
