//! Core functionality for triaging digital photos.
//!
//! This library provides the building blocks of the photo workflow:
//! - Importing camera files into a staging directory
//! - Renaming them to their capture time and linking them into a
//!   date-indexed archive
//! - A working set the operator navigates and tags
//! - Committing the tags to the filesystem

// -- External Dependencies --
use log::{info, warn};
use std::path::Path;

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use config::*;
pub use error::{Error, Result};
pub use types::*;

// -- Public Modules --
pub mod archive;
pub mod catalog;
pub mod commit;
pub mod config;
pub mod discovery;
pub mod import;
pub mod logging;
pub mod metadata;
pub mod rating;
pub mod reporter;
pub mod resolver;
pub mod safety;
pub mod types;
pub mod working_set;

// -- Test Modules --
#[cfg(test)]
pub mod test_utils;

use archive::{ArchiveBatchReport, Archiver};
use commit::CommitEngine;
use import::{ImportMode, ImportReport};
use metadata::MetadataChain;
use rating::{DigikamRatingStore, MemoryRatingStore, RatingStore};
use reporter::Reporter;
use working_set::WorkingSet;

/// Main entry point wiring the workflow to a configuration
pub struct PhotoTriage {
    config: Config,
}

impl PhotoTriage {
    /// Create a new PhotoTriage with the provided configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Metadata sources in the order the configuration enables them
    pub fn metadata(&self) -> MetadataChain {
        MetadataChain::from_config(&self.config)
    }

    pub fn archiver(&self) -> Archiver<MetadataChain> {
        Archiver::new(self.metadata(), self.config.archive_root.clone()).dry_run(self.config.dry_run)
    }

    /// Pull camera files into the staging directory
    pub fn import<R: Reporter>(
        &self,
        source: &Path,
        mode: ImportMode,
        reporter: &mut R,
    ) -> Result<ImportReport> {
        import::import_files(source, &self.config.mid_dir, mode, self.config.dry_run, reporter)
    }

    /// Rename and archive files and directories
    pub fn rename<P, R>(&self, paths: &[P], reporter: &mut R) -> ArchiveBatchReport
    where
        P: AsRef<Path>,
        R: Reporter,
    {
        let report = self
            .archiver()
            .archive_paths(paths, self.config.max_depth, reporter);
        info!("{}", report);
        report
    }

    /// Build a working set over the pictures under `root`
    pub fn scan<R: Reporter>(&self, root: &Path, reporter: &mut R) -> Result<WorkingSet> {
        WorkingSet::scan(root, self.config.max_depth, &self.metadata(), reporter)
    }

    pub fn commit_engine(&self) -> CommitEngine {
        CommitEngine::from_config(&self.config)
    }

    /// The configured digiKam catalog, or an in-memory store when there is
    /// none to open
    pub fn rating_store(&self) -> Box<dyn RatingStore> {
        match &self.config.rating_database {
            Some(path) => match DigikamRatingStore::open(path) {
                Ok(store) => return Box::new(store),
                Err(e) => warn!("Ratings won't be saved: {}", e),
            },
            None => info!("No rating catalog configured"),
        }
        Box::new(MemoryRatingStore::new())
    }
}
