//! Rename freshly imported files to their canonical timestamp name and
//! hard-link them into the date-indexed archive.
//!
//! Every step is idempotent: running the archiver again over a processed
//! file changes nothing and reports it as already in place.

mod error;
#[cfg(test)]
mod tests;

pub use error::{ArchiveError, ArchiveResult};

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::discovery::{expand_sources, RejectedSource};
use crate::metadata::MetadataProvider;
use crate::reporter::Reporter;
use crate::resolver::{FileProbe, FsProbe, PathResolver};

/// What happened to the archive link of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    Created,
    /// The link was already there from an earlier run
    AlreadyPresent,
    /// Dry run: the link would have been created
    Planned,
    /// The archive slot holds a different file
    Conflict,
    Failed(String),
}

impl LinkStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Conflict | Self::Failed(_))
    }
}

/// Result of archiving one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOutcome {
    pub source: PathBuf,

    /// Stable identity of the file for the rest of the workflow
    pub primary: PathBuf,

    pub archive: PathBuf,

    /// Whether the source was (or, in dry-run, would be) renamed
    pub renamed: bool,

    pub link: LinkStatus,
}

impl ArchiveOutcome {
    /// Nothing had to be done
    pub fn already_in_place(&self) -> bool {
        !self.renamed && self.link == LinkStatus::AlreadyPresent
    }
}

/// Renames and links files, one at a time
pub struct Archiver<M, P = FsProbe> {
    metadata: M,
    resolver: PathResolver<P>,
    dry_run: bool,
    /// Names claimed earlier in a dry run
    reserved: HashSet<PathBuf>,
}

impl<M: MetadataProvider> Archiver<M, FsProbe> {
    pub fn new(metadata: M, archive_root: impl Into<PathBuf>) -> Self {
        Self::with_resolver(metadata, PathResolver::new(archive_root))
    }
}

impl<M: MetadataProvider, P: FileProbe> Archiver<M, P> {
    pub fn with_resolver(metadata: M, resolver: PathResolver<P>) -> Self {
        Self {
            metadata,
            resolver,
            dry_run: false,
            reserved: HashSet::new(),
        }
    }

    /// Resolve and report only, never touch the filesystem
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Archive a single file, returning its final location
    pub fn archive<R: Reporter>(
        &mut self,
        source: &Path,
        reporter: &mut R,
    ) -> ArchiveResult<ArchiveOutcome> {
        if !source.exists() {
            return Err(ArchiveError::NotFound(source.to_path_buf()));
        }

        let timestamp = match self.metadata.read_timestamp(source) {
            Ok(Some(ts)) => ts,
            Ok(None) => {
                return Err(ArchiveError::NoTimestamp {
                    path: source.to_path_buf(),
                    reason: None,
                })
            }
            Err(e) => {
                return Err(ArchiveError::NoTimestamp {
                    path: source.to_path_buf(),
                    reason: Some(e.to_string()),
                })
            }
        };

        let resolution = self
            .resolver
            .resolve_excluding(source, Some(timestamp), &self.reserved)
            .map_err(|source_err| ArchiveError::Resolve {
                path: source.to_path_buf(),
                source: source_err,
            })?;

        let primary = resolution.primary;
        let archive = resolution.archive;
        let renamed = !resolution.in_place && primary != source;

        if renamed {
            if self.dry_run {
                reporter.changed(
                    "rename",
                    source,
                    Some(format!("would rename to {}", primary.display())),
                );
            } else {
                std::fs::rename(source, &primary).map_err(|e| ArchiveError::Rename {
                    from: source.to_path_buf(),
                    to: primary.clone(),
                    source: e,
                })?;
                reporter.changed("rename", source, Some(format!("-> {}", primary.display())));
            }
        }

        let current = if renamed && self.dry_run { source } else { primary.as_path() };
        let link = self.link(current, &primary, &archive, reporter);

        if self.dry_run {
            self.reserved.insert(primary.clone());
            self.reserved.insert(archive.clone());
        }

        let outcome = ArchiveOutcome {
            source: source.to_path_buf(),
            primary,
            archive,
            renamed,
            link,
        };

        if outcome.already_in_place() {
            reporter.notice(&outcome.primary, "already in place");
        }

        Ok(outcome)
    }

    /// Hard-link `archive` to `primary` unless it already is.
    ///
    /// `current` is where the file's data lives right now: the source in a
    /// dry run with a pending rename, `primary` otherwise.
    fn link<R: Reporter>(
        &self,
        current: &Path,
        primary: &Path,
        archive: &Path,
        reporter: &mut R,
    ) -> LinkStatus {
        let probe = self.resolver.probe();
        let archive_id = match probe.identity(archive) {
            Ok(id) => id,
            Err(e) => {
                reporter.failed("link", archive, &e);
                return LinkStatus::Failed(e.to_string());
            }
        };

        if let Some(archive_id) = archive_id {
            return match probe.identity(current) {
                Ok(Some(id)) if id == archive_id => LinkStatus::AlreadyPresent,
                _ => {
                    reporter.failed("link", archive, &"archive slot holds a different file");
                    LinkStatus::Conflict
                }
            };
        }

        if self.dry_run {
            reporter.changed(
                "link",
                archive,
                Some(format!("would link to {}", primary.display())),
            );
            return LinkStatus::Planned;
        }

        if let Some(bucket) = archive.parent() {
            if let Err(e) = std::fs::create_dir_all(bucket) {
                reporter.failed("mkdir", bucket, &e);
                return LinkStatus::Failed(e.to_string());
            }
        }

        match std::fs::hard_link(primary, archive) {
            Ok(()) => {
                reporter.changed("link", archive, Some(format!("=> {}", primary.display())));
                LinkStatus::Created
            }
            Err(e) => {
                reporter.failed("link", archive, &e);
                LinkStatus::Failed(e.to_string())
            }
        }
    }

    /// Archive every file named in `sources`, expanding directories
    pub fn archive_paths<S, R>(
        &mut self,
        sources: &[S],
        max_depth: Option<usize>,
        reporter: &mut R,
    ) -> ArchiveBatchReport
    where
        S: AsRef<Path>,
        R: Reporter,
    {
        let mut report = ArchiveBatchReport::default();
        let expansion = expand_sources(sources, max_depth);
        log::info!(
            "Archiving {} files from {} sources",
            expansion.files.len(),
            sources.len()
        );
        report.reject(expansion.rejected, reporter);

        for file in expansion.files {
            let result = self.archive(&file, reporter);
            report.record(result, reporter);
        }

        report
    }
}

/// Aggregate of an archive run
#[derive(Debug, Default)]
pub struct ArchiveBatchReport {
    pub outcomes: Vec<ArchiveOutcome>,
    pub failures: Vec<ArchiveError>,
}

impl ArchiveBatchReport {
    /// Add one result, reporting failures
    pub fn record<R: Reporter>(&mut self, result: ArchiveResult<ArchiveOutcome>, reporter: &mut R) {
        match result {
            Ok(outcome) => self.outcomes.push(outcome),
            Err(e) => {
                reporter.skipped(e.path(), e.to_string());
                self.failures.push(e);
            }
        }
    }

    /// Count sources that never made it into the batch as failures
    pub fn reject<R: Reporter>(&mut self, rejected: Vec<RejectedSource>, reporter: &mut R) {
        for source in rejected {
            self.record(Err(source.into()), reporter);
        }
    }

    pub fn renamed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.renamed).count()
    }

    pub fn already_in_place(&self) -> usize {
        self.outcomes.iter().filter(|o| o.already_in_place()).count()
    }

    pub fn link_failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.link.is_failure()).count()
    }

    /// Whether any file could not be processed
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl fmt::Display for ArchiveBatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files: {} renamed, {} already in place, {} link failures, {} skipped",
            self.outcomes.len() + self.failures.len(),
            self.renamed(),
            self.already_in_place(),
            self.link_failures(),
            self.failures.len()
        )
    }
}
