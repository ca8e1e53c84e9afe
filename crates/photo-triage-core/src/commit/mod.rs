//! Applies the operator's decisions to the filesystem.
//!
//! The sweep walks the full sequence in path order. Each item is handled on
//! its own: a failure is reported and leaves the item alive for another try,
//! a success marks it dead.

mod take;

pub use take::{fit_within, write_reduced, TakeOptions};

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::{Config, ToolCommand};
use crate::error::{Error, Result};
use crate::reporter::Reporter;
use crate::safety::{self, target_in};
use crate::types::Disposition;
use crate::working_set::WorkingSet;

/// Starts external programs without waiting for them
pub trait ToolLauncher {
    fn launch(&mut self, tool: &ToolCommand, files: &[PathBuf]) -> Result<()>;
}

/// Spawns a detached child process
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

impl ToolLauncher for ProcessLauncher {
    fn launch(&mut self, tool: &ToolCommand, files: &[PathBuf]) -> Result<()> {
        let child = Command::new(&tool.program)
            .args(&tool.args)
            .args(files)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| Error::Launch {
                program: tool.program.clone(),
                source,
            })?;
        log::info!("Launched {} (pid {})", tool.program, child.id());
        Ok(())
    }
}

/// Outcome of launching the stitcher at the end of a sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StitcherLaunch {
    Launched,
    /// Dry run: would have been launched
    Planned,
    NotConfigured,
    Failed(String),
}

/// Where each disposition sends its files
#[derive(Debug, Clone)]
pub struct CommitEngine<L = ProcessLauncher> {
    stitch_dir: PathBuf,
    compare_dir: PathBuf,
    stitcher: Option<ToolCommand>,
    crop_editor: Option<ToolCommand>,
    take: TakeOptions,
    dry_run: bool,
    launcher: L,
}

impl CommitEngine<ProcessLauncher> {
    pub fn from_config(config: &Config) -> Self {
        Self {
            stitch_dir: config.stitch_dir.clone(),
            compare_dir: config.compare_dir.clone(),
            stitcher: config.stitcher.clone(),
            crop_editor: config.crop_editor.clone(),
            take: TakeOptions {
                max_dimension: config.take_max_dimension,
                jpeg_quality: config.take_jpeg_quality,
            },
            dry_run: config.dry_run,
            launcher: ProcessLauncher,
        }
    }
}

impl<L: ToolLauncher> CommitEngine<L> {
    /// Use a different launcher for the stitcher and crop editor
    pub fn with_launcher<T: ToolLauncher>(self, launcher: T) -> CommitEngine<T> {
        CommitEngine {
            stitch_dir: self.stitch_dir,
            compare_dir: self.compare_dir,
            stitcher: self.stitcher,
            crop_editor: self.crop_editor,
            take: self.take,
            dry_run: self.dry_run,
            launcher,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Apply every disposition in `set`, moving results to `destination`
    pub fn commit<R: Reporter>(
        &mut self,
        set: &mut WorkingSet,
        destination: &Path,
        reporter: &mut R,
    ) -> CommitReport {
        let mut report = CommitReport {
            dry_run: self.dry_run,
            ..CommitReport::default()
        };
        let mut stitched = Vec::new();

        let pending: Vec<_> = set
            .iter()
            .filter(|(_, item)| item.is_alive() && item.disposition() != Disposition::None)
            .map(|(id, item)| (id, item.path().to_path_buf(), item.disposition()))
            .collect();
        log::info!("Committing {} tagged items", pending.len());

        for (id, path, disposition) in pending {
            match self.apply(&path, disposition, destination, reporter) {
                Ok(new_path) => {
                    report.record_success(disposition);
                    if disposition == Disposition::Stitch {
                        stitched.push(new_path.unwrap_or_else(|| path.clone()));
                    }
                    if !self.dry_run {
                        set.expunge(id);
                    }
                }
                Err(e) => {
                    reporter.failed(operation_name(disposition), &path, &e);
                    report.failures.push(CommitFailure {
                        path,
                        disposition,
                        error: e.to_string(),
                    });
                }
            }
        }

        if !stitched.is_empty() {
            report.stitcher = Some(self.launch_stitcher(&stitched, reporter));
        }

        set.compact();
        report
    }

    /// Carry out one disposition; returns the file's new location if it moved
    fn apply<R: Reporter>(
        &mut self,
        path: &Path,
        disposition: Disposition,
        destination: &Path,
        reporter: &mut R,
    ) -> Result<Option<PathBuf>> {
        let operation = operation_name(disposition);

        match disposition {
            Disposition::None => Ok(None),
            Disposition::Keep => self.relocate(path, destination, reporter).map(Some),
            Disposition::Stitch => {
                let dir = self.stitch_dir.clone();
                self.relocate(path, &dir, reporter).map(Some)
            }
            Disposition::Compare => {
                let dir = self.compare_dir.clone();
                self.relocate(path, &dir, reporter).map(Some)
            }
            Disposition::Take => {
                let target = target_in(destination, path)?;
                if self.dry_run {
                    reporter.changed(operation, path, Some(format!("would reduce to {}", target.display())));
                    return Ok(Some(target));
                }
                write_reduced(path, &target, self.take)?;
                if let Err(e) = safety::remove(path) {
                    // Keep exactly one copy on failure
                    let _ = std::fs::remove_file(&target);
                    return Err(e);
                }
                reporter.changed(operation, path, Some(format!("-> {}", target.display())));
                Ok(Some(target))
            }
            Disposition::Crop => {
                let editor = self
                    .crop_editor
                    .clone()
                    .ok_or_else(|| Error::Configuration("no crop editor configured".to_string()))?;
                if self.dry_run {
                    reporter.changed(operation, path, Some(format!("would open in {}", editor.program)));
                    return Ok(None);
                }
                self.launcher.launch(&editor, &[path.to_path_buf()])?;
                reporter.changed(operation, path, Some(format!("opened in {}", editor.program)));
                Ok(None)
            }
            Disposition::Delete => {
                if self.dry_run {
                    reporter.changed(operation, path, Some("would delete".to_string()));
                    return Ok(None);
                }
                safety::remove(path)?;
                reporter.changed(operation, path, None);
                Ok(None)
            }
        }
    }

    fn relocate<R: Reporter>(&self, path: &Path, dir: &Path, reporter: &mut R) -> Result<PathBuf> {
        if self.dry_run {
            let target = target_in(dir, path)?;
            reporter.changed("move", path, Some(format!("would move to {}", target.display())));
            return Ok(target);
        }
        let target = safety::move_into(path, dir)?;
        reporter.changed("move", path, Some(format!("-> {}", target.display())));
        Ok(target)
    }

    fn launch_stitcher<R: Reporter>(&mut self, files: &[PathBuf], reporter: &mut R) -> StitcherLaunch {
        let Some(stitcher) = self.stitcher.clone() else {
            reporter.notice(&self.stitch_dir, "no stitcher configured");
            return StitcherLaunch::NotConfigured;
        };
        if self.dry_run {
            reporter.changed(
                "stitch",
                &self.stitch_dir,
                Some(format!("would launch {} on {} files", stitcher.program, files.len())),
            );
            return StitcherLaunch::Planned;
        }
        match self.launcher.launch(&stitcher, files) {
            Ok(()) => {
                reporter.changed(
                    "stitch",
                    &self.stitch_dir,
                    Some(format!("launched {} on {} files", stitcher.program, files.len())),
                );
                StitcherLaunch::Launched
            }
            Err(e) => {
                reporter.failed("stitch", &self.stitch_dir, &e);
                StitcherLaunch::Failed(e.to_string())
            }
        }
    }
}

fn operation_name(disposition: Disposition) -> &'static str {
    match disposition {
        Disposition::None => "none",
        Disposition::Keep => "keep",
        Disposition::Take => "take",
        Disposition::Stitch => "stitch",
        Disposition::Compare => "compare",
        Disposition::Crop => "crop",
        Disposition::Delete => "delete",
    }
}

/// An item the sweep could not process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitFailure {
    pub path: PathBuf,
    pub disposition: Disposition,
    pub error: String,
}

/// Aggregate of a commit sweep
#[derive(Debug, Clone, Default)]
pub struct CommitReport {
    pub dry_run: bool,
    /// Successfully processed items per disposition
    pub succeeded: BTreeMap<Disposition, usize>,
    pub failures: Vec<CommitFailure>,
    /// Set when at least one item was staged for stitching
    pub stitcher: Option<StitcherLaunch>,
}

impl CommitReport {
    fn record_success(&mut self, disposition: Disposition) {
        *self.succeeded.entry(disposition).or_insert(0) += 1;
    }

    pub fn succeeded(&self, disposition: Disposition) -> usize {
        self.succeeded.get(&disposition).copied().unwrap_or(0)
    }

    pub fn failed(&self, disposition: Disposition) -> usize {
        self.failures
            .iter()
            .filter(|f| f.disposition == disposition)
            .count()
    }

    pub fn total_succeeded(&self) -> usize {
        self.succeeded.values().sum()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl fmt::Display for CommitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            write!(f, "(dry run) ")?;
        }
        write!(
            f,
            "{} committed, {} failed",
            self.total_succeeded(),
            self.failures.len()
        )?;
        for disposition in Disposition::ACTIONS {
            let (ok, failed) = (self.succeeded(disposition), self.failed(disposition));
            if ok + failed > 0 {
                write!(f, "; {} {}", disposition, ok)?;
                if failed > 0 {
                    write!(f, " (+{} failed)", failed)?;
                }
            }
        }
        Ok(())
    }
}
