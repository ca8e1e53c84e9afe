//! Bring files from a camera card into the staging directory.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::discovery::discover_in_directory;
use crate::error::Result;
use crate::reporter::Reporter;
use crate::safety::{copy_into, move_into, target_in};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    #[default]
    Move,
    Copy,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    /// Files now in (or, in dry-run, headed for) the staging directory
    pub imported: Vec<PathBuf>,
    pub failed: usize,
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} imported, {} failed", self.imported.len(), self.failed)
    }
}

/// Move or copy every media file under `source` flat into `staging`.
///
/// A file whose name is already taken in `staging` is reported and left
/// on the card.
pub fn import_files<R: Reporter>(
    source: &Path,
    staging: &Path,
    mode: ImportMode,
    dry_run: bool,
    reporter: &mut R,
) -> Result<ImportReport> {
    let files = discover_in_directory(source, None, |format| format.is_archivable())?;
    log::info!("Importing {} files from {}", files.len(), source.display());

    let mut report = ImportReport::default();
    let operation = match mode {
        ImportMode::Move => "move",
        ImportMode::Copy => "copy",
    };

    for file in files {
        let result = if dry_run {
            target_in(staging, &file).and_then(|target| {
                if target.exists() {
                    Err(crate::Error::filesystem(
                        operation,
                        &target,
                        std::io::Error::new(std::io::ErrorKind::AlreadyExists, "target already exists"),
                    ))
                } else {
                    Ok(target)
                }
            })
        } else {
            match mode {
                ImportMode::Move => move_into(&file, staging),
                ImportMode::Copy => copy_into(&file, staging),
            }
        };

        match result {
            Ok(target) => {
                let details = if dry_run {
                    format!("would {} to {}", operation, target.display())
                } else {
                    format!("-> {}", target.display())
                };
                reporter.changed(operation, &file, Some(details));
                report.imported.push(target);
            }
            Err(e) => {
                reporter.failed(operation, &file, &e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}
