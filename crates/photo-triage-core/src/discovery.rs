use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::MediaFormat;

/// Walk a directory and return every file whose format passes `accept`.
///
/// Entries are visited sorted by file name so batches are processed in a
/// deterministic order; same-second shots from one camera then keep their
/// shutter order when the counter suffix is assigned.
pub fn discover_in_directory<F>(
    directory: &Path,
    max_depth: Option<usize>,
    accept: F,
) -> Result<Vec<PathBuf>>
where
    F: Fn(&MediaFormat) -> bool,
{
    if !directory.exists() {
        return Err(Error::FileNotFound(directory.to_path_buf()));
    }

    let max_depth = max_depth.unwrap_or(usize::MAX);

    let files = WalkDir::new(directory)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Error walking {}: {}", directory.display(), e);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            MediaFormat::from_path(e.path())
                .map(|format| accept(&format))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();

    Ok(files)
}

/// Reviewable pictures under `directory`
pub fn discover_reviewable(directory: &Path, max_depth: Option<usize>) -> Result<Vec<PathBuf>> {
    discover_in_directory(directory, max_depth, MediaFormat::is_reviewable)
}

/// A named source that contributed nothing to a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedSource {
    pub path: PathBuf,
    pub reason: String,
    /// The path does not exist at all
    pub missing: bool,
}

/// Files found for a batch plus the sources that could not be used
#[derive(Debug, Default)]
pub struct Expansion {
    pub files: Vec<PathBuf>,
    pub rejected: Vec<RejectedSource>,
}

/// Expand a list of files and directories into the files to archive.
///
/// Explicitly named files are always kept; directories contribute their
/// archivable media. Missing or unreadable paths end up in `rejected`.
pub fn expand_sources<P: AsRef<Path>>(sources: &[P], max_depth: Option<usize>) -> Expansion {
    let mut expansion = Expansion::default();

    for source in sources {
        let source = source.as_ref();
        let reject = |reason: String, missing: bool| RejectedSource {
            path: source.to_path_buf(),
            reason,
            missing,
        };

        match std::fs::metadata(source) {
            Err(e) => {
                let missing = e.kind() == std::io::ErrorKind::NotFound;
                expansion.rejected.push(reject(e.to_string(), missing));
            }
            Ok(meta) if meta.is_file() => expansion.files.push(source.to_path_buf()),
            Ok(meta) if meta.is_dir() => {
                match discover_in_directory(source, max_depth, MediaFormat::is_archivable) {
                    Ok(found) => expansion.files.extend(found),
                    Err(e) => expansion.rejected.push(reject(e.to_string(), false)),
                }
            }
            Ok(_) => expansion
                .rejected
                .push(reject("not a regular file or directory".to_string(), false)),
        }
    }

    expansion
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    fn create_test_file(dir: &Path, name: &str) -> PathBuf {
        let file_path = dir.join(name);
        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"DUMMY IMAGE DATA").unwrap();
        file_path
    }

    fn setup_test_directory() -> (tempfile::TempDir, Vec<PathBuf>) {
        let dir = tempdir().unwrap();
        let subdir_path = dir.path().join("subdir");
        fs::create_dir(&subdir_path).unwrap();

        let files = vec![
            create_test_file(dir.path(), "DSC_0002.JPG"),
            create_test_file(dir.path(), "DSC_0001.jpg"),
            create_test_file(dir.path(), "scan.png"),
            create_test_file(dir.path(), "clip.MOV"),
            create_test_file(&subdir_path, "DSC_0003.jpg"),
        ];
        create_test_file(dir.path(), "notes.txt");

        (dir, files)
    }

    #[test]
    fn test_discover_reviewable_is_sorted() {
        let (dir, _) = setup_test_directory();

        let found = discover_reviewable(dir.path(), None).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            names,
            vec!["DSC_0001.jpg", "DSC_0002.JPG", "scan.png", "subdir/DSC_0003.jpg"]
        );
    }

    #[test]
    fn test_discover_with_depth_limit() {
        let (dir, _) = setup_test_directory();
        let found = discover_reviewable(dir.path(), Some(1)).unwrap();
        assert_eq!(found.len(), 3);
        for file in &found {
            assert_eq!(file.parent().unwrap(), dir.path());
        }
    }

    #[test]
    fn test_discover_nonexistent_directory() {
        let result = discover_reviewable(Path::new("/path/that/does/not/exist"), None);
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_expand_sources() {
        let (dir, files) = setup_test_directory();
        let notes = dir.path().join("notes.txt");
        let missing = dir.path().join("missing.jpg");

        let sources = vec![dir.path().to_path_buf(), notes.clone(), missing.clone()];
        let expansion = expand_sources(&sources, None);

        // Directory walk picks archivable media only, explicit files are kept
        let expanded = &expansion.files;
        assert_eq!(expanded.len(), files.len() + 1);
        assert!(expanded.contains(&dir.path().join("clip.MOV")));
        assert_eq!(expanded.last(), Some(&notes));

        assert_eq!(expansion.rejected.len(), 1);
        assert_eq!(expansion.rejected[0].path, missing);
        assert!(expansion.rejected[0].missing);
    }
}
