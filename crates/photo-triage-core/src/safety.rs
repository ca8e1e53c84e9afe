//! File operations that never overwrite.
//!
//! Every helper here refuses to replace an existing target, so a repeated or
//! interrupted run can only ever leave a file in one of two places.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// `dir/<file name of source>`
pub fn target_in(dir: &Path, source: &Path) -> Result<PathBuf> {
    let name = source
        .file_name()
        .ok_or_else(|| Error::filesystem("name", source, io::ErrorKind::InvalidInput.into()))?;
    Ok(dir.join(name))
}

fn refuse_existing(target: &Path) -> Result<()> {
    if target.symlink_metadata().is_ok() {
        return Err(Error::filesystem(
            "move",
            target,
            io::Error::new(io::ErrorKind::AlreadyExists, "target already exists"),
        ));
    }
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| Error::filesystem("mkdir", dir, e))
}

/// Move `source` into `dir`, keeping its name.
///
/// Renames when possible and falls back to copy and remove across
/// filesystems. Returns the new path.
pub fn move_into(source: &Path, dir: &Path) -> Result<PathBuf> {
    let target = target_in(dir, source)?;
    ensure_dir(dir)?;
    refuse_existing(&target)?;

    if fs::rename(source, &target).is_ok() {
        return Ok(target);
    }

    copy_new(source, &target)?;
    if let Err(e) = fs::remove_file(source) {
        // Leave the original alone; the copy would make it a duplicate
        let _ = fs::remove_file(&target);
        return Err(Error::filesystem("remove", source, e));
    }
    Ok(target)
}

/// Copy `source` into `dir`, keeping its name. Returns the new path.
pub fn copy_into(source: &Path, dir: &Path) -> Result<PathBuf> {
    let target = target_in(dir, source)?;
    ensure_dir(dir)?;
    refuse_existing(&target)?;
    copy_new(source, &target)?;
    Ok(target)
}

fn copy_new(source: &Path, target: &Path) -> Result<()> {
    let mut reader = fs::File::open(source).map_err(|e| Error::filesystem("open", source, e))?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .map_err(|e| Error::filesystem("create", target, e))?;

    if let Err(e) = io::copy(&mut reader, &mut writer) {
        drop(writer);
        let _ = fs::remove_file(target);
        return Err(Error::filesystem("copy", source, e));
    }

    if let Ok(meta) = fs::metadata(source) {
        let _ = fs::set_permissions(target, meta.permissions());
    }
    Ok(())
}

/// Write `data` to a new file; fails if `target` exists
pub fn write_new(target: &Path, data: &[u8]) -> Result<()> {
    use std::io::Write;

    if let Some(dir) = target.parent() {
        ensure_dir(dir)?;
    }
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .map_err(|e| Error::filesystem("create", target, e))?;
    file.write_all(data)
        .map_err(|e| Error::filesystem("write", target, e))
}

pub fn remove(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| Error::filesystem("delete", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_stamped_file;
    use tempfile::tempdir;

    #[test]
    fn test_move_into_creates_directory() {
        let dir = tempdir().unwrap();
        let source = create_stamped_file(dir.path(), "a.jpg", "data");

        let target = move_into(&source, &dir.path().join("out/deeper")).unwrap();

        assert_eq!(target, dir.path().join("out/deeper/a.jpg"));
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(target).unwrap(), "data");
    }

    #[test]
    fn test_move_never_overwrites() {
        let dir = tempdir().unwrap();
        let source = create_stamped_file(dir.path(), "a.jpg", "new");
        let existing = create_stamped_file(&dir.path().join("out"), "a.jpg", "old");

        let result = move_into(&source, &dir.path().join("out"));

        assert!(matches!(result, Err(Error::Filesystem { operation: "move", .. })));
        assert!(source.exists());
        assert_eq!(fs::read_to_string(existing).unwrap(), "old");
    }

    #[test]
    fn test_copy_keeps_source() {
        let dir = tempdir().unwrap();
        let source = create_stamped_file(dir.path(), "a.jpg", "data");

        let target = copy_into(&source, &dir.path().join("out")).unwrap();

        assert!(source.exists());
        assert_eq!(fs::read_to_string(target).unwrap(), "data");
        assert!(copy_into(&source, &dir.path().join("out")).is_err());
    }

    #[test]
    fn test_write_new_refuses_existing() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("x.jpg");
        write_new(&target, b"one").unwrap();
        assert!(write_new(&target, b"two").is_err());
        assert_eq!(fs::read(&target).unwrap(), b"one");
    }
}
