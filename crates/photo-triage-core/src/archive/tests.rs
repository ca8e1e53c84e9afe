use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use super::*;
use crate::resolver::FileId;
use crate::reporter::{CollectingReporter, Event};
use crate::test_utils::{create_stamped_file, init_test_logging, ContentStamp};

const STAMP: &str = "2020-11-06 22:58:14";

fn archiver(root: &Path) -> Archiver<ContentStamp> {
    Archiver::new(ContentStamp, root.join("ByDate"))
}

#[cfg(unix)]
fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    let (a, b) = (fs::metadata(a).unwrap(), fs::metadata(b).unwrap());
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[test]
fn test_archive_renames_and_links() {
    init_test_logging();
    let dir = tempdir().unwrap();
    let incoming = dir.path().join("01-tmp");
    let source = create_stamped_file(&incoming, "DSC_0001.JPG", STAMP);
    let mut reporter = CollectingReporter::new();

    let outcome = archiver(dir.path()).archive(&source, &mut reporter).unwrap();

    assert_eq!(outcome.primary, incoming.join("2020-11-06T22.58.14.jpg"));
    assert_eq!(
        outcome.archive,
        dir.path().join("ByDate/2020/11/2020-11-06T22.58.14.jpg")
    );
    assert!(outcome.renamed);
    assert_eq!(outcome.link, LinkStatus::Created);
    assert!(!source.exists());
    assert!(outcome.primary.exists());
    #[cfg(unix)]
    assert!(same_file(&outcome.primary, &outcome.archive));
    assert_eq!(reporter.changes().count(), 2);
}

#[test]
fn test_archive_twice_is_a_no_op() {
    let dir = tempdir().unwrap();
    let source = create_stamped_file(dir.path(), "DSC_0001.JPG", STAMP);
    let mut archiver = archiver(dir.path());

    let first = archiver.archive(&source, &mut CollectingReporter::new()).unwrap();

    let mut reporter = CollectingReporter::new();
    let second = archiver.archive(&first.primary, &mut reporter).unwrap();

    assert_eq!(second.primary, first.primary);
    assert_eq!(second.archive, first.archive);
    assert!(second.already_in_place());
    assert_eq!(reporter.changes().count(), 0);
    assert!(reporter
        .events
        .iter()
        .any(|e| matches!(e, Event::Notice { message, .. } if message == "already in place")));
}

#[test]
fn test_same_second_collision_gets_shared_suffix() {
    let dir = tempdir().unwrap();
    let first = create_stamped_file(dir.path(), "DSC_0001.JPG", STAMP);
    let second = create_stamped_file(dir.path(), "DSC_0002.JPG", STAMP);
    let mut archiver = archiver(dir.path());
    let mut reporter = CollectingReporter::new();

    let a = archiver.archive(&first, &mut reporter).unwrap();
    let b = archiver.archive(&second, &mut reporter).unwrap();

    assert_eq!(a.primary.file_name().unwrap(), "2020-11-06T22.58.14.jpg");
    assert_eq!(b.primary.file_name().unwrap(), "2020-11-06T22.58.14_01.jpg");
    assert_eq!(b.archive.file_name(), b.primary.file_name());
    assert_eq!(b.link, LinkStatus::Created);

    // Both re-runs stay put
    let again = archiver.archive(&b.primary, &mut reporter).unwrap();
    assert!(again.already_in_place());
    assert_eq!(again.primary, b.primary);
}

#[test]
fn test_dry_run_changes_nothing_but_plans_suffixes() {
    let dir = tempdir().unwrap();
    let first = create_stamped_file(dir.path(), "DSC_0001.JPG", STAMP);
    let second = create_stamped_file(dir.path(), "DSC_0002.JPG", STAMP);
    let mut archiver = archiver(dir.path()).dry_run(true);
    let mut reporter = CollectingReporter::new();

    let a = archiver.archive(&first, &mut reporter).unwrap();
    let b = archiver.archive(&second, &mut reporter).unwrap();

    assert!(first.exists() && second.exists());
    assert!(!dir.path().join("ByDate").exists());
    assert_eq!(a.link, LinkStatus::Planned);
    assert_eq!(b.primary.file_name().unwrap(), "2020-11-06T22.58.14_01.jpg");
}

#[test]
fn test_no_timestamp_is_reported_not_guessed() {
    let dir = tempdir().unwrap();
    let source = create_stamped_file(dir.path(), "DSC_0001.JPG", "no date here");

    let result = archiver(dir.path()).archive(&source, &mut CollectingReporter::new());

    assert!(matches!(result, Err(ArchiveError::NoTimestamp { .. })));
    assert!(source.exists());
}

#[test]
fn test_missing_source() {
    let dir = tempdir().unwrap();
    let result = archiver(dir.path()).archive(&dir.path().join("gone.jpg"), &mut CollectingReporter::new());
    assert!(matches!(result, Err(ArchiveError::NotFound(_))));
}

#[test]
fn test_existing_archive_link_is_reused() {
    let dir = tempdir().unwrap();
    let source = create_stamped_file(dir.path(), "DSC_0001.JPG", STAMP);
    let bucket = dir.path().join("ByDate/2020/11");
    fs::create_dir_all(&bucket).unwrap();
    fs::hard_link(&source, bucket.join("2020-11-06T22.58.14.jpg")).unwrap();

    let outcome = archiver(dir.path())
        .archive(&source, &mut CollectingReporter::new())
        .unwrap();

    assert!(outcome.renamed);
    assert_eq!(outcome.link, LinkStatus::AlreadyPresent);
}

#[test]
fn test_batch_sorts_and_continues_past_failures() {
    let dir = tempdir().unwrap();
    let incoming = dir.path().join("incoming");
    // Created out of order on purpose
    create_stamped_file(&incoming, "DSC_0002.JPG", STAMP);
    create_stamped_file(&incoming, "DSC_0001.JPG", STAMP);
    create_stamped_file(&incoming, "DSC_0003.JPG", "garbage");
    create_stamped_file(&incoming, "notes.txt", STAMP);

    let mut reporter = CollectingReporter::new();
    let report = archiver(dir.path()).archive_paths(
        &[incoming.clone(), dir.path().join("missing")],
        None,
        &mut reporter,
    );

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.failures.len(), 2);
    assert!(report.has_failures());
    assert_eq!(report.renamed(), 2);

    // Sorted by original name: DSC_0001 gets the bare name
    let sources: Vec<&PathBuf> = report.outcomes.iter().map(|o| &o.source).collect();
    assert_eq!(sources, vec![&incoming.join("DSC_0001.JPG"), &incoming.join("DSC_0002.JPG")]);
    assert_eq!(
        report.outcomes[0].primary,
        incoming.join("2020-11-06T22.58.14.jpg")
    );
    assert!(incoming.join("notes.txt").exists());

    // Missing source + the undated file
    assert_eq!(reporter.failures().count(), 2);
    assert_eq!(
        report.to_string(),
        "4 files: 2 renamed, 0 already in place, 0 link failures, 2 skipped"
    );
}

#[test]
fn test_missing_named_file_fails_the_batch() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("DSC_9999.JPG");
    let mut reporter = CollectingReporter::new();

    let report = archiver(dir.path()).archive_paths(&[missing.clone()], None, &mut reporter);

    assert!(report.has_failures());
    assert!(matches!(&report.failures[..], [ArchiveError::NotFound(path)] if *path == missing));
    assert_eq!(reporter.failures().count(), 1);
    assert_eq!(
        report.to_string(),
        "1 files: 0 renamed, 0 already in place, 0 link failures, 1 skipped"
    );
}

/// Sees every archive slot as another name for the file at `linked`
struct LinkedArchive {
    archive_root: PathBuf,
    linked: PathBuf,
}

impl FileProbe for LinkedArchive {
    fn identity(&self, path: &Path) -> std::io::Result<Option<FileId>> {
        if path.starts_with(&self.archive_root) {
            FsProbe.identity(&self.linked)
        } else {
            FsProbe.identity(path)
        }
    }
}

#[test]
fn test_link_check_uses_the_resolver_identity() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("ByDate");
    let source = create_stamped_file(dir.path(), "DSC_0001.JPG", STAMP);
    let identities = LinkedArchive {
        archive_root: root.clone(),
        linked: dir.path().join("2020-11-06T22.58.14.jpg"),
    };
    let mut archiver = Archiver::with_resolver(ContentStamp, PathResolver::with_probe(&root, identities));

    let outcome = archiver.archive(&source, &mut CollectingReporter::new()).unwrap();

    assert!(outcome.renamed);
    assert_eq!(outcome.link, LinkStatus::AlreadyPresent);
    assert!(!outcome.archive.exists());
}
