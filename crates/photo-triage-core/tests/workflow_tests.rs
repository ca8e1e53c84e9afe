mod common;

use std::fs;

use tempfile::tempdir;

use common::{create_camera_jpeg, init_test_logging, Layout, Shot};
use photo_triage_core::archive::LinkStatus;
use photo_triage_core::import::ImportMode;
use photo_triage_core::metadata::{ExifMetadata, MetadataProvider};
use photo_triage_core::reporter::CollectingReporter;
use photo_triage_core::working_set::Move;
use photo_triage_core::{Config, Disposition, PhotoTriage, Rotation};

fn load_card(layout: &Layout) {
    create_camera_jpeg(
        &layout.card,
        "DSC_0001.JPG",
        &Shot {
            orientation: 6,
            ..Shot::default()
        },
    );
    create_camera_jpeg(&layout.card, "DSC_0002.JPG", &Shot::default());
    create_camera_jpeg(
        &layout.card,
        "DSC_0003.JPG",
        &Shot {
            taken: "2021:01:02 03:04:05",
            ..Shot::default()
        },
    );
    fs::write(layout.card.join("INDEX.DAT"), b"camera index").unwrap();
}

#[test]
fn test_import_rename_review_commit() {
    init_test_logging();
    let dir = tempdir().unwrap();
    let layout = Layout::new(dir.path());
    load_card(&layout);
    let triage = PhotoTriage::new(layout.config());
    let mut reporter = CollectingReporter::new();

    // Import
    let imported = triage.import(&layout.card, ImportMode::Move, &mut reporter).unwrap();
    assert_eq!(imported.imported.len(), 3);
    assert!(layout.card.join("INDEX.DAT").exists());

    // Rename and archive
    let report = triage.rename(&[&layout.mid], &mut reporter);
    assert!(!report.has_failures());
    assert_eq!(report.renamed(), 3);
    for name in [
        "2020-11-06T22.58.14.jpg",
        "2020-11-06T22.58.14_01.jpg",
        "2021-01-02T03.04.05.jpg",
    ] {
        assert!(layout.mid.join(name).exists(), "{} missing", name);
    }
    assert!(layout.archive.join("2020/11/2020-11-06T22.58.14.jpg").exists());
    assert!(layout.archive.join("2020/11/2020-11-06T22.58.14_01.jpg").exists());
    assert!(layout.archive.join("2021/01/2021-01-02T03.04.05.jpg").exists());
    assert!(report.outcomes.iter().all(|o| o.link == LinkStatus::Created));

    // A second run changes nothing
    let again = triage.rename(&[&layout.mid], &mut CollectingReporter::new());
    assert_eq!(again.renamed(), 0);
    assert_eq!(again.already_in_place(), 3);

    // Review
    let mut set = triage.scan(&layout.mid, &mut reporter).unwrap();
    assert_eq!(set.len(), 3);
    let first = set.move_cursor(Move::First).unwrap();
    assert_eq!(set.item(first).file_name(), "2020-11-06T22.58.14.jpg");
    assert_eq!(set.item(first).rotation, Rotation::Deg90);

    set.tag(Disposition::Take).unwrap();
    set.move_cursor(Move::By(1)).unwrap();
    set.tag(Disposition::Delete).unwrap();
    set.move_cursor(Move::By(1)).unwrap();
    set.tag(Disposition::Keep).unwrap();

    // Commit
    let mut engine = triage.commit_engine();
    let report = engine.commit(&mut set, &layout.dst, &mut reporter);
    assert!(!report.has_failures(), "{:?}", report.failures);
    assert_eq!(report.total_succeeded(), 3);
    assert_eq!(set.live_count(), 0);

    // Take: reduced, metadata carried over
    let taken = layout.dst.join("2020-11-06T22.58.14.jpg");
    let reduced = image::open(&taken).unwrap();
    assert_eq!((reduced.width(), reduced.height()), (32, 24));
    assert_eq!(
        ExifMetadata.read_timestamp(&taken).unwrap().unwrap().to_string(),
        "2020-11-06 22:58:14"
    );
    assert_eq!(ExifMetadata.read_orientation(&taken).unwrap(), Some(Rotation::Deg90));

    // Delete only drops the staging copy; the archive keeps the picture
    assert!(!layout.mid.join("2020-11-06T22.58.14_01.jpg").exists());
    assert!(layout.archive.join("2020/11/2020-11-06T22.58.14_01.jpg").exists());

    assert!(layout.dst.join("2021-01-02T03.04.05.jpg").exists());
    assert_eq!(fs::read_dir(&layout.mid).unwrap().count(), 0);
}

#[test]
fn test_dry_run_rename_plans_everything() {
    let dir = tempdir().unwrap();
    let layout = Layout::new(dir.path());
    load_card(&layout);
    let triage = PhotoTriage::new(Config {
        dry_run: true,
        ..layout.config()
    });

    let report = triage.rename(&[&layout.card], &mut CollectingReporter::new());

    assert_eq!(report.renamed(), 3);
    assert_eq!(report.failures.len(), 0);
    let planned: Vec<String> = report
        .outcomes
        .iter()
        .map(|o| o.primary.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        planned,
        vec![
            "2020-11-06T22.58.14.jpg",
            "2020-11-06T22.58.14_01.jpg",
            "2021-01-02T03.04.05.jpg"
        ]
    );
    assert!(layout.card.join("DSC_0001.JPG").exists());
    assert!(!layout.archive.exists());
}

#[test]
fn test_files_without_dates_fail_the_batch() {
    let dir = tempdir().unwrap();
    let layout = Layout::new(dir.path());
    fs::create_dir_all(&layout.mid).unwrap();
    image::RgbImage::new(8, 8)
        .save_with_format(layout.mid.join("scan.jpg"), image::ImageFormat::Jpeg)
        .unwrap();
    create_camera_jpeg(&layout.mid, "DSC_0001.JPG", &Shot::default());
    let triage = PhotoTriage::new(layout.config());
    let mut reporter = CollectingReporter::new();

    let report = triage.rename(&[&layout.mid], &mut reporter);

    assert!(report.has_failures());
    assert_eq!(report.renamed(), 1);
    assert!(layout.mid.join("scan.jpg").exists());
    assert_eq!(reporter.failures().count(), 1);

    // Opting into mtime rescues it
    let triage = PhotoTriage::new(Config {
        use_mtime_fallback: true,
        ..layout.config()
    });
    let report = triage.rename(&[layout.mid.join("scan.jpg")], &mut CollectingReporter::new());
    assert!(!report.has_failures());
    assert_eq!(report.renamed(), 1);
}
