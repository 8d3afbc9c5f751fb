//! Scratch directory, temporary file and sweep tests.

use std::fs::{self, File};
use std::time::{Duration, SystemTime};

use keepshot::storage::{remove_quietly, sweep_older_than};
use keepshot::{ImageFormat, ScratchSpace};
use tempfile::TempDir;

#[test]
fn in_directory_layout() {
    let scratch = ScratchSpace::in_directory("/srv/keepshot");
    assert_eq!(scratch.temp_dir(), std::path::Path::new("/srv/keepshot/temp"));
    assert_eq!(
        scratch.output_dir(),
        std::path::Path::new("/srv/keepshot/screenshots")
    );
}

#[test]
fn temp_paths_are_unique_and_keep_safe_extensions() {
    let scratch = ScratchSpace::in_directory("/tmp/keepshot-test");

    let first = scratch.unique_temp_path(Some("mp4"));
    let second = scratch.unique_temp_path(Some("mp4"));
    assert_ne!(first, second);
    assert_eq!(first.extension().and_then(|ext| ext.to_str()), Some("mp4"));
    assert!(first.starts_with(scratch.temp_dir()));

    for unsafe_extension in ["", "../etc", "m p4", "averyveryverylongextension"] {
        let path = scratch.unique_temp_path(Some(unsafe_extension));
        assert_eq!(path.extension(), None, "{unsafe_extension:?} should be dropped");
    }
    assert_eq!(scratch.unique_temp_path(None).extension(), None);
}

#[test]
fn output_paths_follow_the_naming_scheme() {
    let scratch = ScratchSpace::in_directory("/tmp/keepshot-test");

    let numbered = scratch.unique_output_path("keepshot", Some(2), ImageFormat::Jpeg);
    let name = numbered.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("keepshot_"));
    assert!(name.ends_with("_2.jpg"));
    assert_eq!(name.len(), "keepshot_".len() + 32 + "_2.jpg".len());

    let single = scratch.unique_output_path("shot", None, ImageFormat::Png);
    let name = single.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("shot_"));
    assert!(name.ends_with(".png"));
    assert_eq!(name.len(), "shot_".len() + 32 + ".png".len());
}

#[test]
fn temp_file_is_deleted_on_drop() {
    let root = TempDir::new().unwrap();
    let scratch = ScratchSpace::in_directory(root.path());

    let temp = scratch.write_temp(b"payload", Some("webm")).unwrap();
    let path = temp.path().to_path_buf();
    assert_eq!(fs::read(&path).unwrap(), b"payload");

    drop(temp);
    assert!(!path.exists());
}

#[test]
fn temp_file_drop_tolerates_prior_deletion() {
    let root = TempDir::new().unwrap();
    let scratch = ScratchSpace::in_directory(root.path());

    let temp = scratch.write_temp(b"payload", None).unwrap();
    fs::remove_file(temp.path()).unwrap();
    drop(temp);
}

#[test]
fn ensure_output_dir_creates_nested_directories() {
    let root = TempDir::new().unwrap();
    let scratch = ScratchSpace::new(root.path().join("t"), root.path().join("a/b/c"));

    scratch.ensure_output_dir().unwrap();
    scratch.ensure_output_dir().unwrap();
    assert!(scratch.output_dir().is_dir());
}

#[test]
fn remove_quietly_reports_whether_anything_was_removed() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("leftover.jpg");
    fs::write(&path, b"x").unwrap();

    assert!(remove_quietly(&path));
    assert!(!remove_quietly(&path));
}

#[test]
fn sweep_removes_only_stale_files() {
    let root = TempDir::new().unwrap();
    let stale = root.path().join("stale.jpg");
    let fresh = root.path().join("fresh.jpg");
    let nested = root.path().join("nested");

    fs::write(&stale, b"old").unwrap();
    fs::write(&fresh, b"new").unwrap();
    fs::create_dir(&nested).unwrap();

    let two_hours_ago = SystemTime::now() - Duration::from_secs(2 * 3600);
    File::options()
        .write(true)
        .open(&stale)
        .unwrap()
        .set_modified(two_hours_ago)
        .unwrap();

    let removed = sweep_older_than(root.path(), Duration::from_secs(3600));

    assert_eq!(removed, 1);
    assert!(!stale.exists());
    assert!(fresh.exists());
    assert!(nested.is_dir());
}

#[test]
fn sweep_of_missing_directory_is_a_no_op() {
    let root = TempDir::new().unwrap();
    assert_eq!(
        sweep_older_than(root.path().join("absent"), Duration::ZERO),
        0
    );
}
