//! Integration tests for page persistence

use docket_downloader::output::{
    defendant_page_path, docket_sheet_path, sheet_key, write_page, EmptyWritePolicy,
};
use tempfile::TempDir;

#[tokio::test]
async fn rewriting_the_same_item_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = defendant_page_path(dir.path(), 633_123);

    write_page(&path, Some("<html>page</html>"), EmptyWritePolicy::Touch)
        .await
        .unwrap();
    let first = std::fs::read(&path).unwrap();

    write_page(&path, Some("<html>page</html>"), EmptyWritePolicy::Touch)
        .await
        .unwrap();
    let second = std::fs::read(&path).unwrap();

    assert_eq!(first, second);
    // One file, not an accumulating series.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn overwrite_truncates_longer_previous_content() {
    let dir = TempDir::new().unwrap();
    let path = defendant_page_path(dir.path(), 1);

    write_page(
        &path,
        Some("a much longer body from an earlier run"),
        EmptyWritePolicy::Touch,
    )
    .await
    .unwrap();
    write_page(&path, Some("short"), EmptyWritePolicy::Touch)
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "short");
}

#[tokio::test]
async fn empty_policy_decides_between_touch_and_skip() {
    let dir = TempDir::new().unwrap();

    let touched = defendant_page_path(dir.path(), 2);
    write_page(&touched, None, EmptyWritePolicy::Touch)
        .await
        .unwrap();
    assert!(touched.exists());

    let skipped = defendant_page_path(dir.path(), 3);
    write_page(&skipped, None, EmptyWritePolicy::Skip)
        .await
        .unwrap();
    assert!(!skipped.exists());
}

#[test]
fn sheet_paths_derive_from_the_link_tail() {
    let dir = TempDir::new().unwrap();
    let link = "666666.php?&docase=111111";

    assert_eq!(sheet_key(link), "111111");
    assert_eq!(
        docket_sheet_path(dir.path(), link),
        dir.path().join("docket111111.html")
    );
}
