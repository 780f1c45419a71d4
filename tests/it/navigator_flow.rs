use crate::helpers::{nested_zip, zip_bytes, Fixture};
use bytes::Bytes;
use resource_preview::navigator::SplitBounds;
use resource_preview::{ArchiveNavigator, ObjectStore, PreviewPhase, ZipTreeBuilder};

async fn ready_navigator(data: Bytes) -> (ObjectStore, ArchiveNavigator) {
    let store = ObjectStore::new();
    let mut navigator = ArchiveNavigator::default();
    let ticket = navigator.begin_build();
    let result = ZipTreeBuilder::new(store.clone()).build(data).await;
    assert!(navigator.complete_build(ticket, result));
    (store, navigator)
}

#[tokio::test]
async fn first_file_is_selected_and_its_ancestors_expanded() {
    let (_store, navigator) = ready_navigator(nested_zip()).await;

    assert_eq!(navigator.phase(), &PreviewPhase::Ready);
    assert_eq!(navigator.state().selected_entry_path.as_deref(), Some("a/b.txt"));
    assert!(navigator.state().expanded_paths.contains("a"));
    assert_eq!(navigator.selected_entry().unwrap().name, "b.txt");
}

#[tokio::test]
async fn selecting_a_file_changes_only_the_selection() {
    let (_store, mut navigator) = ready_navigator(nested_zip()).await;
    navigator.toggle_directory("a/c");
    let expanded = navigator.state().expanded_paths.clone();
    let ratio = navigator.state().split_ratio;

    assert!(navigator.select_file("a/c/d.png"));

    assert_eq!(navigator.state().selected_entry_path.as_deref(), Some("a/c/d.png"));
    assert_eq!(navigator.state().expanded_paths, expanded);
    assert_eq!(navigator.state().split_ratio, ratio);
    assert_eq!(navigator.phase(), &PreviewPhase::Ready);
}

#[tokio::test]
async fn directories_and_unknown_paths_cannot_be_selected() {
    let (_store, mut navigator) = ready_navigator(nested_zip()).await;

    assert!(!navigator.select_file("a/c"));
    assert!(!navigator.select_file("missing.txt"));
    assert_eq!(navigator.state().selected_entry_path.as_deref(), Some("a/b.txt"));
}

#[tokio::test]
async fn toggling_directories_controls_visible_rows() {
    let (_store, mut navigator) = ready_navigator(nested_zip()).await;

    let paths = |navigator: &ArchiveNavigator| -> Vec<String> {
        navigator.visible_rows().into_iter().map(|row| row.path).collect()
    };
    assert_eq!(paths(&navigator), vec!["a", "a/b.txt", "a/c"]);

    assert!(navigator.toggle_directory("a/c"));
    let rows = navigator.visible_rows();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3].path, "a/c/d.png");
    assert_eq!(rows[3].depth, 2);
    assert!(rows[1].is_selected);

    assert!(navigator.toggle_directory("a"));
    assert_eq!(paths(&navigator), vec!["a"]);

    // 文件不能被展开
    assert!(!navigator.toggle_directory("a/b.txt"));
}

#[tokio::test]
async fn empty_archive_reaches_the_empty_phase() {
    let (store, navigator) = ready_navigator(zip_bytes(&[])).await;

    assert_eq!(navigator.phase(), &PreviewPhase::Empty);
    assert!(navigator.tree().unwrap().first_file().is_none());
    assert!(navigator.state().selected_entry_path.is_none());
    assert_eq!(store.live_count(), 0);
}

#[tokio::test]
async fn directory_only_archive_is_empty() {
    let data = zip_bytes(&[Fixture::Dir("a/"), Fixture::Dir("a/b/")]);
    let (_store, navigator) = ready_navigator(data).await;

    assert_eq!(navigator.phase(), &PreviewPhase::Empty);
    assert_eq!(navigator.visible_rows().len(), 1);
}

#[tokio::test]
async fn corrupt_archive_fails_with_a_single_message() {
    let (store, mut navigator) =
        ready_navigator(Bytes::from_static(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10])).await;

    assert_eq!(
        navigator.phase(),
        &PreviewPhase::Failed {
            message: "Failed to process archive".to_string()
        }
    );
    assert!(navigator.tree().is_none());
    assert!(navigator.visible_rows().is_empty());
    assert!(!navigator.select_file("a/b.txt"));
    assert_eq!(store.live_count(), 0);
}

#[tokio::test]
async fn stale_build_results_are_discarded_and_released() {
    let store = ObjectStore::new();
    let builder = ZipTreeBuilder::new(store.clone());
    let mut navigator = ArchiveNavigator::default();

    let first = navigator.begin_build();
    let second = navigator.begin_build();

    let stale = builder.build(nested_zip()).await;
    assert!(!navigator.complete_build(first, stale));
    assert_eq!(store.live_count(), 0);
    assert_eq!(navigator.phase(), &PreviewPhase::Loading);

    let fresh = builder.build(nested_zip()).await;
    assert!(navigator.complete_build(second, fresh));
    assert_eq!(store.live_count(), 2);
}

#[tokio::test]
async fn closing_disposes_the_tree_and_cancels_pending_builds() {
    let (store, mut navigator) = ready_navigator(nested_zip()).await;
    assert_eq!(store.live_count(), 2);

    let pending = navigator.begin_build();
    assert_eq!(store.live_count(), 0);
    navigator.close();

    let late = ZipTreeBuilder::new(store.clone()).build(nested_zip()).await;
    assert!(!navigator.complete_build(pending, late));
    assert_eq!(navigator.phase(), &PreviewPhase::Idle);
    assert_eq!(store.live_count(), 0);
}

#[test]
fn divider_drag_is_clamped() {
    let mut navigator = ArchiveNavigator::new(SplitBounds::default());
    assert_eq!(navigator.state().split_ratio, 0.25);

    assert_eq!(navigator.drag_divider(50.0, 1000.0), 0.10);
    assert_eq!(navigator.drag_divider(900.0, 1000.0), 0.50);
    assert_eq!(navigator.drag_divider(300.0, 1000.0), 0.30);
    // 容器宽度为 0 时保持不变
    assert_eq!(navigator.drag_divider(10.0, 0.0), 0.30);
    assert_eq!(navigator.set_split_ratio(f32::NAN), 0.25);
}
