use crate::helpers::{nested_zip, zip64_declaring, zip_bytes, Fixture, PNG_HEADER};
use bytes::Bytes;
use resource_preview::archive::DEFAULT_MAX_UNCOMPRESSED_BYTES;
use resource_preview::{ArchiveError, ArchiveTree, ContentCategory, ObjectStore, ZipTreeBuilder};

async fn build(data: Bytes) -> (ObjectStore, Result<ArchiveTree, ArchiveError>) {
    let store = ObjectStore::new();
    let result = ZipTreeBuilder::new(store.clone()).build(data).await;
    (store, result)
}

#[tokio::test]
async fn nested_paths_become_a_directory_tree() {
    let (_store, result) = build(nested_zip()).await;
    let tree = result.unwrap();

    assert_eq!(tree.roots().len(), 1);
    let a = &tree.roots()[0];
    assert_eq!(a.name, "a");
    assert!(a.is_directory);

    let children: Vec<&str> = a.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(children, vec!["b.txt", "c"]);

    let c = &a.children[1];
    assert!(c.is_directory);
    assert_eq!(c.path, "a/c");
    assert_eq!(c.children.len(), 1);
    assert_eq!(c.children[0].path, "a/c/d.png");
    assert_eq!(c.children[0].category, ContentCategory::Image);
}

#[tokio::test]
async fn implicit_parents_and_root_files_form_separate_roots() {
    let data = zip_bytes(&[
        Fixture::File("a/b.txt", b"b"),
        Fixture::File("a/c/d.png", &PNG_HEADER),
        Fixture::File("e.md", b"# e"),
    ]);
    let (_store, result) = build(data).await;
    let tree = result.unwrap();

    let roots: Vec<&str> = tree.roots().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(roots, vec!["a", "e.md"]);

    let a = &tree.roots()[0];
    assert!(a.is_directory);
    let children: Vec<&str> = a.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(children, vec!["b.txt", "c"]);

    let c = &a.children[1];
    let grandchildren: Vec<&str> = c.children.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(grandchildren, vec!["d.png"]);

    let e = &tree.roots()[1];
    assert!(e.is_file());
    assert_eq!(e.category, ContentCategory::Markdown);
}

#[tokio::test]
async fn implicit_directories_are_created_once() {
    let data = zip_bytes(&[
        Fixture::File("docs/intro.md", b"# Intro"),
        Fixture::File("docs/guide/setup.md", b"# Setup"),
        Fixture::File("docs/guide/usage.md", b"# Usage"),
    ]);
    let (_store, result) = build(data).await;
    let tree = result.unwrap();

    let directories: Vec<&str> = tree
        .walk()
        .into_iter()
        .filter(|e| e.is_directory)
        .map(|e| e.path.as_str())
        .collect();
    assert_eq!(directories, vec!["docs", "docs/guide"]);
    assert_eq!(tree.stats().file_count, 3);
    assert_eq!(tree.stats().directory_count, 2);
}

#[tokio::test]
async fn text_entries_are_decoded_and_binary_entries_only_referenced() {
    let data = zip_bytes(&[
        Fixture::File("src/main.rs", b"fn main() {}\n"),
        Fixture::File("notes.txt", "héllo wörld 你好".as_bytes()),
        Fixture::File("logo.png", &PNG_HEADER),
    ]);
    let (store, result) = build(data).await;
    let tree = result.unwrap();

    let main = tree.find("src/main.rs").unwrap();
    assert_eq!(main.category, ContentCategory::Code);
    assert_eq!(main.grammar, Some("rust"));
    assert_eq!(main.inline_text.as_deref(), Some("fn main() {}\n"));

    let notes = tree.find("notes.txt").unwrap();
    assert_eq!(notes.inline_text.as_deref(), Some("héllo wörld 你好"));

    let logo = tree.find("logo.png").unwrap();
    assert!(logo.inline_text.is_none());
    let object = logo.object_ref.as_ref().unwrap();
    assert!(object.url().starts_with("blob:emsi-share/"));
    assert_eq!(store.resolve(object).unwrap().as_ref(), &PNG_HEADER);

    assert_eq!(store.live_count(), 3);
}

#[tokio::test]
async fn inline_text_round_trips_to_the_original_bytes() {
    let fixtures: [(&str, &[u8]); 3] = [
        ("ascii.txt", b"plain ascii\nsecond line\n"),
        ("accents.md", "# Résumé\n\nÉtudiants, café, naïve".as_bytes()),
        ("script.py", "print(\"مرحبا 你好 🚀\")\n".as_bytes()),
    ];
    let data = zip_bytes(&[
        Fixture::File(fixtures[0].0, fixtures[0].1),
        Fixture::File(fixtures[1].0, fixtures[1].1),
        Fixture::File(fixtures[2].0, fixtures[2].1),
    ]);
    let (store, result) = build(data).await;
    let tree = result.unwrap();

    for (path, original) in fixtures {
        let entry = tree.find(path).unwrap();
        let text = entry.inline_text.as_deref().unwrap();
        let stored = store.resolve(entry.object_ref.as_ref().unwrap()).unwrap();

        assert_eq!(text.as_bytes(), original, "{}", path);
        assert_eq!(text.as_bytes(), stored.as_ref(), "{}", path);
    }
}

#[tokio::test]
async fn invalid_utf8_text_keeps_only_the_reference() {
    let data = zip_bytes(&[Fixture::File("broken.txt", &[0xff, 0xfe, 0x41])]);
    let (store, result) = build(data).await;
    let tree = result.unwrap();

    let entry = tree.find("broken.txt").unwrap();
    assert!(entry.inline_text.is_none());
    assert!(store.is_live(entry.object_ref.as_ref().unwrap()));
}

#[tokio::test]
async fn nested_archives_are_not_expanded() {
    let inner = zip_bytes(&[Fixture::File("x.txt", b"x")]);
    let data = zip_bytes(&[Fixture::File("inner.zip", &inner)]);
    let (_store, result) = build(data).await;
    let tree = result.unwrap();

    let entry = tree.find("inner.zip").unwrap();
    assert_eq!(entry.category, ContentCategory::Unknown);
    assert!(entry.children.is_empty());
}

#[tokio::test]
async fn empty_archive_builds_an_empty_tree() {
    let (store, result) = build(zip_bytes(&[])).await;
    let tree = result.unwrap();

    assert!(tree.is_empty());
    assert!(tree.first_file().is_none());
    assert_eq!(store.live_count(), 0);
}

#[tokio::test]
async fn random_bytes_fail_without_leaking_references() {
    let (store, result) = build(Bytes::from_static(&[7, 1, 9, 3, 0, 4, 2, 8, 5, 6])).await;

    let err = result.unwrap_err();
    assert!(matches!(err, ArchiveError::Decompression(_)));
    assert_eq!(err.user_message(), "Failed to process archive");
    assert_eq!(store.live_count(), 0);
}

#[tokio::test]
async fn oversized_declared_entry_is_rejected_without_allocating() {
    let (store, result) = build(zip64_declaring("big.txt", 1 << 46)).await;

    match result {
        Err(ArchiveError::TooLarge { size, limit }) => {
            assert_eq!(size, 1 << 46);
            assert_eq!(limit, DEFAULT_MAX_UNCOMPRESSED_BYTES);
        }
        other => panic!("expected TooLarge, got {:?}", other),
    }
    assert_eq!(store.live_count(), 0);
}

#[tokio::test]
async fn declared_total_above_the_limit_is_rejected() {
    let data = zip_bytes(&[
        Fixture::File("one.txt", &[b'x'; 600]),
        Fixture::File("two.txt", &[b'y'; 600]),
    ]);
    let store = ObjectStore::new();
    let result = ZipTreeBuilder::new(store.clone())
        .with_max_uncompressed_bytes(1024)
        .build(data)
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, ArchiveError::TooLarge { size: 1200, limit: 1024 }));
    assert_eq!(err.user_message(), "Archive is too large to preview");
    assert_eq!(store.live_count(), 0);
}

#[tokio::test]
async fn entries_within_the_limit_still_build() {
    let data = zip_bytes(&[Fixture::File("one.txt", &[b'x'; 600])]);
    let store = ObjectStore::new();
    let tree = ZipTreeBuilder::new(store.clone())
        .with_max_uncompressed_bytes(600)
        .build(data)
        .await
        .unwrap();

    let entry = tree.find("one.txt").unwrap();
    assert_eq!(entry.inline_text.as_ref().map(String::len), Some(600));
}

#[tokio::test]
async fn dispose_releases_every_reference_once() {
    let (store, result) = build(nested_zip()).await;
    let mut tree = result.unwrap();
    assert_eq!(store.live_count(), 2);

    assert_eq!(tree.dispose(), 2);
    assert!(tree.is_disposed());
    assert_eq!(store.live_count(), 0);
    assert_eq!(tree.dispose(), 0);
}

#[tokio::test]
async fn dropping_the_tree_releases_references() {
    let (store, result) = build(nested_zip()).await;
    let tree = result.unwrap();
    let url = tree.find("a/b.txt").unwrap().object_ref.as_ref().unwrap().url();
    assert!(store.resolve_url(&url).is_some());

    drop(tree);
    assert!(store.resolve_url(&url).is_none());
    assert_eq!(store.live_count(), 0);
}

#[test]
fn releasing_a_reference_twice_is_a_no_op() {
    let store = ObjectStore::new();
    let object = store.acquire(Bytes::from_static(b"data"));

    assert!(store.release(&object));
    assert!(!store.release(&object));
    assert!(!store.is_live(&object));
}
