//! End-to-end behaviour through the public API.

use std::io::Cursor;
use std::sync::Arc;

use folio_core::config::{ClassificationConfig, VocabEntry};
use folio_core::{
    search, CancelHandle, Category, ClassificationEngine, Config, FingerprintCache, Folio,
    LocalObjectStore, MemorySequenceCounter, MemoryTagStore, ObjectStore, RequiredTags, ScanItem,
    TagList,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

fn engine() -> ClassificationEngine {
    ClassificationEngine::new(&ClassificationConfig::default())
}

#[test]
fn test_team_project_final() {
    let tags = TagList::from_raw(["Archier", " Yandoit", "FINAL", "kitchen"]);
    let result = engine().classify(&tags, 42);
    assert_eq!(result.folder_path, "/Team/Yandoit/Final");
    assert_eq!(result.filename, "0042-project-yandoit");
    assert_eq!(result.category, Category::Project);
}

#[test]
fn test_material_with_marker() {
    let tags = TagList::from_raw(["material", "Terrazzo", "bathrooms"]);
    let result = engine().classify(&tags, 7);
    assert_eq!(result.folder_path, "/Materials/Terrazzo");
    assert_eq!(result.filename, "0007-material-terrazzo");
}

#[test]
fn test_reference_image() {
    let tags = TagList::from_raw(["Bathrooms", "moody"]);
    let result = engine().classify(&tags, 128);
    assert_eq!(result.folder_path, "/Reference/Bathrooms");
    assert_eq!(result.filename, "0128-reference-bathrooms");
}

#[test]
fn test_first_material_tag_wins() {
    let engine = engine();
    let a = engine.classify(&TagList::from_raw(["tile", "stone", "material"]), 1);
    let b = engine.classify(&TagList::from_raw(["stone", "tile", "material"]), 1);
    assert_eq!(a.folder_path, "/Materials/Tile");
    assert_eq!(b.folder_path, "/Materials/Stone");
}

#[test]
fn test_extended_vocabulary_from_toml() {
    let config = Config::from_toml(
        r#"
        [classification]
        base_path = "/studio"
        projects = ["yandoit", { tag = "north melbourne", folder = "North Melbourne Library" }]
        "#,
    )
    .unwrap();
    assert_eq!(
        config.classification.projects[1],
        VocabEntry::with_folder("north melbourne", "North Melbourne Library")
    );

    let engine = ClassificationEngine::new(&config.classification);
    let result = engine.classify(&TagList::from_raw(["archier", "North  Melbourne"]), 3);
    assert_eq!(result.folder_path, "/studio/Team/North Melbourne Library/WIP");
    assert_eq!(result.filename, "0003-project-north-melbourne");
}

#[tokio::test]
async fn test_sequence_numbers_are_unique_across_classifications() {
    let folio = Arc::new(Folio::new(
        Config::default(),
        Arc::new(MemorySequenceCounter::new()),
    ));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let folio = folio.clone();
            tokio::spawn(async move { folio.classify_next(["kitchens"]).await.unwrap() })
        })
        .collect();

    let mut names = Vec::new();
    for handle in handles {
        names.push(handle.await.unwrap().filename);
    }
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 8);
    assert_eq!(names[0], "0001-reference-kitchens");
}

#[tokio::test]
async fn test_search_requires_every_tag() {
    let store: MemoryTagStore = serde_json::from_str::<Vec<folio_core::ImageRecord>>(
        r#"[
            {"id": 1, "file_name": "a.jpg", "tags": ["Kitchens"]},
            {"id": 2, "file_name": "b.jpg", "tags": ["kitchens", "TIMBER"]},
            {"id": 3, "file_name": "c.jpg", "tags": ["timber"],
             "regions": [{"tag": "kitchens", "region": {"x": 0.1, "y": 0.1, "width": 0.5, "height": 0.5}}]}
        ]"#,
    )
    .map(MemoryTagStore::from_records)
    .unwrap();

    let required = RequiredTags::parse(["kitchens", " timber "]).unwrap();
    let hits = search(&store, &store.ids(), &required).await.unwrap();
    assert_eq!(hits, vec![2, 3]);

    let everything = search(&store, &store.ids(), &RequiredTags::any())
        .await
        .unwrap();
    assert_eq!(everything, vec![1, 2, 3]);
}

fn gradient(flip: bool) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(200, 150, |x, _| {
        let v = (x * 255 / 199) as u8;
        let v = if flip { 255 - v } else { v };
        Rgb([v, v, v])
    }))
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

#[tokio::test]
async fn test_dedup_over_local_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("inbox")).unwrap();
    std::fs::write(root.join("inbox/original.png"), encode(&gradient(false), ImageFormat::Png))
        .unwrap();
    std::fs::write(
        root.join("inbox/resized.png"),
        encode(&gradient(false).thumbnail(100, 75), ImageFormat::Png),
    )
    .unwrap();
    std::fs::write(root.join("inbox/flipped.png"), encode(&gradient(true), ImageFormat::Png))
        .unwrap();
    std::fs::write(root.join("inbox/corrupt.jpg"), b"\xFF\xD8 truncated").unwrap();

    let config = Config::default();
    let store = Arc::new(LocalObjectStore::new(
        root,
        config.scan.supported_formats.clone(),
    ));
    let paths = store.list("inbox").await.unwrap();
    assert_eq!(
        paths,
        vec![
            "inbox/corrupt.jpg",
            "inbox/flipped.png",
            "inbox/original.png",
            "inbox/resized.png"
        ]
    );
    let items: Vec<ScanItem> = paths
        .iter()
        .enumerate()
        .map(|(i, p)| ScanItem::new(i as u64 + 1, p.as_str()))
        .collect();

    let folio = Folio::new(config, Arc::new(MemorySequenceCounter::new()));
    let scanner = folio.scanner(store, Arc::new(FingerprintCache::new()));
    let report = scanner
        .scan(&items, &CancelHandle::new(), |_| {})
        .await
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].ids(), vec![3, 4]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, "inbox/corrupt.jpg");
    assert_eq!(report.fingerprinted, 3);
}
