//! End-to-end tests exercising the full pipeline through the public API:
//! batch unlocking, archive construction, and artifact reaping.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pdf_unlock::{
    ArtifactRegistry, BatchStatus, Config, Event, PdfUnlocker, Reaper, RetentionConfig,
    StorageConfig, UploadCandidate,
};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Write a minimal valid PDF with the given number of blank pages
fn write_pdf(path: &Path, page_count: usize) {
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(page_count);
    for _ in 0..page_count {
        let content = lopdf::content::Content { operations: vec![] };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn test_config(work_dir: &Path) -> Config {
    Config {
        storage: StorageConfig {
            work_dir: work_dir.to_path_buf(),
        },
        ..Default::default()
    }
}

fn candidate(path: &Path, name: &str) -> UploadCandidate {
    UploadCandidate::from_path(path.to_path_buf(), Some(name.to_string())).unwrap()
}

#[tokio::test]
async fn test_mixed_batch_end_to_end() {
    let temp = TempDir::new().unwrap();
    let unlocker = PdfUnlocker::new(test_config(temp.path())).await.unwrap();
    let mut events = unlocker.subscribe();

    let mut candidates = Vec::new();
    for i in 0..5 {
        let path = temp.path().join(format!("doc{}.pdf", i));
        write_pdf(&path, i + 1);
        candidates.push(candidate(&path, &format!("doc{}.pdf", i)));
    }
    // A wrong extension and an empty file both fail validation
    let txt = temp.path().join("notes.txt");
    std::fs::write(&txt, b"plain text").unwrap();
    candidates.push(candidate(&txt, "notes.txt"));
    let empty = temp.path().join("empty.pdf");
    std::fs::write(&empty, b"").unwrap();
    candidates.push(candidate(&empty, "empty.pdf"));

    let result = unlocker.process_batch(candidates).await.unwrap();

    assert_eq!(result.succeeded, 5);
    assert_eq!(result.failed, 2);
    assert_eq!(result.status(), BatchStatus::Partial);
    assert_eq!(result.summary(), "5 succeeded, 2 failed");
    assert_eq!(unlocker.registry().len(), 5);

    for output in &result.outputs {
        assert!(output.exists());
        let doc = lopdf::Document::load(output).unwrap();
        assert!(!doc.is_encrypted());
    }

    // The broadcast stream must report the final tally
    let mut saw_complete = false;
    while let Ok(event) = events.try_recv() {
        if let Event::BatchComplete { succeeded, failed } = event {
            assert_eq!(succeeded, 5);
            assert_eq!(failed, 2);
            saw_complete = true;
        }
    }
    assert!(saw_complete, "expected a BatchComplete event");
}

#[tokio::test]
async fn test_archive_bundles_unlocked_artifacts() {
    let temp = TempDir::new().unwrap();
    let unlocker = PdfUnlocker::new(test_config(temp.path())).await.unwrap();

    let mut candidates = Vec::new();
    for i in 0..3 {
        let path = temp.path().join(format!("doc{}.pdf", i));
        write_pdf(&path, 1);
        candidates.push(candidate(&path, &format!("doc{}.pdf", i)));
    }
    let result = unlocker.process_batch(candidates).await.unwrap();
    assert_eq!(result.succeeded, 3);

    let outcome = unlocker.build_archive(&result.outputs);
    let archive_path = outcome.archive_path.expect("archive should be created");

    let name = archive_path.file_name().unwrap().to_str().unwrap();
    assert!(name.ends_with("_unlocked_pdfs.zip"));
    assert!(unlocker.registry().contains(&archive_path));

    let file = std::fs::File::open(&archive_path).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    assert_eq!(zip.len(), 3);
    let mut entry_names: Vec<String> = (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect();
    entry_names.sort();
    assert_eq!(
        entry_names,
        vec![
            "doc0_unlocked.pdf",
            "doc1_unlocked.pdf",
            "doc2_unlocked.pdf"
        ]
    );
}

#[tokio::test]
async fn test_reaper_removes_expired_artifacts_and_staging_dirs() {
    let temp = TempDir::new().unwrap();
    let unlocker = PdfUnlocker::new(test_config(temp.path())).await.unwrap();

    let input = temp.path().join("doc.pdf");
    write_pdf(&input, 1);
    let result = unlocker
        .process_batch(vec![candidate(&input, "doc.pdf")])
        .await
        .unwrap();
    assert_eq!(result.succeeded, 1);
    let artifact = result.outputs[0].clone();
    let staging_dir = artifact.parent().unwrap().to_path_buf();
    assert!(artifact.exists());

    let retention = RetentionConfig {
        artifact_ttl_secs: 0,
        sweep_interval_secs: 1,
    };
    let (event_tx, mut events) = broadcast::channel(16);
    let reaper = Reaper::new(
        unlocker.registry().clone(),
        &retention,
        event_tx,
        CancellationToken::new(),
    );

    // Zero TTL still needs a nonzero age
    std::thread::sleep(Duration::from_millis(10));
    reaper.sweep();

    assert!(!artifact.exists(), "expired artifact should be deleted");
    assert!(
        !staging_dir.exists(),
        "empty staging directory should be removed with its artifact"
    );
    assert!(unlocker.registry().is_empty());

    match events.try_recv().unwrap() {
        Event::ArtifactReaped { path } => assert_eq!(path, artifact),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_fresh_artifacts_survive_a_sweep() {
    let temp = TempDir::new().unwrap();
    let registry = ArtifactRegistry::new();
    let artifact = temp.path().join("kept.pdf");
    write_pdf(&artifact, 1);
    registry.register(artifact.clone());

    let retention = RetentionConfig {
        artifact_ttl_secs: 3600,
        sweep_interval_secs: 1,
    };
    let (event_tx, _events) = broadcast::channel(16);
    let reaper = Reaper::new(
        registry.clone(),
        &retention,
        event_tx,
        CancellationToken::new(),
    );
    reaper.sweep();

    assert!(artifact.exists());
    assert_eq!(registry.len(), 1);
}
