mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{open_gate, write_base_metadata, FailingProvider, GateProvider, SpikeProvider};
use primer::config::IndexPaths;
use primer::error::PrimerError;
use primer::index::{FlatIndex, IndexMetadata};
use primer::interviews::InterviewStore;
use primer::rebuild::{status_report, ProgressPublisher, RebuildOutcome, RebuildStatus, Rebuilder};
use tempfile::TempDir;

fn setup(tmp: &TempDir) -> (IndexPaths, std::path::PathBuf) {
    let paths = IndexPaths::in_dir(tmp.path().join("index"));
    let interviews_path = tmp.path().join("interviews.json");
    (paths, interviews_path)
}

fn seed_store(interviews_path: &std::path::Path, docs: &[(&str, &str)]) {
    let mut store = InterviewStore::load(interviews_path).unwrap();
    let interview_id = store.create_interview("Acme Systems");
    for (title, content) in docs {
        store
            .add_document(&interview_id, title, content, None)
            .unwrap();
    }
    store.save().unwrap();
}

#[test]
fn rebuild_produces_aligned_index_metadata_and_status() {
    let tmp = TempDir::new().unwrap();
    let (paths, interviews_path) = setup(&tmp);
    write_base_metadata(&paths.metadata, &[("a", "base text", "doc1")], "spike-test");
    seed_store(&interviews_path, &[("Resume", "resume text")]);

    let rebuilder = Rebuilder::new(paths.clone(), &interviews_path);
    let provider = SpikeProvider::new();
    let publisher = ProgressPublisher::new();

    let status = rebuilder.rebuild(&provider, &publisher).unwrap();
    assert_eq!(status.status, RebuildOutcome::Completed);
    assert_eq!(status.total_documents, 2);
    assert_eq!(status.original_docs, 1);
    assert_eq!(status.interview_docs, 1);
    assert!(!status.rebuild_id.is_empty());

    let snapshot = publisher.snapshot();
    assert_eq!(snapshot.percent, 100);

    let index = FlatIndex::load(&paths.vector_index).unwrap();
    let metadata = IndexMetadata::load(&paths.metadata).unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(metadata.len(), 2);
    assert_eq!(metadata.total_documents, 2);
    assert_eq!(metadata.embedding_model, "spike-test");
    assert_eq!(metadata.ids[0], "a");
    assert!(metadata.ids[1].starts_with("interview_"));

    let on_disk = RebuildStatus::load(&paths.rebuild_status).unwrap().unwrap();
    assert_eq!(on_disk.status, RebuildOutcome::Completed);
    assert_eq!(on_disk.rebuild_id, status.rebuild_id);
}

#[test]
fn consecutive_rebuilds_keep_shape_and_create_backups() {
    let tmp = TempDir::new().unwrap();
    let (paths, interviews_path) = setup(&tmp);
    write_base_metadata(
        &paths.metadata,
        &[("a", "first", "doc1"), ("b", "second", "doc2")],
        "spike-test",
    );
    seed_store(&interviews_path, &[("Resume", "third")]);

    let rebuilder = Rebuilder::new(paths.clone(), &interviews_path);
    let provider = SpikeProvider::new();

    rebuilder.rebuild(&provider, &ProgressPublisher::new()).unwrap();
    let first = IndexMetadata::load(&paths.metadata).unwrap();

    rebuilder.rebuild(&provider, &ProgressPublisher::new()).unwrap();
    let second = IndexMetadata::load(&paths.metadata).unwrap();

    // unchanged document store → identical shape and ordering
    assert_eq!(first.total_documents, second.total_documents);
    assert_eq!(first.texts, second.texts);
    assert_eq!(first.sources, second.sources);
    assert_eq!(first.ids, second.ids);

    // the second rebuild renamed the first rebuild's files to backups
    let backups: Vec<String> = std::fs::read_dir(&paths.index_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.contains(".backup_"))
        .collect();
    assert!(
        backups.iter().any(|n| n.starts_with("vector_index.json.backup_")),
        "no index backup in {backups:?}"
    );
    assert!(
        backups.iter().any(|n| n.starts_with("metadata.json.backup_")),
        "no metadata backup in {backups:?}"
    );
}

#[test]
fn empty_corpus_fails_and_writes_failed_status_without_index_files() {
    let tmp = TempDir::new().unwrap();
    let (paths, interviews_path) = setup(&tmp);

    let rebuilder = Rebuilder::new(paths.clone(), &interviews_path);
    let result = rebuilder.rebuild(&SpikeProvider::new(), &ProgressPublisher::new());
    assert!(matches!(result, Err(PrimerError::NoDocumentsFound)));

    assert!(!paths.vector_index.exists());
    assert!(!paths.metadata.exists());

    let status = RebuildStatus::load(&paths.rebuild_status).unwrap().unwrap();
    assert_eq!(status.status, RebuildOutcome::Failed);
    assert!(status.error.unwrap().contains("no documents"));
}

#[test]
fn failed_embedding_leaves_previous_index_byte_identical() {
    let tmp = TempDir::new().unwrap();
    let (paths, interviews_path) = setup(&tmp);
    seed_store(&interviews_path, &[("Resume", "resume text")]);

    let rebuilder = Rebuilder::new(paths.clone(), &interviews_path);
    rebuilder
        .rebuild(&SpikeProvider::new(), &ProgressPublisher::new())
        .unwrap();

    let index_before = std::fs::read(&paths.vector_index).unwrap();
    let metadata_before = std::fs::read(&paths.metadata).unwrap();

    let result = rebuilder.rebuild(&FailingProvider, &ProgressPublisher::new());
    assert!(matches!(result, Err(PrimerError::EmbeddingFailed(_))));

    assert_eq!(std::fs::read(&paths.vector_index).unwrap(), index_before);
    assert_eq!(std::fs::read(&paths.metadata).unwrap(), metadata_before);

    let status = RebuildStatus::load(&paths.rebuild_status).unwrap().unwrap();
    assert_eq!(status.status, RebuildOutcome::Failed);
    assert!(status.error.unwrap().contains("provider offline"));
}

#[test]
fn concurrent_rebuild_is_rejected_not_queued() {
    let tmp = TempDir::new().unwrap();
    let (paths, interviews_path) = setup(&tmp);
    seed_store(&interviews_path, &[("Resume", "resume text")]);

    let rebuilder = Arc::new(Rebuilder::new(paths, &interviews_path));
    let (provider, gate) = GateProvider::new();
    let provider = Arc::new(provider);
    let publisher = ProgressPublisher::new();

    let background = {
        let rebuilder = Arc::clone(&rebuilder);
        let provider = Arc::clone(&provider);
        let publisher = publisher.clone();
        std::thread::spawn(move || rebuilder.rebuild(provider.as_ref(), &publisher))
    };

    // wait until the first rebuild is blocked inside the embedding phase
    while publisher.snapshot().percent < 20 {
        std::thread::sleep(Duration::from_millis(5));
    }

    let second = rebuilder.rebuild(&SpikeProvider::new(), &ProgressPublisher::new());
    assert!(matches!(second, Err(PrimerError::RebuildAlreadyInProgress)));

    open_gate(&gate);
    let first = background.join().unwrap().unwrap();
    assert_eq!(first.status, RebuildOutcome::Completed);

    // with the first rebuild finished, the guard is released again
    let third = rebuilder.rebuild(provider.as_ref(), &ProgressPublisher::new());
    assert_eq!(third.unwrap().status, RebuildOutcome::Completed);
}

#[test]
fn deleting_a_base_document_shrinks_the_next_rebuild_by_one() {
    let tmp = TempDir::new().unwrap();
    let (paths, interviews_path) = setup(&tmp);
    write_base_metadata(
        &paths.metadata,
        &[("a", "first", "doc1"), ("b", "second", "doc2"), ("c", "third", "doc3")],
        "spike-test",
    );

    let rebuilder = Rebuilder::new(paths.clone(), &interviews_path);
    let provider = SpikeProvider::new();
    rebuilder.rebuild(&provider, &ProgressPublisher::new()).unwrap();

    // delete one base document from the source-of-truth metadata
    let mut metadata = IndexMetadata::load(&paths.metadata).unwrap();
    metadata.texts.remove(1);
    metadata.sources.remove(1);
    metadata.ids.remove(1);
    metadata.total_documents -= 1;
    metadata.save(&paths.metadata).unwrap();

    rebuilder.rebuild(&provider, &ProgressPublisher::new()).unwrap();

    let rebuilt = IndexMetadata::load(&paths.metadata).unwrap();
    assert_eq!(rebuilt.ids, vec!["a", "c"]);
    assert_eq!(rebuilt.total_documents, 2);
    assert_eq!(FlatIndex::load(&paths.vector_index).unwrap().len(), 2);
}

#[test]
fn status_report_flags_staleness_after_store_changes() {
    let tmp = TempDir::new().unwrap();
    let (paths, interviews_path) = setup(&tmp);
    seed_store(&interviews_path, &[("Resume", "resume text")]);

    let report = status_report(&paths, &interviews_path);
    assert!(report.last_status.is_none());
    assert!(!report.index_exists);
    assert!(report.stale, "store exists but no index yet");

    let rebuilder = Rebuilder::new(paths.clone(), &interviews_path);
    rebuilder
        .rebuild(&SpikeProvider::new(), &ProgressPublisher::new())
        .unwrap();

    let report = status_report(&paths, &interviews_path);
    assert!(report.index_exists);
    assert!(!report.stale);
    assert_eq!(
        report.last_status.unwrap().status,
        RebuildOutcome::Completed
    );

    // a store edit after the rebuild makes the index stale
    std::thread::sleep(Duration::from_millis(100));
    let mut store = InterviewStore::load(&interviews_path).unwrap();
    let interview_id = store.create_interview("Beta Corp");
    store
        .add_document(&interview_id, "Notes", "new doc", None)
        .unwrap();
    store.save().unwrap();

    let report = status_report(&paths, &interviews_path);
    assert!(report.stale);
}

#[test]
fn progress_reports_monotonic_labeled_phases() {
    let tmp = TempDir::new().unwrap();
    let (paths, interviews_path) = setup(&tmp);
    seed_store(&interviews_path, &[("Resume", "resume text"), ("Notes", "notes text")]);

    let rebuilder = Arc::new(Rebuilder::new(paths, &interviews_path));
    let provider = Arc::new(SpikeProvider::new());
    let publisher = ProgressPublisher::new();

    let background = {
        let rebuilder = Arc::clone(&rebuilder);
        let provider = Arc::clone(&provider);
        let publisher = publisher.clone();
        std::thread::spawn(move || rebuilder.rebuild(provider.as_ref(), &publisher))
    };

    let mut observed = Vec::new();
    loop {
        let snapshot = publisher.snapshot();
        observed.push(snapshot.percent);
        if snapshot.percent == 100 {
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    background.join().unwrap().unwrap();

    assert!(observed.windows(2).all(|w| w[0] <= w[1]), "{observed:?}");
    assert_eq!(publisher.snapshot().phase, "Rebuild complete");
}
