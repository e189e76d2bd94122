use quarry_config::Config;
use quarry_context::mock::{FailingEmbedder, MockEmbedder};
use quarry_core::models::CollectionId;
use quarry_core::Error;
use quarry_index::{SearchIndex, SimilaritySearch, VectorIndex};
use quarry_pipeline::ingest;
use quarry_store::SnapshotStore;
use std::fs;
use std::path::Path;
use std::sync::Arc;

const DIMENSION: usize = 64;

const SMELLY_SOURCE: &str =
    "function run(code) {\n  if (code) {\n    var x = 1; eval(code);\n  }\n  return x;\n}\n";

fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.core.index_root = root.join(".quarry");
    config.embedding.dimension = DIMENSION;
    config
}

fn write_repo(root: &Path) {
    fs::write(root.join("smelly.js"), SMELLY_SOURCE).unwrap();
    fs::write(
        root.join("math.ts"),
        "export const add = (a: number, b: number) => a + b;\n",
    )
    .unwrap();
    fs::write(root.join("README.md"), "# demo\n\nA tiny fixture repo.\n").unwrap();
}

fn snapshots(config: &Config) -> SnapshotStore {
    SnapshotStore::open(&config.core.snapshots_path()).unwrap()
}

#[tokio::test]
async fn ingest_is_deterministic_per_path() {
    let dir = tempfile::tempdir().unwrap();
    write_repo(dir.path());
    let config = test_config(dir.path());
    let store = snapshots(&config);
    let embedder = Arc::new(MockEmbedder::new(DIMENSION));

    let first = ingest(dir.path(), &config, embedder.clone(), &store)
        .await
        .unwrap();
    let second = ingest(dir.path(), &config, embedder, &store)
        .await
        .unwrap();

    assert_eq!(first.collection_id, second.collection_id);
    assert_ne!(
        first.collection_id,
        CollectionId::for_repo(Path::new("/somewhere/else"))
    );
}

#[tokio::test]
async fn ingest_flags_smells_and_records_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    write_repo(dir.path());
    let config = test_config(dir.path());
    let store = snapshots(&config);

    let report = ingest(
        dir.path(),
        &config,
        Arc::new(MockEmbedder::new(DIMENSION)),
        &store,
    )
    .await
    .unwrap();
    assert_eq!(report.files, 3);
    assert_eq!(report.chunks, 3);

    let records = store.records(report.collection_id.as_str()).unwrap();
    assert_eq!(records.len(), report.chunks);

    let smelly = records
        .iter()
        .find(|r| r.file == "smelly.js")
        .expect("smelly.js chunk recorded");
    assert!(smelly.anti_patterns.iter().any(|p| p.contains("var")));
    assert!(smelly.anti_patterns.iter().any(|p| p.contains("eval")));
    assert!(smelly.complexity >= 2);
}

#[tokio::test]
async fn published_index_is_searchable() {
    let dir = tempfile::tempdir().unwrap();
    write_repo(dir.path());
    let config = test_config(dir.path());
    let store = snapshots(&config);
    let embedder = Arc::new(MockEmbedder::new(DIMENSION));

    let report = ingest(dir.path(), &config, embedder.clone(), &store)
        .await
        .unwrap();

    let index = VectorIndex::load(&config.core.collections_dir(), &report.collection_id)
        .await
        .unwrap();
    assert_eq!(index.len(), 3);

    // Querying with a chunk's exact text pins it to the top: the mock
    // embedder maps identical text to identical vectors.
    let searcher = SearchIndex::new(Arc::new(index), embedder);
    let hits = searcher.similarity_search(SMELLY_SOURCE, 3).await.unwrap();
    assert!(!hits.is_empty());
    assert_eq!(hits[0].chunk.file_path, "smelly.js");
    assert!(hits[0].chunk.content.contains("eval(code)"));

    // Descending similarity.
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn reingest_replaces_the_collection_wholesale() {
    let dir = tempfile::tempdir().unwrap();
    write_repo(dir.path());
    let config = test_config(dir.path());
    let store = snapshots(&config);
    let embedder = Arc::new(MockEmbedder::new(DIMENSION));

    let first = ingest(dir.path(), &config, embedder.clone(), &store)
        .await
        .unwrap();
    assert_eq!(first.chunks, 3);

    fs::remove_file(dir.path().join("smelly.js")).unwrap();
    fs::remove_file(dir.path().join("math.ts")).unwrap();
    let second = ingest(dir.path(), &config, embedder, &store)
        .await
        .unwrap();
    assert_eq!(second.collection_id, first.collection_id);
    assert_eq!(second.chunks, 1);

    let index = VectorIndex::load(&config.core.collections_dir(), &second.collection_id)
        .await
        .unwrap();
    assert_eq!(index.len(), 1);
}

#[tokio::test]
async fn embedding_failure_publishes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_repo(dir.path());
    let config = test_config(dir.path());
    let store = snapshots(&config);

    let result = ingest(dir.path(), &config, Arc::new(FailingEmbedder), &store).await;
    assert!(matches!(result, Err(Error::Embedding(_))));

    let id = CollectionId::for_repo(dir.path());
    let load = VectorIndex::load(&config.core.collections_dir(), &id).await;
    assert!(matches!(load, Err(Error::NotIndexed(_))));
}

#[tokio::test]
async fn empty_repository_still_publishes_a_collection() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = snapshots(&config);

    let report = ingest(
        dir.path(),
        &config,
        Arc::new(MockEmbedder::new(DIMENSION)),
        &store,
    )
    .await
    .unwrap();
    assert_eq!(report.chunks, 0);

    let index = VectorIndex::load(&config.core.collections_dir(), &report.collection_id)
        .await
        .unwrap();
    assert!(index.is_empty());

    let searcher = SearchIndex::new(Arc::new(index), Arc::new(MockEmbedder::new(DIMENSION)));
    let hits = searcher.similarity_search("anything", 5).await.unwrap();
    assert!(hits.is_empty());
}
