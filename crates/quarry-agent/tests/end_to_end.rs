//! Ingest a fixture repo, then ask against the published index.

use quarry_agent::Synthesizer;
use quarry_config::Config;
use quarry_context::mock::{MockEmbedder, MockLlm};
use quarry_core::models::{AnswerEvent, CollectionId};
use quarry_core::Error;
use quarry_pipeline::ingest;
use quarry_store::SnapshotStore;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio_stream::StreamExt;

const DIMENSION: usize = 64;

fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.core.index_root = root.join(".quarry");
    config.embedding.dimension = DIMENSION;
    config
}

async fn indexed_repo(dir: &Path, files: &[(&str, &str)]) -> (Config, CollectionId) {
    for (name, content) in files {
        fs::write(dir.join(name), content).unwrap();
    }
    let config = test_config(dir);
    let store = SnapshotStore::open(&config.core.snapshots_path()).unwrap();
    let report = ingest(
        dir,
        &config,
        Arc::new(MockEmbedder::new(DIMENSION)),
        &store,
    )
    .await
    .unwrap();
    (config, report.collection_id)
}

#[tokio::test]
async fn ask_answers_from_the_published_index() {
    let dir = tempfile::tempdir().unwrap();
    let (config, collection) = indexed_repo(
        dir.path(),
        &[
            ("parser.ts", "export function parse(input: string) { return input.split(' '); }\n"),
            ("lexer.ts", "export function lex(src: string) { return src.trim(); }\n"),
        ],
    )
    .await;

    let synthesizer = Synthesizer::open(
        &config,
        &collection,
        Arc::new(MockEmbedder::new(DIMENSION)),
        Arc::new(MockLlm::returning(
            r#"{"answer": "parse splits the input on spaces.", "sources": ["parser.ts"]}"#,
        )),
    )
    .await
    .unwrap();

    let envelope = synthesizer
        .answer("What does parse do?", None)
        .await
        .unwrap();
    assert_eq!(envelope.text, "parse splits the input on spaces.");
    assert_eq!(envelope.sources, vec!["parser.ts"]);
    assert!(!envelope.source_documents.is_empty());
    assert!(envelope.confidence > 0.0 && envelope.confidence <= 1.0);
}

#[tokio::test]
async fn ask_against_empty_collection_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let (config, collection) = indexed_repo(dir.path(), &[]).await;

    let synthesizer = Synthesizer::open(
        &config,
        &collection,
        Arc::new(MockEmbedder::new(DIMENSION)),
        Arc::new(MockLlm::returning(
            r#"{"answer": "I don't know.", "sources": []}"#,
        )),
    )
    .await
    .unwrap();

    let envelope = synthesizer
        .answer("What does function foo do?", None)
        .await
        .unwrap();
    assert_eq!(envelope.confidence, 0.0);
    assert!(envelope.source_documents.is_empty());
}

#[tokio::test]
async fn opening_an_unbuilt_collection_fails_with_not_indexed() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let result = Synthesizer::open(
        &config,
        &CollectionId::for_repo(Path::new("/never/indexed")),
        Arc::new(MockEmbedder::new(DIMENSION)),
        Arc::new(MockLlm::returning("{}")),
    )
    .await;

    assert!(matches!(result, Err(Error::NotIndexed(_))));
}

#[tokio::test]
async fn streaming_end_to_end_terminates_with_sources() {
    let dir = tempfile::tempdir().unwrap();
    let (config, collection) = indexed_repo(
        dir.path(),
        &[("auth.ts", "export function login(user: string) { return user; }\n")],
    )
    .await;

    let synthesizer = Synthesizer::open(
        &config,
        &collection,
        Arc::new(MockEmbedder::new(DIMENSION)),
        Arc::new(MockLlm::returning(
            r#"{"answer": "login echoes the user.", "sources": ["auth.ts"]}"#,
        )),
    )
    .await
    .unwrap();

    let events: Vec<AnswerEvent> = synthesizer
        .answer_stream("How does login work?".to_string(), None)
        .collect()
        .await;

    assert!(events.len() >= 2, "expected tokens plus a sources event");
    assert!(matches!(events.last(), Some(AnswerEvent::Sources { .. })));
    let token_count = events
        .iter()
        .filter(|e| matches!(e, AnswerEvent::Token { .. }))
        .count();
    assert_eq!(token_count, events.len() - 1);
}
