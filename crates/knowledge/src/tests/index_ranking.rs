//! Ranking behaviour of the populate -> index -> query pipeline.

use crate::embeddings::providers::TrigramProvider;
use crate::indexer::build_index;
use crate::seed::populate;
use crate::semantic_index::SemanticIndex;
use crate::sqlite_index::SqliteSemanticIndex;
use crate::store::{QuestionStore, SqliteQuestionStore};
use crate::types::IndexOptions;
use std::sync::Arc;
use tempfile::TempDir;

const SEED: &str = r#"[
    {"question": "What does OSPF stand for?", "correct_answer": "Open Shortest Path First",
     "incorrect_answers": ["Open Source Path Forwarding", "Optimal Shortest Path First", "Open Standard Protocol Format"]},
    {"question": "What is the default administrative distance of OSPF?", "correct_answer": "110",
     "incorrect_answers": ["90", "120", "100"]},
    {"question": "Which VLAN is the default native VLAN on a Cisco switch?", "correct_answer": "VLAN 1",
     "incorrect_answers": ["VLAN 0", "VLAN 99", "VLAN 1002"]},
    {"question": "Which port does SSH use by default?", "correct_answer": "22",
     "incorrect_answers": ["23", "21", "443"]},
    {"question": "What protocol prevents layer 2 loops?", "correct_answer": "Spanning Tree Protocol",
     "incorrect_answers": ["RIP", "HSRP", "CDP"]},
    {"question": "What does DHCP provide to hosts?", "correct_answer": "IP addressing information",
     "incorrect_answers": ["MAC addresses", "Routing tables", "VLAN membership"]}
]"#;

async fn fixture(temp: &TempDir) -> (SqliteQuestionStore, SqliteSemanticIndex) {
    let seed_path = temp.path().join("ccna.json");
    std::fs::write(&seed_path, SEED).unwrap();

    let store = SqliteQuestionStore::open(&temp.path().join("questions.sqlite")).unwrap();
    populate(&store, &seed_path, false).unwrap();

    let index = SqliteSemanticIndex::open(
        &temp.path().join("index.sqlite"),
        "ccna_embeddings",
        Arc::new(TrigramProvider::new(384)),
    )
    .unwrap();
    build_index(&store, &index, &IndexOptions::default())
        .await
        .unwrap();

    (store, index)
}

#[tokio::test]
async fn test_topic_ranks_matching_questions_first() {
    let temp = TempDir::new().unwrap();
    let (_store, index) = fixture(&temp).await;

    let hits = index.query(&["OSPF".to_string()], 5).await.unwrap();
    let hits = &hits[0];

    assert_eq!(hits.len(), 5);
    let top_two: Vec<&str> = hits[..2].iter().map(|h| h.document.as_str()).collect();
    assert!(top_two.contains(&"What does OSPF stand for?"));
    assert!(top_two.contains(&"What is the default administrative distance of OSPF?"));
    assert!(hits[0].score >= hits[1].score);
    assert!(hits[1].score > hits[4].score);
}

#[tokio::test]
async fn test_indexed_documents_resolve_in_store() {
    let temp = TempDir::new().unwrap();
    let (store, index) = fixture(&temp).await;

    let hits = index.query(&["VLAN".to_string()], 3).await.unwrap();
    for hit in &hits[0] {
        assert!(store.find_answers(&hit.document).unwrap().is_some());
    }
}

#[tokio::test]
async fn test_repeated_queries_are_stable() {
    let temp = TempDir::new().unwrap();
    let (_store, index) = fixture(&temp).await;

    let first = index.query(&["spanning tree loops".to_string()], 5).await.unwrap();
    let second = index.query(&["spanning tree loops".to_string()], 5).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_index_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let (_store, index) = fixture(&temp).await;
    let before = index.query(&["SSH".to_string()], 1).await.unwrap();
    drop(index);

    let reopened = SqliteSemanticIndex::open(
        &temp.path().join("index.sqlite"),
        "ccna_embeddings",
        Arc::new(TrigramProvider::new(384)),
    )
    .unwrap();
    assert_eq!(reopened.count().unwrap(), 6);
    assert_eq!(reopened.query(&["SSH".to_string()], 1).await.unwrap(), before);
}
