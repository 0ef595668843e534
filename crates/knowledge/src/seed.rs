//! Populate the question store from a JSON seed file.
//!
//! The seed file is a JSON array of
//! `{"question", "correct_answer", "incorrect_answers"}` objects.

use crate::store::QuestionStore;
use crate::types::{SeedQuestion, SeedStats};
use ccna_core::{AppError, AppResult};
use std::path::Path;
use std::time::Instant;

/// Parse a seed file.
pub fn load_seed_file(path: &Path) -> AppResult<Vec<SeedQuestion>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Store(format!("Failed to read seed file {:?}: {}", path, e))
    })?;

    serde_json::from_str(&contents)
        .map_err(|e| AppError::Store(format!("Failed to parse seed file {:?}: {}", path, e)))
}

/// Load `seed_path` into the store, optionally clearing it first.
pub fn populate(store: &dyn QuestionStore, seed_path: &Path, reset: bool) -> AppResult<SeedStats> {
    let start = Instant::now();
    let questions = load_seed_file(seed_path)?;

    tracing::info!(
        "Loaded {} questions from {:?}",
        questions.len(),
        seed_path
    );

    for (i, q) in questions.iter().enumerate() {
        if q.incorrect_answers.len() != 3 {
            tracing::warn!(
                index = i,
                distractors = q.incorrect_answers.len(),
                "Seed question does not have exactly 3 incorrect answers"
            );
        }
    }

    if reset {
        store.reset()?;
    }

    let inserted = store.insert_many(&questions)?;
    let duration = start.elapsed();

    tracing::info!(
        "Populate completed: {} questions in {:.2}s",
        inserted,
        duration.as_secs_f64()
    );

    Ok(SeedStats {
        inserted,
        duration_secs: duration.as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteQuestionStore;
    use tempfile::TempDir;

    const SEED: &str = r#"[
        {
            "question": "What does OSPF stand for?",
            "correct_answer": "Open Shortest Path First",
            "incorrect_answers": ["Open Source Path Forwarding", "Optimal Shortest Path First", "Open Standard Protocol Format"]
        },
        {
            "question": "Which command shows the routing table on a Cisco router?",
            "correct_answer": "show ip route",
            "incorrect_answers": ["show routes", "display ip routing-table", "show ip table"]
        }
    ]"#;

    #[test]
    fn test_populate_inserts_every_question() {
        let temp = TempDir::new().unwrap();
        let seed_path = temp.path().join("ccna.json");
        std::fs::write(&seed_path, SEED).unwrap();

        let store = SqliteQuestionStore::open_in_memory().unwrap();
        let stats = populate(&store, &seed_path, false).unwrap();

        assert_eq!(stats.inserted, 2);
        assert_eq!(store.count().unwrap(), 2);
        let answers = store
            .find_answers("Which command shows the routing table on a Cisco router?")
            .unwrap()
            .unwrap();
        assert_eq!(answers.correct_answer, "show ip route");
    }

    #[test]
    fn test_populate_reset_replaces_contents() {
        let temp = TempDir::new().unwrap();
        let seed_path = temp.path().join("ccna.json");
        std::fs::write(&seed_path, SEED).unwrap();

        let store = SqliteQuestionStore::open_in_memory().unwrap();
        populate(&store, &seed_path, false).unwrap();
        populate(&store, &seed_path, false).unwrap();
        assert_eq!(store.count().unwrap(), 4);

        populate(&store, &seed_path, true).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_missing_incorrect_answers_defaults_to_empty() {
        let parsed: Vec<SeedQuestion> = serde_json::from_str(
            r#"[{"question": "What is ARP used for?", "correct_answer": "Resolving IP to MAC"}]"#,
        )
        .unwrap();
        assert!(parsed[0].incorrect_answers.is_empty());
    }

    #[test]
    fn test_malformed_seed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let seed_path = temp.path().join("broken.json");
        std::fs::write(&seed_path, r#"[{"question": 1}]"#).unwrap();

        let store = SqliteQuestionStore::open_in_memory().unwrap();
        assert!(populate(&store, &seed_path, false).is_err());
        assert_eq!(store.count().unwrap(), 0);
    }
}
