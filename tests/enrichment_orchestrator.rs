use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use flashcard_backend_rust::cache::{self, CacheSlot};
use flashcard_backend_rust::db::MemoryStudyItemStore;
use flashcard_backend_rust::services::orchestrator::Classification;

mod common;

use common::{card, options, orchestrator, sentences, strings, StubGenerator};

fn sorted(mut values: Vec<String>) -> Vec<String> {
    values.sort();
    values
}

#[tokio::test]
async fn partial_generation_returns_cached_and_generated_items_only() {
    let mut cached = card(1, 7, "France", "Paris");
    cached.mcq_options = Some(cache::write_slot(&strings(&["Rome", "Berlin", "Madrid"])));
    let store = Arc::new(MemoryStudyItemStore::with_items([
        cached,
        card(2, 7, "Spain", "Madrid"),
        card(3, 7, "Italy", "Rome"),
    ]));
    let generator = Arc::new(
        StubGenerator::new().with_distractors(vec![options("Spain", "Madrid", &["Lisbon", "Paris", "Rome"])]),
    );

    let questions = orchestrator(store.clone(), generator.clone())
        .multiple_choice(7, 4)
        .await
        .unwrap();

    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].term, "France");
    assert_eq!(questions[1].term, "Spain");
    assert_eq!(questions[1].correct, "Madrid");
    assert!(questions[1].options.contains(&"Madrid".to_string()));

    // Only the misses went upstream, in one batch.
    assert_eq!(generator.distractor_calls(), 1);
    let requested: Vec<String> = generator.requested_pairs.lock().iter().map(|p| p.term.clone()).collect();
    assert_eq!(requested, strings(&["Spain", "Italy"]));

    assert_eq!(
        store.get(2).unwrap().cached(CacheSlot::McqOptions),
        Some(strings(&["Lisbon", "Paris", "Rome"]))
    );
    assert_eq!(store.get(3).unwrap().mcq_options, None);
}

#[tokio::test]
async fn cached_items_are_served_without_calling_upstream() {
    let mut item = card(1, 3, "France", "Paris");
    item.mcq_options = Some(cache::write_slot(&strings(&["Rome", "Berlin", "Madrid", "Lisbon"])));
    let store = Arc::new(MemoryStudyItemStore::with_items([item]));
    let generator = Arc::new(StubGenerator::new());
    let orchestrator = orchestrator(store, generator.clone());

    let first = orchestrator.multiple_choice(3, 4).await.unwrap();
    let second = orchestrator.multiple_choice(3, 4).await.unwrap();

    assert_eq!(generator.distractor_calls(), 0);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].options.len(), 4);
    assert_eq!(first[0].options.iter().filter(|o| *o == "Paris").count(), 1);
    assert_eq!(second[0].options.len(), 4);
    assert!(second[0].options.contains(&"Paris".to_string()));
}

#[tokio::test]
async fn oversized_option_count_is_served_from_what_is_cached() {
    let mut item = card(1, 3, "France", "Paris");
    item.mcq_options = Some(cache::write_slot(&strings(&["Rome", "Berlin"])));
    let store = Arc::new(MemoryStudyItemStore::with_items([item]));
    let generator = Arc::new(StubGenerator::new());

    let questions = orchestrator(store, generator).multiple_choice(3, i32::MAX).await.unwrap();

    assert_eq!(questions.len(), 1);
    assert_eq!(sorted(questions[0].options.clone()), strings(&["Berlin", "Paris", "Rome"]));
}

#[tokio::test]
async fn generated_content_is_stable_once_cached() {
    let store = Arc::new(MemoryStudyItemStore::with_items([card(1, 3, "France", "Paris")]));
    let generator = Arc::new(
        StubGenerator::new().with_distractors(vec![options("France", "Paris", &["Rome", "Berlin", "Madrid"])]),
    );
    let orchestrator = orchestrator(store, generator.clone());

    let first = orchestrator.multiple_choice(3, 4).await.unwrap();
    let second = orchestrator.multiple_choice(3, 4).await.unwrap();

    assert_eq!(generator.distractor_calls(), 1);
    assert_eq!(sorted(first[0].options.clone()), sorted(second[0].options.clone()));
    assert_eq!(sorted(second[0].options.clone()), strings(&["Berlin", "Madrid", "Paris", "Rome"]));
}

#[tokio::test(start_paused = true)]
async fn slow_upstream_is_abandoned_at_the_deadline() {
    let mut cached = card(1, 5, "dog", "con chó");
    cached.mcq_options = Some(cache::write_slot(&strings(&["con mèo", "con gà"])));
    let store = Arc::new(MemoryStudyItemStore::with_items([cached, card(2, 5, "cat", "con mèo")]));
    let generator = Arc::new(
        StubGenerator::new()
            .with_distractors(vec![options("cat", "con mèo", &["con chó", "con gà"])])
            .with_delay(Duration::from_secs(30)),
    );

    let started = tokio::time::Instant::now();
    let questions = orchestrator(store.clone(), generator).multiple_choice(5, 4).await.unwrap();

    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].term, "dog");
    assert!(started.elapsed() < Duration::from_secs(7));
    assert_eq!(store.get(2).unwrap().mcq_options, None);
}

#[tokio::test]
async fn unavailable_upstream_degrades_to_an_empty_batch() {
    let store = Arc::new(MemoryStudyItemStore::with_items([card(1, 9, "cat", "con mèo")]));
    let generator = Arc::new(StubGenerator::new());

    let questions = orchestrator(store, generator).multiple_choice(9, 4).await.unwrap();

    assert!(questions.is_empty());
}

#[tokio::test]
async fn corrupted_cache_is_regenerated_and_overwritten() {
    let mut item = card(1, 2, "apple", "quả táo");
    item.mcq_options = Some("[\"unterminated".to_string());
    let store = Arc::new(MemoryStudyItemStore::with_items([item]));
    let generator = Arc::new(
        StubGenerator::new().with_distractors(vec![options("apple", "quả táo", &["quả lê", "quả cam"])]),
    );

    let questions = orchestrator(store.clone(), generator.clone()).multiple_choice(2, 4).await.unwrap();

    assert_eq!(generator.distractor_calls(), 1);
    assert_eq!(questions.len(), 1);
    assert_eq!(
        store.get(1).unwrap().cached(CacheSlot::McqOptions),
        Some(strings(&["quả lê", "quả cam"]))
    );
}

#[tokio::test]
async fn unknown_terms_and_blank_words_are_ignored() {
    let store = Arc::new(MemoryStudyItemStore::with_items([
        card(1, 4, "pear", "quả lê"),
        card(2, 4, "   ", "nothing"),
    ]));
    let generator = Arc::new(StubGenerator::new().with_distractors(vec![
        options("banana", "quả chuối", &["a", "b"]),
        options("pear", "quả lê", &[]),
    ]));

    let questions = orchestrator(store.clone(), generator.clone()).multiple_choice(4, 4).await.unwrap();

    assert!(questions.is_empty());
    assert_eq!(generator.requested_pairs.lock().len(), 1);
    assert_eq!(store.get(1).unwrap().mcq_options, None);
}

#[tokio::test]
async fn duplicate_entries_for_one_item_are_presented_once() {
    let store = Arc::new(MemoryStudyItemStore::with_items([card(1, 4, "pear", "quả lê")]));
    let generator = Arc::new(StubGenerator::new().with_distractors(vec![
        options("pear", "quả lê", &["quả táo"]),
        options("pear", "quả lê", &["quả cam"]),
    ]));

    let questions = orchestrator(store.clone(), generator).multiple_choice(4, 4).await.unwrap();

    assert_eq!(questions.len(), 1);
    assert_eq!(store.get(1).unwrap().cached(CacheSlot::McqOptions), Some(strings(&["quả táo"])));
}

#[tokio::test]
async fn item_deleted_mid_generation_is_skipped() {
    let store = Arc::new(MemoryStudyItemStore::with_items([
        card(1, 8, "cat", "con mèo"),
        card(2, 8, "dog", "con chó"),
    ]));
    let mut generator = StubGenerator::new().with_distractors(vec![
        options("cat", "con mèo", &["con chó"]),
        options("dog", "con chó", &["con mèo"]),
    ]);
    let handle = store.clone();
    generator.during_generation = Some(Box::new(move || {
        handle.remove(2);
    }));

    let questions = orchestrator(store.clone(), Arc::new(generator)).multiple_choice(8, 4).await.unwrap();

    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].term, "cat");
    assert!(store.get(2).is_none());
}

#[tokio::test]
async fn sentences_are_persisted_correct_first() {
    let store = Arc::new(MemoryStudyItemStore::with_items([card(1, 6, "run", "chạy")]));
    let generator = Arc::new(StubGenerator::new().with_sentences(vec![sentences(
        "run",
        &["I ran away.", "She runs daily.", "They run fast."],
        1,
    )]));
    let orchestrator = orchestrator(store.clone(), generator.clone());

    let fresh = orchestrator.sentence_choice(6, 4).await.unwrap();
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].correct_index, 1);
    assert_eq!(fresh[0].sentences[1], "She runs daily.");

    assert_eq!(
        store.get(1).unwrap().cached(CacheSlot::SentenceOptions),
        Some(strings(&["She runs daily.", "I ran away.", "They run fast."]))
    );

    let cached = orchestrator.sentence_choice(6, 2).await.unwrap();
    assert_eq!(generator.sentence_calls(), 1);
    assert_eq!(cached[0].correct_index, 0);
    assert_eq!(cached[0].sentences, strings(&["She runs daily.", "I ran away."]));
}

#[tokio::test]
async fn sentence_request_asks_for_at_least_two_options() {
    let store = Arc::new(MemoryStudyItemStore::with_items([card(1, 6, "run", "chạy")]));
    let generator = Arc::new(StubGenerator::new().with_sentences(vec![sentences(
        "run",
        &["a", "b", "c"],
        0,
    )]));

    let questions = orchestrator(store, generator).sentence_choice(6, 0).await.unwrap();

    assert_eq!(questions[0].sentences, strings(&["a", "b"]));
}

#[tokio::test]
async fn document_classification_falls_back_to_local_tokens() {
    let mut generator = StubGenerator::new();
    generator.flashcards = Some(json!({ "cards": [{ "word": "river" }] }));
    let store = Arc::new(MemoryStudyItemStore::new());

    let result = orchestrator(store, Arc::new(generator))
        .enrich_document("The river, the river bank! a".to_string())
        .await;

    assert_eq!(result.word_count_estimate, 6);
    assert!(result.classify_error.is_some());
    assert!(result.flashcards_error.is_none());
    let Classification::Fallback(words) = &result.classify else {
        panic!("expected local classification");
    };
    let tokens: Vec<&str> = words.iter().map(|w| w.word.as_str()).collect();
    assert_eq!(tokens, vec!["The", "river", "the", "bank"]);
    assert!(words.iter().all(|w| w.level == "easy"));
}

#[tokio::test(start_paused = true)]
async fn document_branches_run_concurrently() {
    let mut generator = StubGenerator::new();
    generator.classify = Some(json!({ "words": [{ "word": "river", "level": "medium" }] }));
    generator.flashcards = Some(json!({ "cards": [] }));
    generator.classify_delay = Duration::from_secs(4);
    generator.flashcards_delay = Duration::from_secs(4);
    let store = Arc::new(MemoryStudyItemStore::new());

    let started = tokio::time::Instant::now();
    let result = orchestrator(store, Arc::new(generator))
        .enrich_document("river".to_string())
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(
        result.classify,
        Classification::Upstream(json!([{ "word": "river", "level": "medium" }]))
    );
    assert_eq!(result.flashcards, Some(json!({ "cards": [] })));
}

#[tokio::test(start_paused = true)]
async fn slow_document_branch_does_not_block_the_other() {
    let mut generator = StubGenerator::new();
    generator.classify = Some(json!([]));
    generator.flashcards = Some(json!({ "cards": [] }));
    generator.flashcards_delay = Duration::from_secs(60);
    let store = Arc::new(MemoryStudyItemStore::new());

    let result = orchestrator(store, Arc::new(generator))
        .enrich_document("river".to_string())
        .await;

    assert_eq!(result.classify, Classification::Upstream(json!([])));
    assert!(result.flashcards.is_none());
    assert!(result.flashcards_error.is_some());
}
