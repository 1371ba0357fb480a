mod common;

use common::{day, init_tracing, paper, surfaced};
use paper_digest::{reconcile, Corpus, CorpusOrigin, PaperRecord, SeenStore};
use std::fs;

#[test]
fn test_missing_file_loads_as_empty() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = SeenStore::new(dir.path().join("seen.json"));

    let loaded = store.load();
    assert!(loaded.corpus.is_empty());
    assert_eq!(loaded.origin, CorpusOrigin::Missing);
}

#[test]
fn test_round_trip_preserves_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = SeenStore::new(dir.path().join("state").join("seen.json"));

    let record = PaperRecord {
        authors: vec!["Li Q.".to_string(), "Okafor N.".to_string()],
        summary: "Ice sheet dynamics — a review".to_string(),
        date: day(2023, 12, 31),
        ..paper("doi:10.1/abc")
    };
    let corpus = Corpus::from_records(vec![record, surfaced("b")]);

    store.save(&corpus).unwrap();
    let loaded = store.load();

    assert_eq!(loaded.origin, CorpusOrigin::Loaded);
    assert_eq!(loaded.corpus, corpus);

    // Saving the reloaded corpus again yields the same bytes
    let first = fs::read(store.path()).unwrap();
    store.save(&loaded.corpus).unwrap();
    assert_eq!(fs::read(store.path()).unwrap(), first);
}

#[test]
fn test_persisted_format_is_a_json_array_of_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = SeenStore::new(dir.path().join("seen.json"));
    store.save(&Corpus::from_records(vec![paper("a")])).unwrap();

    let value: serde_json::Value = serde_json::from_slice(&fs::read(store.path()).unwrap()).unwrap();
    let first = &value.as_array().unwrap()[0];
    assert_eq!(first["id"], "a");
    assert_eq!(first["date"], "2024-03-01");
    assert_eq!(first["sent"], false);
    assert_eq!(first["authors"][0], "A. Author");
    assert!(first.get("title").is_some());
    assert!(first.get("link").is_some());
    assert!(first.get("summary").is_some());
    assert!(first.get("source").is_some());
}

#[test]
fn test_corrupt_file_loads_as_empty_and_is_kept() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen.json");
    fs::write(&path, "[{\"id\": \"a\", ").unwrap();
    let store = SeenStore::new(&path);

    let loaded = store.load();

    assert!(loaded.corpus.is_empty());
    match loaded.origin {
        CorpusOrigin::Unreadable { quarantined, .. } => {
            let copy = quarantined.expect("corrupt file should be copied aside");
            assert_eq!(fs::read_to_string(copy).unwrap(), "[{\"id\": \"a\", ");
        }
        other => panic!("unexpected origin {:?}", other),
    }

    // A corrupt corpus leads to bootstrap semantics
    let result = reconcile(loaded.corpus, vec![paper("x")]);
    assert!(result.is_first_run());
    assert!(result.delta.is_empty());
}

#[test]
fn test_legacy_records_are_read_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen.json");
    fs::write(
        &path,
        r#"[
            {"id": "a", "title": "Old paper", "link": "https://x/a", "source": "Nature",
             "summary": "", "authors": ["X"], "date": "2024-01-02"},
            {"link": "https://x/b", "title": "No id"},
            {"title": "Neither id nor link"},
            {"id": "a", "title": "Duplicate of a"}
        ]"#,
    )
    .unwrap();

    let loaded = SeenStore::new(&path).load();
    let records = loaded.corpus.records();

    assert_eq!(loaded.origin, CorpusOrigin::Loaded);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title, "Old paper");
    assert!(records[0].sent, "records without a flag were already surfaced");
    assert_eq!(records[0].date, day(2024, 1, 2));
    assert_eq!(records[1].id, "https://x/b");
    assert!(records[1].authors.is_empty());
}

#[test]
fn test_blank_file_is_an_empty_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen.json");
    fs::write(&path, "\n").unwrap();

    let loaded = SeenStore::new(&path).load();
    assert!(loaded.corpus.is_empty());
    assert_eq!(loaded.origin, CorpusOrigin::Loaded);
}

#[test]
fn test_save_leaves_no_temporary_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = SeenStore::new(dir.path().join("seen.json"));
    store.save(&Corpus::from_records(vec![paper("a")])).unwrap();

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["seen.json"]);
}

#[test]
fn test_save_into_unwritable_location_fails() {
    let dir = tempfile::tempdir().unwrap();
    // A file where the parent directory should be
    let blocker = dir.path().join("state");
    fs::write(&blocker, "not a directory").unwrap();
    let store = SeenStore::new(blocker.join("seen.json"));

    let err = store.save(&Corpus::from_records(vec![paper("a")])).unwrap_err();
    assert!(matches!(err, paper_digest::AggregatorError::Storage { .. }));
}

#[test]
fn test_missing_date_is_fixed_by_the_next_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen.json");
    fs::write(&path, r#"[{"id": "a", "title": "Undated"}]"#).unwrap();
    let store = SeenStore::new(&path);

    let first = store.load().corpus;
    let today = chrono::Local::now().date_naive();
    assert!(first.records()[0].date >= today - chrono::Duration::days(1));

    store.save(&first).unwrap();
    let saved = fs::read(&path).unwrap();
    let reloaded = store.load().corpus;
    assert_eq!(reloaded, first);
    store.save(&reloaded).unwrap();
    assert_eq!(fs::read(&path).unwrap(), saved);
}
