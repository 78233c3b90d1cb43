use crate::store::UNTITLED;
use crate::{CorpusStore, DataLayout, Table};
use leanscope_core::text::{MAX_PATH_LEN, PATH_BUDGET};
use leanscope_core::{Comment, Post, StoreError};
use std::fs;
use tempfile::TempDir;

fn store(dir: &TempDir) -> CorpusStore {
    CorpusStore::new(DataLayout::new(dir.path()))
}

fn post(title: &str, score: i64, comments: Vec<Comment>) -> Post {
    Post {
        id: title.to_string(),
        title: title.to_string(),
        score,
        comments,
    }
}

#[test]
fn test_posts_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let posts = vec![
        post("First post", 120, vec![Comment::new("nice", 4)]),
        post("Second, with comma", -3, vec![]),
    ];

    let summary = store.save_posts("politics", &posts).unwrap();
    assert_eq!(summary.posts, 2);
    assert_eq!(summary.comment_files, 2);

    let rows = store.load_posts("politics").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].title, "First post");
    assert_eq!(rows[0].score, 120);
    assert_eq!(rows[1].title, "Second, with comma");
    assert_eq!(rows[1].score, -3);

    let header = fs::read_to_string(dir.path().join("politics.csv")).unwrap();
    assert!(header.starts_with("title,score\n"));
}

#[test]
fn test_comments_are_written_per_post() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let posts = vec![post(
        "Thread",
        1,
        vec![Comment::new("line\nbreak", 2), Comment::new("\"quoted\", text", -1)],
    )];

    store.save_posts("politics", &posts).unwrap();

    let comments = store.load_comments("politics", "Thread").unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].text, "linebreak");
    assert_eq!(comments[1].text, "\"quoted\", text");
    assert_eq!(comments[1].score, -1);
}

#[test]
fn test_post_without_comments_gets_header_only_file() {
    let dir = TempDir::new().unwrap();
    store(&dir)
        .save_posts("politics", &[post("Quiet", 0, vec![])])
        .unwrap();

    let table = Table::read(&dir.path().join("politics").join("Quiet.csv")).unwrap();
    assert_eq!(table.headers(), &["text", "score"]);
    assert!(table.is_empty());
}

#[test]
fn test_titles_are_sanitized_and_truncated() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let long_title = "w".repeat(300);
    let posts = vec![
        post("What? A <bad> \"title\": yes/no", 5, vec![]),
        post(&long_title, 6, vec![]),
    ];

    let summary = store.save_posts("politics", &posts).unwrap();
    assert_eq!(summary.truncated_titles, 1);

    let rows = store.load_posts("politics").unwrap();
    assert_eq!(rows[0].title, "What A bad title yesno");
    assert!(PATH_BUDGET + rows[1].title.chars().count() <= MAX_PATH_LEN);
    assert!(dir.path().join("politics").join("What A bad title yesno.csv").exists());
}

#[test]
fn test_duplicate_titles_overwrite_and_are_counted() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let posts = vec![
        post("Same", 1, vec![Comment::new("old", 1)]),
        post("Same", 2, vec![Comment::new("new", 1)]),
    ];

    let summary = store.save_posts("politics", &posts).unwrap();
    assert_eq!(summary.title_collisions, 1);
    assert_eq!(store.load_posts("politics").unwrap().len(), 2);

    let comments = store.load_comments("politics", "Same").unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "new");
}

#[test]
fn test_saving_twice_reuses_directories() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let posts = vec![post("Again", 1, vec![])];

    store.save_posts("politics", &posts).unwrap();
    store.save_posts("politics", &posts).unwrap();
    assert_eq!(store.load_posts("politics").unwrap().len(), 1);
}

#[test]
fn test_unwritable_comment_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    // A directory where the comments file should go
    fs::create_dir_all(dir.path().join("politics").join("Blocked.csv")).unwrap();

    let posts = vec![post("Blocked", 1, vec![]), post("Fine", 2, vec![])];
    let summary = store.save_posts("politics", &posts).unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.comment_files, 1);
    assert_eq!(store.load_posts("politics").unwrap().len(), 2);
}

#[test]
fn test_missing_posts_file() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        store(&dir).load_posts("absent"),
        Err(StoreError::FileNotFound { .. })
    ));
}

#[test]
fn test_title_without_usable_characters_falls_back_to_id() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let mut unnamed = post("???", 2, vec![Comment::new("hmm", 1)]);
    unnamed.id = "t3xyz".to_string();
    let nameless = post(":/:", 1, vec![]);

    let summary = store.save_posts("politics", &[unnamed, nameless]).unwrap();
    assert_eq!(summary.comment_files, 2);
    assert_eq!(summary.truncated_titles, 0);

    let rows = store.load_posts("politics").unwrap();
    assert_eq!(rows[0].title, "t3xyz");
    assert_eq!(rows[1].title, UNTITLED);
    assert_eq!(store.load_comments("politics", "t3xyz").unwrap()[0].text, "hmm");
    assert!(!dir.path().join("politics").join(".csv").exists());
}
