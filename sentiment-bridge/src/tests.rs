use crate::{AttachMode, ExportManifest, ImportOptions, SentimentBridge, EMPTY_PLACEHOLDER};
use corpus_store::{CorpusStore, DataLayout, Table};
use leanscope_core::{Comment, Post};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const COMMUNITY: &str = "politics";

fn setup(posts: &[Post]) -> (TempDir, DataLayout) {
    let dir = TempDir::new().unwrap();
    let layout = DataLayout::new(dir.path());
    CorpusStore::new(layout.clone())
        .save_posts(COMMUNITY, posts)
        .unwrap();
    (dir, layout)
}

fn post(title: &str, score: i64, comments: &[(&str, i64)]) -> Post {
    Post {
        id: title.to_string(),
        title: title.to_string(),
        score,
        comments: comments
            .iter()
            .map(|(text, score)| Comment::new(text, *score))
            .collect(),
    }
}

/// Stands in for the external tool: rates each exported line by its length
/// and writes the results in reverse order.
fn run_tool(text_dir: &Path, rate: impl Fn(&str) -> (i32, i32)) {
    let manifest = ExportManifest::load(text_dir).unwrap();
    for title in manifest.files.keys() {
        let input = fs::read_to_string(text_dir.join(format!("{}.txt", title))).unwrap();
        let mut output: Vec<String> = input
            .lines()
            .map(|line| {
                let (positive, negative) = rate(line);
                format!("{}\t{}\t{}", line, positive, negative)
            })
            .collect();
        output.reverse();
        fs::write(
            text_dir.join(format!("{}+results.txt", title)),
            output.join("\n") + "\n",
        )
        .unwrap();
    }
}

fn by_length(line: &str) -> (i32, i32) {
    let len = line.len() as i32;
    (1 + len % 5, -1 - len % 3)
}

#[test]
fn test_export_writes_lines_and_placeholder() {
    let (_dir, layout) = setup(&[
        post("Busy", 10, &[("first comment", 1), ("second", 2)]),
        post("Quiet", 1, &[]),
    ]);
    let bridge = SentimentBridge::new(layout.clone());

    let summary = bridge.export(COMMUNITY).unwrap();
    assert_eq!(summary.files, 2);
    assert_eq!(summary.empty_posts, 1);

    let busy = fs::read_to_string(layout.text_file(COMMUNITY, "Busy")).unwrap();
    assert_eq!(busy, "first comment\nsecond\n");

    let quiet = fs::read_to_string(layout.text_file(COMMUNITY, "Quiet")).unwrap();
    assert_eq!(quiet.lines().collect::<Vec<_>>(), vec![EMPTY_PLACEHOLDER]);

    let manifest = ExportManifest::load(&layout.text_dir(COMMUNITY)).unwrap();
    let lines = manifest.lines("Busy").unwrap();
    assert_eq!(lines[1].row, Some(1));
    assert_eq!(lines[1].text, "second");
    assert_eq!(manifest.lines("Quiet").unwrap()[0].row, None);
}

#[test]
fn test_export_replaces_embedded_newlines() {
    let (_dir, layout) = setup(&[post("Edited", 1, &[])]);
    let mut table = Table::new(&["text", "score"]);
    table.push_row(&["two\nlines", "3"]);
    table.write(&layout.comments_csv(COMMUNITY, "Edited")).unwrap();

    SentimentBridge::new(layout.clone()).export(COMMUNITY).unwrap();

    let text = fs::read_to_string(layout.text_file(COMMUNITY, "Edited")).unwrap();
    assert_eq!(text, "two lines\n");
}

#[test]
fn test_keyed_import_then_aggregate() {
    let (_dir, layout) = setup(&[
        post("Top", 40, &[("great", 10), ("meh", 2)]),
        post("Low", 10, &[("terrible idea", -3)]),
        post("Quiet", 5, &[]),
    ]);
    let bridge = SentimentBridge::new(layout.clone());
    bridge.export(COMMUNITY).unwrap();
    run_tool(&layout.text_dir(COMMUNITY), by_length);

    let summary = bridge.import(COMMUNITY, &ImportOptions::default()).unwrap();
    assert_eq!(summary.files, 3);
    assert_eq!(summary.unmatched_rows, 0);
    assert!(summary.text_dir_removed);
    assert!(!layout.text_dir(COMMUNITY).exists());

    // Reversed tool output still lands on the right rows
    let top = Table::read(&layout.comments_csv(COMMUNITY, "Top")).unwrap();
    assert_eq!(top.column("positiveSentiment").unwrap(), vec!["1", "4"]);
    assert_eq!(top.column("negativeSentiment").unwrap(), vec!["-3", "-1"]);

    let quiet = Table::read(&layout.comments_csv(COMMUNITY, "Quiet")).unwrap();
    assert!(quiet.is_empty());
    assert!(quiet.has_column("positiveSentiment"));

    let aggregate = bridge.aggregate(COMMUNITY).unwrap();
    assert_eq!(aggregate.max_score, Some(40));
    assert_eq!(aggregate.missing, 0);

    let posts = Table::read(&layout.posts_csv(COMMUNITY)).unwrap();
    assert_eq!(
        posts.headers(),
        &[
            "title",
            "score",
            "avgCommentScore",
            "avgPositiveSentiment",
            "avgNegativeSentiment",
            "Acceptance"
        ]
    );
    assert_eq!(posts.column("avgCommentScore").unwrap(), vec!["6", "-3", "0"]);
    assert_eq!(posts.column("avgPositiveSentiment").unwrap(), vec!["2.5", "4", "1"]);
    assert_eq!(posts.column("avgNegativeSentiment").unwrap(), vec!["-2", "-2", "-1"]);

    let acceptance = posts.parse_column::<f64>("Acceptance").unwrap();
    let expected_top = (1.0 + 1.5 / 4.0 + 3.0 / 4.0) / 3.0;
    assert!((acceptance[0].unwrap() - expected_top).abs() < 1e-9);

    // Re-running overwrites instead of duplicating columns
    bridge.aggregate(COMMUNITY).unwrap();
    let posts = Table::read(&layout.posts_csv(COMMUNITY)).unwrap();
    assert_eq!(posts.headers().len(), 6);
}

#[test]
fn test_keyed_import_reports_dropped_lines() {
    let (_dir, layout) = setup(&[post("Thread", 1, &[("kept", 1), ("lost", 1)])]);
    let bridge = SentimentBridge::new(layout.clone());
    bridge.export(COMMUNITY).unwrap();

    let text_dir = layout.text_dir(COMMUNITY);
    fs::write(text_dir.join("Thread+results.txt"), "kept\t3\t-2\n").unwrap();

    let summary = bridge.import(COMMUNITY, &ImportOptions::default()).unwrap();
    assert_eq!(summary.unmatched_rows, 1);

    let table = Table::read(&layout.comments_csv(COMMUNITY, "Thread")).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.column("positiveSentiment").unwrap(), vec!["3", ""]);
}

#[test]
fn test_positional_import_truncates_short_output() {
    let (_dir, layout) = setup(&[post("Thread", 1, &[("a", 1), ("b", 2), ("c", 3)])]);
    let bridge = SentimentBridge::new(layout.clone());
    bridge.export(COMMUNITY).unwrap();

    let text_dir = layout.text_dir(COMMUNITY);
    fs::write(text_dir.join("Thread+results.txt"), "a\t2\t-1\nb\t3\t-4\n").unwrap();

    let options = ImportOptions {
        mode: AttachMode::Positional,
        ..Default::default()
    };
    let summary = bridge.import(COMMUNITY, &options).unwrap();
    assert_eq!(summary.truncated_files, 1);

    let table = Table::read(&layout.comments_csv(COMMUNITY, "Thread")).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.column("negativeSentiment").unwrap(), vec!["-1", "-4"]);
}

#[test]
fn test_empty_result_file_rates_neutral() {
    let (_dir, layout) = setup(&[post("Quiet", 1, &[("only", 1)])]);
    let bridge = SentimentBridge::new(layout.clone());
    bridge.export(COMMUNITY).unwrap();
    fs::write(layout.text_dir(COMMUNITY).join("Quiet+results.txt"), "").unwrap();

    let options = ImportOptions {
        mode: AttachMode::Positional,
        ..Default::default()
    };
    bridge.import(COMMUNITY, &options).unwrap();

    let table = Table::read(&layout.comments_csv(COMMUNITY, "Quiet")).unwrap();
    assert_eq!(table.column("positiveSentiment").unwrap(), vec!["1"]);
    assert_eq!(table.column("negativeSentiment").unwrap(), vec!["-1"]);
}

#[test]
fn test_missing_and_malformed_results_are_skipped() {
    let (_dir, layout) = setup(&[
        post("Good", 1, &[("fine", 1)]),
        post("Broken", 1, &[("bad", 1)]),
        post("Absent", 1, &[("gone", 1)]),
    ]);
    let bridge = SentimentBridge::new(layout.clone());
    bridge.export(COMMUNITY).unwrap();

    let text_dir = layout.text_dir(COMMUNITY);
    fs::write(text_dir.join("Good+results.txt"), "fine\t2\t-2\n").unwrap();
    fs::write(text_dir.join("Broken+results.txt"), "bad\tnot a number\n").unwrap();

    let summary = bridge.import(COMMUNITY, &ImportOptions::default()).unwrap();
    assert_eq!(summary.files, 1);
    assert_eq!(summary.skipped, 2);
    assert!(!summary.text_dir_removed);
    assert!(text_dir.exists());

    let good = Table::read(&layout.comments_csv(COMMUNITY, "Good")).unwrap();
    assert!(good.has_column("positiveSentiment"));
    let absent = Table::read(&layout.comments_csv(COMMUNITY, "Absent")).unwrap();
    assert!(!absent.has_column("positiveSentiment"));
}

#[test]
fn test_keep_text_leaves_renamed_results() {
    let (_dir, layout) = setup(&[post("Thread", 1, &[("hello", 1)])]);
    let bridge = SentimentBridge::new(layout.clone());
    bridge.export(COMMUNITY).unwrap();
    run_tool(&layout.text_dir(COMMUNITY), by_length);

    let options = ImportOptions {
        keep_text: true,
        ..Default::default()
    };
    let summary = bridge.import(COMMUNITY, &options).unwrap();
    assert!(!summary.text_dir_removed);

    let renamed = fs::read_to_string(layout.text_file(COMMUNITY, "Thread")).unwrap();
    assert!(renamed.starts_with("hello\t"));
    assert!(!layout.text_dir(COMMUNITY).join("Thread+results.txt").exists());
}

#[test]
fn test_aggregate_falls_back_to_title_without_zero_width_spaces() {
    let (_dir, layout) = setup(&[post("Plain", 3, &[])]);
    let mut comments = Table::new(&["text", "score", "positiveSentiment", "negativeSentiment"]);
    comments.push_row(&["x", "4", "2", "-2"]);
    comments.write(&layout.comments_csv(COMMUNITY, "Plain")).unwrap();

    let mut posts = Table::new(&["title", "score"]);
    posts.push_row(&["Pl\u{200b}ain", "3"]);
    posts.push_row(&["Nowhere", "1"]);
    posts.write(&layout.posts_csv(COMMUNITY)).unwrap();

    let summary = SentimentBridge::new(layout.clone()).aggregate(COMMUNITY).unwrap();
    assert_eq!(summary.missing, 1);

    let posts = Table::read(&layout.posts_csv(COMMUNITY)).unwrap();
    assert_eq!(posts.column("avgCommentScore").unwrap(), vec!["4", ""]);
    assert_eq!(posts.column("Acceptance").unwrap()[1], "");
}

#[test]
fn test_aggregate_after_partial_import_blanks_only_skipped_posts() {
    let (_dir, layout) = setup(&[
        post("Good", 8, &[("fine", 4)]),
        post("Absent", 2, &[("gone", 1)]),
    ]);
    let bridge = SentimentBridge::new(layout.clone());
    bridge.export(COMMUNITY).unwrap();
    fs::write(
        layout.text_dir(COMMUNITY).join("Good+results.txt"),
        "fine\t3\t-1\n",
    )
    .unwrap();

    let imported = bridge.import(COMMUNITY, &ImportOptions::default()).unwrap();
    assert_eq!(imported.skipped, 1);

    let summary = bridge.aggregate(COMMUNITY).unwrap();
    assert_eq!(summary.posts, 2);
    assert_eq!(summary.missing, 1);

    let posts = Table::read(&layout.posts_csv(COMMUNITY)).unwrap();
    assert_eq!(posts.column("avgCommentScore").unwrap(), vec!["4", ""]);
    assert_eq!(posts.column("avgPositiveSentiment").unwrap(), vec!["3", ""]);
    assert_eq!(posts.column("Acceptance").unwrap()[1], "");
    assert!(!posts.column("Acceptance").unwrap()[0].is_empty());
}

#[test]
fn test_title_without_usable_characters_goes_through_every_stage() {
    let untitled = Post {
        id: "t3abc".to_string(),
        title: "???".to_string(),
        score: 3,
        comments: vec![Comment::new("why", 1)],
    };
    let (_dir, layout) = setup(&[untitled, post("Normal", 5, &[("ok", 2)])]);
    let bridge = SentimentBridge::new(layout.clone());

    let exported = bridge.export(COMMUNITY).unwrap();
    assert_eq!(exported.files, 2);
    let manifest = ExportManifest::load(&layout.text_dir(COMMUNITY)).unwrap();
    assert!(manifest.lines("t3abc").is_some());

    run_tool(&layout.text_dir(COMMUNITY), by_length);
    bridge.import(COMMUNITY, &ImportOptions::default()).unwrap();

    let summary = bridge.aggregate(COMMUNITY).unwrap();
    assert_eq!(summary.missing, 0);
    let posts = Table::read(&layout.posts_csv(COMMUNITY)).unwrap();
    assert_eq!(posts.column("title").unwrap(), vec!["t3abc", "Normal"]);
}
