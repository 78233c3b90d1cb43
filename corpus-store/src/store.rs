use crate::layout::DataLayout;
use crate::table::Table;
use leanscope_core::text::{sanitize_title, strip_illegal_title_chars, truncate_title};
use leanscope_core::{Comment, Post, StoreError};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const TITLE_COLUMN: &str = "title";
pub const SCORE_COLUMN: &str = "score";
pub const TEXT_COLUMN: &str = "text";

/// File name for posts whose title and id both sanitize to nothing.
pub const UNTITLED: &str = "untitled";

/// One row of a posts CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRow {
    pub title: String,
    pub score: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveSummary {
    pub posts: usize,
    pub comment_files: usize,
    pub skipped: usize,
    pub truncated_titles: usize,
    pub title_collisions: usize,
}

/// Flat-file storage for collected communities.
#[derive(Debug, Clone)]
pub struct CorpusStore {
    layout: DataLayout,
}

impl CorpusStore {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Writes the posts CSV and one comments CSV per post. Titles are made
    /// filesystem-safe first; the sanitized title is what the posts CSV
    /// records.
    pub fn save_posts(&self, community: &str, posts: &[Post]) -> Result<SaveSummary, StoreError> {
        let comments_dir = self.layout.comments_dir(community);
        fs::create_dir_all(&comments_dir).map_err(|e| StoreError::io(&comments_dir, e))?;

        let mut summary = SaveSummary::default();
        let mut seen = HashSet::new();
        let mut table = Table::new(&[TITLE_COLUMN, SCORE_COLUMN]);

        for post in posts {
            let stripped = strip_illegal_title_chars(&post.title);
            let mut title = match truncate_title(&stripped) {
                Some(truncated) => {
                    info!(
                        "Title too long, truncated to {} characters: {}",
                        truncated.chars().count(),
                        truncated
                    );
                    summary.truncated_titles += 1;
                    truncated
                }
                None => stripped,
            };
            if title.trim().is_empty() {
                let fallback = Some(sanitize_title(&post.id))
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or_else(|| UNTITLED.to_string());
                warn!(
                    "Title '{}' has no usable characters, saving it as '{}'",
                    post.title, fallback
                );
                title = fallback;
            }
            if !seen.insert(title.clone()) {
                warn!("Duplicate title in r/{}, overwriting comments of: {}", community, title);
                summary.title_collisions += 1;
            }

            table.push_row(&[title.clone(), post.score.to_string()]);

            let path = self.layout.comments_csv(community, &title);
            match write_comments(&path, &post.comments) {
                Ok(()) => summary.comment_files += 1,
                Err(e) => {
                    warn!("Could not write comments for '{}': {}, skipping", title, e);
                    summary.skipped += 1;
                }
            }
        }

        table.write(&self.layout.posts_csv(community))?;
        summary.posts = posts.len();

        info!(
            "Saved {} posts and {} comment files for r/{}",
            summary.posts, summary.comment_files, community
        );
        Ok(summary)
    }

    pub fn posts_table(&self, community: &str) -> Result<Table, StoreError> {
        Table::read(&self.layout.posts_csv(community))
    }

    pub fn load_posts(&self, community: &str) -> Result<Vec<PostRow>, StoreError> {
        let table = self.posts_table(community)?;
        let titles = table.column(TITLE_COLUMN)?;
        let scores = table.parse_column::<i64>(SCORE_COLUMN)?;

        Ok(titles
            .into_iter()
            .zip(scores)
            .map(|(title, score)| PostRow {
                title: title.to_string(),
                score: score.unwrap_or(0),
            })
            .collect())
    }

    pub fn load_comments(&self, community: &str, title: &str) -> Result<Vec<Comment>, StoreError> {
        let table = Table::read(&self.layout.comments_csv(community, title))?;
        let texts = table.column(TEXT_COLUMN)?;
        let scores = table.parse_column::<i64>(SCORE_COLUMN)?;

        Ok(texts
            .into_iter()
            .zip(scores)
            .map(|(text, score)| Comment {
                text: text.to_string(),
                score: score.unwrap_or(0),
            })
            .collect())
    }
}

pub fn write_comments(path: &Path, comments: &[Comment]) -> Result<(), StoreError> {
    let mut table = Table::new(&[TEXT_COLUMN, SCORE_COLUMN]);
    for comment in comments {
        table.push_row(&[comment.text.clone(), comment.score.to_string()]);
    }
    table.write(path)
}
