use crate::import::{NEGATIVE_COLUMN, POSITIVE_COLUMN};
use corpus_store::{DataLayout, Table};
use leanscope_core::text::strip_zero_width;
use leanscope_core::{
    CoreError, ErrorRecovery, ErrorReporter, PostAverages, RecoveryStrategy, StoreError,
};
use std::time::Duration;
use tracing::{info, warn};

pub const AVG_SCORE_COLUMN: &str = "avgCommentScore";
pub const AVG_POSITIVE_COLUMN: &str = "avgPositiveSentiment";
pub const AVG_NEGATIVE_COLUMN: &str = "avgNegativeSentiment";
pub const ACCEPTANCE_COLUMN: &str = "Acceptance";

const NEUTRAL_SCORE: f64 = 0.0;
const NEUTRAL_POSITIVE: f64 = 1.0;
const NEUTRAL_NEGATIVE: f64 = -1.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateSummary {
    pub posts: usize,
    pub missing: usize,
    pub max_score: Option<i64>,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Means over one comment table; blank cells are ignored and empty means
/// fall back to neutral values.
pub fn comment_averages(table: &Table) -> Result<PostAverages, StoreError> {
    let scores = table.parse_column::<f64>("score")?;
    let positive = table.parse_column::<f64>(POSITIVE_COLUMN)?;
    let negative = table.parse_column::<f64>(NEGATIVE_COLUMN)?;

    Ok(PostAverages {
        score: round2(mean(scores).unwrap_or(NEUTRAL_SCORE)),
        positive: round2(mean(positive).unwrap_or(NEUTRAL_POSITIVE)),
        negative: round2(mean(negative).unwrap_or(NEUTRAL_NEGATIVE)),
    })
}

/// `(score / max + (positive - 1) / 4 + (negative + 5) / 4) / 3`. A
/// non-positive maximum contributes a normalized score of 0.
pub fn acceptance(score: i64, max_score: i64, averages: &PostAverages) -> f64 {
    let normalized = if max_score > 0 {
        score as f64 / max_score as f64
    } else {
        0.0
    };
    (normalized + (averages.positive - 1.0) / 4.0 + (averages.negative + 5.0) / 4.0) / 3.0
}

fn load_averages(
    layout: &DataLayout,
    community: &str,
    title: &str,
) -> Result<Option<PostAverages>, StoreError> {
    let mut path = layout.comments_csv(community, title);
    if !path.exists() {
        path = layout.comments_csv(community, &strip_zero_width(title));
    }
    if !path.exists() {
        warn!("No comment file for '{}', leaving its averages blank", title);
        return Ok(None);
    }
    let table = Table::read(&path)?;
    if !(table.has_column(POSITIVE_COLUMN) && table.has_column(NEGATIVE_COLUMN)) {
        warn!(
            "No sentiment imported for '{}', leaving its averages blank",
            title
        );
        return Ok(None);
    }
    comment_averages(&table).map(Some)
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Adds per-post comment averages and the acceptance score to the posts CSV.
pub fn aggregate_community(
    layout: &DataLayout,
    community: &str,
) -> Result<AggregateSummary, CoreError> {
    let posts_path = layout.posts_csv(community);
    let mut posts = Table::read(&posts_path)?;
    let titles: Vec<String> = posts
        .column("title")?
        .into_iter()
        .map(str::to_string)
        .collect();
    let scores = posts.parse_column::<i64>("score")?;

    let mut summary = AggregateSummary {
        posts: posts.len(),
        max_score: scores.iter().flatten().copied().max(),
        ..Default::default()
    };
    let max_score = summary.max_score.unwrap_or(0);
    if max_score <= 0 {
        warn!("Highest post score in r/{} is {}, score term set to 0", community, max_score);
    }

    let mut averages = Vec::with_capacity(titles.len());
    for title in &titles {
        let post_averages = match load_averages(layout, community, title) {
            Ok(found) => found,
            Err(e) => {
                let error = CoreError::from(e);
                if !matches!(
                    ErrorRecovery::determine_strategy(&error, Duration::ZERO),
                    RecoveryStrategy::Skip
                ) {
                    return Err(error);
                }
                ErrorReporter::new().report_warning(&error);
                warn!("Could not average comments of '{}', leaving them blank", title);
                None
            }
        };
        if post_averages.is_none() {
            summary.missing += 1;
        }
        averages.push(post_averages);
    }

    let acceptance_cells = averages
        .iter()
        .zip(&scores)
        .map(|(avg, score)| {
            cell(avg.as_ref().map(|a| acceptance(score.unwrap_or(0), max_score, a)))
        })
        .collect();

    let column = |field: fn(&PostAverages) -> f64| -> Vec<String> {
        averages.iter().map(|a| cell(a.as_ref().map(field))).collect()
    };
    posts.set_column(AVG_SCORE_COLUMN, column(|a| a.score))?;
    posts.set_column(AVG_POSITIVE_COLUMN, column(|a| a.positive))?;
    posts.set_column(AVG_NEGATIVE_COLUMN, column(|a| a.negative))?;
    posts.set_column(ACCEPTANCE_COLUMN, acceptance_cells)?;
    posts.write(&posts_path)?;

    info!(
        "Aggregated {} posts in r/{} ({} without comment files)",
        summary.posts, community, summary.missing
    );
    Ok(summary)
}
