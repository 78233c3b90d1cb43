use crate::text::sanitize_comment_text;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
    pub score: i64,
}

impl Comment {
    /// Builds a comment with newlines and tabs stripped from its text.
    pub fn new(text: &str, score: i64) -> Self {
        Self {
            text: sanitize_comment_text(text),
            score,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub score: i64,
    pub comments: Vec<Comment>,
}

/// Positive (1..=5) and negative (-5..=-1) rating of one line of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentPair {
    pub positive: i32,
    pub negative: i32,
}

impl SentimentPair {
    pub const NEUTRAL: SentimentPair = SentimentPair {
        positive: 1,
        negative: -1,
    };

    pub fn new(positive: i32, negative: i32) -> Self {
        Self { positive, negative }
    }
}

/// Per-post means over its comment file, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostAverages {
    pub score: f64,
    pub positive: f64,
    pub negative: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Conservative,
    Liberal,
}

impl Label {
    pub const ALL: [Label; 2] = [Label::Conservative, Label::Liberal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Conservative => "Conservative",
            Label::Liberal => "Liberal",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(Label::Conservative),
            "liberal" => Ok(Label::Liberal),
            other => Err(format!("unknown label: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    pub text: String,
    pub label: Label,
}

impl TrainingRecord {
    pub fn new(text: impl Into<String>, label: Label) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}
