//! TF-IDF vectorization with a capped vocabulary.

use leanscope_core::ClassifierError;
use ndarray::Array2;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

pub const DEFAULT_MAX_FEATURES: usize = 5000;

/// Tokens of two or more word characters.
const TOKEN_PATTERN: &str = r"\b\w\w+\b";

fn token_regex() -> &'static Regex {
    static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
    TOKEN_REGEX.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("token pattern is valid"))
}

fn tokenize(doc: &str) -> impl Iterator<Item = &str> {
    token_regex().find_iter(doc).map(|m| m.as_str())
}

#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    max_features: usize,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
        }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Learns the vocabulary and idf weights. The `max_features` most
    /// frequent terms across the corpus are kept, indexed alphabetically.
    pub fn fit<S: AsRef<str>>(&mut self, docs: &[S]) -> Result<(), ClassifierError> {
        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in docs {
            let lowered = doc.as_ref().to_lowercase();
            let mut seen = HashSet::new();
            for token in tokenize(&lowered) {
                *term_counts.entry(token.to_string()).or_insert(0) += 1;
                if seen.insert(token) {
                    *doc_freq.entry(token.to_string()).or_insert(0) += 1;
                }
            }
        }

        if term_counts.is_empty() {
            return Err(ClassifierError::EmptyVocabulary);
        }

        let mut terms: Vec<(String, usize)> = term_counts.into_iter().collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        terms.truncate(self.max_features);
        terms.sort_by(|a, b| a.0.cmp(&b.0));

        let n = docs.len() as f64;
        self.vocabulary.clear();
        self.idf.clear();
        for (index, (term, _)) in terms.into_iter().enumerate() {
            let df = doc_freq.get(&term).copied().unwrap_or(0) as f64;
            self.idf.push(((1.0 + n) / (1.0 + df)).ln() + 1.0);
            self.vocabulary.insert(term, index);
        }
        Ok(())
    }

    /// One L2-normalized row per document. Terms outside the vocabulary are
    /// ignored, so a document may map to an all-zero row.
    pub fn transform<S: AsRef<str>>(&self, docs: &[S]) -> Result<Array2<f64>, ClassifierError> {
        if !self.is_fitted() {
            return Err(ClassifierError::NotFitted);
        }

        let mut matrix = Array2::<f64>::zeros((docs.len(), self.vocabulary.len()));
        for (row, doc) in docs.iter().enumerate() {
            let lowered = doc.as_ref().to_lowercase();
            for token in tokenize(&lowered) {
                if let Some(&col) = self.vocabulary.get(token) {
                    matrix[[row, col]] += 1.0;
                }
            }

            let mut values = matrix.row_mut(row);
            for (col, value) in values.iter_mut().enumerate() {
                *value *= self.idf[col];
            }
            let norm = values.dot(&values).sqrt();
            if norm > 0.0 {
                values.mapv_inplace(|v| v / norm);
            }
        }
        Ok(matrix)
    }

    pub fn fit_transform<S: AsRef<str>>(
        &mut self,
        docs: &[S],
    ) -> Result<Array2<f64>, ClassifierError> {
        self.fit(docs)?;
        self.transform(docs)
    }
}
