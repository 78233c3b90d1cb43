pub mod dataset;
pub mod logistic;
pub mod preprocess;
pub mod tfidf;


pub use dataset::{load_training_data, stratified_split, Split, SPLIT_SEED, TEST_FRACTION};
pub use logistic::LogisticRegression;
pub use preprocess::Preprocessor;
pub use tfidf::{TfIdfVectorizer, DEFAULT_MAX_FEATURES};

use corpus_store::Table;
use leanscope_core::{CoreError, Label, TrainingRecord};
use ndarray::Array1;
use std::path::Path;
use tracing::{debug, info};

pub const TITLE_COLUMN: &str = "title";
pub const PREDICTED_LABEL_COLUMN: &str = "Predicted_Label";

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub train_size: usize,
    pub test_size: usize,
    pub vocabulary: usize,
    pub accuracy: f64,
}

fn encode(label: Label) -> f64 {
    match label {
        Label::Conservative => 0.0,
        Label::Liberal => 1.0,
    }
}

fn decode(value: f64) -> Label {
    if value >= 0.5 {
        Label::Liberal
    } else {
        Label::Conservative
    }
}

/// Political-lean classifier over preprocessed text. Trained from scratch
/// on every run.
pub struct LeanClassifier {
    preprocessor: Preprocessor,
    vectorizer: TfIdfVectorizer,
    model: LogisticRegression,
}

impl Default for LeanClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LeanClassifier {
    pub fn new() -> Self {
        Self {
            preprocessor: Preprocessor::new(),
            vectorizer: TfIdfVectorizer::new(DEFAULT_MAX_FEATURES),
            model: LogisticRegression::default(),
        }
    }

    fn prepare(&self, records: &[TrainingRecord]) -> (Vec<String>, Array1<f64>) {
        let texts = records
            .iter()
            .map(|r| self.preprocessor.process(&r.text))
            .collect();
        let labels = records.iter().map(|r| encode(r.label)).collect();
        (texts, labels)
    }

    /// Splits `records`, fits on the training part and reports held-out
    /// accuracy.
    pub fn train(&mut self, records: &[TrainingRecord]) -> Result<TrainingReport, CoreError> {
        let split = stratified_split(records, TEST_FRACTION, SPLIT_SEED)?;

        let (train_texts, train_labels) = self.prepare(&split.train);
        let x_train = self.vectorizer.fit_transform(&train_texts)?;
        debug!(
            "Fitting on {} documents with {} features",
            x_train.nrows(),
            x_train.ncols()
        );
        self.model.fit(&x_train, &train_labels)?;

        let (test_texts, test_labels) = self.prepare(&split.test);
        let x_test = self.vectorizer.transform(&test_texts)?;
        let accuracy = self.model.score(&x_test, &test_labels)?;

        let report = TrainingReport {
            train_size: split.train.len(),
            test_size: split.test.len(),
            vocabulary: self.vectorizer.vocabulary_len(),
            accuracy,
        };
        info!("Model accuracy: {:.4}", report.accuracy);
        Ok(report)
    }

    pub fn predict<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Label>, CoreError> {
        let processed: Vec<String> = texts
            .iter()
            .map(|t| self.preprocessor.process(t.as_ref()))
            .collect();
        let x = self.vectorizer.transform(&processed)?;
        Ok(self.model.predict(&x)?.iter().map(|v| decode(*v)).collect())
    }

    /// Predicts a label for every post title and writes it to the
    /// `Predicted_Label` column of the same CSV.
    pub fn label_posts(&self, path: &Path) -> Result<usize, CoreError> {
        let mut table = Table::read(path)?;
        let titles: Vec<String> = table
            .column(TITLE_COLUMN)?
            .into_iter()
            .map(str::to_string)
            .collect();

        let labels = self.predict(&titles)?;
        table.set_column(
            PREDICTED_LABEL_COLUMN,
            labels.iter().map(|l| l.to_string()).collect(),
        )?;
        table.write(path)?;

        info!("Predictions saved to {}", path.display());
        Ok(labels.len())
    }
}
