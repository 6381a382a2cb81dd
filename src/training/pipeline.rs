//! Text classification pipeline
//!
//! `CountVectorizer` → `TfidfTransformer` → `MultiOutputClassifier(RandomForest)`.
//! A fitted pipeline is the artifact written to disk at the end of training.

use super::config::PipelineConfig;
use super::multi_output::MultiOutputClassifier;
use super::random_forest::RandomForest;
use crate::error::{Result, TriageError};
use crate::feature_engineering::{CountVectorizer, TfidfTransformer};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Fitted (or ready-to-fit) message classification pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriagePipeline {
    config: PipelineConfig,
    vectorizer: CountVectorizer,
    tfidf: TfidfTransformer,
    classifier: MultiOutputClassifier,
    category_names: Vec<String>,
    is_fitted: bool,
}

impl TriagePipeline {
    /// Build an unfitted pipeline from hyperparameters
    pub fn new(config: PipelineConfig) -> Self {
        let (ngram_min, ngram_max) = config.ngram_range;
        let mut vectorizer = CountVectorizer::new()
            .with_ngram_range(ngram_min, ngram_max)
            .with_min_df(config.min_df)
            .with_max_df(config.max_df);
        if let Some(max_features) = config.max_vocab_features {
            vectorizer = vectorizer.with_max_features(max_features);
        }

        let mut forest = RandomForest::new_classifier(config.n_estimators);
        if let Some(seed) = config.random_state {
            forest = forest.with_random_state(seed);
        }

        Self {
            vectorizer,
            tfidf: TfidfTransformer::new().with_sublinear_tf(config.sublinear_tf),
            classifier: MultiOutputClassifier::new(forest),
            category_names: Vec::new(),
            is_fitted: false,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Attach category names; they travel with the serialized artifact
    pub fn with_category_names(mut self, names: Vec<String>) -> Self {
        self.category_names = names;
        self
    }

    /// Fit vectorizer, TF-IDF statistics and one forest per label column
    pub fn fit(&mut self, texts: &[String], labels: &Array2<f64>) -> Result<&mut Self> {
        if texts.len() != labels.nrows() {
            return Err(TriageError::ShapeError {
                expected: format!("{} label rows", texts.len()),
                actual: format!("{} label rows", labels.nrows()),
            });
        }
        if !self.category_names.is_empty() && self.category_names.len() != labels.ncols() {
            return Err(TriageError::ShapeError {
                expected: format!("{} label columns", self.category_names.len()),
                actual: format!("{} label columns", labels.ncols()),
            });
        }

        let start = Instant::now();

        let counts = self.vectorizer.fit_transform(texts)?;
        let features = self.tfidf.fit_transform(&counts)?;
        self.classifier.fit(&features, labels)?;

        if self.category_names.is_empty() {
            self.category_names = (0..labels.ncols()).map(|i| format!("category_{}", i)).collect();
        }
        self.is_fitted = true;

        debug!(
            rows = texts.len(),
            vocabulary = self.vectorizer.vocabulary_size(),
            outputs = labels.ncols(),
            ngram_range = ?self.config.ngram_range,
            elapsed = ?start.elapsed(),
            "Fitted pipeline"
        );

        Ok(self)
    }

    /// Predict a label matrix with one row per text and one column per category
    pub fn predict(&self, texts: &[String]) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(TriageError::ModelNotFitted);
        }
        let features = self.transform(texts)?;
        self.classifier.predict(&features)
    }

    /// Predict labels for a single message
    pub fn predict_one(&self, text: &str) -> Result<Vec<f64>> {
        let predictions = self.predict(&[text.to_string()])?;
        Ok(predictions.row(0).to_vec())
    }

    /// TF-IDF features for `texts`
    pub fn transform(&self, texts: &[String]) -> Result<Array2<f64>> {
        let counts = self.vectorizer.transform(texts)?;
        self.tfidf.transform(&counts)
    }

    pub fn category_names(&self) -> &[String] {
        &self.category_names
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vectorizer.vocabulary_size()
    }

    pub fn n_outputs(&self) -> usize {
        self.classifier.n_outputs()
    }
}

/// Fraction of rows whose every label is predicted correctly
pub fn subset_accuracy(y_true: &Array2<f64>, y_pred: &Array2<f64>) -> Result<f64> {
    if y_true.dim() != y_pred.dim() {
        return Err(TriageError::ShapeError {
            expected: format!("{:?}", y_true.dim()),
            actual: format!("{:?}", y_pred.dim()),
        });
    }
    if y_true.nrows() == 0 {
        return Ok(0.0);
    }

    let exact = y_true
        .rows()
        .into_iter()
        .zip(y_pred.rows())
        .filter(|(t, p)| t == p)
        .count();

    Ok(exact as f64 / y_true.nrows() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn corpus() -> (Vec<String>, Array2<f64>) {
        let texts = [
            "we need water urgently",
            "no clean water in the village",
            "people need food and water",
            "send food to the camp",
            "food supplies are running out",
            "the bridge collapsed after the storm",
            "storm destroyed many houses",
            "heavy rain and storm tonight",
        ];
        let labels = array![
            [1.0, 0.0],
            [1.0, 0.0],
            [1.0, 0.0],
            [0.0, 0.0],
            [0.0, 0.0],
            [0.0, 1.0],
            [0.0, 1.0],
            [0.0, 1.0],
        ];
        (texts.iter().map(|s| s.to_string()).collect(), labels)
    }

    #[test]
    fn test_fit_predict_shape() {
        let (texts, labels) = corpus();
        let mut pipeline =
            TriagePipeline::new(PipelineConfig::default().with_n_estimators(10).with_random_state(3));
        pipeline.fit(&texts, &labels).unwrap();

        let predictions = pipeline.predict(&texts).unwrap();
        assert_eq!(predictions.dim(), (8, 2));
        assert_eq!(pipeline.n_outputs(), 2);
        assert_eq!(pipeline.category_names(), &["category_0", "category_1"]);
    }

    #[test]
    fn test_sublinear_tf_reaches_features() {
        let (texts, labels) = corpus();
        let message = vec!["water water water food".to_string()];

        let mut linear =
            TriagePipeline::new(PipelineConfig::default().with_n_estimators(3).with_random_state(3));
        let mut sublinear = TriagePipeline::new(
            PipelineConfig::default()
                .with_n_estimators(3)
                .with_random_state(3)
                .with_sublinear_tf(true),
        );
        linear.fit(&texts, &labels).unwrap();
        sublinear.fit(&texts, &labels).unwrap();

        assert_ne!(linear.transform(&message).unwrap(), sublinear.transform(&message).unwrap());
    }

    #[test]
    fn test_predict_one() {
        let (texts, labels) = corpus();
        let mut pipeline = TriagePipeline::new(
            PipelineConfig::default()
                .with_ngram_range(1, 2)
                .with_n_estimators(10)
                .with_random_state(3),
        )
        .with_category_names(vec!["water".into(), "weather".into()]);
        pipeline.fit(&texts, &labels).unwrap();

        let labels = pipeline.predict_one("storm and rain").unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(pipeline.category_names(), &["water", "weather"]);
    }

    #[test]
    fn test_category_count_mismatch() {
        let (texts, labels) = corpus();
        let mut pipeline = TriagePipeline::new(PipelineConfig::default())
            .with_category_names(vec!["only_one".into()]);
        assert!(matches!(
            pipeline.fit(&texts, &labels),
            Err(TriageError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_predict_before_fit() {
        let pipeline = TriagePipeline::new(PipelineConfig::default());
        assert!(matches!(
            pipeline.predict(&["water".to_string()]),
            Err(TriageError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_subset_accuracy() {
        let y_true = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]];
        let y_pred = array![[1.0, 0.0], [0.0, 0.0], [1.0, 1.0], [1.0, 0.0]];
        assert!((subset_accuracy(&y_true, &y_pred).unwrap() - 0.5).abs() < 1e-12);
    }
}
