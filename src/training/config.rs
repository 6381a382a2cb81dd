//! Training configuration

use crate::error::{Result, TriageError};
use crate::utils::LoaderConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hyperparameters of a single text classification pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// N-gram range of the count vectorizer
    pub ngram_range: (usize, usize),
    /// Vocabulary cap (None = keep every term)
    pub max_vocab_features: Option<usize>,
    /// Minimum document frequency of a term
    pub min_df: usize,
    /// Maximum document frequency of a term, as a fraction of documents
    pub max_df: f64,
    /// Use `1 + ln(count)` term frequencies
    pub sublinear_tf: bool,
    /// Trees per label forest
    pub n_estimators: usize,
    /// Random seed for reproducibility
    pub random_state: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ngram_range: (1, 1),
            max_vocab_features: Some(2000),
            min_df: 1,
            max_df: 1.0,
            sublinear_tf: false,
            n_estimators: 100,
            random_state: None,
        }
    }
}

impl PipelineConfig {
    pub fn with_ngram_range(mut self, min: usize, max: usize) -> Self {
        self.ngram_range = (min, max);
        self
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    pub fn with_max_vocab_features(mut self, max_features: Option<usize>) -> Self {
        self.max_vocab_features = max_features;
        self
    }

    pub fn with_sublinear_tf(mut self, sublinear_tf: bool) -> Self {
        self.sublinear_tf = sublinear_tf;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }
}

/// Configuration for a full training run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Where and how messages are read
    pub loader: LoaderConfig,

    /// Fraction of rows held out for evaluation
    pub test_size: f64,

    /// Number of cross-validation folds used by the grid search
    pub cv_folds: usize,

    /// Trees per label forest
    pub n_estimators: usize,

    /// Vocabulary cap for the count vectorizer
    pub max_vocab_features: Option<usize>,

    /// Minimum document frequency of a term
    pub min_df: usize,

    /// Maximum document frequency of a term, as a fraction of documents
    pub max_df: f64,

    /// Sublinear term frequency in the TF-IDF step
    pub sublinear_tf: bool,

    /// N-gram ranges explored by the grid search
    pub ngram_grid: Vec<(usize, usize)>,

    /// Random seed for reproducibility (None = fresh entropy every run)
    pub random_state: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            test_size: 0.2,
            cv_folds: 5,
            n_estimators: 100,
            max_vocab_features: Some(2000),
            min_df: 1,
            max_df: 1.0,
            sublinear_tf: false,
            ngram_grid: vec![(1, 1), (1, 2)],
            random_state: None,
        }
    }
}

impl TrainingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Builder method to set the held-out fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Builder method to set the number of folds
    pub fn with_cv_folds(mut self, cv_folds: usize) -> Self {
        self.cv_folds = cv_folds;
        self
    }

    /// Builder method to set trees per forest
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Builder method to set the vocabulary cap
    pub fn with_max_vocab_features(mut self, max_features: Option<usize>) -> Self {
        self.max_vocab_features = max_features;
        self
    }

    /// Builder method to enable sublinear term frequency
    pub fn with_sublinear_tf(mut self, sublinear_tf: bool) -> Self {
        self.sublinear_tf = sublinear_tf;
        self
    }

    /// Builder method to set the n-gram grid
    pub fn with_ngram_grid(mut self, grid: Vec<(usize, usize)>) -> Self {
        self.ngram_grid = grid;
        self
    }

    /// Builder method to set the random seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Builder method to set the loader configuration
    pub fn with_loader(mut self, loader: LoaderConfig) -> Self {
        self.loader = loader;
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(invalid("test_size", self.test_size, "must be in (0, 1)"));
        }
        if self.cv_folds < 2 {
            return Err(invalid("cv_folds", self.cv_folds, "must be at least 2"));
        }
        if self.n_estimators == 0 {
            return Err(invalid("n_estimators", self.n_estimators, "must be at least 1"));
        }
        if self.max_vocab_features == Some(0) {
            return Err(invalid("max_vocab_features", 0, "must be at least 1"));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(invalid("max_df", self.max_df, "must be in (0, 1]"));
        }
        if self.ngram_grid.is_empty() {
            return Err(TriageError::ConfigError("ngram_grid must not be empty".to_string()));
        }
        if let Some(&(lo, hi)) = self.ngram_grid.iter().find(|&&(lo, hi)| lo == 0 || hi < lo) {
            return Err(invalid("ngram_grid", format!("({}, {})", lo, hi), "needs 1 <= min <= max"));
        }
        Ok(())
    }

    /// Pipeline hyperparameters shared by every grid candidate
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            ngram_range: self.ngram_grid.first().copied().unwrap_or((1, 1)),
            max_vocab_features: self.max_vocab_features,
            min_df: self.min_df,
            max_df: self.max_df,
            sublinear_tf: self.sublinear_tf,
            n_estimators: self.n_estimators,
            random_state: self.random_state,
        }
    }
}

fn invalid(name: &str, value: impl std::fmt::Display, reason: &str) -> TriageError {
    TriageError::ConfigError(format!("{} = {}: {}", name, value, reason))
}
