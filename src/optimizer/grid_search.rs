//! Exhaustive grid search with K-fold cross-validation

use crate::error::{Result, TriageError};
use crate::training::cross_validation::{CVResults, CrossValidator};
use crate::training::{subset_accuracy, PipelineConfig, TriagePipeline};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

/// Hyperparameter values to try
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    /// Count vectorizer n-gram ranges
    pub ngram_ranges: Vec<(usize, usize)>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            ngram_ranges: vec![(1, 1), (1, 2)],
        }
    }
}

impl ParamGrid {
    pub fn new(ngram_ranges: Vec<(usize, usize)>) -> Self {
        Self { ngram_ranges }
    }

    /// Every combination of grid values applied on top of `base`
    pub fn candidates(&self, base: &PipelineConfig) -> Vec<PipelineConfig> {
        self.ngram_ranges
            .iter()
            .map(|&(min, max)| base.clone().with_ngram_range(min, max))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ngram_ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ngram_ranges.is_empty()
    }
}

/// Cross-validated score of one grid candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    pub params: PipelineConfig,
    pub cv: CVResults,
}

/// Grid search over pipeline hyperparameters, scored by subset accuracy
#[derive(Debug, Clone)]
pub struct GridSearchCV {
    base: PipelineConfig,
    grid: ParamGrid,
    cv_folds: usize,
    category_names: Vec<String>,
    results: Vec<CandidateResult>,
    best_index: Option<usize>,
}

impl GridSearchCV {
    pub fn new(base: PipelineConfig, grid: ParamGrid) -> Self {
        Self {
            base,
            grid,
            cv_folds: 5,
            category_names: Vec::new(),
            results: Vec::new(),
            best_index: None,
        }
    }

    /// Number of folds (unshuffled K-fold)
    pub fn with_cv(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    /// Category names handed to the refit pipeline
    pub fn with_category_names(mut self, names: Vec<String>) -> Self {
        self.category_names = names;
        self
    }

    /// Score every candidate, then refit the best one on all of `texts`
    pub fn fit(&mut self, texts: &[String], labels: &Array2<f64>) -> Result<TriagePipeline> {
        if self.grid.is_empty() {
            return Err(TriageError::ConfigError("parameter grid is empty".to_string()));
        }
        if texts.len() != labels.nrows() {
            return Err(TriageError::ShapeError {
                expected: format!("{} label rows", texts.len()),
                actual: format!("{} label rows", labels.nrows()),
            });
        }
        if texts.len() < 2 {
            return Err(TriageError::ValidationError(format!(
                "Grid search needs at least 2 rows, got {}",
                texts.len()
            )));
        }

        let folds = self.cv_folds.min(texts.len()).max(2);
        if folds != self.cv_folds {
            warn!(requested = self.cv_folds, used = folds, "Fewer rows than folds");
        }
        let splits = CrossValidator::new(folds).split(texts.len())?;

        let candidates = self.grid.candidates(&self.base);
        let mut results = Vec::with_capacity(candidates.len());

        for (candidate_idx, params) in candidates.into_iter().enumerate() {
            let start = Instant::now();
            let mut scores = Vec::with_capacity(splits.len());

            for split in &splits {
                let train_texts = select_texts(texts, &split.train_indices);
                let test_texts = select_texts(texts, &split.test_indices);
                let train_labels = labels.select(Axis(0), &split.train_indices);
                let test_labels = labels.select(Axis(0), &split.test_indices);

                let mut pipeline = TriagePipeline::new(params.clone());
                pipeline.fit(&train_texts, &train_labels)?;
                let predicted = pipeline.predict(&test_texts)?;
                scores.push(subset_accuracy(&test_labels, &predicted)?);
            }

            let cv = CVResults::from_scores(scores);
            info!(
                candidate = candidate_idx,
                ngram_range = ?params.ngram_range,
                mean_score = cv.mean_score,
                std_score = cv.std_score,
                elapsed = ?start.elapsed(),
                "Grid candidate scored"
            );
            results.push(CandidateResult { params, cv });
        }

        // strict comparison keeps the earliest candidate on ties
        let mut best_index = 0;
        for (idx, result) in results.iter().enumerate() {
            if result.cv.mean_score > results[best_index].cv.mean_score {
                best_index = idx;
            }
        }

        let best_params = results[best_index].params.clone();
        info!(ngram_range = ?best_params.ngram_range, "Refitting best candidate");

        self.results = results;
        self.best_index = Some(best_index);

        let mut best = TriagePipeline::new(best_params).with_category_names(self.category_names.clone());
        best.fit(texts, labels)?;
        Ok(best)
    }

    /// Scores of every candidate, in grid order
    pub fn results(&self) -> &[CandidateResult] {
        &self.results
    }

    pub fn best_params(&self) -> Option<&PipelineConfig> {
        self.best_index.map(|idx| &self.results[idx].params)
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best_index.map(|idx| self.results[idx].cv.mean_score)
    }
}

fn select_texts(texts: &[String], indices: &[usize]) -> Vec<String> {
    indices.iter().map(|&i| texts[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_candidates() {
        let base = PipelineConfig::default().with_n_estimators(7);
        let candidates = ParamGrid::default().candidates(&base);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].ngram_range, (1, 1));
        assert_eq!(candidates[1].ngram_range, (1, 2));
        assert!(candidates.iter().all(|c| c.n_estimators == 7));
    }

    #[test]
    fn test_search_records_every_candidate() {
        let texts: Vec<String> = [
            "water needed", "clean water", "water shortage", "drinking water",
            "storm damage", "storm warning", "severe storm", "storm surge",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let labels = array![[1.0], [1.0], [1.0], [1.0], [0.0], [0.0], [0.0], [0.0]];

        let base = PipelineConfig::default().with_n_estimators(5).with_random_state(11);
        let mut search = GridSearchCV::new(base, ParamGrid::default()).with_cv(2);
        let best = search.fit(&texts, &labels).unwrap();

        assert_eq!(search.results().len(), 2);
        assert!(search.best_params().is_some());
        assert!(search.best_score().unwrap() >= 0.0);
        assert!(best.is_fitted());
        assert_eq!(best.predict(&texts).unwrap().dim(), (8, 1));
    }

    #[test]
    fn test_empty_grid() {
        let mut search = GridSearchCV::new(PipelineConfig::default(), ParamGrid::new(vec![]));
        let result = search.fit(&["a b".to_string(), "c d".to_string()], &array![[0.0], [1.0]]);
        assert!(matches!(result, Err(TriageError::ConfigError(_))));
    }
}
