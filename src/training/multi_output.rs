//! Multi-output classification: one independent forest per label column

use super::random_forest::RandomForest;
use crate::error::{Result, TriageError};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Fits a clone of the template forest for every label column.
/// All forests share the same input features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiOutputClassifier {
    template: RandomForest,
    estimators: Vec<RandomForest>,
}

impl MultiOutputClassifier {
    pub fn new(template: RandomForest) -> Self {
        Self {
            template,
            estimators: Vec::new(),
        }
    }

    /// Fit one forest per column of `y`
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() != y.nrows() {
            return Err(TriageError::ShapeError {
                expected: format!("{} label rows", x.nrows()),
                actual: format!("{} label rows", y.nrows()),
            });
        }
        if y.ncols() == 0 {
            return Err(TriageError::ValidationError(
                "Multi-output classification needs at least one label column".to_string(),
            ));
        }

        let mut estimators = Vec::with_capacity(y.ncols());
        for (output_idx, column) in y.axis_iter(Axis(1)).enumerate() {
            let mut forest = self.template.clone();
            // distinct but reproducible seed per output
            if let Some(seed) = self.template.random_state {
                forest = forest.with_random_state(seed.wrapping_add(output_idx as u64));
            }

            let column = column.to_owned();
            forest.fit(x, &column)?;

            if forest.classes().len() < 2 {
                warn!(output = output_idx, "Label column has a single class in the training data");
            }
            debug!(output = output_idx, classes = ?forest.classes(), "Fitted output forest");

            estimators.push(forest);
        }

        self.estimators = estimators;
        Ok(self)
    }

    /// Predict every output; the result has one column per fitted forest
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.estimators.is_empty() {
            return Err(TriageError::ModelNotFitted);
        }

        let mut predictions = Array2::zeros((x.nrows(), self.estimators.len()));
        for (output_idx, forest) in self.estimators.iter().enumerate() {
            let column = forest.predict(x)?;
            predictions.column_mut(output_idx).assign(&column);
        }

        Ok(predictions)
    }

    /// Number of fitted outputs
    pub fn n_outputs(&self) -> usize {
        self.estimators.len()
    }

    pub fn estimators(&self) -> &[RandomForest] {
        &self.estimators
    }
}
