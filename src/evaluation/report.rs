//! Per-category classification reports

use crate::error::{Result, TriageError};
use crate::training::TriagePipeline;
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

const DIGITS: usize = 2;

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Averaged precision, recall and F1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Text classification report for one label column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// One entry per class present in the truth or the prediction, ascending
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    /// Total number of rows
    pub support: usize,
}

impl ClassificationReport {
    /// Compare true and predicted labels. Zero divisions yield 0.0.
    pub fn compute(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(TriageError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }

        let mut labels: Vec<f64> = y_true.iter().chain(y_pred.iter()).copied().collect();
        labels.sort_by(|a, b| a.total_cmp(b));
        labels.dedup();

        let n = y_true.len();
        let classes: Vec<ClassMetrics> = labels
            .iter()
            .map(|&label| {
                let mut tp = 0usize;
                let mut fp = 0usize;
                let mut fn_ = 0usize;
                for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
                    match (t == label, p == label) {
                        (true, true) => tp += 1,
                        (false, true) => fp += 1,
                        (true, false) => fn_ += 1,
                        (false, false) => {}
                    }
                }

                let precision = ratio(tp, tp + fp);
                let recall = ratio(tp, tp + fn_);
                let f1_score = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                ClassMetrics {
                    label: format_label(label),
                    precision,
                    recall,
                    f1_score,
                    support: tp + fn_,
                }
            })
            .collect();

        let correct = y_true.iter().zip(y_pred.iter()).filter(|(t, p)| t == p).count();
        let accuracy = ratio(correct, n);

        let n_classes = classes.len().max(1) as f64;
        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            f1_score: classes.iter().map(|c| c.f1_score).sum::<f64>() / n_classes,
        };

        let total = n.max(1) as f64;
        let weighted = |f: fn(&ClassMetrics) -> f64| {
            classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1_score: weighted(|c| c.f1_score),
        };

        Ok(Self {
            classes,
            accuracy,
            macro_avg,
            weighted_avg,
            support: n,
        })
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn format_label(label: f64) -> String {
    if label.fract() == 0.0 && label.is_finite() {
        format!("{}", label as i64)
    } else {
        format!("{}", label)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support",
            width = width
        )?;
        writeln!(f)?;

        for class in &self.classes {
            writeln!(
                f,
                "{:>width$}  {:>9.d$} {:>9.d$} {:>9.d$} {:>9}",
                class.label, class.precision, class.recall, class.f1_score, class.support,
                width = width,
                d = DIGITS
            )?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.d$} {:>9}",
            "accuracy", "", "", self.accuracy, self.support,
            width = width,
            d = DIGITS
        )?;

        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$}  {:>9.d$} {:>9.d$} {:>9.d$} {:>9}",
                name, avg.precision, avg.recall, avg.f1_score, self.support,
                width = width,
                d = DIGITS
            )?;
        }

        Ok(())
    }
}

/// Report for one category of a multi-label model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: String,
    pub report: ClassificationReport,
}

impl fmt::Display for CategoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.category, self.report)
    }
}

/// Build one report per label column. Columns of `y_true` and `y_pred`
/// line up with `category_names`.
pub fn category_reports(
    y_true: &Array2<f64>,
    y_pred: &Array2<f64>,
    category_names: &[String],
) -> Result<Vec<CategoryReport>> {
    if y_true.dim() != y_pred.dim() {
        return Err(TriageError::ShapeError {
            expected: format!("{:?}", y_true.dim()),
            actual: format!("{:?}", y_pred.dim()),
        });
    }
    if y_true.ncols() != category_names.len() {
        return Err(TriageError::ShapeError {
            expected: format!("{} category names", y_true.ncols()),
            actual: format!("{} category names", category_names.len()),
        });
    }

    y_true
        .axis_iter(Axis(1))
        .zip(y_pred.axis_iter(Axis(1)))
        .zip(category_names)
        .map(|((truth, predicted), name)| {
            Ok(CategoryReport {
                category: name.clone(),
                report: ClassificationReport::compute(truth, predicted)?,
            })
        })
        .collect()
}

/// Predict the held-out rows and print a report for every category
pub fn evaluate_model(
    model: &TriagePipeline,
    x_test: &[String],
    y_test: &Array2<f64>,
    category_names: &[String],
) -> Result<Vec<CategoryReport>> {
    let y_pred = model.predict(x_test)?;
    let reports = category_reports(y_test, &y_pred, category_names)?;

    for report in &reports {
        println!("{}", report);
    }

    let mean_f1 = reports
        .iter()
        .map(|r| r.report.weighted_avg.f1_score)
        .sum::<f64>()
        / reports.len().max(1) as f64;
    info!(
        categories = reports.len(),
        rows = x_test.len(),
        mean_weighted_f1 = mean_f1,
        "Evaluation finished"
    );

    Ok(reports)
}
