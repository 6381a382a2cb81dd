//! Model evaluation
//!
//! Per-category precision, recall and F1 reports for the held-out split.

pub mod report;

pub use report::{
    category_reports, evaluate_model, AverageMetrics, CategoryReport, ClassMetrics,
    ClassificationReport,
};
