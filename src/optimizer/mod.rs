//! Hyperparameter search
//!
//! Exhaustive grid search over pipeline hyperparameters with K-fold
//! cross-validation and a final refit of the best candidate.

pub mod grid_search;

pub use grid_search::{CandidateResult, GridSearchCV, ParamGrid};
