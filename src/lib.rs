//! Disaster Triage - multi-label classifier for disaster-response messages
//!
//! This crate trains the message triage model end to end:
//! - Load labeled messages from a SQLite database
//! - Tokenize, vectorize and TF-IDF weight the text
//! - Fit one random forest per category, choosing n-grams by grid search
//! - Report per-category precision, recall and F1
//! - Persist the fitted pipeline
//!
//! # Modules
//!
//! - [`utils`] - SQLite message loading
//! - [`feature_engineering`] - Tokenizer, lemmatizer, count vectorizer, TF-IDF
//! - [`training`] - Decision trees, random forests, multi-output pipeline
//! - [`optimizer`] - Grid search with K-fold cross-validation
//! - [`evaluation`] - Classification reports
//! - [`export`] - Model artifact I/O
//! - [`cli`] - The `train_classifier` program

pub mod error;

pub mod feature_engineering;
pub mod training;
pub mod optimizer;
pub mod evaluation;
pub mod export;
pub mod utils;

pub mod cli;

pub use error::{Result, TriageError};
