//! Command-line entry point for `train_classifier`
//!
//! Loads labeled messages, grid-searches the text pipeline, reports
//! held-out metrics and writes the fitted model.

use anyhow::Context;
use clap::Parser;
use colored::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::evaluation::{evaluate_model, CategoryReport};
use crate::export::save_model;
use crate::optimizer::{CandidateResult, GridSearchCV, ParamGrid};
use crate::training::{train_test_split, TrainingConfig};
use crate::utils::MessageLoader;

pub const USAGE: &str = "Please provide the filepath of the disaster messages database \
as the first argument and the filepath of the model file to save the model to as the \
second argument. \n\nExample: train_classifier ../data/DisasterResponse.db classifier.bin";

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {:<18} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "train_classifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train a multi-label disaster message classifier")]
#[command(long_about = None)]
pub struct Cli {
    /// DATABASE_PATH MODEL_PATH
    #[arg(num_args = 0..)]
    pub paths: Vec<PathBuf>,

    /// JSON training configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Seed for the split, K-fold refits and forests
    #[arg(long)]
    pub seed: Option<u64>,

    /// Grid-search folds
    #[arg(long)]
    pub cv_folds: Option<usize>,

    /// Trees per category forest
    #[arg(long)]
    pub n_estimators: Option<usize>,

    /// Vocabulary cap of the count vectorizer
    #[arg(long)]
    pub max_features: Option<usize>,

    /// Held-out fraction
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Write the evaluation report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Cli {
    /// Defaults, then the config file, then explicit flags
    pub fn training_config(&self) -> anyhow::Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => TrainingConfig::from_json_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => TrainingConfig::default(),
        };

        if let Some(seed) = self.seed {
            config = config.with_random_state(seed);
        }
        if let Some(folds) = self.cv_folds {
            config = config.with_cv_folds(folds);
        }
        if let Some(n) = self.n_estimators {
            config = config.with_n_estimators(n);
        }
        if let Some(n) = self.max_features {
            config = config.with_max_vocab_features(Some(n));
        }
        if let Some(test_size) = self.test_size {
            config = config.with_test_size(test_size);
        }

        config.validate()?;
        Ok(config)
    }
}

/// What a run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Wrong number of positional arguments; usage was printed
    Usage,
    /// A model was trained and saved
    Trained,
}

#[derive(Serialize)]
struct TrainingReport<'a> {
    best_ngram_range: Option<(usize, usize)>,
    best_cv_score: Option<f64>,
    grid: &'a [CandidateResult],
    categories: &'a [CategoryReport],
}

/// Run the training program
pub fn run(cli: &Cli) -> anyhow::Result<RunOutcome> {
    let (database_path, model_path) = match cli.paths.as_slice() {
        [database, model] => (database, model),
        _ => {
            println!("{}", USAGE);
            return Ok(RunOutcome::Usage);
        }
    };

    let config = cli.training_config()?;
    let started = Instant::now();

    println!("Loading data...\n    DATABASE: {}", database_path.display());
    let corpus = MessageLoader::new(config.loader.clone())
        .load(database_path)
        .with_context(|| format!("loading {}", database_path.display()))?;
    let (train_idx, test_idx) = train_test_split(corpus.len(), config.test_size, config.random_state)?;
    let train = corpus.select(&train_idx);
    let test = corpus.select(&test_idx);

    println!("Building model...");
    let mut search = GridSearchCV::new(config.pipeline_config(), ParamGrid::new(config.ngram_grid.clone()))
        .with_cv(config.cv_folds)
        .with_category_names(corpus.category_names.clone());

    println!("Training model...");
    let model = search.fit(&train.messages, &train.labels)?;

    println!("Evaluating model...");
    let reports = evaluate_model(&model, &test.messages, &test.labels, &corpus.category_names)?;

    if let Some(path) = &cli.report {
        write_report(path, &search, &reports)?;
    }

    println!("Saving model...\n    MODEL: {}", model_path.display());
    save_model(&model, model_path).with_context(|| format!("saving {}", model_path.display()))?;

    println!("Trained model saved!");

    section("Summary");
    kv("Messages", &format!("{} train / {} test", train.len(), test.len()));
    kv("Categories", &corpus.n_categories().to_string());
    kv("Vocabulary", &model.vocabulary_size().to_string());
    if let (Some(params), Some(score)) = (search.best_params(), search.best_score()) {
        kv("Best n-grams", &format!("{:?}", params.ngram_range));
        kv("CV subset acc.", &format!("{:.4}", score));
    }
    kv("Time", &format!("{:.1}s", started.elapsed().as_secs_f64()));
    println!();

    Ok(RunOutcome::Trained)
}

fn write_report(path: &Path, search: &GridSearchCV, reports: &[CategoryReport]) -> anyhow::Result<()> {
    let report = TrainingReport {
        best_ngram_range: search.best_params().map(|p| p.ngram_range),
        best_cv_score: search.best_score(),
        grid: search.results(),
        categories: reports,
    };
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positionals_and_flags() {
        let cli = Cli::try_parse_from([
            "train_classifier",
            "data.db",
            "model.bin",
            "--seed",
            "7",
            "--n-estimators",
            "25",
        ])
        .unwrap();

        assert_eq!(cli.paths.len(), 2);
        let config = cli.training_config().unwrap();
        assert_eq!(config.random_state, Some(7));
        assert_eq!(config.n_estimators, 25);
        assert_eq!(config.cv_folds, 5);
    }

    #[test]
    fn test_extra_positionals_parse() {
        let cli = Cli::try_parse_from(["train_classifier", "a", "b", "c"]).unwrap();
        assert_eq!(cli.paths.len(), 3);
    }

    #[test]
    fn test_invalid_flag_value_rejected_by_validation() {
        let cli = Cli::try_parse_from(["train_classifier", "--test-size", "1.5"]).unwrap();
        assert!(cli.training_config().is_err());
    }

    #[test]
    fn test_usage_without_paths() {
        let cli = Cli::try_parse_from(["train_classifier"]).unwrap();
        assert_eq!(run(&cli).unwrap(), RunOutcome::Usage);
    }
}
