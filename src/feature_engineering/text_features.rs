//! Text feature extraction

use super::tokenizer::MessageTokenizer;
use crate::error::{Result, TriageError};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Count-based text vectorizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountVectorizer {
    tokenizer: MessageTokenizer,
    vocabulary: HashMap<String, usize>,
    max_features: Option<usize>,
    min_df: usize,
    max_df: f64,
    ngram_range: (usize, usize),
}

impl CountVectorizer {
    pub fn new() -> Self {
        Self {
            tokenizer: MessageTokenizer::new(),
            vocabulary: HashMap::new(),
            max_features: None,
            min_df: 1,
            max_df: 1.0,
            ngram_range: (1, 1),
        }
    }

    pub fn with_max_features(mut self, n: usize) -> Self {
        self.max_features = Some(n);
        self
    }

    pub fn with_ngram_range(mut self, min: usize, max: usize) -> Self {
        self.ngram_range = (min.max(1), max.max(min.max(1)));
        self
    }

    pub fn with_min_df(mut self, min_df: usize) -> Self {
        self.min_df = min_df.max(1);
        self
    }

    /// Fraction of documents above which a term is ignored
    pub fn with_max_df(mut self, max_df: f64) -> Self {
        self.max_df = max_df.clamp(0.0, 1.0);
        self
    }

    pub fn ngram_range(&self) -> (usize, usize) {
        self.ngram_range
    }

    fn generate_ngrams(&self, tokens: &[String]) -> Vec<String> {
        let mut ngrams = Vec::new();

        for n in self.ngram_range.0..=self.ngram_range.1 {
            if tokens.len() >= n {
                for window in tokens.windows(n) {
                    ngrams.push(window.join(" "));
                }
            }
        }

        ngrams
    }

    fn analyze(&self, document: &str) -> Vec<String> {
        let tokens = self.tokenizer.tokenize(document);
        self.generate_ngrams(&tokens)
    }

    pub fn fit(&mut self, documents: &[String]) -> Result<()> {
        let n_docs = documents.len();
        let max_df_count = (self.max_df * n_docs as f64).floor() as usize;

        let analyzed: Vec<Vec<String>> = documents.par_iter().map(|doc| self.analyze(doc)).collect();

        // BTreeMap keeps terms in alphabetical order for stable indices
        let mut stats: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for ngrams in &analyzed {
            let mut seen: HashSet<&str> = HashSet::new();
            for ngram in ngrams {
                let entry = stats.entry(ngram.clone()).or_insert((0, 0));
                entry.0 += 1;
                if seen.insert(ngram.as_str()) {
                    entry.1 += 1;
                }
            }
        }

        let mut filtered: Vec<(String, usize)> = stats
            .into_iter()
            .filter(|(_, (_, df))| *df >= self.min_df && *df <= max_df_count.max(1))
            .map(|(term, (count, _))| (term, count))
            .collect();

        if let Some(max_n) = self.max_features {
            if filtered.len() > max_n {
                // highest corpus count first, alphabetical among ties
                filtered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                filtered.truncate(max_n);
                filtered.sort_by(|a, b| a.0.cmp(&b.0));
            }
        }

        if filtered.is_empty() {
            return Err(TriageError::ValidationError(
                "empty vocabulary; perhaps the documents only contain stop words".to_string(),
            ));
        }

        self.vocabulary = filtered
            .into_iter()
            .enumerate()
            .map(|(idx, (term, _))| (term, idx))
            .collect();

        debug!(
            n_docs,
            vocabulary_size = self.vocabulary.len(),
            ngram_range = ?self.ngram_range,
            "Fitted count vectorizer"
        );

        Ok(())
    }

    pub fn transform(&self, documents: &[String]) -> Result<Array2<f64>> {
        if self.vocabulary.is_empty() {
            return Err(TriageError::ModelNotFitted);
        }

        let n_docs = documents.len();
        let n_features = self.vocabulary.len();
        let mut result = Array2::zeros((n_docs, n_features));

        result
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(documents.par_iter())
            .for_each(|(mut row, doc)| {
                for ngram in self.analyze(doc) {
                    if let Some(&idx) = self.vocabulary.get(&ngram) {
                        row[idx] += 1.0;
                    }
                }
            });

        Ok(result)
    }

    pub fn fit_transform(&mut self, documents: &[String]) -> Result<Array2<f64>> {
        self.fit(documents)?;
        self.transform(documents)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn get_feature_names(&self) -> Vec<String> {
        let mut names = vec![String::new(); self.vocabulary.len()];
        for (term, &idx) in &self.vocabulary {
            names[idx] = term.clone();
        }
        names
    }
}

impl Default for CountVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

/// TF-IDF reweighting of a count matrix.
///
/// Uses smooth idf `ln((1 + n) / (1 + df)) + 1` and L2-normalized rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfTransformer {
    idf: Option<Array1<f64>>,
    sublinear_tf: bool,
}

impl TfidfTransformer {
    pub fn new() -> Self {
        Self {
            idf: None,
            sublinear_tf: false,
        }
    }

    /// Replace raw counts with `1 + ln(count)`
    pub fn with_sublinear_tf(mut self, sublinear_tf: bool) -> Self {
        self.sublinear_tf = sublinear_tf;
        self
    }

    pub fn idf(&self) -> Option<&Array1<f64>> {
        self.idf.as_ref()
    }

    pub fn fit(&mut self, counts: &Array2<f64>) -> Result<()> {
        let n_docs = counts.nrows() as f64;

        let idf: Array1<f64> = counts
            .axis_iter(Axis(1))
            .map(|column| {
                let df = column.iter().filter(|&&v| v > 0.0).count() as f64;
                ((n_docs + 1.0) / (df + 1.0)).ln() + 1.0
            })
            .collect();

        self.idf = Some(idf);
        Ok(())
    }

    pub fn transform(&self, counts: &Array2<f64>) -> Result<Array2<f64>> {
        let idf = self.idf.as_ref().ok_or(TriageError::ModelNotFitted)?;

        if counts.ncols() != idf.len() {
            return Err(TriageError::ShapeError {
                expected: format!("{} columns", idf.len()),
                actual: format!("{} columns", counts.ncols()),
            });
        }

        let mut tf_matrix = counts.clone();

        if self.sublinear_tf {
            tf_matrix.mapv_inplace(|v| if v > 0.0 { 1.0 + v.ln() } else { 0.0 });
        }

        tf_matrix *= idf;

        tf_matrix
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .for_each(|mut row| {
                let norm: f64 = row.iter().map(|&v| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    row.mapv_inplace(|v| v / norm);
                }
            });

        Ok(tf_matrix)
    }

    pub fn fit_transform(&mut self, counts: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(counts)?;
        self.transform(counts)
    }
}

impl Default for TfidfTransformer {
    fn default() -> Self {
        Self::new()
    }
}
