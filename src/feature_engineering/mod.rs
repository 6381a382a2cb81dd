//! Feature engineering module
//!
//! Turns raw message text into numeric features:
//! - Message tokenization (URL placeholders, lemmatization, stop words)
//! - Bag-of-words counting with n-grams
//! - TF-IDF reweighting

pub mod lemmatizer;
pub mod text_features;
pub mod tokenizer;

pub use lemmatizer::Lemmatizer;
pub use text_features::{CountVectorizer, TfidfTransformer};
pub use tokenizer::{is_stop_word, MessageTokenizer, ENGLISH_STOP_WORDS, URL_PLACEHOLDER};
