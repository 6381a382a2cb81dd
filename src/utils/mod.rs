//! Utility modules

pub mod data_loader;

pub use data_loader::{LoaderConfig, MessageCorpus, MessageLoader, LABEL_OFFSET};
