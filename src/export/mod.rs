//! Model persistence
//!
//! The fitted pipeline is written as a single bincode file.

mod serializer;

pub use serializer::{load_model, save_model};
