//! Model training module
//!
//! Provides the pieces of the message classification pipeline:
//! - Decision trees and Random Forests
//! - Multi-output classification (one forest per category)
//! - Train/test splitting and K-fold cross-validation
//! - The end-to-end text pipeline and its configuration

mod config;
pub mod cross_validation;
pub mod decision_tree;
pub mod multi_output;
pub mod pipeline;
pub mod random_forest;

pub use config::{PipelineConfig, TrainingConfig};
pub use cross_validation::{train_test_split, CVResults, CVSplit, CrossValidator};
pub use decision_tree::{DecisionTree, TreeNode};
pub use multi_output::MultiOutputClassifier;
pub use pipeline::{subset_accuracy, TriagePipeline};
pub use random_forest::{MaxFeatures, RandomForest};
