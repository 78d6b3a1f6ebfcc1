//! Pre-trained classifier artifacts and the capability the evaluator scores against.

pub mod booster;
pub mod loader;
pub mod tree;

pub use booster::{GradientBoostedClassifier, ModelSummary};
pub use loader::{load_model, shared_model};

use crate::applicant::FeatureRow;
use std::path::PathBuf;

/// A fitted binary classifier over applicant feature rows.
///
/// Implementations are immutable once loaded, so a single instance can be shared
/// across any number of concurrent evaluations.
pub trait Classifier: Send + Sync {
    /// Class label: `1` for default, `0` for paid off.
    fn predict(&self, row: &FeatureRow) -> Result<u8, InferenceError>;

    /// `[p_class0, p_class1]`.
    fn predict_proba(&self, row: &FeatureRow) -> Result<[f64; 2], InferenceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("unable to read model artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact is not valid XGBoost JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported model: {0}")]
    Unsupported(String),
    #[error("model schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("tree {tree} is malformed: {reason}")]
    MalformedTree { tree: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("classifier produced a non-finite margin ({0})")]
    NonFiniteMargin(f64),
}
