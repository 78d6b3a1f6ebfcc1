use credit_risk::config::ModelConfig;
use credit_risk::error::AppError;
use credit_risk::model::{load_model, shared_model, GradientBoostedClassifier};
use credit_risk::RiskEvaluator;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) evaluator: Arc<RiskEvaluator>,
}

/// How the classifier behind an evaluator is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ModelSource {
    /// Process-wide handle reused by every request.
    Shared,
    /// Fresh load owned by the caller, for one-shot commands.
    Owned,
}

pub(crate) fn apply_model_override(config: &mut ModelConfig, model: Option<PathBuf>) {
    if let Some(path) = model {
        config.path = path;
    }
}

pub(crate) fn build_evaluator(
    config: &ModelConfig,
    source: ModelSource,
) -> Result<RiskEvaluator, AppError> {
    let model: Arc<GradientBoostedClassifier> = match source {
        ModelSource::Shared => shared_model(&config.path)?,
        ModelSource::Owned => Arc::new(load_model(&config.path)?),
    };
    let summary = model.summary();
    Ok(RiskEvaluator::new(model, config.unseen_category).with_summary(summary))
}
