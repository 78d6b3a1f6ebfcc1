//! Gradient boosted tree classifier read from XGBoost's JSON model format.

use super::tree::{RawTree, Tree};
use super::{Classifier, InferenceError, ModelLoadError};
use crate::applicant::{FeatureRow, FEATURE_COUNT, FEATURE_NAMES};
use crate::applicant::schema::FEATURE_KINDS;
use serde::{Deserialize, Serialize};

const SUPPORTED_OBJECTIVES: [&str; 2] = ["binary:logistic", "reg:logistic"];

#[derive(Debug, Deserialize)]
struct RawModel {
    learner: RawLearner,
    #[serde(default)]
    version: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct RawLearner {
    #[serde(default)]
    feature_names: Vec<String>,
    #[serde(default)]
    feature_types: Vec<String>,
    gradient_booster: RawGradientBooster,
    learner_model_param: RawLearnerParam,
    objective: RawObjective,
}

#[derive(Debug, Deserialize)]
struct RawGradientBooster {
    name: String,
    #[serde(default)]
    model: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawTreeModel {
    trees: Vec<RawTree>,
    #[serde(default)]
    tree_info: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct RawLearnerParam {
    base_score: String,
    #[serde(default)]
    num_class: Option<String>,
    num_feature: String,
}

#[derive(Debug, Deserialize)]
struct RawObjective {
    name: String,
}

/// Descriptive metadata for a loaded model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub booster: String,
    pub objective: String,
    pub trees: usize,
    pub nodes: usize,
    pub categorical_splits: usize,
    pub base_score: f64,
    pub feature_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xgboost_version: Option<String>,
}

/// Binary classifier summing the leaves of a tree ensemble into a logistic margin.
#[derive(Debug, Clone)]
pub struct GradientBoostedClassifier {
    trees: Vec<Tree>,
    base_margin: f64,
    base_score: f64,
    objective: String,
    feature_names: Vec<String>,
    version: Option<String>,
}

impl GradientBoostedClassifier {
    /// Parse a model from JSON text that has already had non-finite literals normalized.
    pub fn from_json_str(raw: &str) -> Result<Self, ModelLoadError> {
        let model: RawModel = serde_json::from_str(raw)?;
        Self::from_raw(model)
    }

    fn from_raw(model: RawModel) -> Result<Self, ModelLoadError> {
        let RawModel { learner, version } = model;

        if learner.gradient_booster.name != "gbtree" {
            return Err(ModelLoadError::Unsupported(format!(
                "booster '{}' (only gbtree is supported)",
                learner.gradient_booster.name
            )));
        }

        let objective = learner.objective.name;
        if !SUPPORTED_OBJECTIVES.contains(&objective.as_str()) {
            return Err(ModelLoadError::Unsupported(format!(
                "objective '{objective}' (expected one of {})",
                SUPPORTED_OBJECTIVES.join(", ")
            )));
        }

        let params = learner.learner_model_param;
        let num_class = params
            .num_class
            .as_deref()
            .map(|value| parse_param::<u32>("num_class", value))
            .transpose()?
            .unwrap_or(0);
        if num_class > 1 {
            return Err(ModelLoadError::Unsupported(format!(
                "{num_class} classes (only binary classifiers are supported)"
            )));
        }

        let num_feature = parse_param::<usize>("num_feature", &params.num_feature)?;
        if num_feature != FEATURE_COUNT {
            return Err(ModelLoadError::SchemaMismatch(format!(
                "model expects {num_feature} features, applicant rows have {FEATURE_COUNT}"
            )));
        }
        check_feature_names(&learner.feature_names)?;
        check_feature_types(&learner.feature_types)?;

        let base_score = parse_base_score(&params.base_score)?;

        let tree_model: RawTreeModel = match learner.gradient_booster.model {
            Some(value) => serde_json::from_value(value)?,
            None => {
                return Err(ModelLoadError::Unsupported(
                    "gbtree booster without a model section".to_string(),
                ))
            }
        };
        if tree_model.tree_info.iter().any(|group| *group != 0) {
            return Err(ModelLoadError::Unsupported(
                "trees assigned to more than one output group".to_string(),
            ));
        }

        let trees = tree_model
            .trees
            .into_iter()
            .enumerate()
            .map(|(tree, raw)| {
                Tree::from_raw(raw).map_err(|reason| ModelLoadError::MalformedTree { tree, reason })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let feature_names = if learner.feature_names.is_empty() {
            FEATURE_NAMES.iter().map(|name| name.to_string()).collect()
        } else {
            learner.feature_names
        };
        let version = (!version.is_empty()).then(|| {
            version
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(".")
        });

        Ok(Self {
            trees,
            base_margin: logit(base_score),
            base_score,
            objective,
            feature_names,
            version,
        })
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            booster: "gbtree".to_string(),
            objective: self.objective.clone(),
            trees: self.trees.len(),
            nodes: self.trees.iter().map(Tree::node_count).sum(),
            categorical_splits: self.trees.iter().map(Tree::categorical_splits).sum(),
            base_score: self.base_score,
            feature_names: self.feature_names.clone(),
            xgboost_version: self.version.clone(),
        }
    }

    /// Raw logistic margin: base margin plus the leaf reached in every tree.
    pub fn margin(&self, row: &FeatureRow) -> f64 {
        let features = row.values().map(|value| value as f32);
        self.trees
            .iter()
            .map(|tree| f64::from(tree.leaf_value(&features)))
            .sum::<f64>()
            + self.base_margin
    }
}

impl Classifier for GradientBoostedClassifier {
    fn predict(&self, row: &FeatureRow) -> Result<u8, InferenceError> {
        let [_, positive] = self.predict_proba(row)?;
        Ok(u8::from(positive > 0.5))
    }

    fn predict_proba(&self, row: &FeatureRow) -> Result<[f64; 2], InferenceError> {
        let margin = self.margin(row);
        if !margin.is_finite() {
            return Err(InferenceError::NonFiniteMargin(margin));
        }
        let positive = sigmoid(margin);
        Ok([1.0 - positive, positive])
    }
}

fn check_feature_names(names: &[String]) -> Result<(), ModelLoadError> {
    if names.is_empty() || names.iter().map(String::as_str).eq(FEATURE_NAMES) {
        return Ok(());
    }
    Err(ModelLoadError::SchemaMismatch(format!(
        "model feature order [{}] differs from [{}]",
        names.join(", "),
        FEATURE_NAMES.join(", ")
    )))
}

fn check_feature_types(types: &[String]) -> Result<(), ModelLoadError> {
    if types.is_empty() {
        return Ok(());
    }
    if types.len() != FEATURE_COUNT {
        return Err(ModelLoadError::SchemaMismatch(format!(
            "model lists {} feature types, expected {FEATURE_COUNT}",
            types.len()
        )));
    }
    for ((name, kind), tag) in FEATURE_NAMES.iter().zip(FEATURE_KINDS).zip(types) {
        if !kind.accepts(tag) {
            return Err(ModelLoadError::SchemaMismatch(format!(
                "feature {name} has type '{tag}', expected {kind:?}"
            )));
        }
    }
    Ok(())
}

fn parse_param<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ModelLoadError> {
    value
        .trim()
        .parse()
        .map_err(|_| ModelLoadError::Unsupported(format!("{name} '{value}' is not a number")))
}

/// `base_score` is stored as a probability, bracketed as a vector by newer releases.
fn parse_base_score(raw: &str) -> Result<f64, ModelLoadError> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let score: f64 = parse_param("base_score", trimmed)?;
    if score > 0.0 && score < 1.0 {
        Ok(score)
    } else {
        Err(ModelLoadError::Unsupported(format!(
            "base_score {score} is not a probability"
        )))
    }
}

fn logit(probability: f64) -> f64 {
    (probability / (1.0 - probability)).ln()
}

fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}
