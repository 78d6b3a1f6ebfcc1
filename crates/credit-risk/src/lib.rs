//! Loan default risk assessment.
//!
//! Validates applicant attributes, adapts them to the feature schema of a pre-trained
//! gradient boosted classifier, and reports a default verdict with its probability.

pub mod applicant;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod telemetry;

pub use applicant::{ApplicantRecord, ApplicantSubmission, UnseenCategoryPolicy};
pub use config::AppConfig;
pub use error::AppError;
pub use evaluation::{EvaluationError, RiskAssessment, RiskEvaluator, RiskVerdict};
pub use model::{Classifier, GradientBoostedClassifier, ModelLoadError};
