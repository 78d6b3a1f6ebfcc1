//! Risk evaluation: applicant submission in, default verdict and probability out.

pub mod router;
pub mod views;

pub use router::evaluation_router;
pub use views::RiskAssessmentView;

use crate::applicant::{
    ApplicantRecord, ApplicantSubmission, FeatureRow, RecordError, UnknownCategoryError,
    UnseenCategoryPolicy, ValidationError,
};
use crate::model::{Classifier, InferenceError, ModelSummary};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Binary outcome predicted for an applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskVerdict {
    Default,
    PaidOff,
}

impl RiskVerdict {
    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            1 => Some(Self::Default),
            0 => Some(Self::PaidOff),
            _ => None,
        }
    }

    pub fn label(self) -> u8 {
        match self {
            Self::Default => 1,
            Self::PaidOff => 0,
        }
    }

    pub fn risk_band(self) -> &'static str {
        match self {
            Self::Default => "HIGH RISK",
            Self::PaidOff => "LOW RISK",
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            Self::Default => "HIGH RISK: The AI predicts this applicant will DEFAULT.",
            Self::PaidOff => "LOW RISK: The AI predicts this applicant will PAY OFF the loan.",
        }
    }
}

impl fmt::Display for RiskVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("DEFAULT"),
            Self::PaidOff => f.write_str("PAID_OFF"),
        }
    }
}

/// Outcome of a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskAssessment {
    pub verdict: RiskVerdict,
    /// Positive-class probability in `[0, 1]`.
    pub default_probability: f64,
    pub loan_percent_income: f64,
}

impl RiskAssessment {
    pub fn probability_percent(&self) -> f64 {
        self.default_probability * 100.0
    }

    pub fn probability_line(&self) -> String {
        format!(
            "Probability of Default: {:.2}%",
            self.probability_percent()
        )
    }

    pub fn ratio_line(&self) -> String {
        format!(
            "Calculated Debt-to-Income Ratio: {:.2}",
            self.loan_percent_income
        )
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {:.2}% probability of default",
            self.verdict.risk_band(),
            self.probability_percent()
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Validation(ValidationError),
    #[error(transparent)]
    UnknownCategory(UnknownCategoryError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("classifier returned unexpected label {0}")]
    UnexpectedLabel(u8),
    #[error("classifier returned invalid default probability {0}")]
    InvalidProbability(f64),
}

impl EvaluationError {
    /// Errors caused by the submitted data rather than the model.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            EvaluationError::Validation(_) | EvaluationError::UnknownCategory(_)
        )
    }
}

impl From<RecordError> for EvaluationError {
    fn from(value: RecordError) -> Self {
        match value {
            RecordError::Validation(err) => Self::Validation(err),
            RecordError::UnknownCategory(err) => Self::UnknownCategory(err),
        }
    }
}

/// Scores applicants against a shared, read-only classifier.
pub struct RiskEvaluator {
    classifier: Arc<dyn Classifier>,
    policy: UnseenCategoryPolicy,
    summary: Option<ModelSummary>,
}

impl RiskEvaluator {
    pub fn new(classifier: Arc<dyn Classifier>, policy: UnseenCategoryPolicy) -> Self {
        Self {
            classifier,
            policy,
            summary: None,
        }
    }

    /// Attach descriptive metadata about the classifier for reporting.
    pub fn with_summary(mut self, summary: ModelSummary) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn policy(&self) -> UnseenCategoryPolicy {
        self.policy
    }

    pub fn model_summary(&self) -> Option<&ModelSummary> {
        self.summary.as_ref()
    }

    pub fn evaluate(
        &self,
        submission: &ApplicantSubmission,
    ) -> Result<RiskAssessment, EvaluationError> {
        let record = ApplicantRecord::from_submission(submission, self.policy)?;
        self.evaluate_record(&record)
    }

    pub fn evaluate_record(
        &self,
        record: &ApplicantRecord,
    ) -> Result<RiskAssessment, EvaluationError> {
        let row = FeatureRow::from_record(record);

        let label = self.classifier.predict(&row)?;
        let verdict = RiskVerdict::from_label(label).ok_or(EvaluationError::UnexpectedLabel(label))?;

        let [_, default_probability] = self.classifier.predict_proba(&row)?;
        if !(0.0..=1.0).contains(&default_probability) {
            return Err(EvaluationError::InvalidProbability(default_probability));
        }

        let assessment = RiskAssessment {
            verdict,
            default_probability,
            loan_percent_income: record.loan_percent_income(),
        };
        debug!(
            verdict = %assessment.verdict,
            probability_percent = assessment.probability_percent(),
            loan_percent_income = assessment.loan_percent_income,
            "applicant evaluated"
        );
        Ok(assessment)
    }
}
