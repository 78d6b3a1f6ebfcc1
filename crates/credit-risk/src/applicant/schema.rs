//! Column layout of the training frame and the one-row feature vector built from a record.
//!
//! The classifier reads features by position, so the order below must match the
//! training schema exactly. A mismatch does not fail loudly; it yields wrong scores.

use super::categories::{CategoryField, HomeOwnership, LoanGrade, LoanIntent, PriorDefault};
use super::record::{ApplicantRecord, ApplicantSubmission};

pub const FEATURE_COUNT: usize = 11;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "person_age",
    "person_income",
    "person_home_ownership",
    "person_emp_length",
    "loan_intent",
    "loan_grade",
    "loan_amnt",
    "loan_int_rate",
    "loan_percent_income",
    "cb_person_default_on_file",
    "cb_person_cred_hist_length",
];

/// Column dtype as recorded by the training frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Integer,
    Float,
    Categorical,
}

pub const FEATURE_KINDS: [FeatureKind; FEATURE_COUNT] = [
    FeatureKind::Integer,
    FeatureKind::Integer,
    FeatureKind::Categorical,
    FeatureKind::Float,
    FeatureKind::Categorical,
    FeatureKind::Categorical,
    FeatureKind::Integer,
    FeatureKind::Float,
    FeatureKind::Float,
    FeatureKind::Categorical,
    FeatureKind::Integer,
];

impl FeatureKind {
    /// Whether a model's stored feature type tag is compatible with this column.
    pub fn accepts(self, tag: &str) -> bool {
        match self {
            FeatureKind::Categorical => tag == "c",
            FeatureKind::Integer | FeatureKind::Float => {
                matches!(tag, "int" | "float" | "i" | "q")
            }
        }
    }
}

/// Positional index of a training column.
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|candidate| *candidate == name)
}

/// One row of model input in training column order.
///
/// Categorical columns carry their training code; the missing-value bucket is NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    values: [f64; FEATURE_COUNT],
}

impl FeatureRow {
    pub fn from_record(record: &ApplicantRecord) -> Self {
        Self {
            values: [
                f64::from(record.age()),
                record.annual_income(),
                f64::from(record.home_ownership().encode()),
                record.employment_length_years(),
                f64::from(record.loan_intent().encode()),
                f64::from(record.loan_grade().encode()),
                record.loan_amount(),
                record.loan_interest_rate(),
                record.loan_percent_income(),
                f64::from(record.prior_default_on_file().encode()),
                f64::from(record.credit_history_length_years()),
            ],
        }
    }

    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|index| self.values[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }

    /// Read the source fields back out of the row, decoding category codes to labels.
    pub fn restore(&self) -> Result<ApplicantSubmission, SchemaError> {
        Ok(ApplicantSubmission {
            age: self.whole(0)?,
            annual_income: self.values[1],
            home_ownership: self.label::<HomeOwnership>(2)?,
            employment_length_years: self.values[3],
            loan_intent: self.label::<LoanIntent>(4)?,
            loan_grade: self.label::<LoanGrade>(5)?,
            loan_amount: self.values[6],
            loan_interest_rate: self.values[7],
            prior_default_on_file: self.label::<PriorDefault>(9)?,
            credit_history_length_years: self.whole(10)?,
        })
    }

    fn whole(&self, index: usize) -> Result<i64, SchemaError> {
        let value = self.values[index];
        if value.is_finite() && value.fract() == 0.0 {
            Ok(value as i64)
        } else {
            Err(SchemaError::NotRepresentable {
                column: FEATURE_NAMES[index],
                value,
            })
        }
    }

    fn label<T: CategoryField>(&self, index: usize) -> Result<String, SchemaError> {
        let value = self.values[index];
        let code = self.whole(index)?;
        u32::try_from(code)
            .ok()
            .and_then(T::from_code)
            .map(|category| category.label().to_string())
            .ok_or(SchemaError::NotRepresentable {
                column: FEATURE_NAMES[index],
                value,
            })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("column {column} holds {value}, which has no applicant value")]
    NotRepresentable { column: &'static str, value: f64 },
}
