use super::categories::{
    Categorical, CategoryField, HomeOwnership, LoanGrade, LoanIntent, PriorDefault,
    UnknownCategoryError, UnseenCategoryPolicy,
};
use serde::{Deserialize, Serialize};

/// Inclusive bounds for a numeric applicant attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBounds {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
}

pub const AGE: FieldBounds = FieldBounds {
    field: "age",
    min: 18.0,
    max: 100.0,
};
pub const ANNUAL_INCOME: FieldBounds = FieldBounds {
    field: "annual_income",
    min: 0.0,
    max: 5_000_000.0,
};
pub const EMPLOYMENT_LENGTH: FieldBounds = FieldBounds {
    field: "employment_length_years",
    min: 0.0,
    max: 50.0,
};
pub const LOAN_AMOUNT: FieldBounds = FieldBounds {
    field: "loan_amount",
    min: 500.0,
    max: 50_000.0,
};
pub const INTEREST_RATE: FieldBounds = FieldBounds {
    field: "loan_interest_rate",
    min: 1.0,
    max: 30.0,
};
pub const CREDIT_HISTORY_LENGTH: FieldBounds = FieldBounds {
    field: "credit_history_length_years",
    min: 0.0,
    max: 30.0,
};

impl FieldBounds {
    fn check(&self, value: f64) -> Result<f64, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field: self.field });
        }
        if value < self.min || value > self.max {
            return Err(ValidationError::OutOfRange {
                field: self.field,
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(value)
    }

    fn check_whole(&self, value: i64) -> Result<u8, ValidationError> {
        let checked = self.check(value as f64)?;
        Ok(checked as u8)
    }
}

/// Raw applicant input as supplied by the form, the JSON API or the CLI.
///
/// Numbers are kept wide and categories as strings so that bad input is reported
/// by range validation and the unseen-category policy instead of a parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantSubmission {
    #[serde(alias = "person_age")]
    pub age: i64,
    #[serde(alias = "person_income")]
    pub annual_income: f64,
    #[serde(alias = "person_home_ownership")]
    pub home_ownership: String,
    #[serde(alias = "person_emp_length")]
    pub employment_length_years: f64,
    pub loan_intent: String,
    pub loan_grade: String,
    #[serde(alias = "loan_amnt")]
    pub loan_amount: f64,
    #[serde(alias = "loan_int_rate")]
    pub loan_interest_rate: f64,
    #[serde(alias = "cb_person_default_on_file")]
    pub prior_default_on_file: String,
    #[serde(alias = "cb_person_cred_hist_length")]
    pub credit_history_length_years: i64,
}

impl Default for ApplicantSubmission {
    /// The values the assessment form starts out with.
    fn default() -> Self {
        Self {
            age: 25,
            annual_income: 50_000.0,
            home_ownership: HomeOwnership::Rent.label().to_string(),
            employment_length_years: 2.0,
            loan_intent: LoanIntent::Personal.label().to_string(),
            loan_grade: LoanGrade::A.label().to_string(),
            loan_amount: 10_000.0,
            loan_interest_rate: 10.5,
            prior_default_on_file: PriorDefault::Yes.label().to_string(),
            credit_history_length_years: 3,
        }
    }
}

/// A validated applicant, ready to be adapted to the model's feature schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicantRecord {
    age: u8,
    annual_income: f64,
    home_ownership: Categorical<HomeOwnership>,
    employment_length_years: f64,
    loan_intent: Categorical<LoanIntent>,
    loan_grade: Categorical<LoanGrade>,
    loan_amount: f64,
    loan_interest_rate: f64,
    prior_default_on_file: Categorical<PriorDefault>,
    credit_history_length_years: u8,
}

impl ApplicantRecord {
    /// Validate a submission, applying `policy` to category labels outside the training set.
    pub fn from_submission(
        submission: &ApplicantSubmission,
        policy: UnseenCategoryPolicy,
    ) -> Result<Self, RecordError> {
        Ok(Self {
            age: AGE.check_whole(submission.age)?,
            annual_income: ANNUAL_INCOME.check(submission.annual_income)?,
            home_ownership: policy.resolve(&submission.home_ownership)?,
            employment_length_years: EMPLOYMENT_LENGTH.check(submission.employment_length_years)?,
            loan_intent: policy.resolve(&submission.loan_intent)?,
            loan_grade: policy.resolve(&submission.loan_grade)?,
            loan_amount: LOAN_AMOUNT.check(submission.loan_amount)?,
            loan_interest_rate: INTEREST_RATE.check(submission.loan_interest_rate)?,
            prior_default_on_file: policy.resolve(&submission.prior_default_on_file)?,
            credit_history_length_years: CREDIT_HISTORY_LENGTH
                .check_whole(submission.credit_history_length_years)?,
        })
    }

    pub fn age(&self) -> u8 {
        self.age
    }

    pub fn annual_income(&self) -> f64 {
        self.annual_income
    }

    pub fn home_ownership(&self) -> &Categorical<HomeOwnership> {
        &self.home_ownership
    }

    pub fn employment_length_years(&self) -> f64 {
        self.employment_length_years
    }

    pub fn loan_intent(&self) -> &Categorical<LoanIntent> {
        &self.loan_intent
    }

    pub fn loan_grade(&self) -> &Categorical<LoanGrade> {
        &self.loan_grade
    }

    pub fn loan_amount(&self) -> f64 {
        self.loan_amount
    }

    pub fn loan_interest_rate(&self) -> f64 {
        self.loan_interest_rate
    }

    pub fn prior_default_on_file(&self) -> &Categorical<PriorDefault> {
        &self.prior_default_on_file
    }

    pub fn credit_history_length_years(&self) -> u8 {
        self.credit_history_length_years
    }

    /// Loan amount relative to annual income, always derived from the source fields.
    pub fn loan_percent_income(&self) -> f64 {
        loan_percent_income(self.loan_amount, self.annual_income)
    }

    /// Render the record back into its wire shape.
    pub fn to_submission(&self) -> ApplicantSubmission {
        ApplicantSubmission {
            age: i64::from(self.age),
            annual_income: self.annual_income,
            home_ownership: self.home_ownership.label().to_string(),
            employment_length_years: self.employment_length_years,
            loan_intent: self.loan_intent.label().to_string(),
            loan_grade: self.loan_grade.label().to_string(),
            loan_amount: self.loan_amount,
            loan_interest_rate: self.loan_interest_rate,
            prior_default_on_file: self.prior_default_on_file.label().to_string(),
            credit_history_length_years: i64::from(self.credit_history_length_years),
        }
    }
}

/// `loan_amount / annual_income`, or `0.0` when there is no income to divide by.
pub fn loan_percent_income(loan_amount: f64, annual_income: f64) -> f64 {
    if annual_income > 0.0 {
        loan_amount / annual_income
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::OutOfRange { field, .. } | ValidationError::NotFinite { field } => {
                *field
            }
        }
    }
}

/// Reasons a submission cannot become an [`ApplicantRecord`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(submission: &ApplicantSubmission) -> Result<ApplicantRecord, RecordError> {
        ApplicantRecord::from_submission(submission, UnseenCategoryPolicy::Reject)
    }

    #[test]
    fn default_submission_is_valid() {
        let record = record(&ApplicantSubmission::default()).expect("defaults validate");
        assert_eq!(record.age(), 25);
        assert_eq!(record.home_ownership().known(), Some(HomeOwnership::Rent));
        assert_eq!(record.prior_default_on_file().known(), Some(PriorDefault::Yes));
        assert!((record.loan_percent_income() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn age_bounds_are_inclusive() {
        for age in [18, 100] {
            let submission = ApplicantSubmission {
                age,
                ..ApplicantSubmission::default()
            };
            assert!(record(&submission).is_ok(), "age {age} should be accepted");
        }

        for age in [17, 101] {
            let submission = ApplicantSubmission {
                age,
                ..ApplicantSubmission::default()
            };
            match record(&submission) {
                Err(RecordError::Validation(err)) => assert_eq!(err.field(), "age"),
                other => panic!("expected validation error for age {age}, got {other:?}"),
            }
        }
    }

    #[test]
    fn numeric_bounds_are_inclusive_for_every_field() {
        let accepted = [
            ApplicantSubmission {
                annual_income: 5_000_000.0,
                ..ApplicantSubmission::default()
            },
            ApplicantSubmission {
                credit_history_length_years: 30,
                ..ApplicantSubmission::default()
            },
            ApplicantSubmission {
                credit_history_length_years: 0,
                ..ApplicantSubmission::default()
            },
            ApplicantSubmission {
                employment_length_years: 50.0,
                ..ApplicantSubmission::default()
            },
            ApplicantSubmission {
                loan_interest_rate: 1.0,
                ..ApplicantSubmission::default()
            },
            ApplicantSubmission {
                loan_interest_rate: 30.0,
                ..ApplicantSubmission::default()
            },
            ApplicantSubmission {
                loan_amount: 500.0,
                ..ApplicantSubmission::default()
            },
            ApplicantSubmission {
                loan_amount: 50_000.0,
                ..ApplicantSubmission::default()
            },
        ];
        for submission in &accepted {
            assert!(record(submission).is_ok(), "{submission:?} should be accepted");
        }

        let rejected = [
            (
                ApplicantSubmission {
                    annual_income: 5_000_001.0,
                    ..ApplicantSubmission::default()
                },
                "annual_income",
            ),
            (
                ApplicantSubmission {
                    annual_income: -1.0,
                    ..ApplicantSubmission::default()
                },
                "annual_income",
            ),
            (
                ApplicantSubmission {
                    credit_history_length_years: 31,
                    ..ApplicantSubmission::default()
                },
                "credit_history_length_years",
            ),
            (
                ApplicantSubmission {
                    employment_length_years: 50.1,
                    ..ApplicantSubmission::default()
                },
                "employment_length_years",
            ),
            (
                ApplicantSubmission {
                    loan_interest_rate: 0.99,
                    ..ApplicantSubmission::default()
                },
                "loan_interest_rate",
            ),
            (
                ApplicantSubmission {
                    loan_interest_rate: 30.01,
                    ..ApplicantSubmission::default()
                },
                "loan_interest_rate",
            ),
            (
                ApplicantSubmission {
                    loan_amount: 50_000.5,
                    ..ApplicantSubmission::default()
                },
                "loan_amount",
            ),
        ];
        for (submission, field) in &rejected {
            match record(submission) {
                Err(RecordError::Validation(err)) => assert_eq!(err.field(), *field),
                other => panic!("expected {field} to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn out_of_range_message_names_bounds() {
        let submission = ApplicantSubmission {
            loan_amount: 499.0,
            ..ApplicantSubmission::default()
        };
        let err = record(&submission).expect_err("loan below minimum");
        assert_eq!(
            err.to_string(),
            "loan_amount must be between 500 and 50000 (got 499)"
        );
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let submission = ApplicantSubmission {
            loan_interest_rate: f64::NAN,
            ..ApplicantSubmission::default()
        };
        assert_eq!(
            record(&submission),
            Err(RecordError::Validation(ValidationError::NotFinite {
                field: "loan_interest_rate"
            }))
        );
    }

    #[test]
    fn zero_income_yields_zero_ratio() {
        assert_eq!(loan_percent_income(10_000.0, 0.0), 0.0);
        assert_eq!(loan_percent_income(50_000.0, 0.0), 0.0);

        let submission = ApplicantSubmission {
            annual_income: 0.0,
            loan_amount: 10_000.0,
            ..ApplicantSubmission::default()
        };
        let record = record(&submission).expect("zero income is within range");
        assert_eq!(record.loan_percent_income(), 0.0);
    }

    #[test]
    fn unknown_category_surfaces_under_reject_policy() {
        let submission = ApplicantSubmission {
            home_ownership: "SQUAT".to_string(),
            ..ApplicantSubmission::default()
        };
        match record(&submission) {
            Err(RecordError::UnknownCategory(err)) => {
                assert_eq!(err.field, "person_home_ownership");
                assert_eq!(err.value, "SQUAT");
            }
            other => panic!("expected unknown category, got {other:?}"),
        }
    }

    #[test]
    fn to_submission_preserves_values() {
        let submission = ApplicantSubmission {
            age: 41,
            annual_income: 83_250.5,
            home_ownership: "mortgage".to_string(),
            employment_length_years: 12.5,
            loan_intent: "VENTURE".to_string(),
            loan_grade: "C".to_string(),
            loan_amount: 24_000.0,
            loan_interest_rate: 13.49,
            prior_default_on_file: "N".to_string(),
            credit_history_length_years: 17,
        };
        let round_trip = record(&submission).expect("valid").to_submission();
        assert_eq!(
            round_trip,
            ApplicantSubmission {
                home_ownership: "MORTGAGE".to_string(),
                ..submission
            }
        );
    }

    #[test]
    fn submission_accepts_training_column_names() {
        let payload = serde_json::json!({
            "person_age": 30,
            "person_income": 72000,
            "person_home_ownership": "OWN",
            "person_emp_length": 4.0,
            "loan_intent": "MEDICAL",
            "loan_grade": "B",
            "loan_amnt": 8000,
            "loan_int_rate": 11.2,
            "cb_person_default_on_file": "N",
            "cb_person_cred_hist_length": 6
        });
        let submission: ApplicantSubmission =
            serde_json::from_value(payload).expect("aliases deserialize");
        assert_eq!(submission.age, 30);
        assert_eq!(submission.loan_amount, 8000.0);
        assert_eq!(submission.credit_history_length_years, 6);
    }
}
