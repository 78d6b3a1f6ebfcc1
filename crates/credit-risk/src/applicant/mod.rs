//! Applicant attributes, their validation, and the feature row handed to the classifier.

pub mod categories;
pub mod record;
pub mod schema;

pub use categories::{
    Categorical, CategoryField, HomeOwnership, LoanGrade, LoanIntent, PriorDefault,
    UnknownCategoryError, UnseenCategoryPolicy,
};
pub use record::{
    loan_percent_income, ApplicantRecord, ApplicantSubmission, FieldBounds, RecordError,
    ValidationError,
};
pub use schema::{FeatureKind, FeatureRow, SchemaError, FEATURE_COUNT, FEATURE_NAMES};
