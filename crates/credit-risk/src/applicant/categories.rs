use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A closed set of category labels with the integer codes the classifier was trained on.
///
/// Codes follow the lexical ordering of the training labels, which is how the
/// training frame's `category` columns were encoded.
pub trait CategoryField: Copy + Sized + 'static {
    /// Column name of the field in the training schema.
    const FIELD: &'static str;
    /// Every label, in the order a form should offer them.
    const OPTIONS: &'static [Self];

    fn label(self) -> &'static str;
    fn code(self) -> u32;

    fn parse(raw: &str) -> Result<Self, UnknownCategoryError> {
        let needle = raw.trim();
        Self::OPTIONS
            .iter()
            .copied()
            .find(|option| option.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownCategoryError {
                field: Self::FIELD,
                value: raw.to_string(),
            })
    }

    fn from_code(code: u32) -> Option<Self> {
        Self::OPTIONS.iter().copied().find(|option| option.code() == code)
    }
}

macro_rules! category_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => ($label:literal, $code:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl CategoryField for $name {
            const FIELD: &'static str = $field;
            const OPTIONS: &'static [Self] = &[$(Self::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            fn code(self) -> u32 {
                match self {
                    $(Self::$variant => $code),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = UnknownCategoryError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                <Self as CategoryField>::parse(raw)
            }
        }
    };
}

category_enum! {
    /// Housing situation of the applicant.
    HomeOwnership, "person_home_ownership" {
        Rent => ("RENT", 3),
        Own => ("OWN", 2),
        Mortgage => ("MORTGAGE", 0),
        Other => ("OTHER", 1),
    }
}

category_enum! {
    /// Stated purpose of the loan.
    LoanIntent, "loan_intent" {
        Personal => ("PERSONAL", 4),
        Education => ("EDUCATION", 1),
        Medical => ("MEDICAL", 3),
        Venture => ("VENTURE", 5),
        HomeImprovement => ("HOMEIMPROVEMENT", 2),
        DebtConsolidation => ("DEBTCONSOLIDATION", 0),
    }
}

category_enum! {
    /// Lender-assigned loan grade.
    LoanGrade, "loan_grade" {
        A => ("A", 0),
        B => ("B", 1),
        C => ("C", 2),
        D => ("D", 3),
        E => ("E", 4),
        F => ("F", 5),
        G => ("G", 6),
    }
}

category_enum! {
    /// Whether the credit bureau holds a historical default for the applicant.
    PriorDefault, "cb_person_default_on_file" {
        Yes => ("Y", 1),
        No => ("N", 0),
    }
}

/// A category value after the unseen-category policy has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Categorical<T> {
    Known(T),
    /// Label outside the training set, routed to the model's missing-value branch.
    Unseen(String),
}

impl<T: CategoryField> Categorical<T> {
    pub fn known(&self) -> Option<T> {
        match self {
            Categorical::Known(value) => Some(*value),
            Categorical::Unseen(_) => None,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Categorical::Known(value) => value.label(),
            Categorical::Unseen(raw) => raw,
        }
    }

    /// Feature encoding: the training code, or NaN for the missing-value bucket.
    pub fn encode(&self) -> f32 {
        match self {
            Categorical::Known(value) => value.code() as f32,
            Categorical::Unseen(_) => f32::NAN,
        }
    }
}

impl<T: CategoryField> From<T> for Categorical<T> {
    fn from(value: T) -> Self {
        Categorical::Known(value)
    }
}

impl<T: CategoryField> fmt::Display for Categorical<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How labels outside the training vocabulary are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnseenCategoryPolicy {
    #[default]
    Reject,
    MissingBucket,
}

impl UnseenCategoryPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reject" => Some(Self::Reject),
            "missing" | "missing_bucket" => Some(Self::MissingBucket),
            _ => None,
        }
    }

    pub fn resolve<T: CategoryField>(
        self,
        raw: &str,
    ) -> Result<Categorical<T>, UnknownCategoryError> {
        match T::parse(raw) {
            Ok(value) => Ok(Categorical::Known(value)),
            Err(err) => match self {
                Self::Reject => Err(err),
                Self::MissingBucket => {
                    tracing::debug!(
                        field = T::FIELD,
                        value = %raw,
                        "unseen category mapped to missing bucket"
                    );
                    Ok(Categorical::Unseen(raw.trim().to_string()))
                }
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{value}' for {field}")]
pub struct UnknownCategoryError {
    pub field: &'static str,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_lexical_order_of_labels() {
        fn assert_lexical<T: CategoryField>() {
            let mut labels: Vec<&str> = T::OPTIONS.iter().map(|option| option.label()).collect();
            labels.sort_unstable();
            for (expected, label) in labels.iter().enumerate() {
                let value = T::parse(label).expect("label parses");
                assert_eq!(value.code(), expected as u32, "{} code for {label}", T::FIELD);
            }
        }

        assert_lexical::<HomeOwnership>();
        assert_lexical::<LoanIntent>();
        assert_lexical::<LoanGrade>();
        assert_lexical::<PriorDefault>();
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(HomeOwnership::parse(" rent "), Ok(HomeOwnership::Rent));
        assert_eq!(
            "homeimprovement".parse::<LoanIntent>(),
            Ok(LoanIntent::HomeImprovement)
        );
        assert_eq!(PriorDefault::parse("y"), Ok(PriorDefault::Yes));
    }

    #[test]
    fn unknown_label_is_rejected_with_field_name() {
        let err = LoanGrade::parse("H").expect_err("H is not a grade");
        assert_eq!(err.field, "loan_grade");
        assert_eq!(err.value, "H");
        assert_eq!(err.to_string(), "unknown category 'H' for loan_grade");
    }

    #[test]
    fn missing_bucket_policy_keeps_raw_label_and_encodes_nan() {
        let value: Categorical<LoanIntent> = UnseenCategoryPolicy::MissingBucket
            .resolve("WEDDING")
            .expect("missing bucket accepts unseen labels");
        assert_eq!(value, Categorical::Unseen("WEDDING".to_string()));
        assert!(value.encode().is_nan());
        assert!(value.known().is_none());
    }

    #[test]
    fn reject_policy_surfaces_unknown_category() {
        let result: Result<Categorical<LoanIntent>, _> =
            UnseenCategoryPolicy::Reject.resolve("WEDDING");
        assert!(matches!(result, Err(UnknownCategoryError { field: "loan_intent", .. })));
    }

    #[test]
    fn policy_parses_configuration_values() {
        assert_eq!(UnseenCategoryPolicy::parse("Reject"), Some(UnseenCategoryPolicy::Reject));
        assert_eq!(
            UnseenCategoryPolicy::parse("missing"),
            Some(UnseenCategoryPolicy::MissingBucket)
        );
        assert_eq!(UnseenCategoryPolicy::parse("drop"), None);
    }

    #[test]
    fn codes_map_back_to_labels() {
        assert_eq!(LoanGrade::from_code(6), Some(LoanGrade::G));
        assert_eq!(HomeOwnership::from_code(3), Some(HomeOwnership::Rent));
        assert_eq!(PriorDefault::from_code(2), None);
    }
}
