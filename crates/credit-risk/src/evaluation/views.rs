use super::{RiskAssessment, RiskVerdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JSON shape of an assessment returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessmentView {
    pub verdict: RiskVerdict,
    pub label: u8,
    pub default_probability: f64,
    /// Percentage rounded to two decimals.
    pub probability_percent: f64,
    pub loan_percent_income: f64,
    pub summary: String,
    pub evaluated_at: DateTime<Utc>,
}

impl RiskAssessmentView {
    pub fn new(assessment: &RiskAssessment, evaluated_at: DateTime<Utc>) -> Self {
        Self {
            verdict: assessment.verdict,
            label: assessment.verdict.label(),
            default_probability: assessment.default_probability,
            probability_percent: round_to_cents(assessment.probability_percent()),
            loan_percent_income: assessment.loan_percent_income,
            summary: assessment.summary(),
            evaluated_at,
        }
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn view_rounds_percentage_to_two_decimals() {
        let assessment = RiskAssessment {
            verdict: RiskVerdict::Default,
            default_probability: 0.734_159,
            loan_percent_income: 0.2,
        };
        let evaluated_at = Utc
            .with_ymd_and_hms(2026, 10, 19, 9, 30, 0)
            .single()
            .expect("valid timestamp");
        let view = RiskAssessmentView::new(&assessment, evaluated_at);

        assert_eq!(view.label, 1);
        assert_eq!(view.probability_percent, 73.42);
        assert_eq!(view.summary, "HIGH RISK: 73.42% probability of default");

        let json = serde_json::to_value(&view).expect("serializes");
        assert_eq!(json["verdict"], "DEFAULT");
        assert_eq!(json["evaluated_at"], "2026-10-19T09:30:00Z");
    }
}
