//! Server-rendered assessment form.

use credit_risk::applicant::record::{
    AGE, ANNUAL_INCOME, CREDIT_HISTORY_LENGTH, EMPLOYMENT_LENGTH, INTEREST_RATE, LOAN_AMOUNT,
};
use credit_risk::applicant::{
    loan_percent_income, CategoryField, FieldBounds, HomeOwnership, LoanGrade, LoanIntent,
    PriorDefault,
};
use credit_risk::{ApplicantSubmission, RiskAssessment, RiskVerdict};
use std::collections::HashMap;
use std::str::FromStr;

/// Result panel shown under the form.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Outcome<'a> {
    Assessed(&'a RiskAssessment),
    Rejected(&'a str),
    Failed(&'a str),
}

const STYLE: &str = "body{font-family:sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem;color:#1f2933}\
fieldset{border:1px solid #cbd2d9;border-radius:6px;margin-bottom:1rem;display:grid;grid-template-columns:1fr 1fr;gap:.75rem 1.5rem}\
label{display:flex;flex-direction:column;font-size:.9rem;gap:.25rem}\
.info{background:#e6f0ff;padding:.5rem .75rem;border-radius:4px;grid-column:1/-1}\
.panel{padding:1rem;border-radius:6px;margin-top:1.5rem}\
.high{background:#fde8e8;color:#9b1c1c}.low{background:#def7ec;color:#03543f}.error{background:#fdf6b2;color:#723b13}";

pub(crate) fn render_page(submission: &ApplicantSubmission, outcome: Option<Outcome<'_>>) -> String {
    let ratio = loan_percent_income(submission.loan_amount, submission.annual_income);

    let mut html = String::with_capacity(6 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>AI Credit Risk Assessor</title>\n");
    html.push_str(&format!("<style>{STYLE}</style>\n</head>\n<body>\n"));
    html.push_str("<h1>AI Credit Risk Assessor</h1>\n");
    html.push_str(
        "<p>Enter the financial details of the applicant below. The model evaluates the \
         profile and predicts the probability of loan default.</p>\n",
    );
    html.push_str("<form method=\"post\" action=\"/evaluate\">\n");

    html.push_str("<fieldset>\n<legend>Applicant Financial Profile</legend>\n");
    html.push_str(&number_input("age", "Age", &submission.age.to_string(), &AGE, "1"));
    html.push_str(&number_input(
        "annual_income",
        "Annual Income ($)",
        &submission.annual_income.to_string(),
        &ANNUAL_INCOME,
        "any",
    ));
    html.push_str(&number_input(
        "employment_length_years",
        "Employment Length (Years)",
        &submission.employment_length_years.to_string(),
        &EMPLOYMENT_LENGTH,
        "any",
    ));
    html.push_str(&number_input(
        "loan_amount",
        "Loan Amount Requested ($)",
        &submission.loan_amount.to_string(),
        &LOAN_AMOUNT,
        "any",
    ));
    html.push_str(&number_input(
        "loan_interest_rate",
        "Interest Rate (%)",
        &submission.loan_interest_rate.to_string(),
        &INTEREST_RATE,
        "any",
    ));
    html.push_str(&number_input(
        "credit_history_length_years",
        "Credit History Length (Years)",
        &submission.credit_history_length_years.to_string(),
        &CREDIT_HISTORY_LENGTH,
        "1",
    ));
    html.push_str(&format!(
        "<p class=\"info\">Calculated Debt-to-Income Ratio: {ratio:.2}</p>\n"
    ));
    html.push_str("</fieldset>\n");

    html.push_str("<fieldset>\n<legend>Categorical Details</legend>\n");
    html.push_str(&select::<HomeOwnership>(
        "home_ownership",
        "Home Ownership",
        &submission.home_ownership,
    ));
    html.push_str(&select::<LoanIntent>(
        "loan_intent",
        "Loan Purpose",
        &submission.loan_intent,
    ));
    html.push_str(&select::<LoanGrade>(
        "loan_grade",
        "Assigned Loan Grade",
        &submission.loan_grade,
    ));
    html.push_str(&select::<PriorDefault>(
        "prior_default_on_file",
        "Historical Default on File?",
        &submission.prior_default_on_file,
    ));
    html.push_str("</fieldset>\n");
    html.push_str("<button type=\"submit\">Evaluate Risk</button>\n</form>\n");

    if let Some(outcome) = outcome {
        html.push_str(&render_outcome(outcome));
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_outcome(outcome: Outcome<'_>) -> String {
    match outcome {
        Outcome::Assessed(assessment) => {
            let class = match assessment.verdict {
                RiskVerdict::Default => "high",
                RiskVerdict::PaidOff => "low",
            };
            format!(
                "<section class=\"panel {class}\" id=\"verdict\">\n<h2>{}</h2>\n<p><strong>{}</strong></p>\n<p>{}</p>\n</section>\n",
                escape_html(assessment.verdict.headline()),
                escape_html(&assessment.probability_line()),
                escape_html(&assessment.ratio_line()),
            )
        }
        Outcome::Rejected(message) => format!(
            "<section class=\"panel error\" id=\"verdict\">\n<h2>Submission rejected</h2>\n<p>{}</p>\n</section>\n",
            escape_html(message)
        ),
        Outcome::Failed(message) => format!(
            "<section class=\"panel error\" id=\"verdict\">\n<h2>Evaluation unavailable</h2>\n<p>{}</p>\n</section>\n",
            escape_html(message)
        ),
    }
}

fn number_input(name: &str, label: &str, value: &str, bounds: &FieldBounds, step: &str) -> String {
    format!(
        "<label>{label}<input type=\"number\" name=\"{name}\" value=\"{}\" min=\"{}\" max=\"{}\" step=\"{step}\" required></label>\n",
        escape_html(value),
        bounds.min,
        bounds.max,
    )
}

fn select<T: CategoryField>(name: &str, label: &str, current: &str) -> String {
    let mut html = format!("<label>{label}<select name=\"{name}\">\n");
    for option in T::OPTIONS {
        let value = option.label();
        let selected = if value.eq_ignore_ascii_case(current.trim()) {
            " selected"
        } else {
            ""
        };
        html.push_str(&format!(
            "<option value=\"{value}\"{selected}>{value}</option>\n"
        ));
    }
    html.push_str("</select></label>\n");
    html
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Read a submission from form fields, reporting the first missing or non-numeric value.
pub(crate) fn parse_form(fields: &HashMap<String, String>) -> Result<ApplicantSubmission, String> {
    Ok(ApplicantSubmission {
        age: number(fields, "age")?,
        annual_income: number(fields, "annual_income")?,
        home_ownership: text(fields, "home_ownership")?,
        employment_length_years: number(fields, "employment_length_years")?,
        loan_intent: text(fields, "loan_intent")?,
        loan_grade: text(fields, "loan_grade")?,
        loan_amount: number(fields, "loan_amount")?,
        loan_interest_rate: number(fields, "loan_interest_rate")?,
        prior_default_on_file: text(fields, "prior_default_on_file")?,
        credit_history_length_years: number(fields, "credit_history_length_years")?,
    })
}

/// Best-effort values for re-rendering a form that failed to parse.
pub(crate) fn form_with_defaults(fields: &HashMap<String, String>) -> ApplicantSubmission {
    let defaults = ApplicantSubmission::default();
    ApplicantSubmission {
        age: number(fields, "age").unwrap_or(defaults.age),
        annual_income: number(fields, "annual_income").unwrap_or(defaults.annual_income),
        home_ownership: text(fields, "home_ownership").unwrap_or(defaults.home_ownership),
        employment_length_years: number(fields, "employment_length_years")
            .unwrap_or(defaults.employment_length_years),
        loan_intent: text(fields, "loan_intent").unwrap_or(defaults.loan_intent),
        loan_grade: text(fields, "loan_grade").unwrap_or(defaults.loan_grade),
        loan_amount: number(fields, "loan_amount").unwrap_or(defaults.loan_amount),
        loan_interest_rate: number(fields, "loan_interest_rate")
            .unwrap_or(defaults.loan_interest_rate),
        prior_default_on_file: text(fields, "prior_default_on_file")
            .unwrap_or(defaults.prior_default_on_file),
        credit_history_length_years: number(fields, "credit_history_length_years")
            .unwrap_or(defaults.credit_history_length_years),
    }
}

fn text(fields: &HashMap<String, String>, name: &str) -> Result<String, String> {
    fields
        .get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| format!("{name} is required"))
}

fn number<T: FromStr>(fields: &HashMap<String, String>, name: &str) -> Result<T, String> {
    let raw = text(fields, name)?;
    raw.parse()
        .map_err(|_| format!("{name} must be a number (got '{raw}')"))
}
