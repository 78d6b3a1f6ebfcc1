use crate::infra::{apply_model_override, build_evaluator, ModelSource};
use chrono::Utc;
use clap::Args;
use credit_risk::config::AppConfig;
use credit_risk::error::AppError;
use credit_risk::evaluation::RiskAssessmentView;
use credit_risk::model::{load_model, ModelSummary};
use credit_risk::telemetry;
use credit_risk::{ApplicantSubmission, RiskAssessment};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Applicant age in years (18-100)
    #[arg(long, default_value_t = 25)]
    pub(crate) age: i64,
    /// Annual income in dollars
    #[arg(long, default_value_t = 50_000.0)]
    pub(crate) income: f64,
    /// RENT, OWN, MORTGAGE or OTHER
    #[arg(long, default_value = "RENT")]
    pub(crate) home_ownership: String,
    /// Years in current employment
    #[arg(long, default_value_t = 2.0)]
    pub(crate) employment_length: f64,
    /// PERSONAL, EDUCATION, MEDICAL, VENTURE, HOMEIMPROVEMENT or DEBTCONSOLIDATION
    #[arg(long, default_value = "PERSONAL")]
    pub(crate) loan_intent: String,
    /// Assigned loan grade, A through G
    #[arg(long, default_value = "A")]
    pub(crate) loan_grade: String,
    /// Requested loan amount in dollars
    #[arg(long, default_value_t = 10_000.0)]
    pub(crate) loan_amount: f64,
    /// Interest rate in percent
    #[arg(long, default_value_t = 10.5)]
    pub(crate) interest_rate: f64,
    /// Historical default on file, Y or N
    #[arg(long, default_value = "Y")]
    pub(crate) prior_default: String,
    /// Credit history length in years
    #[arg(long, default_value_t = 3)]
    pub(crate) credit_history_length: i64,
    /// Model artifact to score with (defaults to MODEL_PATH)
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
    /// Print the assessment as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

impl EvaluateArgs {
    fn submission(&self) -> ApplicantSubmission {
        ApplicantSubmission {
            age: self.age,
            annual_income: self.income,
            home_ownership: self.home_ownership.clone(),
            employment_length_years: self.employment_length,
            loan_intent: self.loan_intent.clone(),
            loan_grade: self.loan_grade.clone(),
            loan_amount: self.loan_amount,
            loan_interest_rate: self.interest_rate,
            prior_default_on_file: self.prior_default.clone(),
            credit_history_length_years: self.credit_history_length,
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct InspectArgs {
    /// Model artifact to describe (defaults to MODEL_PATH)
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
}

/// Configuration for one-shot commands, with logging installed on stderr.
fn command_config(model: Option<PathBuf>) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    apply_model_override(&mut config.model, model);
    Ok(config)
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let submission = args.submission();
    let config = command_config(args.model)?;

    let evaluator = build_evaluator(&config.model, ModelSource::Owned)?;
    let assessment = evaluator.evaluate(&submission)?;

    if args.json {
        let view = RiskAssessmentView::new(&assessment, Utc::now());
        println!(
            "{}",
            serde_json::to_string_pretty(&view).map_err(std::io::Error::from)?
        );
    } else {
        print!("{}", render_assessment(&assessment));
    }
    Ok(())
}

pub(crate) fn run_model_inspect(args: InspectArgs) -> Result<(), AppError> {
    let config = command_config(args.model)?;

    let model = load_model(&config.model.path)?;
    println!("Model artifact: {}", config.model.path.display());
    print!("{}", render_summary(&model.summary()));
    Ok(())
}

pub(crate) fn render_assessment(assessment: &RiskAssessment) -> String {
    format!(
        "{}\n{}\n{}\n",
        assessment.verdict.headline(),
        assessment.probability_line(),
        assessment.ratio_line()
    )
}

pub(crate) fn render_summary(summary: &ModelSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("- booster: {}\n", summary.booster));
    out.push_str(&format!("- objective: {}\n", summary.objective));
    if let Some(version) = &summary.xgboost_version {
        out.push_str(&format!("- xgboost version: {version}\n"));
    }
    out.push_str(&format!(
        "- {} trees | {} nodes | {} categorical splits\n",
        summary.trees, summary.nodes, summary.categorical_splits
    ));
    out.push_str(&format!("- base score: {}\n", summary.base_score));
    out.push_str("Feature order:\n");
    for (index, name) in summary.feature_names.iter().enumerate() {
        out.push_str(&format!("  {index:>2}. {name}\n"));
    }
    out
}
