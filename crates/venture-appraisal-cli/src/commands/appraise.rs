use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use venture_appraisal_core::appraisal::appraise_project;
use venture_appraisal_core::metrics::derive_metrics;
use venture_appraisal_core::projection::{build_projection, MonthlyRecord, ProjectParameters};

use crate::input;

/// Arguments shared by the appraisal and projection commands
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AppraiseArgs {
    /// Upfront capital outlay
    #[arg(long, alias = "investment")]
    pub initial_investment: Option<Decimal>,

    /// Fixed operating costs per month
    #[arg(long, alias = "fixed-costs")]
    pub fixed_costs_per_month: Option<Decimal>,

    /// Annual discount rate in percent (10 = 10%/yr)
    #[arg(long, alias = "discount-rate")]
    pub discount_rate_annual_pct: Option<Decimal>,

    /// Selling price of a single unit
    #[arg(long)]
    pub single_unit_price: Option<Decimal>,

    /// Selling price of a combo unit
    #[arg(long)]
    pub combo_unit_price: Option<Decimal>,

    /// Variable cost of a single unit
    #[arg(long)]
    pub single_unit_cost: Option<Decimal>,

    /// Variable cost of a combo unit
    #[arg(long)]
    pub combo_unit_cost: Option<Decimal>,

    /// Unit volume in the first month
    #[arg(long, alias = "base-units")]
    pub base_monthly_units: Option<Decimal>,

    /// Share of volume sold as singles, 0-100
    #[arg(long, alias = "single-ratio")]
    pub single_ratio_pct: Option<Decimal>,

    /// Month-over-month volume growth in percent (negative = decline)
    #[arg(long, alias = "growth")]
    pub monthly_growth_pct: Option<Decimal>,

    /// First projected calendar month (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Path to a JSON or YAML parameter file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for deriving metrics from an existing projection
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct MetricsArgs {
    /// Upfront capital outlay
    #[arg(long, alias = "investment")]
    pub initial_investment: Decimal,

    /// Annual discount rate in percent (10 = 10%/yr)
    #[arg(long, alias = "discount-rate")]
    pub discount_rate_annual_pct: Decimal,

    /// Fixed operating costs per month, used for the break-even revenue level
    #[arg(long, alias = "fixed-costs", default_value = "0")]
    pub fixed_costs_per_month: Decimal,

    /// Path to a JSON or YAML file holding the projection records
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_appraise(args: AppraiseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params = resolve_parameters(args)?;
    let result = appraise_project(&params)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_projection(args: AppraiseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params = resolve_parameters(args)?;
    let records = build_projection(&params)?;
    Ok(serde_json::to_value(records)?)
}

pub fn run_metrics(args: MetricsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let records: Vec<MonthlyRecord> = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)
            .map_err(|e| format!("expected an array of monthly records on stdin: {}", e))?
    } else {
        return Err("--input <records-file> or piped `projection` output is required".into());
    };

    let result = derive_metrics(
        &records,
        args.initial_investment,
        args.discount_rate_annual_pct,
        args.fixed_costs_per_month,
    )?;
    Ok(serde_json::to_value(result)?)
}

/// Parameter resolution order: --input file, then piped stdin, then flags.
fn resolve_parameters(args: AppraiseArgs) -> Result<ProjectParameters, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return Ok(input::file::read_document(path)?);
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }

    Ok(ProjectParameters {
        initial_investment: args
            .initial_investment
            .ok_or("--initial-investment is required (or provide --input)")?,
        fixed_costs_per_month: args.fixed_costs_per_month.unwrap_or(dec!(0)),
        discount_rate_annual_pct: args
            .discount_rate_annual_pct
            .ok_or("--discount-rate-annual-pct is required (or provide --input)")?,
        single_unit_price: args
            .single_unit_price
            .ok_or("--single-unit-price is required (or provide --input)")?,
        combo_unit_price: args
            .combo_unit_price
            .ok_or("--combo-unit-price is required (or provide --input)")?,
        single_unit_cost: args
            .single_unit_cost
            .ok_or("--single-unit-cost is required (or provide --input)")?,
        combo_unit_cost: args
            .combo_unit_cost
            .ok_or("--combo-unit-cost is required (or provide --input)")?,
        base_monthly_units: args
            .base_monthly_units
            .ok_or("--base-monthly-units is required (or provide --input)")?,
        single_ratio_pct: args
            .single_ratio_pct
            .ok_or("--single-ratio-pct is required (or provide --input)")?,
        monthly_growth_pct: args.monthly_growth_pct.unwrap_or(dec!(0)),
        start_date: args.start_date,
    })
}
