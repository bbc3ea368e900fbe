use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use venture_appraisal_core::projection::MonthlyRecord;
use venture_appraisal_core::types::{Money, Pct};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Appraisal
// ---------------------------------------------------------------------------

/// Full appraisal from a parameter document: projection, cash flows and the
/// complete metrics bundle.
#[napi]
pub fn appraise(input_json: String) -> NapiResult<String> {
    let params: venture_appraisal_core::projection::ProjectParameters =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        venture_appraisal_core::appraisal::appraise_project(&params).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// The 36-month projection alone, as an array of monthly records.
#[napi]
pub fn build_projection(input_json: String) -> NapiResult<String> {
    let params: venture_appraisal_core::projection::ProjectParameters =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let records = venture_appraisal_core::projection::build_projection(&params)
        .map_err(to_napi_error)?;
    serde_json::to_string(&records).map_err(to_napi_error)
}

/// Input document for [`derive_metrics`]: a previously built projection plus
/// the appraisal terms.
#[derive(Deserialize)]
struct DeriveMetricsInput {
    records: Vec<MonthlyRecord>,
    initial_investment: Money,
    discount_rate_annual_pct: Pct,
    #[serde(default)]
    fixed_costs_per_month: Money,
}

/// Metrics for an existing projection, without rebuilding it.
#[napi]
pub fn derive_metrics(input_json: String) -> NapiResult<String> {
    let input: DeriveMetricsInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = venture_appraisal_core::metrics::derive_metrics(
        &input.records,
        input.initial_investment,
        input.discount_rate_annual_pct,
        input.fixed_costs_per_month,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
