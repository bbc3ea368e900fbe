use rust_decimal::Decimal;
use std::time::Instant;

use crate::metrics::{derive_metrics, MetricsOutput};
use crate::projection::{build_projection, ProjectParameters, PROJECTION_MONTHS};
use crate::types::{with_metadata, ComputationOutput};
use crate::AppraisalResult;

/// End-to-end appraisal: expand the parameters into the 36-month projection,
/// then derive the full metrics bundle from it.
///
/// Sanitation warnings from the parameter clamp and computation warnings
/// from the metrics pass are merged into one list on the envelope.
pub fn appraise_project(
    params: &ProjectParameters,
) -> AppraisalResult<ComputationOutput<MetricsOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let p = params.sanitized(&mut warnings);
    if p.initial_investment <= Decimal::ZERO {
        warnings.push(
            "initial_investment is not positive; payback, NPV and ROI are not meaningful".into(),
        );
    }

    let records = build_projection(&p)?;
    let inner = derive_metrics(
        &records,
        p.initial_investment,
        p.discount_rate_annual_pct,
        p.fixed_costs_per_month,
    )?;
    warnings.extend(inner.warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "36-Month Venture Projection & Appraisal",
        &serde_json::json!({
            "initial_investment": p.initial_investment.to_string(),
            "fixed_costs_per_month": p.fixed_costs_per_month.to_string(),
            "discount_rate_annual_pct": p.discount_rate_annual_pct.to_string(),
            "single_unit_price": p.single_unit_price.to_string(),
            "combo_unit_price": p.combo_unit_price.to_string(),
            "single_unit_cost": p.single_unit_cost.to_string(),
            "combo_unit_cost": p.combo_unit_cost.to_string(),
            "base_monthly_units": p.base_monthly_units.to_string(),
            "single_ratio_pct": p.single_ratio_pct.to_string(),
            "monthly_growth_pct": p.monthly_growth_pct.to_string(),
            "start_date": p.start_date.map(|d| d.to_string()),
            "months": PROJECTION_MONTHS,
        }),
        warnings,
        elapsed,
        inner.result,
    ))
}
