use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use venture_appraisal_core::appraisal::appraise_project;
use venture_appraisal_core::metrics::{derive_metrics, npv_at_monthly_rate, Recommendation};
use venture_appraisal_core::projection::{build_projection, ProjectParameters};

// ===========================================================================
// Launch scenario appraisal
//
// Two-product retail launch: 2B upfront, 15M fixed/month, 200 base units
// growing 4%/month on a 60/40 single/combo split. Worked by hand: total
// net profit 2,067,480,000 over the horizon, recovery late in month 36.
// ===========================================================================

fn launch_params() -> ProjectParameters {
    ProjectParameters {
        initial_investment: dec!(2_000_000_000),
        fixed_costs_per_month: dec!(15_000_000),
        discount_rate_annual_pct: dec!(10),
        single_unit_price: dec!(200_000),
        combo_unit_price: dec!(400_000),
        single_unit_cost: dec!(80_000),
        combo_unit_cost: dec!(160_000),
        base_monthly_units: dec!(200),
        single_ratio_pct: dec!(60),
        monthly_growth_pct: dec!(4),
        start_date: None,
    }
}

fn launch_metrics() -> venture_appraisal_core::metrics::MetricsOutput {
    let records = build_projection(&launch_params()).unwrap();
    derive_metrics(&records, dec!(2_000_000_000), dec!(10), dec!(15_000_000))
        .unwrap()
        .result
}

#[test]
fn test_launch_cumulative_positions() {
    let metrics = launch_metrics();

    // -2B + 18.6M after month 1; sign flips between months 35 and 36
    assert_eq!(metrics.cash_flows[0].cumulative, dec!(-1_981_400_000));
    assert_eq!(metrics.cash_flows[34].cumulative, dec!(-50_120_000));
    assert_eq!(metrics.cash_flows[35].cumulative, dec!(67_480_000));
}

#[test]
fn test_launch_totals() {
    let metrics = launch_metrics();
    let totals = &metrics.totals;

    assert_eq!(totals.total_units, dec!(15_521));
    assert_eq!(totals.total_revenue, dec!(4_345_800_000));
    assert_eq!(totals.total_net_profit, dec!(2_067_480_000));
    assert_eq!(totals.avg_monthly_net_profit, dec!(57_430_000));
    assert!((totals.avg_monthly_revenue - dec!(120_716_666.67)).abs() < dec!(0.01));
}

#[test]
fn test_launch_payback_interpolates_in_final_month() {
    // Crossing month nets 117.6M against a 50.12M shortfall:
    // 35 + 50.12/117.6 = 35.4262
    let metrics = launch_metrics();
    let payback = metrics.payback_month.unwrap();
    assert!(payback > dec!(35) && payback < dec!(36));
    assert!(
        (payback - dec!(35.4262)).abs() < dec!(0.001),
        "expected payback ~35.4262, got {payback}"
    );
}

#[test]
fn test_launch_roi() {
    // 2,067,480,000 / 2,000,000,000 * 100
    let metrics = launch_metrics();
    assert_eq!(metrics.roi_pct, Some(dec!(103.374)));
}

#[test]
fn test_launch_npv_negative_at_hurdle() {
    // 10%/yr discounts at 1/120 per month; late recovery pushes NPV underwater
    let metrics = launch_metrics();
    assert!(metrics.npv < Decimal::ZERO);
    assert!(
        (metrics.npv - dec!(-295_942_642)).abs() < dec!(1),
        "expected NPV ~-295.94M, got {}",
        metrics.npv
    );
}

#[test]
fn test_launch_irr_small_positive_monthly() {
    let records = build_projection(&launch_params()).unwrap();
    let output =
        derive_metrics(&records, dec!(2_000_000_000), dec!(10), dec!(15_000_000)).unwrap();

    let irr_pct = output.result.irr_monthly_pct;
    assert!(
        (irr_pct - dec!(0.1379)).abs() < dec!(0.02),
        "expected monthly IRR ~0.138%, got {irr_pct}"
    );
    assert!(output.warnings.is_empty());

    // NPV at the solved rate sits within one convergence step of zero,
    // which at this cash-flow scale is ~1.3M against a 2B outlay
    let residual =
        npv_at_monthly_rate(&records, dec!(2_000_000_000), irr_pct / dec!(100)).unwrap();
    assert!(
        residual.abs() < dec!(3_000_000),
        "NPV at solved IRR should be near zero, got {residual}"
    );
}

#[test]
fn test_launch_break_even_levels() {
    // Margin 57.43M / 120.72M = 0.4757; revenue BEP = 15M / 0.4757
    let metrics = launch_metrics();

    let revenue = metrics.break_even.revenue_per_month.unwrap();
    assert!(
        (revenue - dec!(31_529_688)).abs() < dec!(1),
        "expected revenue BEP ~31.53M, got {revenue}"
    );

    let months = metrics.break_even.months.unwrap();
    assert!(
        (months - dec!(34.825)).abs() < dec!(0.001),
        "expected BEP ~34.825 months, got {months}"
    );
}

#[test]
fn test_launch_assessment_reconsiders() {
    // Profitable on paper (ROI 103%) but NPV-negative at the 10% hurdle
    let metrics = launch_metrics();
    let assessment = &metrics.assessment;

    assert!(!assessment.npv_positive);
    assert!(!assessment.irr_above_hurdle);
    assert!(assessment.roi_positive);
    assert!(assessment.payback_within_horizon);
    assert_eq!(assessment.recommendation, Recommendation::Reconsider);
}

// ===========================================================================
// Degenerate shapes
// ===========================================================================

#[test]
fn test_oversized_investment_degenerates_gracefully() {
    // 9B can never be recovered by 2.07B of net profit: payback absent,
    // and the IRR hunt runs into the deep-discount overflow region
    let records = build_projection(&launch_params()).unwrap();
    let output = derive_metrics(&records, dec!(9_000_000_000), dec!(10), dec!(15_000_000)).unwrap();
    let metrics = &output.result;

    assert_eq!(metrics.payback_month, None);
    assert_eq!(metrics.roi_pct, Some(dec!(22.972)));
    assert_eq!(metrics.irr_monthly_pct, dec!(-99));
    assert!(output
        .warnings
        .iter()
        .any(|w| w.contains("IRR objective overflowed")));

    let assessment = &metrics.assessment;
    assert!(!assessment.npv_positive);
    assert!(!assessment.irr_above_hurdle);
    assert!(assessment.roi_positive);
    assert!(!assessment.payback_within_horizon);
    assert_eq!(assessment.recommendation, Recommendation::Reconsider);
}

// ===========================================================================
// End-to-end appraisal envelope
// ===========================================================================

#[test]
fn test_appraise_project_launch_end_to_end() {
    let output = appraise_project(&launch_params()).unwrap();

    assert_eq!(output.methodology, "36-Month Venture Projection & Appraisal");
    assert_eq!(output.assumptions["months"], 36);
    assert_eq!(output.assumptions["initial_investment"], "2000000000");
    assert!(output.warnings.is_empty());

    assert_eq!(output.result.roi_pct, Some(dec!(103.374)));
    assert_eq!(output.result.cash_flows.len(), 36);

    let value = serde_json::to_value(&output).unwrap();
    assert!(value["result"]["npv"].is_string());
    assert_eq!(value["result"]["assessment"]["recommendation"], "reconsider");
    assert_eq!(value["metadata"]["precision"], "rust_decimal_128bit");
}
