use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AppraisalError;
use crate::types::{Money, Pct};
use crate::AppraisalResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Projection horizon. Every run produces exactly this many monthly records.
pub const PROJECTION_MONTHS: u32 = 36;

const HUNDRED: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Flat parameter set for one appraisal run. Immutable per computation;
/// every output is recomputed wholesale from a fresh copy of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectParameters {
    /// Upfront capital outlay at month 0
    pub initial_investment: Money,
    /// Fixed operating costs charged every month (may be zero)
    pub fixed_costs_per_month: Money,
    /// Annual discount rate in percentage points (10 = 10%/yr), compounded monthly
    pub discount_rate_annual_pct: Pct,
    /// Selling price of a single unit
    pub single_unit_price: Money,
    /// Selling price of a combo unit
    pub combo_unit_price: Money,
    /// Variable cost of a single unit
    pub single_unit_cost: Money,
    /// Variable cost of a combo unit
    pub combo_unit_cost: Money,
    /// Unit volume in month 1, before growth
    pub base_monthly_units: Decimal,
    /// Share of volume sold as single units, in [0, 100]; combos take the rest
    pub single_ratio_pct: Pct,
    /// Compounding month-over-month volume growth (negative = decline)
    pub monthly_growth_pct: Pct,
    /// Optional calendar anchor for month/year labels. Display only, never
    /// enters the financial math.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

impl ProjectParameters {
    /// Clamp presentation-facing fields into their valid ranges, recording one
    /// warning per adjustment. Magnitudes whose sign changes interpretation
    /// (investment, discount, growth) pass through untouched.
    pub fn sanitized(&self, warnings: &mut Vec<String>) -> ProjectParameters {
        let mut p = self.clone();

        if p.single_ratio_pct < Decimal::ZERO || p.single_ratio_pct > HUNDRED {
            let clamped = p.single_ratio_pct.clamp(Decimal::ZERO, HUNDRED);
            warnings.push(format!(
                "single_ratio_pct {} is outside [0, 100]; clamped to {}",
                p.single_ratio_pct, clamped
            ));
            p.single_ratio_pct = clamped;
        }

        clamp_non_negative("base_monthly_units", &mut p.base_monthly_units, warnings);
        clamp_non_negative("single_unit_price", &mut p.single_unit_price, warnings);
        clamp_non_negative("combo_unit_price", &mut p.combo_unit_price, warnings);
        clamp_non_negative("single_unit_cost", &mut p.single_unit_cost, warnings);
        clamp_non_negative("combo_unit_cost", &mut p.combo_unit_cost, warnings);
        clamp_non_negative(
            "fixed_costs_per_month",
            &mut p.fixed_costs_per_month,
            warnings,
        );

        p
    }
}

fn clamp_non_negative(field: &str, value: &mut Decimal, warnings: &mut Vec<String>) {
    if *value < Decimal::ZERO {
        warnings.push(format!("{field} {value} is negative; clamped to 0"));
        *value = Decimal::ZERO;
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One projected month. Value object; never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    /// 0-based month index within the horizon
    pub index: u32,
    /// 1-based sequence label ("M1".."M36")
    pub label: String,
    /// Month of year, 1-12; calendar month when the run is anchored
    pub month: u32,
    /// Calendar year when anchored, 1-based projection year otherwise
    pub year: i32,
    /// Total unit volume after growth and rounding
    pub total_units: Decimal,
    /// Units sold as singles
    pub single_units: Decimal,
    /// Units sold as combos (total minus singles, never rounded on its own)
    pub combo_units: Decimal,
    pub single_revenue: Money,
    pub combo_revenue: Money,
    /// single_revenue + combo_revenue
    pub revenue: Money,
    /// Variable cost of goods for the month
    pub cost: Money,
    /// revenue - cost
    pub gross_profit: Money,
    /// gross_profit - fixed_costs_per_month
    pub net_profit: Money,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Expand the parameter set into the fixed 36-month projection.
///
/// Growth compounds multiplicatively: volume at month i is
/// `round(base_monthly_units * (1 + g)^i)`, with the factor accumulated by
/// repeated multiplication so rounding never feeds back into the
/// compounding. Rounding is half-away-from-zero at whole units.
///
/// Out-of-range presentation fields are clamped at this boundary (see
/// [`ProjectParameters::sanitized`]). The one failure mode is numeric
/// overflow: sustained extreme growth compounds volume past the decimal
/// range well inside the horizon, and such parameter sets are rejected with
/// [`AppraisalError::Overflow`] naming the first month that cannot be
/// computed.
pub fn build_projection(params: &ProjectParameters) -> AppraisalResult<Vec<MonthlyRecord>> {
    let p = params.sanitized(&mut Vec::new());

    let growth_factor = Decimal::ONE + p.monthly_growth_pct / HUNDRED;

    let mut records = Vec::with_capacity(PROJECTION_MONTHS as usize);
    let mut compounded = Decimal::ONE;

    for index in 0..PROJECTION_MONTHS {
        if index > 0 {
            compounded = compounded
                .checked_mul(growth_factor)
                .ok_or_else(|| overflow_error(index))?;
        }

        let record = project_month(&p, index, compounded).ok_or_else(|| overflow_error(index))?;
        records.push(record);
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// One month's figures from the compounded volume factor. All arithmetic is
/// checked; None means a product or sum left the representable range.
fn project_month(p: &ProjectParameters, index: u32, compounded: Decimal) -> Option<MonthlyRecord> {
    let single_ratio = p.single_ratio_pct / HUNDRED;

    let total_units = round_units(p.base_monthly_units.checked_mul(compounded)?);
    let single_units = round_units(total_units.checked_mul(single_ratio)?);
    // Combos take the remainder so the split always sums to the total
    let combo_units = total_units.checked_sub(single_units)?;

    let single_revenue = single_units.checked_mul(p.single_unit_price)?;
    let combo_revenue = combo_units.checked_mul(p.combo_unit_price)?;
    let revenue = single_revenue.checked_add(combo_revenue)?;
    let cost = single_units
        .checked_mul(p.single_unit_cost)?
        .checked_add(combo_units.checked_mul(p.combo_unit_cost)?)?;
    let gross_profit = revenue.checked_sub(cost)?;
    let net_profit = gross_profit.checked_sub(p.fixed_costs_per_month)?;

    let (month, year) = month_and_year(index, p.start_date);

    Some(MonthlyRecord {
        index,
        label: format!("M{}", index + 1),
        month,
        year,
        total_units,
        single_units,
        combo_units,
        single_revenue,
        combo_revenue,
        revenue,
        cost,
        gross_profit,
        net_profit,
    })
}

fn overflow_error(index: u32) -> AppraisalError {
    AppraisalError::Overflow {
        context: format!("projection month {}", index + 1),
    }
}

/// Round a unit volume to a whole number, half away from zero.
fn round_units(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Month/year display pair for a record: calendar values when a start date
/// anchors the run, 1-based ordinals otherwise.
fn month_and_year(index: u32, start_date: Option<NaiveDate>) -> (u32, i32) {
    match start_date.and_then(|d| d.checked_add_months(Months::new(index))) {
        Some(date) => (date.month(), date.year()),
        None => (index % 12 + 1, (index / 12) as i32 + 1),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::MathematicalOps;
    use rust_decimal_macros::dec;

    /// The worked example used across the crate: a two-product retail launch
    /// with 4% monthly growth and a 60/40 single/combo split.
    fn standard_launch_params() -> ProjectParameters {
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

    #[test]
    fn test_builds_full_horizon() {
        let records = build_projection(&standard_launch_params()).unwrap();
        assert_eq!(records.len(), PROJECTION_MONTHS as usize);
        assert_eq!(records[0].index, 0);
        assert_eq!(records[0].label, "M1");
        assert_eq!(records[35].index, 35);
        assert_eq!(records[35].label, "M36");
    }

    #[test]
    fn test_first_month_reference_figures() {
        let records = build_projection(&standard_launch_params()).unwrap();
        let m1 = &records[0];
        assert_eq!(m1.total_units, dec!(200));
        assert_eq!(m1.single_units, dec!(120));
        assert_eq!(m1.combo_units, dec!(80));
        assert_eq!(m1.single_revenue, dec!(24_000_000));
        assert_eq!(m1.combo_revenue, dec!(32_000_000));
        assert_eq!(m1.revenue, dec!(56_000_000));
        assert_eq!(m1.cost, dec!(22_400_000));
        assert_eq!(m1.gross_profit, dec!(33_600_000));
        assert_eq!(m1.net_profit, dec!(18_600_000));
    }

    #[test]
    fn test_unit_split_sums_exactly() {
        // An awkward ratio forces fractional single counts every month
        let mut params = standard_launch_params();
        params.single_ratio_pct = dec!(37);

        for record in build_projection(&params).unwrap() {
            assert_eq!(
                record.single_units + record.combo_units,
                record.total_units,
                "split drift at month {}",
                record.index
            );
        }
    }

    #[test]
    fn test_zero_growth_is_flat() {
        let mut params = standard_launch_params();
        params.monthly_growth_pct = dec!(0);

        for record in build_projection(&params).unwrap() {
            assert_eq!(record.total_units, dec!(200));
            assert_eq!(record.net_profit, dec!(18_600_000));
        }
    }

    #[test]
    fn test_growth_matches_closed_form() {
        let records = build_projection(&standard_launch_params()).unwrap();
        let growth = Decimal::ONE + dec!(0.04);

        for record in &records {
            let expected = (dec!(200) * growth.powi(record.index as i64))
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
            assert_eq!(record.total_units, expected, "month {}", record.index);
        }
    }

    #[test]
    fn test_negative_growth_declines() {
        let mut params = standard_launch_params();
        params.monthly_growth_pct = dec!(-10);

        let records = build_projection(&params).unwrap();
        assert_eq!(records[0].total_units, dec!(200));
        assert_eq!(records[1].total_units, dec!(180));
        assert_eq!(records[2].total_units, dec!(162));
        assert_eq!(records[3].total_units, dec!(146)); // 145.8 rounds up
    }

    #[test]
    fn test_ratio_clamped_to_valid_range() {
        let mut params = standard_launch_params();
        params.single_ratio_pct = dec!(150);

        let records = build_projection(&params).unwrap();
        assert_eq!(records[0].single_units, dec!(200));
        assert_eq!(records[0].combo_units, dec!(0));

        let mut warnings = Vec::new();
        let clean = params.sanitized(&mut warnings);
        assert_eq!(clean.single_ratio_pct, dec!(100));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("single_ratio_pct"));
    }

    #[test]
    fn test_negative_price_and_cost_clamped() {
        let mut params = standard_launch_params();
        params.single_unit_price = dec!(-5);
        params.fixed_costs_per_month = dec!(-1_000);

        let records = build_projection(&params).unwrap();
        assert_eq!(records[0].single_revenue, dec!(0));
        // Negative fixed costs behave as zero, so net equals gross
        assert_eq!(records[0].net_profit, records[0].gross_profit);

        let mut warnings = Vec::new();
        params.sanitized(&mut warnings);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_extreme_growth_reports_overflow() {
        // 600%/month compounds volume past the decimal range around month 27;
        // the run must fail with the month named, not blow up mid-loop
        let mut params = standard_launch_params();
        params.monthly_growth_pct = dec!(600);

        let err = build_projection(&params).unwrap_err();
        assert!(matches!(err, AppraisalError::Overflow { .. }));
        assert!(err.to_string().contains("projection month"));

        // Steep but representable growth still yields the full horizon
        params.monthly_growth_pct = dec!(100);
        let records = build_projection(&params).unwrap();
        assert_eq!(records.len(), PROJECTION_MONTHS as usize);
    }

    #[test]
    fn test_ordinal_labels_wrap_across_years() {
        let records = build_projection(&standard_launch_params()).unwrap();
        assert_eq!((records[0].month, records[0].year), (1, 1));
        assert_eq!((records[11].month, records[11].year), (12, 1));
        assert_eq!((records[12].month, records[12].year), (1, 2));
        assert_eq!((records[35].month, records[35].year), (12, 3));
    }

    #[test]
    fn test_calendar_labels_follow_start_date() {
        let mut params = standard_launch_params();
        params.start_date = NaiveDate::from_ymd_opt(2026, 1, 15);

        let records = build_projection(&params).unwrap();
        assert_eq!((records[0].month, records[0].year), (1, 2026));
        assert_eq!((records[11].month, records[11].year), (12, 2026));
        assert_eq!((records[12].month, records[12].year), (1, 2027));
        assert_eq!((records[35].month, records[35].year), (12, 2028));
    }

    #[test]
    fn test_mid_year_anchor() {
        let mut params = standard_launch_params();
        params.start_date = NaiveDate::from_ymd_opt(2026, 10, 1);

        let records = build_projection(&params).unwrap();
        assert_eq!((records[0].month, records[0].year), (10, 2026));
        assert_eq!((records[2].month, records[2].year), (12, 2026));
        assert_eq!((records[3].month, records[3].year), (1, 2027));
    }
}
