use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::AppraisalError;
use crate::projection::MonthlyRecord;
use crate::types::{with_metadata, ComputationOutput, Money, Pct, Rate};
use crate::AppraisalResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Newton-Raphson initial guess for the monthly IRR (10% per month).
const IRR_INITIAL_GUESS: Rate = dec!(0.1);
/// Step used for the numerical derivative of the NPV curve.
const IRR_DERIVATIVE_STEP: Decimal = dec!(0.0001);
/// Iteration stops once the rate moves by less than this.
const IRR_CONVERGENCE_THRESHOLD: Decimal = dec!(0.0001);
const MAX_IRR_ITERATIONS: u32 = 100;

const HUNDRED: Decimal = dec!(100);
const MONTHS_PER_YEAR: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A projected month extended with the running cash position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRecord {
    #[serde(flatten)]
    pub month: MonthlyRecord,
    /// Running sum of net profit, seeded at -initial_investment
    pub cumulative: Money,
}

/// Break-even figures. Either is absent when the margin math degenerates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakEven {
    /// Monthly revenue needed to cover fixed costs at the average margin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_per_month: Option<Money>,
    /// Months of average net profit needed to recover the investment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months: Option<Decimal>,
}

/// Aggregates across the full horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionTotals {
    pub total_revenue: Money,
    pub total_net_profit: Money,
    pub total_units: Decimal,
    pub avg_monthly_revenue: Money,
    pub avg_monthly_net_profit: Money,
}

/// Overall verdict: invest when NPV is positive and the IRR clears the hurdle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Invest,
    Reconsider,
}

/// Qualitative read of the metrics, the way an investment memo states them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub npv_positive: bool,
    /// Monthly IRR annualized (x12) against the annual discount hurdle
    pub irr_above_hurdle: bool,
    pub roi_positive: bool,
    pub payback_within_horizon: bool,
    pub recommendation: Recommendation,
}

/// Full metrics bundle for one appraisal run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsOutput {
    /// NPV of the monthly net profits against the upfront investment
    pub npv: Money,
    /// Monthly IRR in percentage points. Deliberately not annualized; the
    /// assessment annualizes only for its hurdle comparison.
    pub irr_monthly_pct: Pct,
    /// Total net profit over the investment, absent when the investment is zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi_pct: Option<Pct>,
    /// Fractional month at which cumulative cash turns non-negative
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payback_month: Option<Decimal>,
    pub break_even: BreakEven,
    pub totals: ProjectionTotals,
    pub assessment: Assessment,
    /// The projection rows with cumulative cash attached (chart feed)
    pub cash_flows: Vec<CashFlowRecord>,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Derive the appraisal metrics from a built projection.
///
/// Pure function of its inputs. The only hard failures are an empty record
/// slice and a discount rate at or below -100% per month; every degenerate
/// metric (zero margin, zero investment, payback never reached) is reported
/// as absent instead of failing the run.
pub fn derive_metrics(
    records: &[MonthlyRecord],
    initial_investment: Money,
    discount_rate_annual_pct: Pct,
    fixed_costs_per_month: Money,
) -> AppraisalResult<ComputationOutput<MetricsOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if records.is_empty() {
        return Err(AppraisalError::InsufficientData(
            "metrics require at least one monthly record".into(),
        ));
    }

    let months = Decimal::from(records.len() as u64);

    // ── Cumulative cash flow and totals ──────────────────────────────
    let cash_flows = cumulative_cash_flows(records, initial_investment);

    let total_revenue: Money = records.iter().map(|r| r.revenue).sum();
    let total_net_profit: Money = records.iter().map(|r| r.net_profit).sum();
    let total_units: Decimal = records.iter().map(|r| r.total_units).sum();
    let avg_monthly_revenue = total_revenue / months;
    let avg_monthly_net_profit = total_net_profit / months;

    let totals = ProjectionTotals {
        total_revenue,
        total_net_profit,
        total_units,
        avg_monthly_revenue,
        avg_monthly_net_profit,
    };

    // ── Discounted metrics ───────────────────────────────────────────
    let monthly_discount = discount_rate_annual_pct / HUNDRED / MONTHS_PER_YEAR;
    let npv = npv_at_monthly_rate(records, initial_investment, monthly_discount)?;

    let irr_monthly = solve_irr(records, initial_investment, &mut warnings);
    let irr_monthly_pct = irr_monthly * HUNDRED;

    let roi_pct = if initial_investment.is_zero() {
        warnings.push("initial_investment is zero; ROI not applicable".into());
        None
    } else {
        Some(total_net_profit / initial_investment * HUNDRED)
    };

    // ── Payback and break-even ───────────────────────────────────────
    let payback_month = compute_payback(&cash_flows);
    let break_even = compute_break_even(
        avg_monthly_revenue,
        avg_monthly_net_profit,
        fixed_costs_per_month,
        initial_investment,
    );

    let assessment = assess_metrics(
        npv,
        irr_monthly_pct,
        roi_pct,
        payback_month,
        discount_rate_annual_pct,
    );

    let output = MetricsOutput {
        npv,
        irr_monthly_pct,
        roi_pct,
        payback_month,
        break_even,
        totals,
        assessment,
        cash_flows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Venture Appraisal: NPV, IRR, ROI, BEP, Payback",
        &serde_json::json!({
            "initial_investment": initial_investment.to_string(),
            "discount_rate_annual_pct": discount_rate_annual_pct.to_string(),
            "fixed_costs_per_month": fixed_costs_per_month.to_string(),
            "months": records.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Fold net profit into a running cash position, seeded at -initial_investment.
pub fn cumulative_cash_flows(
    records: &[MonthlyRecord],
    initial_investment: Money,
) -> Vec<CashFlowRecord> {
    let mut flows = Vec::with_capacity(records.len());
    let mut cumulative = -initial_investment;

    for record in records {
        cumulative += record.net_profit;
        flows.push(CashFlowRecord {
            month: record.clone(),
            cumulative,
        });
    }

    flows
}

/// NPV of the projected net profits at a given monthly rate:
/// `-investment + sum(net_profit[i] / (1 + rate)^(i+1))`.
///
/// Exposed on its own so callers can check the IRR round-trip (NPV at the
/// solved rate is ~0).
pub fn npv_at_monthly_rate(
    records: &[MonthlyRecord],
    initial_investment: Money,
    monthly_rate: Rate,
) -> AppraisalResult<Money> {
    if monthly_rate <= dec!(-1) {
        return Err(AppraisalError::InvalidInput {
            field: "monthly_rate".into(),
            reason: "Discount rate must be greater than -100% per month".into(),
        });
    }

    let one_plus_r = Decimal::ONE + monthly_rate;
    let mut discount = Decimal::ONE;
    let mut result = -initial_investment;

    for (t, record) in records.iter().enumerate() {
        // The first month is already one period out, hence (i+1) exponents
        discount *= one_plus_r;
        if discount.is_zero() {
            return Err(AppraisalError::DivisionByZero {
                context: format!("NPV discount factor at month {t}"),
            });
        }
        result += record.net_profit / discount;
    }

    Ok(result)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Monthly IRR via Newton-Raphson with a numerical derivative.
///
/// Starts at 10%/month and stops once the rate moves by less than the
/// convergence threshold. Pathological shapes (all-positive flows, multiple
/// sign changes) may never converge; the solver then reports its best
/// current estimate with a warning instead of failing the run.
fn solve_irr(
    records: &[MonthlyRecord],
    initial_investment: Money,
    warnings: &mut Vec<String>,
) -> Rate {
    let mut rate = IRR_INITIAL_GUESS;

    for _ in 0..MAX_IRR_ITERATIONS {
        let objective = npv_for_solver(records, initial_investment, rate);
        let shifted = npv_for_solver(records, initial_investment, rate + IRR_DERIVATIVE_STEP);
        let (npv_val, npv_shifted) = match (objective, shifted) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                warnings.push(format!(
                    "IRR objective overflowed at rate {rate}; reporting best estimate"
                ));
                return rate;
            }
        };

        let derivative = (npv_shifted - npv_val) / IRR_DERIVATIVE_STEP;
        if derivative.is_zero() {
            warnings.push(format!(
                "IRR derivative vanished at rate {rate}; reporting best estimate"
            ));
            return rate;
        }

        let next = rate - npv_val / derivative;
        if (next - rate).abs() < IRR_CONVERGENCE_THRESHOLD {
            return rate;
        }
        rate = clamp_rate(next);
    }

    warnings.push(format!(
        "IRR did not converge within {MAX_IRR_ITERATIONS} iterations; reporting best estimate"
    ));
    rate
}

/// Solver-facing NPV: same shape as [`npv_at_monthly_rate`] but reports
/// numeric blowups as None so the iteration can bail out gracefully.
fn npv_for_solver(
    records: &[MonthlyRecord],
    initial_investment: Money,
    rate: Rate,
) -> Option<Money> {
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut result = -initial_investment;

    for record in records {
        discount = discount.checked_mul(one_plus_r)?;
        if discount.is_zero() {
            // Discount factor underflowed to zero; the remaining terms are
            // divisions by zero, so the objective is not evaluable here
            return None;
        }
        result = result.checked_add(record.net_profit.checked_div(discount)?)?;
    }

    Some(result)
}

/// Divergence guard for the Newton iteration.
fn clamp_rate(rate: Rate) -> Rate {
    if rate < dec!(-0.99) {
        dec!(-0.99)
    } else if rate > dec!(100.0) {
        dec!(100.0)
    } else {
        rate
    }
}

/// First fractional month at which the cumulative cash position reaches zero.
///
/// At index 0 there is nothing to interpolate against, so payback is one
/// month. At a later index the recovery lands partway through the month:
/// `i + (-cumulative[i-1] / net_profit[i])`. A first crossing from below
/// implies positive net profit in the crossing month, so the full-month
/// fallback only guards against a scan semantics change.
fn compute_payback(cash_flows: &[CashFlowRecord]) -> Option<Decimal> {
    for (i, flow) in cash_flows.iter().enumerate() {
        if flow.cumulative < Decimal::ZERO {
            continue;
        }
        if i == 0 {
            return Some(Decimal::ONE);
        }

        let net = flow.month.net_profit;
        let prev = cash_flows[i - 1].cumulative;
        if net > Decimal::ZERO {
            return Some(Decimal::from(i as u64) + (-prev) / net);
        }
        return Some(Decimal::from(i as u64 + 1));
    }

    None
}

/// Break-even levels from the average month.
///
/// Revenue break-even scales fixed costs by the average profit margin;
/// absent when average revenue is zero or the margin is non-positive.
/// Months break-even divides the investment by average net profit, absent
/// unless that average is positive.
fn compute_break_even(
    avg_revenue: Money,
    avg_net_profit: Money,
    fixed_costs_per_month: Money,
    initial_investment: Money,
) -> BreakEven {
    let revenue_per_month = if avg_revenue.is_zero() {
        None
    } else {
        let margin = avg_net_profit / avg_revenue;
        if margin > Decimal::ZERO {
            Some(fixed_costs_per_month / margin)
        } else {
            None
        }
    };

    let months = if avg_net_profit > Decimal::ZERO {
        Some(initial_investment / avg_net_profit)
    } else {
        None
    };

    BreakEven {
        revenue_per_month,
        months,
    }
}

fn assess_metrics(
    npv: Money,
    irr_monthly_pct: Pct,
    roi_pct: Option<Pct>,
    payback_month: Option<Decimal>,
    discount_rate_annual_pct: Pct,
) -> Assessment {
    let npv_positive = npv > Decimal::ZERO;
    // Nominal annualization (x12) puts the monthly IRR on the same footing
    // as the annual hurdle
    let irr_above_hurdle = irr_monthly_pct * MONTHS_PER_YEAR > discount_rate_annual_pct;
    let roi_positive = roi_pct.map_or(false, |r| r > Decimal::ZERO);
    let payback_within_horizon = payback_month.is_some();

    let recommendation = if npv_positive && irr_above_hurdle {
        Recommendation::Invest
    } else {
        Recommendation::Reconsider
    };

    Assessment {
        npv_positive,
        irr_above_hurdle,
        roi_positive,
        payback_within_horizon,
        recommendation,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
