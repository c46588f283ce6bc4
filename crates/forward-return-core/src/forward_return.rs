use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::ForwardReturnError;
use crate::fiscal_calendar::{
    add_calendar_years, elapsed_fraction, fiscal_year_bounds, fiscal_year_for_date,
    year_fraction_for_date,
};
use crate::time_value::{self, dated_years};
use crate::types::*;
use crate::ForwardReturnResult;

/// Investment horizon in calendar years
pub const HORIZON_YEARS: u32 = 5;
/// Starting point for the Newton-Raphson IRR search
pub const INITIAL_IRR_GUESS: Rate = dec!(0.10);

const HORIZON: Years = dec!(5);
const CAGR_EXPONENT: Decimal = dec!(0.2);

// ---------------------------------------------------------------------------
// Types — Inputs
// ---------------------------------------------------------------------------

/// Analyst projection for one company fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Absolute fiscal year, e.g. 2027
    pub fiscal_year: i32,
    /// Per-share metric the exit multiple applies to (EPS, FCF/share, ...)
    #[serde(default)]
    pub metric_value: Option<Decimal>,
    /// Per-share dividend for the fiscal year
    #[serde(default)]
    pub dividend_value: Option<Decimal>,
}

/// Input for the 5-year forward return calculation.
///
/// The scalars are optional so that an upstream record with gaps still
/// produces a result listing what is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForwardReturnInput {
    /// Current share price, must be positive
    #[serde(default)]
    pub current_price: Option<Money>,
    /// Price / metric multiple assumed at exit, must be positive
    #[serde(default)]
    pub exit_multiple: Option<Multiple>,
    /// Any date carrying the company's fiscal-year-end month and day
    #[serde(default)]
    pub fiscal_year_end_date: Option<NaiveDate>,
    /// Sparse estimates, at most one per fiscal year
    #[serde(default)]
    pub estimates: Vec<Estimate>,
}

// ---------------------------------------------------------------------------
// Types — Outputs
// ---------------------------------------------------------------------------

/// A reason the IRR could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissingData {
    CurrentPrice,
    ExitMultiple,
    FiscalYearEndDate,
    MetricEstimate { fiscal_year: i32 },
}

impl fmt::Display for MissingData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingData::CurrentPrice => {
                write!(f, "Current price is required and must be positive")
            }
            MissingData::ExitMultiple => {
                write!(f, "Exit multiple is required and must be positive")
            }
            MissingData::FiscalYearEndDate => write!(f, "Fiscal year end date is required"),
            MissingData::MetricEstimate { fiscal_year } => {
                write!(f, "Metric estimate for FY{fiscal_year} is required")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    Computed,
    InsufficientData,
    NotConverged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlowKind {
    InitialInvestment,
    Dividend,
    TerminalValue,
}

/// One entry of the dated cash-flow schedule handed to the IRR solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledCashFlow {
    pub kind: CashFlowKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiscal_year: Option<i32>,
    /// Calendar day the flow is placed on (midpoints round down)
    pub payment_date: NaiveDate,
    /// Offset from today in years (actual/365.25)
    pub years: Years,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverDiagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Output of the forward return calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardReturnOutput {
    pub status: ReturnStatus,
    /// Expected annual return over the 5-year horizon
    pub irr: Option<Rate>,
    /// (future_price / current_price)^(1/5) - 1
    pub price_cagr: Option<Rate>,
    /// Sum of dividends over the horizon / 5 / current_price
    pub average_dividend_yield: Option<Rate>,
    /// interpolated_metric * exit_multiple
    pub future_price: Option<Money>,
    /// Metric blended between the two fiscal years around the 5-year date
    pub interpolated_metric: Option<Decimal>,
    /// Everything preventing an IRR; empty when one was attempted
    pub missing_data: Vec<MissingData>,
    pub five_year_date: Option<NaiveDate>,
    pub forward_fiscal_year: Option<i32>,
    pub next_fiscal_year: Option<i32>,
    /// Weight on the forward fiscal year's metric
    pub interpolation_weight: Option<Rate>,
    pub cash_flows: Vec<ScheduledCashFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverDiagnostics>,
}

impl ForwardReturnOutput {
    fn insufficient(missing_data: Vec<MissingData>) -> Self {
        Self::unsolved(ReturnStatus::InsufficientData, missing_data)
    }

    fn unsolved(status: ReturnStatus, missing_data: Vec<MissingData>) -> Self {
        Self {
            status,
            irr: None,
            price_cagr: None,
            average_dividend_yield: None,
            future_price: None,
            interpolated_metric: None,
            missing_data,
            five_year_date: None,
            forward_fiscal_year: None,
            next_fiscal_year: None,
            interpolation_weight: None,
            cash_flows: Vec::new(),
            solver: None,
        }
    }

    /// Human-readable reasons the IRR is absent
    pub fn missing_data_reasons(&self) -> Vec<String> {
        self.missing_data.iter().map(|m| m.to_string()).collect()
    }
}

// ---------------------------------------------------------------------------
// Core calculation
// ---------------------------------------------------------------------------

struct Preconditions {
    current_price: Money,
    exit_multiple: Multiple,
    fiscal_year_end: NaiveDate,
}

/// Calculate the 5-year forward IRR for one company as of `today`.
///
/// Missing or non-positive inputs and absent bracketing-year metrics come
/// back as `Ok` with `irr: None` and the causes listed; so does an IRR that
/// does not converge. `Err` is reserved for contract violations such as
/// duplicate fiscal years.
pub fn calculate_forward_return(
    input: &ForwardReturnInput,
    today: NaiveDate,
) -> ForwardReturnResult<ComputationOutput<ForwardReturnOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let estimates = index_estimates(&input.estimates)?;

    let output = match validate_preconditions(input) {
        Ok(pre) => evaluate(&pre, &estimates, today, &mut warnings)?,
        Err(missing) => {
            debug!(?missing, "forward return preconditions not met");
            ForwardReturnOutput::insufficient(missing)
        }
    };
    warnings.extend(output.missing_data_reasons());

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Forward Return: fiscal-year interpolated 5-year exit value, dated dividend IRR (Newton-Raphson)",
        &serde_json::json!({
            "today": today.to_string(),
            "current_price": input.current_price.map(|p| p.to_string()),
            "exit_multiple": input.exit_multiple.map(|m| m.to_string()),
            "fiscal_year_end_date": input.fiscal_year_end_date.map(|d| d.to_string()),
            "horizon_years": HORIZON_YEARS,
            "day_count": "actual/365.25",
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn index_estimates(estimates: &[Estimate]) -> ForwardReturnResult<BTreeMap<i32, &Estimate>> {
    let mut by_year = BTreeMap::new();
    for estimate in estimates {
        if by_year.insert(estimate.fiscal_year, estimate).is_some() {
            return Err(ForwardReturnError::InvalidInput {
                field: "estimates".into(),
                reason: format!("FY{} appears more than once", estimate.fiscal_year),
            });
        }
    }
    Ok(by_year)
}

fn validate_preconditions(input: &ForwardReturnInput) -> Result<Preconditions, Vec<MissingData>> {
    let mut missing = Vec::new();

    let current_price = input.current_price.filter(|p| *p > Decimal::ZERO);
    if current_price.is_none() {
        missing.push(MissingData::CurrentPrice);
    }
    let exit_multiple = input.exit_multiple.filter(|m| *m > Decimal::ZERO);
    if exit_multiple.is_none() {
        missing.push(MissingData::ExitMultiple);
    }
    if input.fiscal_year_end_date.is_none() {
        missing.push(MissingData::FiscalYearEndDate);
    }

    match (current_price, exit_multiple, input.fiscal_year_end_date) {
        (Some(current_price), Some(exit_multiple), Some(fiscal_year_end)) => Ok(Preconditions {
            current_price,
            exit_multiple,
            fiscal_year_end,
        }),
        _ => Err(missing),
    }
}

fn evaluate(
    pre: &Preconditions,
    estimates: &BTreeMap<i32, &Estimate>,
    today: NaiveDate,
    warnings: &mut Vec<String>,
) -> ForwardReturnResult<ForwardReturnOutput> {
    let fye = pre.fiscal_year_end;
    let five_year_date = add_calendar_years(today, HORIZON_YEARS)?;
    let forward_fy = fiscal_year_for_date(five_year_date, fye)?;
    let next_fy = forward_fy + 1;

    let metric = |fy: i32| estimates.get(&fy).and_then(|e| e.metric_value);
    let (forward_metric, next_metric) = match (metric(forward_fy), metric(next_fy)) {
        (Some(a), Some(b)) => (a, b),
        (a, b) => {
            let mut missing = Vec::new();
            if a.is_none() {
                missing.push(MissingData::MetricEstimate { fiscal_year: forward_fy });
            }
            if b.is_none() {
                missing.push(MissingData::MetricEstimate { fiscal_year: next_fy });
            }
            debug!(forward_fy, next_fy, "bracketing metric estimates missing");
            let mut output = ForwardReturnOutput::insufficient(missing);
            output.five_year_date = Some(five_year_date);
            output.forward_fiscal_year = Some(forward_fy);
            output.next_fiscal_year = Some(next_fy);
            return Ok(output);
        }
    };

    let weight = year_fraction_for_date(five_year_date, fye)?;
    let Some((interpolated_metric, future_price)) =
        exit_value(weight, forward_metric, next_metric, pre.exit_multiple)
    else {
        let failure = "Exit value exceeds the decimal range".to_string();
        warn!(forward_fy, next_fy, "forward exit value overflowed");
        warnings.push(format!("IRR calculation warning: {failure}"));
        let mut output = ForwardReturnOutput::unsolved(ReturnStatus::NotConverged, Vec::new());
        output.five_year_date = Some(five_year_date);
        output.forward_fiscal_year = Some(forward_fy);
        output.next_fiscal_year = Some(next_fy);
        output.interpolation_weight = Some(weight);
        output.solver = Some(SolverDiagnostics {
            iterations: None,
            failure: Some(failure),
        });
        return Ok(output);
    };
    debug!(
        forward_fy,
        next_fy,
        %weight,
        %interpolated_metric,
        %future_price,
        "interpolated forward metric"
    );

    let price_cagr = compute_price_cagr(future_price, pre.current_price);
    if price_cagr.is_none() {
        warnings.push(format!(
            "Price CAGR undefined for future price {future_price} against current price {}",
            pre.current_price
        ));
    }

    let cash_flows = build_cash_flow_schedule(
        today,
        five_year_date,
        fye,
        pre.current_price,
        future_price,
        estimates,
    )?;

    let average_dividend_yield = cash_flows
        .iter()
        .filter(|cf| cf.kind == CashFlowKind::Dividend)
        .try_fold(Decimal::ZERO, |total, cf| total.checked_add(cf.amount))
        .and_then(|total| total.checked_div(HORIZON))
        .and_then(|per_year| per_year.checked_div(pre.current_price));
    if average_dividend_yield.is_none() {
        warnings.push("Average dividend yield exceeds the decimal range".into());
    }

    let timed: Vec<TimedCashFlow> = cash_flows
        .iter()
        .map(|cf| TimedCashFlow::new(cf.years, cf.amount))
        .collect();

    let (status, irr, solver) = match time_value::xirr_with_stats(&timed, INITIAL_IRR_GUESS) {
        Ok(solution) => (
            ReturnStatus::Computed,
            Some(solution.rate),
            SolverDiagnostics {
                iterations: Some(solution.iterations),
                failure: None,
            },
        ),
        Err(e) => {
            warn!(error = %e, "forward return IRR did not converge");
            warnings.push(format!("IRR calculation warning: {e}"));
            (
                ReturnStatus::NotConverged,
                None,
                SolverDiagnostics {
                    iterations: None,
                    failure: Some(e.to_string()),
                },
            )
        }
    };

    Ok(ForwardReturnOutput {
        status,
        irr,
        price_cagr,
        average_dividend_yield,
        future_price: Some(future_price),
        interpolated_metric: Some(interpolated_metric),
        missing_data: Vec::new(),
        five_year_date: Some(five_year_date),
        forward_fiscal_year: Some(forward_fy),
        next_fiscal_year: Some(next_fy),
        interpolation_weight: Some(weight),
        cash_flows,
        solver: Some(solver),
    })
}

/// Metric blended between the bracketing years, and the exit price it implies.
///
/// `None` when either leaves the decimal range.
fn exit_value(
    weight: Rate,
    forward_metric: Decimal,
    next_metric: Decimal,
    exit_multiple: Multiple,
) -> Option<(Decimal, Money)> {
    let forward_part = weight.checked_mul(forward_metric)?;
    let next_part = (Decimal::ONE - weight).checked_mul(next_metric)?;
    let interpolated = forward_part.checked_add(next_part)?;
    let future_price = interpolated.checked_mul(exit_multiple)?;
    Some((interpolated, future_price))
}

/// Annualised price appreciation over the horizon.
///
/// `None` when the ratio has no real fifth root in decimal arithmetic
/// (negative future price) or the ratio or power overflows.
fn compute_price_cagr(future_price: Money, current_price: Money) -> Option<Rate> {
    let ratio = future_price.checked_div(current_price)?;
    if ratio.is_sign_negative() && !ratio.is_zero() {
        return None;
    }
    ratio
        .checked_powd(CAGR_EXPONENT)
        .map(|growth| growth - Decimal::ONE)
}

/// Purchase today, dividends through the horizon, exit at the 5-year date.
///
/// Dividends are timed at the midpoint of the stretch they accrue over: today
/// to year end for the current fiscal year, the whole year for interior ones,
/// and year start to the 5-year date when the final year straddles it.
/// Missing or non-positive dividends add nothing.
fn build_cash_flow_schedule(
    today: NaiveDate,
    five_year_date: NaiveDate,
    fye: NaiveDate,
    current_price: Money,
    future_price: Money,
    estimates: &BTreeMap<i32, &Estimate>,
) -> ForwardReturnResult<Vec<ScheduledCashFlow>> {
    let mut flows = vec![ScheduledCashFlow {
        kind: CashFlowKind::InitialInvestment,
        fiscal_year: None,
        payment_date: today,
        years: Decimal::ZERO,
        amount: -current_price,
    }];

    let current_fy = fiscal_year_for_date(today, fye)?;
    for offset in 0..=HORIZON_YEARS as i32 {
        let fiscal_year = current_fy + offset;
        let Some(dividend) = estimates
            .get(&fiscal_year)
            .and_then(|e| e.dividend_value)
            .filter(|d| *d > Decimal::ZERO)
        else {
            continue;
        };

        let (start, end) = fiscal_year_bounds(fiscal_year, fye)?;
        let within_horizon = end <= five_year_date;
        let (amount, from, to) = if offset == 0 {
            if !within_horizon {
                continue;
            }
            (year_fraction_for_date(today, fye)? * dividend, today, end)
        } else if within_horizon {
            (dividend, start, end)
        } else if offset == HORIZON_YEARS as i32 {
            (
                elapsed_fraction(start, end, five_year_date) * dividend,
                start,
                five_year_date,
            )
        } else {
            continue;
        };

        if amount <= Decimal::ZERO {
            continue;
        }
        let years = (dated_years(today, from) + dated_years(today, to)) / dec!(2);
        if years <= Decimal::ZERO || years > HORIZON {
            continue;
        }
        let half_days = (from - today).num_days() + (to - today).num_days();
        let payment_date = today
            .checked_add_days(Days::new((half_days / 2) as u64))
            .ok_or_else(|| {
                ForwardReturnError::DateError(format!(
                    "dividend date for FY{fiscal_year} out of range"
                ))
            })?;

        flows.push(ScheduledCashFlow {
            kind: CashFlowKind::Dividend,
            fiscal_year: Some(fiscal_year),
            payment_date,
            years,
            amount,
        });
    }

    flows.push(ScheduledCashFlow {
        kind: CashFlowKind::TerminalValue,
        fiscal_year: None,
        payment_date: five_year_date,
        years: HORIZON,
        amount: future_price,
    });

    Ok(flows)
}
