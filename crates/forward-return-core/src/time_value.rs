use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ForwardReturnError;
use crate::types::{Money, Rate, TimedCashFlow, Years};
use crate::ForwardReturnResult;

pub const CONVERGENCE_THRESHOLD: Decimal = dec!(0.000001);
pub const MAX_IRR_ITERATIONS: u32 = 100;
/// Lower edge of the admissible rate band (exclusive)
pub const MIN_RATE: Rate = dec!(-0.99);
/// Upper edge of the admissible rate band (exclusive)
pub const MAX_RATE: Rate = dec!(10);
pub const DAYS_PER_YEAR: Decimal = dec!(365.25);

/// A converged IRR together with how it was reached
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrrSolution {
    pub rate: Rate,
    pub iterations: u32,
    /// NPV at `rate`, always below the convergence threshold in magnitude
    pub npv: Money,
}

/// Fractional years between two dates on an actual/365.25 basis
pub fn dated_years(from: NaiveDate, to: NaiveDate) -> Years {
    Decimal::from((to - from).num_days()) / DAYS_PER_YEAR
}

/// Net Present Value of cash flows positioned at fractional-year offsets
pub fn xnpv(rate: Rate, flows: &[TimedCashFlow]) -> ForwardReturnResult<Money> {
    if rate <= dec!(-1) {
        return Err(ForwardReturnError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut result = Decimal::ZERO;
    for flow in flows {
        let discount = discount_factor(one_plus_r, flow.years, "XNPV", 0, result)?;
        result = flow
            .amount
            .checked_div(discount)
            .and_then(|pv| result.checked_add(pv))
            .ok_or_else(|| overflow("XNPV", 0, result))?;
    }
    Ok(result)
}

/// Extended IRR for cash flows at fractional-year offsets (Newton-Raphson)
pub fn xirr(flows: &[TimedCashFlow], guess: Rate) -> ForwardReturnResult<Rate> {
    xirr_with_stats(flows, guess).map(|solution| solution.rate)
}

/// Newton-Raphson root of `Σ cf·(1+r)^(−t) = 0`.
///
/// Starts from `guess` and stops once `|NPV|` falls under
/// [`CONVERGENCE_THRESHOLD`]. Gives up with an error when the derivative
/// flattens out, when the rate leaves the open band
/// ([`MIN_RATE`], [`MAX_RATE`]), or after [`MAX_IRR_ITERATIONS`] steps.
/// Arithmetic that leaves the decimal range is reported as a convergence
/// failure. A non-converged rate is never returned.
pub fn xirr_with_stats(
    flows: &[TimedCashFlow],
    guess: Rate,
) -> ForwardReturnResult<IrrSolution> {
    if flows.len() < 2 {
        return Err(ForwardReturnError::InsufficientData(
            "XIRR requires at least 2 cash flows".into(),
        ));
    }
    if guess <= MIN_RATE || guess >= MAX_RATE {
        return Err(ForwardReturnError::InvalidInput {
            field: "guess".into(),
            reason: format!("Initial guess must lie inside ({MIN_RATE}, {MAX_RATE})"),
        });
    }

    let mut rate = guess;
    let mut last_npv = Decimal::ZERO;

    for i in 0..MAX_IRR_ITERATIONS {
        let (npv_val, dnpv) = npv_and_derivative(flows, rate, i)?;
        last_npv = npv_val;
        trace!(iteration = i, %rate, npv = %npv_val, "xirr step");

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(IrrSolution {
                rate,
                iterations: i,
                npv: npv_val,
            });
        }

        if dnpv.abs() < CONVERGENCE_THRESHOLD {
            return Err(ForwardReturnError::ConvergenceFailure {
                function: "XIRR".into(),
                cause: "hit a flat NPV derivative".into(),
                iterations: i,
                last_npv: npv_val,
            });
        }

        rate = npv_val
            .checked_div(dnpv)
            .and_then(|step| rate.checked_sub(step))
            .ok_or_else(|| overflow("XIRR", i, npv_val))?;

        if rate <= MIN_RATE || rate >= MAX_RATE {
            return Err(ForwardReturnError::RateOutOfBounds {
                function: "XIRR".into(),
                rate,
                iterations: i + 1,
            });
        }
    }

    Err(ForwardReturnError::ConvergenceFailure {
        function: "XIRR".into(),
        cause: "exhausted its iteration budget".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_npv,
    })
}

/// NPV and dNPV/dr at `rate`; d/dr[(1+r)^(−t)] = −t·(1+r)^(−t−1)
fn npv_and_derivative(
    flows: &[TimedCashFlow],
    rate: Rate,
    iteration: u32,
) -> ForwardReturnResult<(Money, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;

    for flow in flows {
        let discount = discount_factor(one_plus_r, flow.years, "XIRR", iteration, npv_val)?;
        let step = flow.amount.checked_div(discount).and_then(|pv| {
            let slope = flow.years.checked_mul(pv)?.checked_div(one_plus_r)?;
            Some((npv_val.checked_add(pv)?, dnpv.checked_sub(slope)?))
        });
        (npv_val, dnpv) = step.ok_or_else(|| overflow("XIRR", iteration, npv_val))?;
    }

    Ok((npv_val, dnpv))
}

fn overflow(function: &str, iteration: u32, npv_so_far: Money) -> ForwardReturnError {
    ForwardReturnError::ConvergenceFailure {
        function: function.into(),
        cause: "overflowed the decimal range".into(),
        iterations: iteration,
        last_npv: npv_so_far,
    }
}

fn discount_factor(
    one_plus_r: Decimal,
    years: Years,
    function: &str,
    iteration: u32,
    npv_so_far: Money,
) -> ForwardReturnResult<Decimal> {
    match one_plus_r.checked_powd(years) {
        Some(d) if !d.is_zero() => Ok(d),
        _ => Err(ForwardReturnError::ConvergenceFailure {
            function: function.into(),
            cause: format!("could not discount a flow at {years} years"),
            iterations: iteration,
            last_npv: npv_so_far,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flows(pairs: &[(Decimal, Decimal)]) -> Vec<TimedCashFlow> {
        pairs
            .iter()
            .map(|(t, cf)| TimedCashFlow::new(*t, *cf))
            .collect()
    }

    #[test]
    fn test_xnpv_zero_rate_is_plain_sum() {
        let cfs = flows(&[(dec!(0), dec!(-100)), (dec!(1.5), dec!(30)), (dec!(5), dec!(90))]);
        assert_eq!(xnpv(dec!(0), &cfs).unwrap(), dec!(20));
    }

    #[test]
    fn test_xnpv_rejects_rate_below_minus_one() {
        let cfs = flows(&[(dec!(0), dec!(-100)), (dec!(1), dec!(110))]);
        assert!(xnpv(dec!(-1), &cfs).is_err());
    }

    #[test]
    fn test_xirr_single_period() {
        let cfs = flows(&[(dec!(0), dec!(-100)), (dec!(1), dec!(110))]);
        let rate = xirr(&cfs, dec!(0.10)).unwrap();
        assert!((rate - dec!(0.10)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_xirr_matches_closed_form_cagr() {
        let cfs = flows(&[(dec!(0), dec!(-100)), (dec!(5), dec!(200))]);
        let rate = xirr(&cfs, dec!(0.10)).unwrap();
        let expected = dec!(2).powd(dec!(0.2)) - Decimal::ONE;
        assert!(
            (rate - expected).abs() < dec!(0.000001),
            "expected {expected}, got {rate}"
        );
    }

    #[test]
    fn test_xirr_fractional_dividends() {
        let cfs = flows(&[
            (dec!(0), dec!(-100)),
            (dec!(0.5), dec!(3)),
            (dec!(1.5), dec!(3)),
            (dec!(2.5), dec!(3)),
            (dec!(3.5), dec!(3)),
            (dec!(4.5), dec!(3)),
            (dec!(5), dec!(100)),
        ]);
        let solution = xirr_with_stats(&cfs, dec!(0.10)).unwrap();
        assert!(solution.npv.abs() < CONVERGENCE_THRESHOLD);
        // Roughly a 3% yield on a flat price
        assert!(solution.rate > dec!(0.029) && solution.rate < dec!(0.032));
        assert!(xnpv(solution.rate, &cfs).unwrap().abs() < dec!(0.00001));
    }

    #[test]
    fn test_xirr_requires_two_flows() {
        let cfs = flows(&[(dec!(0), dec!(-100))]);
        assert!(matches!(
            xirr(&cfs, dec!(0.10)),
            Err(ForwardReturnError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_xirr_no_sign_change_diverges() {
        let cfs = flows(&[(dec!(0), dec!(100)), (dec!(5), dec!(100))]);
        assert!(xirr(&cfs, dec!(0.10)).is_err());
    }

    #[test]
    fn test_xirr_total_loss_leaves_rate_band() {
        let cfs = flows(&[(dec!(0), dec!(-100)), (dec!(5), dec!(0.0000001))]);
        assert!(xirr(&cfs, dec!(0.10)).is_err());
    }

    #[test]
    fn test_xirr_huge_terminal_value_fails_without_panicking() {
        let cfs = flows(&[(dec!(0), dec!(-1)), (dec!(5), dec!(70000000000000000000000000000))]);
        assert!(matches!(
            xirr(&cfs, dec!(0.10)),
            Err(ForwardReturnError::ConvergenceFailure { .. })
        ));
    }

    #[test]
    fn test_dated_years_uses_365_25() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(dated_years(from, to), dec!(366) / dec!(365.25));
    }
}
