//! Calendar date ↔ fiscal year conversions.
//!
//! A fiscal year is named by the calendar year in which it ends and runs from
//! the day after the prior fiscal-year end through its own end, inclusive.
//! Only the month and day of the fiscal-year-end date matter. A Feb 29 year
//! end falls back to Feb 28 in years without a leap day.
//!
//! Everything here is relative to a date the caller supplies; nothing reads a
//! clock.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ForwardReturnError;
use crate::types::Rate;
use crate::ForwardReturnResult;

/// The fiscal-year end `fye` (month/day pattern) instantiated in `year`.
pub fn fiscal_year_end_in(year: i32, fye: NaiveDate) -> ForwardReturnResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, fye.month(), fye.day())
        .or_else(|| {
            if fye.month() == 2 && fye.day() == 29 {
                NaiveDate::from_ymd_opt(year, 2, 28)
            } else {
                None
            }
        })
        .ok_or_else(|| {
            ForwardReturnError::DateError(format!(
                "fiscal year end {:02}-{:02} cannot be placed in year {year}",
                fye.month(),
                fye.day()
            ))
        })
}

/// Absolute fiscal year that `date` falls into.
pub fn fiscal_year_for_date(date: NaiveDate, fye: NaiveDate) -> ForwardReturnResult<i32> {
    let boundary = fiscal_year_end_in(date.year(), fye)?;
    Ok(if date > boundary {
        date.year() + 1
    } else {
        date.year()
    })
}

/// First and last day (both inclusive) of `fiscal_year`.
pub fn fiscal_year_bounds(
    fiscal_year: i32,
    fye: NaiveDate,
) -> ForwardReturnResult<(NaiveDate, NaiveDate)> {
    let end = fiscal_year_end_in(fiscal_year, fye)?;
    let prior_end = fiscal_year_end_in(fiscal_year - 1, fye)?;
    let start = prior_end.succ_opt().ok_or_else(|| {
        ForwardReturnError::DateError(format!("no day follows {prior_end}"))
    })?;
    Ok((start, end))
}

/// Fraction of the containing fiscal year still to run, counting `date` itself.
///
/// 1.0 on the first day of a fiscal year, `1 / days_in_year` on its last
/// day. Clamped to [0, 1].
pub fn year_fraction_for_date(date: NaiveDate, fye: NaiveDate) -> ForwardReturnResult<Rate> {
    let fiscal_year = fiscal_year_for_date(date, fye)?;
    let (start, end) = fiscal_year_bounds(fiscal_year, fye)?;
    let length = (end - start).num_days() + 1;
    let remaining = (end - date).num_days() + 1;
    Ok(clamp_unit(Decimal::from(remaining) / Decimal::from(length)))
}

/// Fraction of the fiscal year `[start, end]` that has elapsed before `date`.
///
/// Complements [`year_fraction_for_date`]: for a date inside the year the two
/// sum to one.
pub fn elapsed_fraction(start: NaiveDate, end: NaiveDate, date: NaiveDate) -> Rate {
    let length = (end - start).num_days() + 1;
    if length <= 0 {
        return Decimal::ZERO;
    }
    let elapsed = (date - start).num_days();
    clamp_unit(Decimal::from(elapsed) / Decimal::from(length))
}

/// `date` moved forward by whole calendar years; Feb 29 lands on Feb 28.
pub fn add_calendar_years(date: NaiveDate, years: u32) -> ForwardReturnResult<NaiveDate> {
    years
        .checked_mul(12)
        .and_then(|months| date.checked_add_months(Months::new(months)))
        .ok_or_else(|| {
            ForwardReturnError::DateError(format!("{date} plus {years} years is out of range"))
        })
}

fn clamp_unit(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).min(Decimal::ONE)
}

/// Where a date sits within a company's fiscal calendar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiscalCalendarSummary {
    pub date: NaiveDate,
    pub fiscal_year_end_date: NaiveDate,
    pub fiscal_year: i32,
    pub fiscal_year_start: NaiveDate,
    pub fiscal_year_end: NaiveDate,
    pub days_in_year: i64,
    pub days_remaining: i64,
    /// Fraction of the fiscal year remaining, see [`year_fraction_for_date`]
    pub year_fraction: Rate,
}

pub fn summarize_fiscal_calendar(
    date: NaiveDate,
    fye: NaiveDate,
) -> ForwardReturnResult<FiscalCalendarSummary> {
    let fiscal_year = fiscal_year_for_date(date, fye)?;
    let (start, end) = fiscal_year_bounds(fiscal_year, fye)?;
    Ok(FiscalCalendarSummary {
        date,
        fiscal_year_end_date: fye,
        fiscal_year,
        fiscal_year_start: start,
        fiscal_year_end: end,
        days_in_year: (end - start).num_days() + 1,
        days_remaining: (end - date).num_days() + 1,
        year_fraction: year_fraction_for_date(date, fye)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_calendar_year_end() {
        let fye = d(2020, 12, 31);
        assert_eq!(fiscal_year_for_date(d(2026, 1, 1), fye).unwrap(), 2026);
        assert_eq!(fiscal_year_for_date(d(2026, 12, 31), fye).unwrap(), 2026);
    }

    #[test]
    fn test_june_year_end_rolls_forward() {
        let fye = d(2019, 6, 30);
        assert_eq!(fiscal_year_for_date(d(2026, 6, 30), fye).unwrap(), 2026);
        assert_eq!(fiscal_year_for_date(d(2026, 7, 1), fye).unwrap(), 2027);
        assert_eq!(fiscal_year_for_date(d(2026, 1, 15), fye).unwrap(), 2026);
    }

    #[test]
    fn test_bounds() {
        let fye = d(2019, 9, 30);
        let (start, end) = fiscal_year_bounds(2027, fye).unwrap();
        assert_eq!(start, d(2026, 10, 1));
        assert_eq!(end, d(2027, 9, 30));
    }

    #[test]
    fn test_leap_day_year_end_falls_back() {
        let fye = d(2024, 2, 29);
        assert_eq!(fiscal_year_end_in(2025, fye).unwrap(), d(2025, 2, 28));
        assert_eq!(fiscal_year_end_in(2028, fye).unwrap(), d(2028, 2, 29));
        let (start, end) = fiscal_year_bounds(2025, fye).unwrap();
        assert_eq!(start, d(2024, 3, 1));
        assert_eq!(end, d(2025, 2, 28));
        assert_eq!(fiscal_year_for_date(d(2025, 3, 1), fye).unwrap(), 2026);
    }

    #[test]
    fn test_year_fraction_endpoints() {
        let fye = d(2020, 12, 31);
        assert_eq!(year_fraction_for_date(d(2026, 1, 1), fye).unwrap(), dec!(1));
        assert_eq!(
            year_fraction_for_date(d(2026, 12, 31), fye).unwrap(),
            Decimal::ONE / dec!(365)
        );
        assert_eq!(
            year_fraction_for_date(d(2028, 7, 2), fye).unwrap(),
            dec!(183) / dec!(366)
        );
    }

    #[test]
    fn test_elapsed_complements_remaining() {
        let fye = d(2020, 3, 31);
        let date = d(2026, 11, 20);
        let fy = fiscal_year_for_date(date, fye).unwrap();
        let (start, end) = fiscal_year_bounds(fy, fye).unwrap();
        let total = elapsed_fraction(start, end, date) + year_fraction_for_date(date, fye).unwrap();
        assert!((total - Decimal::ONE).abs() < dec!(0.0000000001));
        assert_eq!(elapsed_fraction(start, end, start), Decimal::ZERO);
        assert_eq!(elapsed_fraction(start, end, d(2030, 1, 1)), Decimal::ONE);
    }

    #[test]
    fn test_add_calendar_years() {
        assert_eq!(add_calendar_years(d(2026, 10, 16), 5).unwrap(), d(2031, 10, 16));
        assert_eq!(add_calendar_years(d(2028, 2, 29), 5).unwrap(), d(2033, 2, 28));
    }

    #[test]
    fn test_summary() {
        let summary = summarize_fiscal_calendar(d(2026, 10, 16), d(2020, 6, 30)).unwrap();
        assert_eq!(summary.fiscal_year, 2027);
        assert_eq!(summary.fiscal_year_start, d(2026, 7, 1));
        assert_eq!(summary.fiscal_year_end, d(2027, 6, 30));
        assert_eq!(summary.days_in_year, 365);
        assert_eq!(summary.days_remaining, 258);
    }
}
