use chrono::{Datelike, Duration, NaiveDate};
use forward_return_core::fiscal_calendar::{
    fiscal_year_bounds, fiscal_year_end_in, fiscal_year_for_date, year_fraction_for_date,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn fye_strategy() -> impl Strategy<Value = NaiveDate> {
    // Every month/day pattern, Feb 29 included
    (0i64..366).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
    })
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..60_000).prop_map(|offset| {
        NaiveDate::from_ymd_opt(1950, 1, 1).unwrap() + Duration::days(offset)
    })
}

proptest! {
    #[test]
    fn fiscal_year_end_belongs_to_its_own_year(fye in fye_strategy(), year in 1950i32..2110) {
        let end = fiscal_year_end_in(year, fye).unwrap();
        prop_assert_eq!(fiscal_year_for_date(end, fye).unwrap(), year);
        let next_day = end.succ_opt().unwrap();
        prop_assert_eq!(fiscal_year_for_date(next_day, fye).unwrap(), year + 1);
    }

    #[test]
    fn year_fraction_stays_in_unit_interval(fye in fye_strategy(), date in date_strategy()) {
        let fraction = year_fraction_for_date(date, fye).unwrap();
        prop_assert!(fraction >= Decimal::ZERO && fraction <= Decimal::ONE);
    }

    #[test]
    fn first_day_of_fiscal_year_has_full_fraction(fye in fye_strategy(), year in 1951i32..2110) {
        let (start, end) = fiscal_year_bounds(year, fye).unwrap();
        prop_assert_eq!(year_fraction_for_date(start, fye).unwrap(), Decimal::ONE);
        prop_assert!(year_fraction_for_date(end, fye).unwrap() < Decimal::ONE / Decimal::from(300));
        let days = (end - start).num_days() + 1;
        prop_assert!((365..=366).contains(&days));
    }

    #[test]
    fn date_falls_inside_its_fiscal_year_bounds(fye in fye_strategy(), date in date_strategy()) {
        let fy = fiscal_year_for_date(date, fye).unwrap();
        let (start, end) = fiscal_year_bounds(fy, fye).unwrap();
        prop_assert!(start <= date && date <= end);
        prop_assert_eq!(end.year(), fy);
    }
}
