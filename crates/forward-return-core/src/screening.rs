use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;
use tracing::debug;

use crate::forward_return::{calculate_forward_return, ForwardReturnInput, ReturnStatus};
use crate::types::*;
use crate::ForwardReturnResult;

// ---------------------------------------------------------------------------
// Types — Forward return screen
// ---------------------------------------------------------------------------

/// One company to screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyForwardReturnInput {
    pub ticker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub inputs: ForwardReturnInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningInput {
    pub companies: Vec<CompanyForwardReturnInput>,
}

/// A company's row in the ranked screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCompany {
    /// 1-based position among companies with an IRR
    pub rank: Option<usize>,
    pub ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `None` when the calculation itself was rejected
    pub status: Option<ReturnStatus>,
    pub irr: Option<Rate>,
    pub price_cagr: Option<Rate>,
    pub average_dividend_yield: Option<Rate>,
    pub future_price: Option<Money>,
    /// Missing-data reasons, solver failures or the rejection message
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningOutput {
    pub rows: Vec<RankedCompany>,
    pub computed: usize,
    pub insufficient_data: usize,
    pub not_converged: usize,
    pub rejected: usize,
}

// ---------------------------------------------------------------------------
// Core calculation
// ---------------------------------------------------------------------------

/// Run the forward return for every company and rank by IRR, highest first.
///
/// Companies without an IRR follow the ranked ones in ticker order. A company
/// whose input is rejected outright is kept as a row carrying the error.
pub fn rank_by_forward_return(
    input: &ScreeningInput,
    today: NaiveDate,
) -> ForwardReturnResult<ComputationOutput<ScreeningOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut rows: Vec<RankedCompany> = input
        .companies
        .iter()
        .map(|company| screen_company(company, today, &mut warnings))
        .collect();

    rows.sort_by(|a, b| match (a.irr, b.irr) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.ticker.cmp(&b.ticker)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.ticker.cmp(&b.ticker),
    });
    for (i, row) in rows.iter_mut().filter(|r| r.irr.is_some()).enumerate() {
        row.rank = Some(i + 1);
    }

    let count = |status: ReturnStatus| rows.iter().filter(|r| r.status == Some(status)).count();
    let output = ScreeningOutput {
        computed: count(ReturnStatus::Computed),
        insufficient_data: count(ReturnStatus::InsufficientData),
        not_converged: count(ReturnStatus::NotConverged),
        rejected: rows.iter().filter(|r| r.status.is_none()).count(),
        rows,
    };
    debug!(
        companies = input.companies.len(),
        computed = output.computed,
        "forward return screen complete"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Forward Return Screen: companies ranked by 5-year expected IRR",
        &serde_json::json!({
            "today": today.to_string(),
            "companies": input.companies.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn screen_company(
    company: &CompanyForwardReturnInput,
    today: NaiveDate,
    warnings: &mut Vec<String>,
) -> RankedCompany {
    let mut row = RankedCompany {
        rank: None,
        ticker: company.ticker.clone(),
        name: company.name.clone(),
        status: None,
        irr: None,
        price_cagr: None,
        average_dividend_yield: None,
        future_price: None,
        issues: Vec::new(),
    };

    match calculate_forward_return(&company.inputs, today) {
        Ok(out) => {
            let result = out.result;
            row.issues = result.missing_data_reasons();
            if let Some(failure) = result.solver.as_ref().and_then(|s| s.failure.clone()) {
                row.issues.push(failure);
            }
            row.status = Some(result.status);
            row.irr = result.irr;
            row.price_cagr = result.price_cagr;
            row.average_dividend_yield = result.average_dividend_yield;
            row.future_price = result.future_price;
        }
        Err(e) => {
            warnings.push(format!("{}: {e}", company.ticker));
            row.issues.push(e.to_string());
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward_return::Estimate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn company(ticker: &str, price: Decimal, metric: Option<Decimal>) -> CompanyForwardReturnInput {
        CompanyForwardReturnInput {
            ticker: ticker.into(),
            name: None,
            inputs: ForwardReturnInput {
                current_price: Some(price),
                exit_multiple: Some(dec!(15)),
                fiscal_year_end_date: NaiveDate::from_ymd_opt(2020, 12, 31),
                estimates: vec![
                    Estimate {
                        fiscal_year: 2031,
                        metric_value: metric,
                        dividend_value: None,
                    },
                    Estimate {
                        fiscal_year: 2032,
                        metric_value: metric,
                        dividend_value: None,
                    },
                ],
            },
        }
    }

    #[test]
    fn test_rank_orders_by_irr_and_puts_gaps_last() {
        let input = ScreeningInput {
            companies: vec![
                company("AAA", dec!(100), Some(dec!(8))),
                company("BBB", dec!(100), None),
                company("CCC", dec!(50), Some(dec!(8))),
            ],
        };
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let out = rank_by_forward_return(&input, today).unwrap().result;

        let tickers: Vec<&str> = out.rows.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["CCC", "AAA", "BBB"]);
        assert_eq!(out.rows[0].rank, Some(1));
        assert_eq!(out.rows[2].rank, None);
        assert_eq!(out.computed, 2);
        assert_eq!(out.insufficient_data, 1);
        assert_eq!(out.rows[2].issues.len(), 2);
    }

    #[test]
    fn test_rejected_company_is_reported() {
        let mut dup = company("DUP", dec!(100), Some(dec!(8)));
        dup.inputs.estimates.push(dup.inputs.estimates[0].clone());
        let input = ScreeningInput {
            companies: vec![dup],
        };
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let out = rank_by_forward_return(&input, today).unwrap();
        assert_eq!(out.result.rejected, 1);
        assert_eq!(out.result.rows[0].status, None);
        assert_eq!(out.warnings.len(), 1);
    }
}
