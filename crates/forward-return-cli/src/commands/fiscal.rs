use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use forward_return_core::fiscal_calendar;

use crate::config::Settings;

/// Arguments for the fiscal calendar summary
#[derive(Args)]
pub struct FiscalArgs {
    /// Fiscal year end date (only month and day matter)
    #[arg(long)]
    pub fiscal_year_end: NaiveDate,

    /// Date to place in the fiscal calendar (defaults to today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub fn run_fiscal(
    args: FiscalArgs,
    settings: &Settings,
) -> Result<Value, Box<dyn std::error::Error>> {
    let date = settings.resolve_today(args.date);
    let summary = fiscal_calendar::summarize_fiscal_calendar(date, args.fiscal_year_end)?;
    Ok(serde_json::json!({ "result": summary }))
}
