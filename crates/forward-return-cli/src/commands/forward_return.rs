use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use forward_return_core::forward_return::{self, Estimate, ForwardReturnInput};

use crate::config::Settings;
use crate::input;

/// Arguments for the 5-year forward return calculation
#[derive(Args)]
pub struct ForwardReturnArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Current share price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Exit multiple applied to the interpolated metric
    #[arg(long)]
    pub exit_multiple: Option<Decimal>,

    /// Fiscal year end date (only month and day matter), e.g. 2024-06-30
    #[arg(long)]
    pub fiscal_year_end: Option<NaiveDate>,

    /// Estimate as FY:METRIC[:DIVIDEND], repeatable (use "-" to leave METRIC blank)
    #[arg(long = "estimate", value_parser = parse_estimate, allow_hyphen_values = true)]
    pub estimates: Vec<Estimate>,

    /// Calculation date (defaults to FWDRET_TODAY, then today's UTC date)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

pub fn run_forward_return(
    args: ForwardReturnArgs,
    settings: &Settings,
) -> Result<Value, Box<dyn std::error::Error>> {
    let today = settings.resolve_today(args.today);

    let fr_input: ForwardReturnInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        // Gaps are reported by the engine as missing data rather than rejected here
        ForwardReturnInput {
            current_price: args.price,
            exit_multiple: args.exit_multiple,
            fiscal_year_end_date: args.fiscal_year_end,
            estimates: args.estimates,
        }
    };

    tracing::debug!(%today, estimates = fr_input.estimates.len(), "running forward return");
    let result = forward_return::calculate_forward_return(&fr_input, today)?;
    Ok(serde_json::to_value(result)?)
}

/// Parse `FY:METRIC[:DIVIDEND]`; an empty or `-` field means no value.
pub fn parse_estimate(raw: &str) -> Result<Estimate, String> {
    let parts: Vec<&str> = raw.split(':').map(str::trim).collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(format!("expected FY:METRIC[:DIVIDEND], got '{raw}'"));
    }

    let fiscal_year: i32 = parts[0]
        .parse()
        .map_err(|_| format!("invalid fiscal year '{}'", parts[0]))?;
    let optional = |field: &str, name: &str| -> Result<Option<Decimal>, String> {
        if field.is_empty() || field == "-" {
            return Ok(None);
        }
        field
            .parse::<Decimal>()
            .map(Some)
            .map_err(|e| format!("invalid {name} '{field}': {e}"))
    };

    Ok(Estimate {
        fiscal_year,
        metric_value: optional(parts[1], "metric")?,
        dividend_value: match parts.get(2) {
            Some(field) => optional(field, "dividend")?,
            None => None,
        },
    })
}
