use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use forward_return_core::screening::{self, CompanyForwardReturnInput, ScreeningInput};

use crate::config::Settings;
use crate::input;

/// Arguments for the forward return screen
#[derive(Args)]
pub struct ScreenArgs {
    /// Path to JSON input: `{"companies": [...]}` or a bare array of companies
    #[arg(long)]
    pub input: Option<String>,

    /// Calculation date (defaults to FWDRET_TODAY, then today's UTC date)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

pub fn run_screen(
    args: ScreenArgs,
    settings: &Settings,
) -> Result<Value, Box<dyn std::error::Error>> {
    let today = settings.resolve_today(args.today);

    let data = if let Some(ref path) = args.input {
        input::file::read_json_value(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required for screen".into());
    };

    let screen_input = if data.is_array() {
        ScreeningInput {
            companies: serde_json::from_value::<Vec<CompanyForwardReturnInput>>(data)?,
        }
    } else {
        serde_json::from_value(data)?
    };

    let result = screening::rank_by_forward_return(&screen_input, today)?;
    Ok(serde_json::to_value(result)?)
}
