//! Runtime configuration resolved from `.env` and the environment.

use chrono::{NaiveDate, Utc};
use clap::ValueEnum;
use std::env;

use crate::OutputFormat;

/// Date override for every calculation, `YYYY-MM-DD`
pub const TODAY_VAR: &str = "FWDRET_TODAY";
/// Default `--output` format
pub const OUTPUT_VAR: &str = "FWDRET_OUTPUT";

#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub today: Option<NaiveDate>,
    pub output: Option<OutputFormat>,
}

impl Settings {
    /// Load configuration from `.env` (if present) and the process environment.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let today = match env::var(TODAY_VAR) {
            Ok(raw) if !raw.trim().is_empty() => Some(
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map_err(|e| format!("{TODAY_VAR}='{raw}' is not a YYYY-MM-DD date: {e}"))?,
            ),
            _ => None,
        };

        let output = match env::var(OUTPUT_VAR) {
            Ok(raw) if !raw.trim().is_empty() => Some(
                OutputFormat::from_str(raw.trim(), true)
                    .map_err(|e| format!("{OUTPUT_VAR}='{raw}': {e}"))?,
            ),
            _ => None,
        };

        Ok(Self { today, output })
    }

    /// The calculation date: explicit flag, then `FWDRET_TODAY`, then the UTC date.
    pub fn resolve_today(&self, flag: Option<NaiveDate>) -> NaiveDate {
        flag.or(self.today).unwrap_or_else(|| Utc::now().date_naive())
    }
}
