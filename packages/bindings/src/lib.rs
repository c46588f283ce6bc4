use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// The caller supplies "today" as an ISO date; the engine never reads a clock.
fn parse_date(field: &str, raw: &str) -> NapiResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| to_napi_error(format!("{field} must be YYYY-MM-DD: {e}")))
}

// ---------------------------------------------------------------------------
// Forward return
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_forward_return(input_json: String, today: String) -> NapiResult<String> {
    let input: forward_return_core::forward_return::ForwardReturnInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let today = parse_date("today", &today)?;
    let output = forward_return_core::forward_return::calculate_forward_return(&input, today)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn rank_forward_returns(input_json: String, today: String) -> NapiResult<String> {
    let input: forward_return_core::screening::ScreeningInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let today = parse_date("today", &today)?;
    let output = forward_return_core::screening::rank_by_forward_return(&input, today)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Fiscal calendar
// ---------------------------------------------------------------------------

#[napi]
pub fn fiscal_calendar_summary(fiscal_year_end_date: String, date: String) -> NapiResult<String> {
    let fye = parse_date("fiscal_year_end_date", &fiscal_year_end_date)?;
    let date = parse_date("date", &date)?;
    let summary = forward_return_core::fiscal_calendar::summarize_fiscal_calendar(date, fye)
        .map_err(to_napi_error)?;
    serde_json::to_string(&summary).map_err(to_napi_error)
}
