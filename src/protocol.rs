use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::ScheduleMode;

pub type Form = Vec<(&'static str, String)>;

/// Body of a successful request. The API answers most writes with an empty
/// or non-JSON body, so callers get the raw text in that case.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    Raw { status: u16, body: String },
}

impl ApiResponse {
    pub fn json(&self) -> Option<&Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::Raw { .. } => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::Raw { .. } => None,
        }
    }
}

pub fn auth_form(username: &str, password: &str) -> Form {
    vec![
        ("Email", username.to_string()),
        ("Password", password.to_string()),
        ("application", "0".to_string()),
    ]
}

pub fn session_id(response: &ApiResponse) -> Option<String> {
    response
        .json()?
        .get("SessionId")
        .and_then(|v| v.as_str())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

pub fn schedule_mode_form(mode: ScheduleMode) -> Form {
    vec![("ScheduleMode", mode.code().to_string())]
}

pub fn target_temperature_form(
    temperature: i32,
    mode: ScheduleMode,
    hold_time: Option<DateTime<Utc>>,
) -> Form {
    let mut form = vec![
        ("SetPointTemp", temperature.to_string()),
        ("ScheduleMode", mode.code().to_string()),
    ];
    if let Some(hold) = hold_time {
        form.push(("HoldSetPointDateTime", format_hold_time(&hold)));
    }
    form
}

pub fn hold_time_form(hold_time: DateTime<Utc>) -> Form {
    vec![
        ("ScheduleMode", ScheduleMode::TemporaryHold.code().to_string()),
        ("HoldSetPointDateTime", format_hold_time(&hold_time)),
    ]
}

/// `Fri, 09 Nov 1990 23:00:00 GMT`
pub fn format_hold_time<Tz: TimeZone>(time: &DateTime<Tz>) -> String {
    time.with_timezone(&Utc)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Accepts RFC 3339, or a naive ISO-8601 timestamp taken as UTC.
pub fn parse_hold_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

pub(crate) fn deserialize_hold_time<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_hold_time))
}

/// Parses `+HH:MM` / `-HH:MM`. Anything else is `None`.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    raw.parse().ok()
}
