use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::protocol::deserialize_hold_time;
use crate::schedule::DaySchedule;
use crate::Error;

/// How the thermostat picks its target temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "i64")]
pub enum ScheduleMode {
    /// Follow the programmed schedule.
    Run,
    /// Hold the target until a given time, then resume the schedule.
    TemporaryHold,
    /// Hold the target until it is changed manually.
    Hold,
}

impl ScheduleMode {
    pub fn code(&self) -> i64 {
        match self {
            ScheduleMode::Run => 1,
            ScheduleMode::TemporaryHold => 2,
            ScheduleMode::Hold => 3,
        }
    }
}

impl TryFrom<i64> for ScheduleMode {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(ScheduleMode::Run),
            2 => Ok(ScheduleMode::TemporaryHold),
            3 => Ok(ScheduleMode::Hold),
            other => Err(Error::InvalidMode(other)),
        }
    }
}

impl fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScheduleMode::Run => "run",
            ScheduleMode::TemporaryHold => "temporary hold",
            ScheduleMode::Hold => "hold",
        };
        f.write_str(name)
    }
}

/// Thermostat state as returned by the device endpoint. Temperatures are in
/// device units.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ThermostatData {
    #[serde(default)]
    pub heating: bool,
    #[serde(default)]
    pub online: bool,
    pub room: Option<String>,
    pub serial_number: Option<String>,
    pub temperature: Option<i32>,
    #[serde(rename = "MinTemp")]
    pub min_temperature: Option<i32>,
    #[serde(rename = "MaxTemp")]
    pub max_temperature: Option<i32>,
    #[serde(rename = "SetPointTemp")]
    pub target_temperature: Option<i32>,
    pub schedule_mode: Option<ScheduleMode>,
    /// Raw server value; stale unless the mode is a temporary hold.
    #[serde(
        rename = "HoldSetPointDateTime",
        default,
        deserialize_with = "deserialize_hold_time"
    )]
    pub hold_time: Option<DateTime<Utc>>,
    #[serde(rename = "TZOffset")]
    pub tz_offset: Option<String>,
    #[serde(default)]
    pub schedules: Vec<DaySchedule>,
}
