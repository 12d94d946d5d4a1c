use std::fmt;

use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Utc};
use tracing::debug;

use crate::protocol::{self, ApiResponse, Form};
use crate::schedule::{self, NextEvent};
use crate::session::NuHeat;
use crate::types::{ScheduleMode, ThermostatData};
use crate::units::{
    celsius_to_device, device_to_celsius, device_to_fahrenheit, fahrenheit_to_device,
};
use crate::{Error, Result};

/// Handle to a single thermostat, holding the state from the last fetch.
pub struct Thermostat<'a> {
    session: &'a NuHeat,
    serial_number: String,
    data: ThermostatData,
}

impl<'a> Thermostat<'a> {
    pub(crate) async fn new(session: &'a NuHeat, serial_number: String) -> Result<Self> {
        let mut thermostat = Self {
            session,
            serial_number,
            data: ThermostatData::default(),
        };
        thermostat.get_data().await?;
        Ok(thermostat)
    }

    /// Refetch the thermostat state. The cached state is replaced as a whole,
    /// and only when the fetch succeeds.
    pub async fn get_data(&mut self) -> Result<()> {
        let url = self.session.thermostat_url();
        let body = self.session.get(&url, &self.params()).await?;
        let value = match body {
            ApiResponse::Json(value) => value,
            ApiResponse::Raw { status, .. } => {
                return Err(Error::Protocol(format!(
                    "thermostat response is not JSON (status {status})"
                )));
            }
        };
        let data: ThermostatData = serde_json::from_value(value)?;

        if let Some(serial) = &data.serial_number {
            self.serial_number = serial.clone();
        }
        self.data = data;
        debug!(serial = %self.serial_number, "thermostat data refreshed");
        Ok(())
    }

    /// Post a raw form payload to the thermostat endpoint.
    pub async fn set_data(&self, form: &[(&str, String)]) -> Result<()> {
        let url = self.session.thermostat_url();
        self.session.post(&url, form, &self.params()).await?;
        Ok(())
    }

    fn params(&self) -> Form {
        vec![("serialnumber", self.serial_number.clone())]
    }

    pub fn data(&self) -> &ThermostatData {
        &self.data
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn heating(&self) -> bool {
        self.data.heating
    }

    pub fn online(&self) -> bool {
        self.data.online
    }

    pub fn room(&self) -> Option<&str> {
        self.data.room.as_deref()
    }

    pub fn temperature(&self) -> Option<i32> {
        self.data.temperature
    }

    pub fn min_temperature(&self) -> Option<i32> {
        self.data.min_temperature
    }

    pub fn max_temperature(&self) -> Option<i32> {
        self.data.max_temperature
    }

    pub fn target_temperature(&self) -> Option<i32> {
        self.data.target_temperature
    }

    pub fn fahrenheit(&self) -> Option<i32> {
        self.data.temperature.map(device_to_fahrenheit)
    }

    pub fn celsius(&self) -> Option<i32> {
        self.data.temperature.map(device_to_celsius)
    }

    pub fn min_fahrenheit(&self) -> Option<i32> {
        self.data.min_temperature.map(device_to_fahrenheit)
    }

    pub fn min_celsius(&self) -> Option<i32> {
        self.data.min_temperature.map(device_to_celsius)
    }

    pub fn max_fahrenheit(&self) -> Option<i32> {
        self.data.max_temperature.map(device_to_fahrenheit)
    }

    pub fn max_celsius(&self) -> Option<i32> {
        self.data.max_temperature.map(device_to_celsius)
    }

    pub fn target_fahrenheit(&self) -> Option<i32> {
        self.data.target_temperature.map(device_to_fahrenheit)
    }

    pub fn target_celsius(&self) -> Option<i32> {
        self.data.target_temperature.map(device_to_celsius)
    }

    pub fn schedule_mode(&self) -> Option<ScheduleMode> {
        self.data.schedule_mode
    }

    /// End of the current temporary hold. The server keeps returning the last
    /// hold time after the hold ends, so it is only reported while the
    /// thermostat is in temporary hold.
    pub fn hold_time(&self) -> Option<DateTime<Utc>> {
        match self.data.schedule_mode {
            Some(ScheduleMode::TemporaryHold) => self.data.hold_time,
            _ => None,
        }
    }

    pub fn next_schedule_event(&self) -> Option<NextEvent<Local>> {
        self.next_schedule_event_at(Utc::now())
            .map(|event| event.with_timezone(&Local))
    }

    /// Next active programmed event after `now`, in the thermostat's offset.
    pub fn next_schedule_event_at(
        &self,
        now: DateTime<Utc>,
    ) -> Option<NextEvent<FixedOffset>> {
        let offset = self
            .data
            .tz_offset
            .as_deref()
            .and_then(protocol::parse_utc_offset)
            .unwrap_or_else(|| Utc.fix());
        schedule::next_event(&self.data.schedules, offset, now)
    }

    pub async fn set_schedule_mode(&self, mode: ScheduleMode) -> Result<()> {
        self.set_data(&protocol::schedule_mode_form(mode)).await
    }

    pub async fn resume_schedule(&self) -> Result<()> {
        self.set_schedule_mode(ScheduleMode::Run).await
    }

    /// Set the target in device units. The value is clamped to the
    /// thermostat's range; `mode` must be a hold mode.
    ///
    /// Without an explicit `hold_time`, a temporary hold keeps the current
    /// hold end, else ends at the next programmed event, else at the hold
    /// time last reported by the server.
    pub async fn set_target_temperature(
        &self,
        temperature: i32,
        mode: ScheduleMode,
        hold_time: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let form = self.target_temperature_form(temperature, mode, hold_time, Utc::now())?;
        self.set_data(&form).await
    }

    pub async fn set_target_fahrenheit(
        &self,
        fahrenheit: i32,
        mode: ScheduleMode,
        hold_time: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.set_target_temperature(fahrenheit_to_device(fahrenheit), mode, hold_time)
            .await
    }

    pub async fn set_target_celsius(
        &self,
        celsius: i32,
        mode: ScheduleMode,
        hold_time: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.set_target_temperature(celsius_to_device(celsius), mode, hold_time)
            .await
    }

    /// Hold `fahrenheit` until changed manually.
    pub async fn set_hold_fahrenheit(&self, fahrenheit: i32) -> Result<()> {
        self.set_target_fahrenheit(fahrenheit, ScheduleMode::Hold, None)
            .await
    }

    /// Hold `celsius` until changed manually.
    pub async fn set_hold_celsius(&self, celsius: i32) -> Result<()> {
        self.set_target_celsius(celsius, ScheduleMode::Hold, None).await
    }

    /// Switch to temporary hold ending at `hold_time`, which must lie in the
    /// future.
    pub async fn set_hold_time<Tz: TimeZone>(&self, hold_time: DateTime<Tz>) -> Result<()> {
        let form = future_hold_form(hold_time.with_timezone(&Utc), Utc::now())?;
        self.set_data(&form).await
    }

    pub(crate) fn target_temperature_form(
        &self,
        temperature: i32,
        mode: ScheduleMode,
        hold_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Form> {
        let temperature = self.clamp(temperature);

        if mode == ScheduleMode::Run {
            return Err(Error::InvalidMode(mode.code()));
        }

        let hold_time = match mode {
            ScheduleMode::TemporaryHold => self.resolve_hold_time(hold_time, now),
            _ => None,
        };
        Ok(protocol::target_temperature_form(temperature, mode, hold_time))
    }

    fn resolve_hold_time(
        &self,
        explicit: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        explicit
            .or_else(|| self.hold_time())
            .or_else(|| self.next_schedule_event_at(now).map(|e| e.time.with_timezone(&Utc)))
            // Weak fallback: after a temporary hold is cleared the server
            // still reports the old hold time here.
            .or(self.data.hold_time)
    }

    fn clamp(&self, temperature: i32) -> i32 {
        let mut temperature = temperature;
        if let Some(min) = self.data.min_temperature {
            temperature = temperature.max(min);
        }
        if let Some(max) = self.data.max_temperature {
            temperature = temperature.min(max);
        }
        temperature
    }
}

pub(crate) fn future_hold_form(hold_time: DateTime<Utc>, now: DateTime<Utc>) -> Result<Form> {
    if hold_time <= now {
        return Err(Error::InvalidArgument(
            "hold time must be in the future".to_string(),
        ));
    }
    Ok(protocol::hold_time_form(hold_time))
}

impl fmt::Display for Thermostat<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show(value: Option<i32>) -> String {
            value.map_or_else(|| "None".to_string(), |v| v.to_string())
        }
        write!(
            f,
            "<NuHeatThermostat id='{}' temperature='{}F / {}C' target='{}F / {}C'>",
            self.serial_number,
            show(self.fahrenheit()),
            show(self.celsius()),
            show(self.target_fahrenheit()),
            show(self.target_celsius()),
        )
    }
}
