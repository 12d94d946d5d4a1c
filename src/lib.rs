mod brand;
mod error;
mod logger;
mod protocol;
mod schedule;
mod session;
mod thermostat;
mod types;
pub mod units;

pub use brand::Brand;
pub use error::{Error, Result};
pub use protocol::{format_hold_time, ApiResponse, Form};
pub use schedule::{next_event, DaySchedule, NextEvent, ScheduleEvent, SLEEP_EVENT};
pub use session::{NuHeat, NuHeatBuilder};
pub use thermostat::Thermostat;
pub use types::*;
